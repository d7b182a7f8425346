mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use bnpl_credit::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
