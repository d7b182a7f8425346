use crate::infra::{demo_profiles, parse_score, HeuristicRiskModel, InMemoryCreditRepository};
use bnpl_credit::error::AppError;
use bnpl_credit::workflows::credit::{
    ApplicantBatchImporter, AssessmentView, CreditAssessmentService, EntitlementEngine,
    EntitlementOutcome, LoanRequest, OrderRequest, RawAssessmentInput,
};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// Model risk score in [0, 1]. Omit to see the unscorable fallback.
    #[arg(long, value_parser = parse_score)]
    pub(crate) risk_score: Option<f64>,
    /// Default on file; only "Y" counts
    #[arg(long)]
    pub(crate) default_flag: Option<String>,
    /// Employment status (EMPLOYED, SELF_EMPLOYED, anything else counts as OTHER)
    #[arg(long)]
    pub(crate) employment: Option<String>,
    /// Credit utilization ratio; unparseable values count as zero
    #[arg(long)]
    pub(crate) utilization: Option<String>,
    /// Print the entitlement as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV with applicant_id,risk_score,default_flag,employment_status,utilization_ratio
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Print the results as a JSON array
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Loan amount used for the estimate step (defaults to the dashboard amount)
    #[arg(long)]
    pub(crate) amount: Option<f64>,
    /// Loan term in months used for the estimate step
    #[arg(long)]
    pub(crate) term_months: Option<u16>,
    /// Skip the persisted assessment and only show estimates
    #[arg(long)]
    pub(crate) estimate_only: bool,
    /// Confirm a checkout of this amount for each applicant after assessment
    #[arg(long)]
    pub(crate) order_amount: Option<f64>,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let raw = raw_input(&args);
    let outcome = EntitlementEngine::standard().assess(&raw.normalize());

    if args.json {
        match serde_json::to_string_pretty(&outcome.entitlement) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Entitlement payload unavailable: {}", err),
        }
    } else {
        render_outcome(&outcome);
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let engine = EntitlementEngine::standard();
    let results = ApplicantBatchImporter::from_path(&args.csv, &engine)?;

    if args.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Batch payload unavailable: {}", err),
        }
        return Ok(());
    }

    println!("Priced {} applicants from {}", results.len(), args.csv.display());
    for row in &results {
        println!("- {}: {}", row.applicant_id, row.entitlement.summary());
    }
    let fallbacks = results
        .iter()
        .filter(|row| !row.entitlement.is_offer())
        .count();
    if fallbacks > 0 {
        println!("{} rows had no usable risk score", fallbacks);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryCreditRepository::seeded());
    let service = CreditAssessmentService::new(repository, Arc::new(HeuristicRiskModel));
    let request = LoanRequest {
        amount: args.amount,
        term_months: args.term_months,
    };

    println!("BNPL credit entitlement demo (offline heuristic scorer)");
    for profile in demo_profiles() {
        let user_id = profile.user_id;
        println!("\nApplicant {}", user_id);

        match service.estimate(&user_id, request) {
            Ok(view) => render_view("Estimate", &view),
            Err(err) => println!("  Estimate unavailable: {}", err),
        }

        if args.estimate_only {
            continue;
        }

        match service.assess(&user_id, request) {
            Ok(view) => render_view("Assessment", &view),
            Err(err) => {
                println!("  Assessment unavailable: {}", err);
                continue;
            }
        }

        match service.current_entitlement(&user_id) {
            Ok(current) => match serde_json::to_string_pretty(&current) {
                Ok(json) => println!("  Current entitlement payload:\n{}", json),
                Err(err) => println!("  Current entitlement payload unavailable: {}", err),
            },
            Err(err) => println!("  Current entitlement unavailable: {}", err),
        }

        match service.spending_limit(&user_id) {
            Ok(view) => match view.current_spending_limit {
                Some(limit) => println!(
                    "  Monthly spending limit £{:.2} of £{:.2}",
                    limit, view.overall_credit_limit
                ),
                None => println!("  No monthly spending limit set"),
            },
            Err(err) => println!("  Spending limit unavailable: {}", err),
        }

        if let Some(amount) = args.order_amount {
            let order = OrderRequest {
                product_title: "Demo checkout".to_string(),
                amount,
                term_months: args.term_months.unwrap_or(3),
                assessment_id: None,
            };
            match service.confirm_order(&user_id, order) {
                Ok(confirmation) => println!(
                    "  Order {} confirmed, first payment due {}, available £{:.2}",
                    confirmation.order.order_id,
                    confirmation.order.first_due_date,
                    confirmation.available_credit
                ),
                Err(err) => println!("  Order declined: {}", err),
            }
        }
    }

    Ok(())
}

fn raw_input(args: &AssessArgs) -> RawAssessmentInput {
    let text = |value: &Option<String>| value.clone().map(Value::String).unwrap_or(Value::Null);
    RawAssessmentInput {
        risk_score: args
            .risk_score
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        default_flag: text(&args.default_flag),
        employment_status: text(&args.employment),
        utilization_ratio: text(&args.utilization),
    }
}

fn render_outcome(outcome: &EntitlementOutcome) {
    let entitlement = &outcome.entitlement;
    println!("{}", entitlement.summary());
    println!("Base limit: £{:.2}", outcome.base_limit);
    if entitlement.adjustments_applied.is_empty() {
        println!("Adjustments: none");
    } else {
        println!("Adjustments:");
        for adjustment in &entitlement.adjustments_applied {
            println!("- {}", adjustment);
        }
    }
    if outcome.cap_hit() {
        println!("Limit capped at the house maximum");
    }
    if outcome.floor_hit() {
        println!("Limit lifted to the house minimum");
    }
}

fn render_view(label: &str, view: &AssessmentView) {
    let terms = view
        .terms
        .iter()
        .map(|months| months.to_string())
        .collect::<Vec<_>>()
        .join("/");
    println!(
        "  {}: tier {} | limit £{:.2} | terms {} months | available £{:.2}",
        label, view.tier, view.limit, terms, view.available_credit
    );
    if let Some(id) = &view.assessment_id {
        println!("  Stored as {}", id);
    }
    for adjustment in &view.adjustments_applied {
        println!("    - {}", adjustment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnpl_credit::workflows::credit::EmploymentStatus;

    #[test]
    fn assess_arguments_normalize_like_http_bodies() {
        let args = AssessArgs {
            risk_score: Some(0.10),
            default_flag: Some("Y".to_string()),
            employment: Some("Unemployed".to_string()),
            utilization: Some("0.9".to_string()),
            json: false,
        };

        let input = raw_input(&args).normalize();

        assert_eq!(input.risk_score, Some(0.10));
        assert!(input.default_flag);
        assert_eq!(input.employment_status, EmploymentStatus::Other);
        assert_eq!(input.utilization_ratio, 0.9);
        assert_eq!(
            EntitlementEngine::standard().assess(&input).entitlement.limit,
            1275.00
        );
    }

    #[test]
    fn omitted_arguments_fall_back_conservatively() {
        let input = raw_input(&AssessArgs::default()).normalize();

        assert_eq!(input.risk_score, None);
        assert!(!input.default_flag);
        assert_eq!(input.employment_status, EmploymentStatus::Other);
        assert_eq!(input.utilization_ratio, 0.0);
    }

    #[test]
    fn demo_runs_against_seeded_profiles() {
        run_demo(DemoArgs::default()).expect("demo completes");
    }

    #[test]
    fn demo_confirms_orders_when_asked() {
        let args = DemoArgs {
            order_amount: Some(100.0),
            ..DemoArgs::default()
        };
        run_demo(args).expect("demo completes");
    }

    #[test]
    fn batch_reports_missing_files() {
        let args = BatchArgs {
            csv: PathBuf::from("/nonexistent/applicants.csv"),
            json: false,
        };
        match run_batch(args) {
            Err(AppError::Import(_)) => {}
            other => panic!("expected import error, got {other:?}"),
        }
    }
}
