use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::features::RiskFeatures;

/// Gateway to the external risk prediction service.
///
/// Implementations are synchronous; async callers should run them on a blocking thread.
pub trait RiskModel: Send + Sync {
    fn predict(&self, features: &RiskFeatures) -> Result<f64, RiskModelError>;
}

/// Failure to obtain a usable score from the prediction service.
#[derive(Debug, thiserror::Error)]
pub enum RiskModelError {
    #[error("prediction service is not configured")]
    NotConfigured,
    #[error("prediction service transport error: {0}")]
    Transport(String),
    #[error("prediction service HTTP error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("prediction failed: {0}")]
    Rejected(String),
    #[error("invalid risk score from prediction service")]
    InvalidScore,
}

/// Blocking HTTP client posting `{"features": ...}` and reading `risk_score` back.
pub struct HttpRiskModel {
    endpoint: String,
    timeout: Duration,
    client: OnceLock<reqwest::blocking::Client>,
}

impl HttpRiskModel {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            client: OnceLock::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    // Built on first use so the client's internal runtime never starts on an async worker.
    fn client(&self) -> Result<&reqwest::blocking::Client, RiskModelError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| RiskModelError::Transport(err.to_string()))?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl std::fmt::Debug for HttpRiskModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRiskModel")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RiskModel for HttpRiskModel {
    fn predict(&self, features: &RiskFeatures) -> Result<f64, RiskModelError> {
        let response = self
            .client()?
            .post(&self.endpoint)
            .json(&json!({ "features": features }))
            .send()
            .map_err(|err| RiskModelError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| RiskModelError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(RiskModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_prediction(&body)
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    risk_score: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub(crate) fn parse_prediction(body: &str) -> Result<f64, RiskModelError> {
    let response: PredictionResponse =
        serde_json::from_str(body).map_err(|_| RiskModelError::InvalidScore)?;

    if let Some(error) = response.error {
        return Err(RiskModelError::Rejected(error));
    }

    response
        .risk_score
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .ok_or(RiskModelError::InvalidScore)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_scores() {
        let score = parse_prediction(r#"{"risk_score": 0.2731}"#).expect("score parses");
        assert_eq!(score, 0.2731);
    }

    #[test]
    fn surfaces_service_side_errors() {
        let err = parse_prediction(r#"{"error": "Prediction processing failed"}"#)
            .expect_err("service error");
        assert!(matches!(err, RiskModelError::Rejected(message) if message.contains("processing")));
    }

    #[test]
    fn rejects_missing_or_non_numeric_scores() {
        assert!(matches!(
            parse_prediction(r#"{"risk_score": null}"#),
            Err(RiskModelError::InvalidScore)
        ));
        assert!(matches!(
            parse_prediction(r#"{"risk_score": "0.4"}"#),
            Err(RiskModelError::InvalidScore)
        ));
        assert!(matches!(
            parse_prediction("<html>bad gateway</html>"),
            Err(RiskModelError::InvalidScore)
        ));
    }
}
