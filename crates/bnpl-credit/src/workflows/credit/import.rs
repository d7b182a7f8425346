use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::domain::Entitlement;
use super::entitlement::EntitlementEngine;
use super::normalize::RawAssessmentInput;

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read applicant batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid applicant CSV data: {}", err),
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One evaluated row of an applicant batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntitlement {
    pub applicant_id: String,
    pub entitlement: Entitlement,
}

/// Reads `applicant_id,risk_score,default_flag,employment_status,utilization_ratio` rows
/// and prices each one.
pub struct ApplicantBatchImporter;

impl ApplicantBatchImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        engine: &EntitlementEngine,
    ) -> Result<Vec<BatchEntitlement>, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, engine)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        engine: &EntitlementEngine,
    ) -> Result<Vec<BatchEntitlement>, BatchImportError> {
        let rows = parse_rows(reader)?;
        Ok(rows
            .into_iter()
            .map(|(applicant_id, raw)| BatchEntitlement {
                applicant_id,
                entitlement: engine.assess(&raw.normalize()).entitlement,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApplicantRow {
    applicant_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    risk_score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    default_flag: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    employment_status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    utilization_ratio: Option<String>,
}

impl ApplicantRow {
    fn into_raw(self) -> (String, RawAssessmentInput) {
        let raw = RawAssessmentInput {
            risk_score: self
                .risk_score
                .as_deref()
                .map(score_cell)
                .unwrap_or(Value::Null),
            default_flag: text_cell(self.default_flag),
            employment_status: text_cell(self.employment_status),
            utilization_ratio: text_cell(self.utilization_ratio),
        };
        (self.applicant_id, raw)
    }
}

pub(crate) fn parse_rows<R: Read>(
    reader: R,
) -> Result<Vec<(String, RawAssessmentInput)>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<ApplicantRow>() {
        rows.push(record?.into_raw());
    }

    Ok(rows)
}

// CSV cells are always text, so a numeric score cell becomes a JSON number here.
fn score_cell(cell: &str) -> Value {
    cell.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

fn text_cell(cell: Option<String>) -> Value {
    cell.map(Value::String).unwrap_or(Value::Null)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
