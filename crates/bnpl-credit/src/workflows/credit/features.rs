use serde::{Deserialize, Serialize};

use super::domain::{ApplicantProfile, EmploymentStatus, LoanRequest, RiskAssessmentInput};
use super::normalize::parse_employment_status;

pub const FALLBACK_UTILIZATION_RATIO: f64 = 0.1;
pub const FALLBACK_PAYMENT_HISTORY: f64 = 500.0;
pub const DEFAULT_HISTORY_PENALTY: f64 = 100.0;
pub const MAX_PAYMENT_HISTORY: f64 = 1000.0;
pub const FALLBACK_LOAN_AMOUNT: f64 = 1000.0;
pub const FALLBACK_LOAN_TERM: u16 = 6;
pub const FALLBACK_LOAN_PERCENT_INCOME: f64 = 1.0;

/// Feature payload expected by the prediction service. Field names follow the model's
/// training columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub employment_status: String,
    pub person_income: f64,
    pub cb_person_default_on_file: String,
    pub cb_person_cred_hist_length: f64,
    pub original_loan_amount: f64,
    pub loan_term: f64,
    pub loan_amnt: f64,
    pub credit_utilization_ratio: f64,
    pub payment_history: f64,
    pub loan_percent_income: f64,
}

impl RiskFeatures {
    pub fn from_profile(profile: &ApplicantProfile, request: &LoanRequest) -> Self {
        let employment = profile_employment(profile);
        let person_income = finite_or_zero(profile.person_income);
        let loan_amount = request
            .amount
            .or(profile.original_loan_amount)
            .filter(|amount| amount.is_finite() && *amount > 0.0)
            .unwrap_or(FALLBACK_LOAN_AMOUNT);
        let loan_term = request
            .term_months
            .or(profile.loan_term)
            .filter(|term| *term > 0)
            .unwrap_or(FALLBACK_LOAN_TERM);

        Self {
            employment_status: employment.model_category().to_string(),
            person_income,
            cb_person_default_on_file: default_marker(profile.default_on_file).to_string(),
            cb_person_cred_hist_length: finite_or_zero(Some(profile.credit_history_length)),
            original_loan_amount: finite_or_zero(profile.original_loan_amount),
            loan_term: f64::from(loan_term),
            loan_amnt: loan_amount,
            credit_utilization_ratio: utilization_ratio_or_fallback(
                profile.credit_utilization_ratio,
            ),
            payment_history: payment_history_score(
                profile.payment_history,
                profile.default_on_file,
            ),
            loan_percent_income: loan_percent_income(loan_amount, person_income)
                .unwrap_or(FALLBACK_LOAN_PERCENT_INCOME),
        }
    }
}

/// Engine input for a profile once the model has produced (or failed to produce) a score.
pub fn assessment_input(
    profile: &ApplicantProfile,
    risk_score: Option<f64>,
) -> RiskAssessmentInput {
    RiskAssessmentInput {
        risk_score,
        default_flag: profile.default_on_file,
        employment_status: profile_employment(profile),
        employment_label: profile
            .employment_status
            .as_deref()
            .map(str::to_uppercase),
        utilization_ratio: utilization_ratio_or_fallback(profile.credit_utilization_ratio),
    }
}

/// Historical utilization when it is a usable number, otherwise the 10% house default.
pub fn utilization_ratio_or_fallback(historical: Option<f64>) -> f64 {
    historical
        .filter(|ratio| ratio.is_finite())
        .unwrap_or(FALLBACK_UTILIZATION_RATIO)
}

/// Payment history on a 0..=1000 scale, docked for a default on file.
pub fn payment_history_score(historical: Option<f64>, default_on_file: bool) -> f64 {
    let mut score = historical
        .filter(|score| score.is_finite())
        .unwrap_or(FALLBACK_PAYMENT_HISTORY);
    if default_on_file {
        score -= DEFAULT_HISTORY_PENALTY;
    }
    score.clamp(0.0, MAX_PAYMENT_HISTORY).round()
}

/// Loan-to-income ratio; undefined without positive income or with a negative loan.
pub fn loan_percent_income(loan_amount: f64, person_income: f64) -> Option<f64> {
    let valid = loan_amount.is_finite()
        && person_income.is_finite()
        && person_income > 0.0
        && loan_amount >= 0.0;
    valid.then(|| loan_amount / person_income)
}

fn profile_employment(profile: &ApplicantProfile) -> EmploymentStatus {
    profile
        .employment_status
        .as_deref()
        .map(parse_employment_status)
        .unwrap_or(EmploymentStatus::Other)
}

fn default_marker(default_on_file: bool) -> &'static str {
    if default_on_file {
        "Y"
    } else {
        "N"
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}
