use chrono::{DateTime, Utc};
use serde::Serialize;

use super::enums::{Sex, ViewPosition};

#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub id: i64,
    pub image_id: i64,
    pub diagnosis_date: DateTime<Utc>,
    pub condition: String,
    /// Always in [0, 1].
    pub confidence: f64,
}

/// Append-only link between a user and one of their diagnoses.
#[derive(Debug, Clone)]
pub struct AnalysisHistory {
    pub id: i64,
    pub user_id: i64,
    pub diagnosis_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// One row of the caller's history listing.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub history_id: i64,
    pub diagnosis_id: i64,
    pub image_id: i64,
    pub view_position: ViewPosition,
    pub condition: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Everything printed on a diagnosis PDF.
#[derive(Debug, Clone)]
pub struct DiagnosisReport {
    pub diagnosis_id: i64,
    pub owner_id: i64,
    pub condition: String,
    pub confidence: f64,
    pub diagnosis_date: DateTime<Utc>,
    pub image_id: i64,
    pub view_position: ViewPosition,
    pub upload_date: DateTime<Utc>,
    pub patient: String,
    pub patient_age: Option<u32>,
    pub patient_sex: Option<Sex>,
}
