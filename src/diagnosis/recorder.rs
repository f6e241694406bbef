//! Persists one inference result: a Diagnosis and its history row.

use rusqlite::Connection;

use crate::classifier::Prediction;
use crate::db::{get_diagnosis_for_image, insert_diagnosis, insert_history, DatabaseError};
use crate::models::{AnalysisHistory, Diagnosis, MedicalImage};

#[derive(Debug, Clone)]
pub struct RecordedDiagnosis {
    pub diagnosis: Diagnosis,
    pub history: AnalysisHistory,
}

/// Writes both rows in one transaction; an image that already has a
/// diagnosis is rejected as a constraint violation.
pub fn record_diagnosis(
    conn: &mut Connection,
    image: &MedicalImage,
    prediction: &Prediction,
) -> Result<RecordedDiagnosis, DatabaseError> {
    let tx = conn.transaction()?;
    if let Some(existing) = get_diagnosis_for_image(&tx, image.id)? {
        return Err(DatabaseError::ConstraintViolation(format!(
            "image {} already has diagnosis {}",
            image.id, existing.id
        )));
    }
    let diagnosis = insert_diagnosis(&tx, image.id, prediction.condition.as_str(), prediction.confidence)?;
    let history = insert_history(&tx, image.user_id, diagnosis.id)?;
    tx.commit()?;

    tracing::info!(
        image_id = image.id,
        diagnosis_id = diagnosis.id,
        condition = %prediction.condition,
        confidence = prediction.confidence,
        "Diagnosis recorded"
    );
    Ok(RecordedDiagnosis { diagnosis, history })
}
