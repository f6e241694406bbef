use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, not_found, optional_enum_column};
use crate::db::DatabaseError;
use crate::models::{Diagnosis, DiagnosisReport};

const DIAGNOSIS_COLUMNS: &str = "id, image_id, diagnosis_date, condition, confidence";

fn read_diagnosis(row: &Row<'_>) -> rusqlite::Result<Diagnosis> {
    Ok(Diagnosis {
        id: row.get(0)?,
        image_id: row.get(1)?,
        diagnosis_date: row.get(2)?,
        condition: row.get(3)?,
        confidence: row.get(4)?,
    })
}

/// Inserts the single Diagnosis allowed for `image_id`.
///
/// Confidence outside [0, 1] and a second diagnosis for the same image are
/// both rejected.
pub fn insert_diagnosis(
    conn: &Connection,
    image_id: i64,
    condition: &str,
    confidence: f64,
) -> Result<Diagnosis, DatabaseError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "confidence {confidence} outside [0, 1]"
        )));
    }
    conn.execute(
        "INSERT INTO diagnoses (image_id, diagnosis_date, condition, confidence) VALUES (?1, ?2, ?3, ?4)",
        params![image_id, Utc::now(), condition, confidence],
    )?;
    get_diagnosis(conn, conn.last_insert_rowid())
}

pub fn get_diagnosis(conn: &Connection, id: i64) -> Result<Diagnosis, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = ?1"),
        params![id],
        read_diagnosis,
    )
    .optional()?
    .ok_or_else(|| not_found("diagnosis", id))
}

pub fn get_diagnosis_for_image(conn: &Connection, image_id: i64) -> Result<Option<Diagnosis>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE image_id = ?1"),
            params![image_id],
            read_diagnosis,
        )
        .optional()?)
}

/// Diagnosis joined with its image and owner, for the PDF report.
pub fn get_diagnosis_report(conn: &Connection, diagnosis_id: i64) -> Result<DiagnosisReport, DatabaseError> {
    conn.query_row(
        "SELECT d.id, u.id, d.condition, d.confidence, d.diagnosis_date,
                i.id, i.view_position, i.upload_date,
                u.username, u.age, u.sex
         FROM diagnoses d
         JOIN medical_images i ON i.id = d.image_id
         JOIN users u ON u.id = i.user_id
         WHERE d.id = ?1",
        params![diagnosis_id],
        |row| {
            Ok(DiagnosisReport {
                diagnosis_id: row.get(0)?,
                owner_id: row.get(1)?,
                condition: row.get(2)?,
                confidence: row.get(3)?,
                diagnosis_date: row.get(4)?,
                image_id: row.get(5)?,
                view_position: enum_column(row, 6)?,
                upload_date: row.get(7)?,
                patient: row.get(8)?,
                patient_age: row.get(9)?,
                patient_sex: optional_enum_column(row, 10)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| not_found("diagnosis", diagnosis_id))
}
