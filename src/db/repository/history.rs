use chrono::Utc;
use rusqlite::{params, Connection};

use super::enum_column;
use crate::db::DatabaseError;
use crate::models::{AnalysisHistory, HistoryEntry};

pub fn insert_history(conn: &Connection, user_id: i64, diagnosis_id: i64) -> Result<AnalysisHistory, DatabaseError> {
    let timestamp = Utc::now();
    conn.execute(
        "INSERT INTO analysis_history (user_id, diagnosis_id, timestamp) VALUES (?1, ?2, ?3)",
        params![user_id, diagnosis_id, timestamp],
    )?;
    Ok(AnalysisHistory { id: conn.last_insert_rowid(), user_id, diagnosis_id, timestamp })
}

/// The user's diagnoses, newest first.
pub fn list_history_for_user(conn: &Connection, user_id: i64) -> Result<Vec<HistoryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT h.id, d.id, i.id, i.view_position, d.condition, d.confidence, h.timestamp
         FROM analysis_history h
         JOIN diagnoses d ON d.id = h.diagnosis_id
         JOIN medical_images i ON i.id = d.image_id
         WHERE h.user_id = ?1
         ORDER BY h.timestamp DESC, h.id DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(HistoryEntry {
            history_id: row.get(0)?,
            diagnosis_id: row.get(1)?,
            image_id: row.get(2)?,
            view_position: enum_column(row, 3)?,
            condition: row.get(4)?,
            confidence: row.get(5)?,
            timestamp: row.get(6)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn count_history(conn: &Connection, user_id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM analysis_history WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?)
}
