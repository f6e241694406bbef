use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, not_found};
use crate::db::DatabaseError;
use crate::models::{MedicalImage, ViewPosition};

fn read_image(row: &Row<'_>) -> rusqlite::Result<MedicalImage> {
    Ok(MedicalImage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        upload_date: row.get(2)?,
        view_position: enum_column(row, 3)?,
        image_file: row.get(4)?,
    })
}

pub fn insert_medical_image(
    conn: &Connection,
    user_id: i64,
    view_position: ViewPosition,
    image_file: &str,
) -> Result<MedicalImage, DatabaseError> {
    conn.execute(
        "INSERT INTO medical_images (user_id, upload_date, view_position, image_file)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, Utc::now(), view_position.as_str(), image_file],
    )?;
    get_medical_image(conn, conn.last_insert_rowid())
}

pub fn get_medical_image(conn: &Connection, id: i64) -> Result<MedicalImage, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, upload_date, view_position, image_file FROM medical_images WHERE id = ?1",
        params![id],
        read_image,
    )
    .optional()?
    .ok_or_else(|| not_found("medical_image", id))
}

pub fn count_medical_images(conn: &Connection, user_id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM medical_images WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;
    use crate::models::NewUser;

    #[test]
    fn insert_and_count_per_user() {
        let conn = open_memory_database().unwrap();
        let uid = insert_user(&conn, &NewUser {
            username: "carol".into(),
            email: "c@example.com".into(),
            password_hash: "x".into(),
            age: None,
            sex: None,
        })
        .unwrap()
        .id;

        let img = insert_medical_image(&conn, uid, ViewPosition::Lateral, "medical_images/a.png").unwrap();
        assert_eq!(img.view_position, ViewPosition::Lateral);
        assert_eq!(get_medical_image(&conn, img.id).unwrap().image_file, "medical_images/a.png");
        assert_eq!(count_medical_images(&conn, uid).unwrap(), 1);
        assert_eq!(count_medical_images(&conn, uid + 1).unwrap(), 0);
    }

    #[test]
    fn unknown_owner_violates_foreign_key() {
        let conn = open_memory_database().unwrap();
        let err = insert_medical_image(&conn, 42, ViewPosition::Other, "x.png").unwrap_err();
        assert!(err.is_constraint());
    }
}
