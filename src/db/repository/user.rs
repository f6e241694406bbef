use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{not_found, optional_enum_column};
use crate::db::DatabaseError;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, age, sex, is_active, date_joined, last_login";

fn read_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        age: row.get(6)?,
        sex: optional_enum_column(row, 7)?,
        is_active: row.get(8)?,
        date_joined: row.get(9)?,
        last_login: row.get(10)?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<User, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, age, sex, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.username,
            user.email,
            user.password_hash,
            user.age,
            user.sex.map(|s| s.as_str()),
            Utc::now(),
        ],
    )?;
    get_user(conn, conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User, DatabaseError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        read_user,
    )
    .optional()?
    .ok_or_else(|| not_found("user", id))
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            read_user,
        )
        .optional()?)
}

/// Case-insensitive, so "Alice" and "alice" cannot both register.
pub fn username_taken(conn: &Connection, username: &str) -> Result<bool, DatabaseError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1 COLLATE NOCASE",
        params![username],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

pub fn touch_last_login(conn: &Connection, user_id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![Utc::now(), user_id],
    )?;
    Ok(())
}
