use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![token, user_id, Utc::now(), expires_at],
    )?;
    Ok(())
}

/// Resolves a session token to its user. Expired sessions are deleted and
/// treated as absent.
pub fn session_user_id(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<i64>, DatabaseError> {
    let row: Option<(i64, DateTime<Utc>)> = conn
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((user_id, expires_at)) if expires_at > now => Ok(Some(user_id)),
        Some(_) => {
            delete_session(conn, token)?;
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Returns true if a session was removed.
pub fn delete_session(conn: &Connection, token: &str) -> Result<bool, DatabaseError> {
    let n = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(n > 0)
}

pub fn purge_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;
    use crate::models::NewUser;
    use chrono::Duration;

    fn user(conn: &Connection) -> i64 {
        insert_user(conn, &NewUser {
            username: "bob".into(),
            email: "bob@example.com".into(),
            password_hash: "x".into(),
            age: None,
            sex: None,
        })
        .unwrap()
        .id
    }

    #[test]
    fn live_session_resolves() {
        let conn = open_memory_database().unwrap();
        let uid = user(&conn);
        insert_session(&conn, "tok", uid, Utc::now() + Duration::days(1)).unwrap();
        assert_eq!(session_user_id(&conn, "tok", Utc::now()).unwrap(), Some(uid));
        assert_eq!(session_user_id(&conn, "other", Utc::now()).unwrap(), None);
    }

    #[test]
    fn expired_session_is_dropped() {
        let conn = open_memory_database().unwrap();
        let uid = user(&conn);
        insert_session(&conn, "old", uid, Utc::now() - Duration::minutes(1)).unwrap();
        assert_eq!(session_user_id(&conn, "old", Utc::now()).unwrap(), None);
        assert!(!delete_session(&conn, "old").unwrap());
    }

    #[test]
    fn purge_removes_only_expired() {
        let conn = open_memory_database().unwrap();
        let uid = user(&conn);
        insert_session(&conn, "old", uid, Utc::now() - Duration::hours(1)).unwrap();
        insert_session(&conn, "new", uid, Utc::now() + Duration::hours(1)).unwrap();
        assert_eq!(purge_expired_sessions(&conn, Utc::now()).unwrap(), 1);
        assert!(delete_session(&conn, "new").unwrap());
    }
}
