//! Server-side sessions carried by the `sessionid` cookie.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use rusqlite::Connection;

use crate::db::{delete_session, get_user, insert_session, session_user_id, DatabaseError};
use crate::models::User;

pub const SESSION_COOKIE: &str = "sessionid";
const TOKEN_BYTES: usize = 32;

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Opens a session for `user_id` and returns its token.
pub fn create_session(conn: &Connection, user_id: i64, lifetime_days: i64) -> Result<String, DatabaseError> {
    let token = new_token();
    insert_session(conn, &token, user_id, Utc::now() + Duration::days(lifetime_days))?;
    Ok(token)
}

/// The active user behind a token, if the session exists and has not expired.
pub fn resolve_session(conn: &Connection, token: &str) -> Result<Option<User>, DatabaseError> {
    let Some(user_id) = session_user_id(conn, token, Utc::now())? else {
        return Ok(None);
    };
    let user = get_user(conn, user_id)?;
    Ok(user.is_active.then_some(user))
}

pub fn end_session(conn: &Connection, token: &str) -> Result<bool, DatabaseError> {
    delete_session(conn, token)
}
