use chrono::{DateTime, Utc};
use serde::Serialize;

use super::enums::Sex;

/// An account. The password hash never leaves the persistence layer in a
/// serialized form.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields needed to create a User row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
}

/// Public view of a User returned on login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub age: Option<u32>,
    /// Display label ("Male"/"Female"), or null when unset.
    pub sex: Option<&'static str>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            age: self.age,
            sex: self.sex.map(|s| s.label()),
        }
    }
}
