//! Registration, login and sessions.

pub mod forms;
pub mod password;
pub mod session;

pub use forms::{CleanRegistration, RegistrationForm};
pub use password::{hash_password, verify_password};
pub use session::{create_session, end_session, resolve_session, SESSION_COOKIE};

use std::sync::Mutex;

use rusqlite::Connection;
use thiserror::Error;

use crate::db::{find_user_by_username, insert_user, lock_db, touch_last_login, username_taken, DatabaseError};
use crate::forms::FormErrors;
use crate::models::{NewUser, User};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    Validation(FormErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Validates the form, hashes the password and creates the user.
///
/// The connection is locked only around the lookup and the insert; hashing
/// runs with the lock released.
pub fn register_user(
    db: &Mutex<Connection>,
    form: &RegistrationForm,
    iterations: u32,
) -> Result<User, AccountError> {
    let clean = form.clean().map_err(AccountError::Validation)?;
    if username_taken(&lock_db(db), &clean.username)? {
        return Err(duplicate_username());
    }

    let new_user = NewUser {
        username: clean.username,
        email: clean.email,
        password_hash: hash_password(&clean.password, iterations),
        age: clean.age,
        sex: clean.sex,
    };
    let inserted = insert_user(&lock_db(db), &new_user);
    let user = match inserted {
        Ok(user) => user,
        // Lost a race with a concurrent registration.
        Err(e) if e.is_constraint() => return Err(duplicate_username()),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Checks credentials and records the login time. The password is verified
/// with the connection unlocked.
pub fn authenticate(db: &Mutex<Connection>, username: &str, password: &str) -> Result<User, AccountError> {
    let found = find_user_by_username(&lock_db(db), username)?;
    let user = found.filter(|u| u.is_active && verify_password(password, &u.password_hash));
    let Some(user) = user else {
        tracing::warn!(username, "Rejected login");
        return Err(AccountError::InvalidCredentials);
    };
    touch_last_login(&lock_db(db), user.id)?;
    Ok(user)
}

fn duplicate_username() -> AccountError {
    AccountError::Validation(FormErrors::single("username", "A user with that username already exists."))
}
