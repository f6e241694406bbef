use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use xray_diagnosis::accounts::resolve_session;
use xray_diagnosis::accounts::SESSION_COOKIE;
use xray_diagnosis::db::lock_db;
use xray_diagnosis::media::MediaStore;
use xray_diagnosis::models::User;
use xray_diagnosis::{Classifier, ServerConfig};

use crate::handlers::error::ApiError;
use crate::util::http::HttpRequest;

/// Process-wide state. Handlers only ever see it behind an `Arc`; the
/// classifier is read-only and the connection is locked per repository call.
pub struct AppState {
    pub config: ServerConfig,
    pub db: Mutex<Connection>,
    pub classifier: Arc<Classifier>,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(config: ServerConfig, conn: Connection, classifier: Arc<Classifier>) -> AppState {
        let media = MediaStore::new(config.media_root.clone());
        AppState { config, db: Mutex::new(conn), classifier, media }
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        lock_db(&self.db)
    }

    /// The session token and user behind the request's cookie, if any.
    pub fn session_user(&self, req: &HttpRequest) -> Result<Option<(String, User)>, ApiError> {
        let Some(token) = req.cookie(SESSION_COOKIE) else {
            return Ok(None);
        };
        let user = resolve_session(&self.conn(), token)?;
        Ok(user.map(|u| (token.to_owned(), u)))
    }

    /// Like [`AppState::session_user`], but 401 when there is no session.
    pub fn require_user(&self, req: &HttpRequest) -> Result<(String, User), ApiError> {
        self.session_user(req)?.ok_or(ApiError::Unauthorized("Authentication required".into()))
    }
}

/// Shared state type, an `Arc<AppState>` passed to every handler.
pub type SharedState = Arc<AppState>;
