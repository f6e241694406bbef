use serde_json::{json, Map, Value};

use xray_diagnosis::accounts::{authenticate, create_session, end_session, register_user, RegistrationForm, SESSION_COOKIE};

use crate::handlers::error::ApiError;
use crate::state::SharedState;
use crate::util::form::{form_get, parse_form};
use crate::util::http::{expired_cookie, session_cookie, ApiResponse, HttpRequest};
use crate::util::multipart::{extract_boundary, MultipartForm};

const INVALID_JSON: &str = "Invalid JSON data";

/// POST /: create an account and log it in.
pub fn handle_register(req: &HttpRequest, state: &SharedState) -> Result<ApiResponse, ApiError> {
    let form = registration_form(req)?;
    let user = register_user(&state.db, &form, state.config.password_iterations)?;
    let token = create_session(&state.conn(), user.id, state.config.session_days)?;

    Ok(ApiResponse::json(
        201,
        json!({
            "status": "success",
            "user_id": user.id,
            "username": user.username,
            "email": user.email,
        }),
    )
    .with_header("Set-Cookie", login_cookie(&token, state)))
}

/// POST /login/: JSON `{username, password}`.
pub fn handle_login(req: &HttpRequest, state: &SharedState) -> Result<ApiResponse, ApiError> {
    let body = json_object(&req.body)?;
    let field = |k: &str| body.get(k).and_then(Value::as_str).filter(|s| !s.is_empty());
    let (Some(username), Some(password)) = (field("username"), field("password")) else {
        return Err(ApiError::BadRequest("Username and password are required".into()));
    };

    let user = authenticate(&state.db, username, password)?;
    let token = create_session(&state.conn(), user.id, state.config.session_days)?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(ApiResponse::json(200, json!({ "status": "success", "user": user.profile() }))
        .with_header("Set-Cookie", login_cookie(&token, state)))
}

/// POST /logout/: ends the caller's session.
pub fn handle_logout(req: &HttpRequest, state: &SharedState) -> Result<ApiResponse, ApiError> {
    let (token, user) = state.require_user(req)?;
    end_session(&state.conn(), &token)?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(ApiResponse::json(200, json!({ "status": "success", "message": "Logged out successfully" }))
        .with_header("Set-Cookie", expired_cookie(SESSION_COOKIE)))
}

fn login_cookie(token: &str, state: &SharedState) -> String {
    session_cookie(SESSION_COOKIE, token, state.config.session_days * 24 * 60 * 60)
}

fn json_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::BadRequest(INVALID_JSON.into())),
    }
}

/// JSON scalars are accepted as their textual form so `"age": 42` works.
fn json_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads the registration fields from a JSON, urlencoded or multipart body.
fn registration_form(req: &HttpRequest) -> Result<RegistrationForm, ApiError> {
    let media_type = req.media_type();
    let form = match media_type.as_deref() {
        Some("application/json") => {
            let map = json_object(&req.body)?;
            RegistrationForm::from_lookup(|k| json_field(&map, k))
        }
        Some("multipart/form-data") => {
            let boundary = req
                .header("Content-Type")
                .and_then(extract_boundary)
                .ok_or_else(|| ApiError::BadRequest("Missing multipart boundary".into()))?;
            let parts = MultipartForm::parse(&req.body, &boundary);
            RegistrationForm::from_lookup(|k| parts.text(k).map(str::to_owned))
        }
        Some("application/x-www-form-urlencoded") => {
            let pairs = parse_form(&String::from_utf8_lossy(&req.body));
            RegistrationForm::from_lookup(|k| form_get(&pairs, k).map(str::to_owned))
        }
        _ => RegistrationForm::default(),
    };
    Ok(form)
}
