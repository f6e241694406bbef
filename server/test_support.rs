//! Fixtures shared by the handler tests.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tempfile::TempDir;
use tiny_http::Method;

use xray_diagnosis::db::open_memory_database;
use xray_diagnosis::{Classifier, NetworkSpec, ServerConfig};

use crate::handlers::accounts::{handle_login, handle_register};
use crate::state::{AppState, SharedState};
use crate::util::http::{ApiResponse, HttpRequest};
use crate::util::multipart;

pub const PASSWORD: &str = "Ribcage!42";
const BOUNDARY: &str = "----xrayTestBoundary";

/// In-memory database, a small seeded classifier and a temporary media root.
/// Keep the `TempDir` alive for the duration of the test.
pub fn test_state() -> (SharedState, TempDir) {
    test_state_with_iterations(1_000)
}

pub fn test_state_with_iterations(password_iterations: u32) -> (SharedState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        media_root: dir.path().to_path_buf(),
        password_iterations,
        ..ServerConfig::default()
    };
    let network = NetworkSpec::dense_binary("tiny", &[8]).build(&mut StdRng::seed_from_u64(42));
    let classifier = Arc::new(Classifier::from_network(network).unwrap());
    let state = AppState::new(config, open_memory_database().unwrap(), classifier);
    (Arc::new(state), dir)
}

pub fn json_request(path: &str, body: Value) -> HttpRequest {
    HttpRequest::new(Method::Post, path)
        .with_header("Content-Type", "application/json")
        .with_body(body.to_string())
}

/// Registers `username` (age 40, female) and returns the handler response.
pub fn register(state: &SharedState, username: &str) -> ApiResponse {
    let req = json_request(
        "/",
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password1": PASSWORD,
            "password2": PASSWORD,
            "age": 40,
            "sex": "F",
        }),
    );
    handle_register(&req, state).unwrap()
}

pub fn login(state: &SharedState, username: &str, password: &str) -> ApiResponse {
    let req = json_request("/login/", json!({ "username": username, "password": password }));
    handle_login(&req, state).unwrap_or_else(|e| e.into_response())
}

/// `sessionid=<token>` taken from a response's Set-Cookie header.
pub fn session_of(resp: &ApiResponse) -> String {
    resp.header("Set-Cookie").unwrap().split(';').next().unwrap().to_owned()
}

/// A 96×80 grayscale PNG with some structure.
pub fn xray_png() -> Vec<u8> {
    let buf = ImageBuffer::from_fn(96, 80, |x, y| Luma([((x * 2 + y) % 256) as u8]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(buf).write_to(&mut out, ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

pub fn upload_request(cookie: Option<&str>, view_position: &str, image: &[u8]) -> HttpRequest {
    let body = multipart::encode(BOUNDARY, &[("view_position", view_position)], &[("image_file", "chest.png", image)]);
    let req = HttpRequest::new(Method::Post, "/upload/")
        .with_header("Content-Type", &format!("multipart/form-data; boundary={BOUNDARY}"))
        .with_body(body);
    match cookie {
        Some(c) => req.with_header("Cookie", c),
        None => req,
    }
}
