use std::io::{Cursor, Read};
use std::time::Instant;

use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::handlers::error::ApiError;
use crate::state::SharedState;
use crate::util::http::{ApiResponse, HttpRequest};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Reads the request, routes it and writes the response.
pub fn dispatch(mut request: Request, state: SharedState) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_owned();

    let response = match read_request(&mut request, state.config.max_upload_bytes) {
        Ok(req) => route(&req, &state),
        Err(e) => e.into_response(),
    };

    tracing::info!(
        method = %method,
        url = %url,
        status = response.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    if let Err(e) = request.respond(to_tiny(response)) {
        tracing::warn!(error = %e, "Could not write response");
    }
}

/// Buffers the body, refusing anything over `limit` bytes.
fn read_request(request: &mut Request, limit: usize) -> Result<HttpRequest, ApiError> {
    let declared = request.body_length();
    let body = read_body(request.as_reader(), declared, limit)?;

    let mut req = HttpRequest::new(request.method().clone(), request.url()).with_body(body);
    for h in request.headers() {
        req = req.with_header(&h.field.to_string(), h.value.as_str());
    }
    Ok(req)
}

/// Reads at most `limit` bytes. A declared length over the limit is refused
/// before anything is read; chunked bodies are cut off one byte past it.
fn read_body(reader: impl Read, declared: Option<usize>, limit: usize) -> Result<Vec<u8>, ApiError> {
    if declared.is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    let mut body = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::BadRequest(format!("Could not read request body: {e}")))?;
    if body.len() > limit {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    Ok(body)
}

fn to_tiny(response: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let len = response.body.len();
    let mut headers: Vec<Header> = Vec::with_capacity(response.headers.len() + 1);
    headers.extend(Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()));
    for (name, value) in &response.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => headers.push(h),
            Err(()) => tracing::warn!(%name, "Dropping unencodable response header"),
        }
    }
    Response::new(StatusCode(response.status), headers, Cursor::new(response.body), Some(len), None)
}

// ---------------------------------------------------------------------------
// Request router
// ---------------------------------------------------------------------------

/// Maps a request onto its handler. Trailing slashes are optional.
pub fn route(req: &HttpRequest, state: &SharedState) -> ApiResponse {
    let path = req.path.trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').skip(1).collect();

    let result = match segments.as_slice() {
        // ── Accounts ─────────────────────────────────────────────────────
        [] => only(req, Method::Post).and_then(|_| handlers::accounts::handle_register(req, state)),
        ["login"] => only(req, Method::Post).and_then(|_| handlers::accounts::handle_login(req, state)),
        ["logout"] => only(req, Method::Post).and_then(|_| handlers::accounts::handle_logout(req, state)),

        // ── Diagnosis ────────────────────────────────────────────────────
        ["upload"] => only(req, Method::Post).and_then(|_| handlers::upload::handle_upload(req, state)),
        ["diagnosis", id, "download"] => match id.parse::<i64>() {
            Ok(id) => only(req, Method::Get).and_then(|_| handlers::diagnosis::handle_download(req, state, id)),
            Err(_) => Err(not_found()),
        },
        ["simple-history"] => {
            only(req, Method::Get).and_then(|_| handlers::history::handle_simple_history(req, state))
        }

        // ── 404 ──────────────────────────────────────────────────────────
        _ => Err(not_found()),
    };

    result.unwrap_or_else(ApiError::into_response)
}

fn only(req: &HttpRequest, method: Method) -> Result<(), ApiError> {
    if req.method == method {
        return Ok(());
    }
    let allow = if method == Method::Get { "GET" } else { "POST" };
    Err(ApiError::MethodNotAllowed { allow })
}

fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{register, session_of, test_state};

    #[test]
    fn trailing_slash_is_optional() {
        let (state, _dir) = test_state();
        let cookie = session_of(&register(&state, "walt"));
        for path in ["/simple-history/", "/simple-history"] {
            let req = HttpRequest::new(Method::Get, path).with_header("Cookie", &cookie);
            assert_eq!(route(&req, &state).status, 200, "{path}");
        }
    }

    #[test]
    fn wrong_method_is_405() {
        let (state, _dir) = test_state();
        let resp = route(&HttpRequest::new(Method::Get, "/login/"), &state);
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("Allow"), Some("POST"));
        assert_eq!(route(&HttpRequest::new(Method::Post, "/simple-history/"), &state).status, 405);
    }

    #[test]
    fn unknown_paths_are_404() {
        let (state, _dir) = test_state();
        for path in ["/nope/", "/diagnosis/abc/download/", "/diagnosis/1/"] {
            assert_eq!(route(&HttpRequest::new(Method::Get, path), &state).status, 404, "{path}");
        }
    }

    #[test]
    fn download_route_parses_id() {
        let (state, _dir) = test_state();
        let resp = route(&HttpRequest::new(Method::Get, "/diagnosis/5/download/"), &state);
        assert_eq!(resp.status, 401);
    }

    #[test]
    fn oversized_body_is_413() {
        let body = vec![7u8; 11];
        let err = read_body(Cursor::new(&body), None, 10).unwrap_err();
        assert_eq!(err.status(), 413);

        let declared = read_body(Cursor::new(&body[..4]), Some(11), 10).unwrap_err();
        assert_eq!(declared.status(), 413);

        assert_eq!(read_body(Cursor::new(&body[..10]), Some(10), 10).unwrap().len(), 10);
    }
}
