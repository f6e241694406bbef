use serde_json::json;

use xray_diagnosis::db::list_history_for_user;

use crate::handlers::error::ApiError;
use crate::state::SharedState;
use crate::util::http::{ApiResponse, HttpRequest};

/// GET /simple-history/: the caller's diagnoses, newest first.
pub fn handle_simple_history(req: &HttpRequest, state: &SharedState) -> Result<ApiResponse, ApiError> {
    let (_, user) = state.require_user(req)?;
    let history = list_history_for_user(&state.conn(), user.id)?;
    Ok(ApiResponse::json(200, json!({ "status": "success", "history": history })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::upload::handle_upload;
    use crate::test_support::{register, session_of, test_state, upload_request, xray_png};
    use tiny_http::Method;

    #[test]
    fn lists_own_entries_newest_first() {
        let (state, _dir) = test_state();
        let cookie = session_of(&register(&state, "uma"));
        let other = session_of(&register(&state, "vic"));

        let mut ids = Vec::new();
        for view in ["PA", "AP"] {
            let body = handle_upload(&upload_request(Some(&cookie), view, &xray_png()), &state)
                .unwrap()
                .json_body();
            ids.push(body["diagnosis_id"].as_i64().unwrap());
        }
        handle_upload(&upload_request(Some(&other), "LAT", &xray_png()), &state).unwrap();

        let req = HttpRequest::new(Method::Get, "/simple-history/").with_header("Cookie", &cookie);
        let body = handle_simple_history(&req, &state).unwrap().json_body();
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["diagnosis_id"].as_i64(), Some(ids[1]));
        assert_eq!(history[0]["view_position"], "AP");
        assert_eq!(history[1]["diagnosis_id"].as_i64(), Some(ids[0]));
        assert!(history[0]["timestamp"].is_string());
    }

    #[test]
    fn requires_session() {
        let (state, _dir) = test_state();
        let req = HttpRequest::new(Method::Get, "/simple-history/");
        assert_eq!(handle_simple_history(&req, &state).unwrap_err().status(), 401);
    }
}
