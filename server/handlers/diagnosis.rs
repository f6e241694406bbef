use xray_diagnosis::db::{get_diagnosis_report, DatabaseError};
use xray_diagnosis::report::{generate_diagnosis_pdf, report_filename};

use crate::handlers::error::ApiError;
use crate::state::SharedState;
use crate::util::http::{ApiResponse, HttpRequest};

const NOT_FOUND: &str = "Diagnosis not found";

/// GET /diagnosis/<id>/download/: the owner's PDF report, shown inline.
///
/// Another user's diagnosis is reported as missing rather than forbidden.
pub fn handle_download(req: &HttpRequest, state: &SharedState, diagnosis_id: i64) -> Result<ApiResponse, ApiError> {
    let (_, user) = state.require_user(req)?;

    let report = match get_diagnosis_report(&state.conn(), diagnosis_id) {
        Ok(report) if report.owner_id == user.id => report,
        Ok(_) | Err(DatabaseError::NotFound { .. }) => return Err(ApiError::NotFound(NOT_FOUND.into())),
        Err(e) => return Err(e.into()),
    };

    let bytes = generate_diagnosis_pdf(&report)?;
    Ok(ApiResponse::pdf(bytes, &report_filename(diagnosis_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::upload::handle_upload;
    use crate::test_support::{register, session_of, test_state, upload_request, xray_png};
    use tiny_http::Method;

    fn diagnosed(state: &SharedState, who: &str) -> (String, i64) {
        let cookie = session_of(&register(state, who));
        let body = handle_upload(&upload_request(Some(&cookie), "PA", &xray_png()), state)
            .unwrap()
            .json_body();
        (cookie, body["diagnosis_id"].as_i64().unwrap())
    }

    fn get(cookie: Option<&str>, id: i64) -> HttpRequest {
        let req = HttpRequest::new(Method::Get, &format!("/diagnosis/{id}/download/"));
        match cookie {
            Some(c) => req.with_header("Cookie", c),
            None => req,
        }
    }

    #[test]
    fn owner_gets_inline_pdf() {
        let (state, _dir) = test_state();
        let (cookie, id) = diagnosed(&state, "rita");
        let resp = handle_download(&get(Some(&cookie), id), &state, id).unwrap();
        assert_eq!(resp.content_type, "application/pdf");
        assert_eq!(
            resp.header("Content-Disposition").unwrap(),
            format!("inline; filename=\"diagnosis_{id}.pdf\"")
        );
        assert_eq!(&resp.body[0..4], b"%PDF");
    }

    #[test]
    fn other_users_and_missing_ids_are_not_found() {
        let (state, _dir) = test_state();
        let (_, id) = diagnosed(&state, "sam");
        let stranger = session_of(&register(&state, "tess"));

        assert_eq!(handle_download(&get(Some(&stranger), id), &state, id).unwrap_err().status(), 404);
        assert_eq!(handle_download(&get(Some(&stranger), 999), &state, 999).unwrap_err().status(), 404);
        assert_eq!(handle_download(&get(None, id), &state, id).unwrap_err().status(), 401);
    }
}
