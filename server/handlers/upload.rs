use serde_json::json;

use xray_diagnosis::diagnosis::{diagnose_upload, UploadForm};

use crate::handlers::error::ApiError;
use crate::state::SharedState;
use crate::util::http::{ApiResponse, HttpRequest};
use crate::util::multipart::{extract_boundary, MultipartForm};

/// POST /upload/: store an X-ray, classify it and record the diagnosis.
pub fn handle_upload(req: &HttpRequest, state: &SharedState) -> Result<ApiResponse, ApiError> {
    // Authentication comes first so anonymous uploads never touch storage.
    let (_, user) = state.require_user(req)?;

    let mut parts = match req.header("Content-Type").and_then(extract_boundary) {
        Some(boundary) if req.media_type().as_deref() == Some("multipart/form-data") => {
            MultipartForm::parse(&req.body, &boundary)
        }
        _ => MultipartForm::default(),
    };
    let form = UploadForm {
        view_position: parts.text("view_position").map(str::to_owned),
        image_file: parts.take_file("image_file"),
    };
    let upload = form.clean().map_err(ApiError::Validation)?;

    let outcome = diagnose_upload(&state.db, &state.media, &state.classifier, user.id, &upload)?;

    Ok(ApiResponse::json(
        200,
        json!({
            "status": "success",
            "image_id": outcome.image.id,
            "patient_age": user.age,
            "patient_sex": user.sex.map(|s| s.as_str()),
            "diagnosis_id": outcome.recorded.diagnosis.id,
            "condition": outcome.prediction.condition,
            "confidence": outcome.prediction.confidence,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{register, session_of, test_state, upload_request, xray_png};
    use xray_diagnosis::db::{count_history, count_medical_images, get_diagnosis};

    #[test]
    fn anonymous_upload_is_rejected_without_rows() {
        let (state, _dir) = test_state();
        let user_id = register(&state, "olga").json_body()["user_id"].as_i64().unwrap();

        let req = upload_request(None, "PA", &xray_png());
        let resp = handle_upload(&req, &state).unwrap_err().into_response();
        assert_eq!(resp.status, 401);
        assert_eq!(resp.json_body()["message"], "Authentication required");
        assert_eq!(count_medical_images(&state.conn(), user_id).unwrap(), 0);
    }

    #[test]
    fn successful_upload_records_one_of_each() {
        let (state, _dir) = test_state();
        let registered = register(&state, "paul");
        let user_id = registered.json_body()["user_id"].as_i64().unwrap();
        let cookie = session_of(&registered);

        let resp = handle_upload(&upload_request(Some(&cookie), "LAT", &xray_png()), &state).unwrap();
        assert_eq!(resp.status, 200);
        let body = resp.json_body();
        assert_eq!(body["status"], "success");
        assert_eq!(body["patient_age"], 40);
        assert_eq!(body["patient_sex"], "F");

        let confidence = body["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
        let condition = body["condition"].as_str().unwrap();
        assert!(condition == "normal" || condition == "pneumonia");

        let conn = state.conn();
        assert_eq!(count_medical_images(&conn, user_id).unwrap(), 1);
        assert_eq!(count_history(&conn, user_id).unwrap(), 1);
        let diagnosis = get_diagnosis(&conn, body["diagnosis_id"].as_i64().unwrap()).unwrap();
        assert_eq!(diagnosis.image_id, body["image_id"].as_i64().unwrap());
        assert_eq!(diagnosis.condition, condition);
    }

    #[test]
    fn invalid_form_is_field_errors() {
        let (state, _dir) = test_state();
        let cookie = session_of(&register(&state, "quin"));

        let resp = handle_upload(&upload_request(Some(&cookie), "SIDE", b"plain text"), &state)
            .unwrap_err()
            .into_response();
        assert_eq!(resp.status, 400);
        let body = resp.json_body();
        assert!(body["errors"]["view_position"].is_array());
        assert!(body["errors"]["image_file"].is_array());
    }
}
