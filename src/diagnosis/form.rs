//! Upload form: a view position and one image file.

use std::str::FromStr;

use crate::forms::{non_blank, FormErrors, REQUIRED};
use crate::models::ViewPosition;
use crate::preprocess::detect_extension;

pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";

/// A file part from a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub view_position: Option<String>,
    pub image_file: Option<UploadedFile>,
}

/// A validated upload; `extension` comes from sniffing the bytes, never
/// from the client's filename.
#[derive(Debug, Clone)]
pub struct CleanUpload {
    pub view_position: ViewPosition,
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

impl UploadForm {
    pub fn clean(self) -> Result<CleanUpload, FormErrors> {
        let mut errors = FormErrors::new();

        let view_position = match non_blank(self.view_position.as_deref()) {
            None => {
                errors.add("view_position", REQUIRED);
                None
            }
            Some(raw) => match ViewPosition::from_str(raw) {
                Ok(v) => Some(v),
                Err(_) => {
                    errors.add(
                        "view_position",
                        format!("Select a valid choice. {raw} is not one of the available choices."),
                    );
                    None
                }
            },
        };

        let file = match self.image_file {
            None => {
                errors.add("image_file", REQUIRED);
                None
            }
            Some(f) if f.bytes.is_empty() => {
                errors.add("image_file", EMPTY_FILE);
                None
            }
            Some(f) => match detect_extension(&f.bytes) {
                Some(ext) => Some((f.bytes, ext)),
                None => {
                    errors.add("image_file", INVALID_IMAGE);
                    None
                }
            },
        };

        match (view_position, file) {
            (Some(view_position), Some((bytes, extension))) if errors.is_empty() => {
                Ok(CleanUpload { view_position, bytes, extension })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::test_images::gradient_png;

    fn file(bytes: Vec<u8>) -> Option<UploadedFile> {
        Some(UploadedFile { filename: "scan.png".into(), bytes })
    }

    #[test]
    fn accepts_png_with_known_view() {
        let clean = UploadForm { view_position: Some("AP".into()), image_file: file(gradient_png(8, 8)) }
            .clean()
            .unwrap();
        assert_eq!(clean.view_position, ViewPosition::Anteroposterior);
        assert_eq!(clean.extension, "png");
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = UploadForm::default().clean().unwrap_err();
        assert_eq!(errors.get("view_position").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("image_file").unwrap(), [REQUIRED]);
    }

    #[test]
    fn rejects_non_image_and_unknown_view() {
        let errors = UploadForm {
            view_position: Some("TOP".into()),
            image_file: file(b"definitely not pixels".to_vec()),
        }
        .clean()
        .unwrap_err();
        assert_eq!(errors.get("image_file").unwrap(), [INVALID_IMAGE]);
        assert!(errors.get("view_position").unwrap()[0].contains("TOP"));
    }

    #[test]
    fn rejects_empty_file() {
        let errors = UploadForm { view_position: Some("PA".into()), image_file: file(Vec::new()) }
            .clean()
            .unwrap_err();
        assert_eq!(errors.get("image_file").unwrap(), [EMPTY_FILE]);
    }
}
