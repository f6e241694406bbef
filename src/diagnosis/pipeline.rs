//! Upload → stored file → preprocess → classify → record.

use std::sync::Mutex;

use rusqlite::Connection;
use thiserror::Error;

use super::form::CleanUpload;
use super::recorder::{record_diagnosis, RecordedDiagnosis};
use crate::classifier::{Classifier, ClassifierError, Prediction};
use crate::db::{insert_medical_image, lock_db, DatabaseError};
use crate::media::{MediaError, MediaStore};
use crate::models::MedicalImage;
use crate::preprocess::{grayscale_input_from_path, PreprocessError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Everything created by one successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub image: MedicalImage,
    pub prediction: Prediction,
    pub recorded: RecordedDiagnosis,
}

/// Runs the whole upload flow for `user_id`. The connection lock is taken
/// per database step and never held during inference.
///
/// Rows created before a failure are kept; an image left without a
/// diagnosis is logged. A file whose image row could not be inserted is
/// deleted again.
pub fn diagnose_upload(
    db: &Mutex<Connection>,
    media: &MediaStore,
    classifier: &Classifier,
    user_id: i64,
    upload: &CleanUpload,
) -> Result<UploadOutcome, PipelineError> {
    let relative = media.save_image(&upload.bytes, upload.extension)?;
    let inserted = insert_medical_image(&lock_db(db), user_id, upload.view_position, &relative);
    let image = match inserted {
        Ok(image) => image,
        Err(e) => {
            if let Err(cleanup) = media.remove(&relative) {
                tracing::warn!(path = %relative, error = %cleanup, "Could not remove unreferenced media file");
            }
            return Err(e.into());
        }
    };

    let prediction = match infer(media, classifier, &image) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(image_id = image.id, error = %e, "Inference failed; image kept without diagnosis");
            return Err(e);
        }
    };

    let recorded = record_diagnosis(&mut lock_db(db), &image, &prediction)?;
    Ok(UploadOutcome { image, prediction, recorded })
}

fn infer(media: &MediaStore, classifier: &Classifier, image: &MedicalImage) -> Result<Prediction, PipelineError> {
    let path = media.resolve(&image.image_file)?;
    let input = grayscale_input_from_path(&path)?;
    Ok(classifier.predict(&input)?)
}
