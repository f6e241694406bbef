//! Upload validation and the inference-to-persistence flow.

pub mod form;
pub mod pipeline;
pub mod recorder;

pub use form::{CleanUpload, UploadForm, UploadedFile};
pub use pipeline::{diagnose_upload, PipelineError, UploadOutcome};
pub use recorder::{record_diagnosis, RecordedDiagnosis};
