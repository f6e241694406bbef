use chrono::{DateTime, Utc};

use super::enums::ViewPosition;

#[derive(Debug, Clone)]
pub struct MedicalImage {
    pub id: i64,
    pub user_id: i64,
    pub upload_date: DateTime<Utc>,
    pub view_position: ViewPosition,
    /// Path relative to the media root.
    pub image_file: String,
}
