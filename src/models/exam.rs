use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata row for an uploaded exam file. The bytes live in the `exams` bucket under `storage_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalExam {
    pub id: String,
    pub patient_id: String,
    pub file_name: String,
    pub content_type: String,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}
