use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a patient.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPatient {
    #[validate(length(min = 1, message = "patient name is required"))]
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub phone: Option<String>,
}
