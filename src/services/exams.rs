use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::backend::{buckets, collections, insert_as, select_as, Backend, Direction, Filter};
use crate::error::{ClinicError, Result};
use crate::models::MedicalExam;

pub struct ExamService {
    backend: Arc<dyn Backend>,
}

fn sanitize(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Ids become the first storage key segment and must stay inside it.
fn check_key_segment(field: &str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ClinicError::Validation(format!("{}: required", field)));
    }
    if id.starts_with('.') || sanitize(id) != id {
        return Err(ClinicError::Validation(format!("{}: invalid characters in {:?}", field, id)));
    }
    Ok(())
}

impl ExamService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Store the file under `<patient_id>/<uuid>-<file_name>` and record its metadata.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        patient_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<MedicalExam> {
        if patient_id.is_empty() {
            return Err(ClinicError::Validation("patient_id: select a patient".to_string()));
        }
        check_key_segment("patient_id", patient_id)?;
        if bytes.is_empty() {
            return Err(ClinicError::Validation("file: empty upload".to_string()));
        }

        let key = format!("{}/{}-{}", patient_id, Uuid::new_v4(), sanitize(file_name));
        self.backend
            .upload(buckets::EXAMS, &key, bytes, content_type)
            .await?;

        let exam: MedicalExam = insert_as(
            self.backend.as_ref(),
            collections::MEDICAL_EXAMS,
            &json!({
                "patient_id": patient_id,
                "file_name": file_name,
                "content_type": content_type,
                "storage_key": key,
                "uploaded_at": Utc::now(),
            }),
        )
        .await?;
        info!(exam_id = %exam.id, key = %exam.storage_key, "exam uploaded");
        Ok(exam)
    }

    #[instrument(skip(self))]
    pub async fn list_for(&self, patient_id: &str) -> Result<Vec<MedicalExam>> {
        select_as(
            self.backend.as_ref(),
            collections::MEDICAL_EXAMS,
            &Filter::new()
                .where_eq("patient_id", patient_id)
                .order_by("uploaded_at", Direction::Desc),
        )
        .await
    }

    pub async fn download(&self, exam: &MedicalExam) -> Result<Vec<u8>> {
        Ok(self
            .backend
            .download(buckets::EXAMS, &exam.storage_key)
            .await?)
    }

    /// Replace a user's avatar image; returns the storage key.
    #[instrument(skip(self, bytes))]
    pub async fn upload_avatar(&self, user_id: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        check_key_segment("user_id", user_id)?;
        let key = format!("{}/avatar", user_id);
        self.backend
            .upload(buckets::AVATARS, &key, bytes, content_type)
            .await?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{check_key_segment, sanitize};

    #[test]
    fn sanitize_keeps_safe_characters_only() {
        assert_eq!(sanitize("raio x (tórax).pdf"), "raio_x__t_rax_.pdf");
        assert_eq!(sanitize("lab-2024_03.png"), "lab-2024_03.png");
    }

    #[test]
    fn key_segments_reject_path_characters() {
        assert!(check_key_segment("patient_id", "p1").is_ok());
        assert!(check_key_segment("patient_id", "3f2a-91c0_x").is_ok());
        for id in ["", "..", "../p2", "p1/../p2", "a/b", ".hidden"] {
            assert!(check_key_segment("patient_id", id).is_err(), "{:?}", id);
        }
    }
}
