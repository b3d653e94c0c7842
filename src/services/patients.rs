use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::backend::{collections, insert_as, select_as, Backend, Direction, Filter};
use crate::error::Result;
use crate::models::{NewPatient, Patient};

pub struct PatientService {
    backend: Arc<dyn Backend>,
}

impl PatientService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// All patients ordered by name.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Patient>> {
        select_as(
            self.backend.as_ref(),
            collections::PATIENTS,
            &Filter::new().order_by("full_name", Direction::Asc),
        )
        .await
    }

    #[instrument(skip(self, patient), fields(name = %patient.full_name))]
    pub async fn create(&self, patient: &NewPatient) -> Result<Patient> {
        patient.validate()?;
        let stored: Patient = insert_as(self.backend.as_ref(), collections::PATIENTS, patient).await?;
        info!(patient_id = %stored.id, "patient registered");
        Ok(stored)
    }
}
