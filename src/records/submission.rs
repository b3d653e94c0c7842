use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::backend::{collections, insert_as, select_as, Backend, Direction, Filter};
use crate::error::{ClinicError, Result};
use crate::models::{DraftRecord, Patient, PersistedRecord};

/// Record list for one page visit plus the patient list used to validate and label new records.
pub struct RecordSubmitter {
    backend: Arc<dyn Backend>,
    patients: Vec<Patient>,
    records: VecDeque<PersistedRecord>,
}

impl RecordSubmitter {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            patients: Vec::new(),
            records: VecDeque::new(),
        }
    }

    /// Fetch patients and existing records. Called once per page visit.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let patients: Vec<Patient> = select_as(
            self.backend.as_ref(),
            collections::PATIENTS,
            &Filter::new().order_by("full_name", Direction::Asc),
        )
        .await?;
        let mut records: Vec<PersistedRecord> = select_as(
            self.backend.as_ref(),
            collections::CLINICAL_RECORDS,
            &Filter::new().order_by("created_at", Direction::Desc),
        )
        .await?;

        for record in &mut records {
            record.patient_name = name_of(&patients, &record.record.patient_id)
                .unwrap_or_default()
                .to_string();
        }

        info!(patients = patients.len(), records = records.len(), "records page loaded");
        self.patients = patients;
        self.records = records.into();
        Ok(())
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Newest first.
    pub fn records(&self) -> impl Iterator<Item = &PersistedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persist a completed draft with a single insert and prepend the result.
    ///
    /// The patient is resolved against the list fetched by [`load`](Self::load),
    /// not re-checked on the server. Nothing guards against submitting the
    /// same draft twice.
    #[instrument(skip(self, draft), fields(patient_id = %draft.patient_id))]
    pub async fn submit(&mut self, draft: &DraftRecord) -> Result<PersistedRecord> {
        draft.validate()?;
        let patient_name = name_of(&self.patients, &draft.patient_id)
            .ok_or_else(|| ClinicError::UnknownPatient(draft.patient_id.clone()))?
            .to_string();

        let mut record: PersistedRecord =
            insert_as(self.backend.as_ref(), collections::CLINICAL_RECORDS, draft).await?;
        record.patient_name = patient_name;

        self.records.push_front(record.clone());
        info!(record_id = %record.id, "clinical record saved");
        Ok(record)
    }
}

fn name_of<'a>(patients: &'a [Patient], id: &str) -> Option<&'a str> {
    patients
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.full_name.as_str())
}
