//! Four-step clinical record form.
//!
//! All state changes go through [`FormController::dispatch`], one tagged
//! action per field group, so transitions can be tested without a renderer.

use chrono::NaiveDateTime;
use tracing::{debug, warn};
use validator::Validate;

use super::submission::RecordSubmitter;
use crate::error::{ClinicError, Result};
use crate::models::record::{EliminationStatus, HydrationLevel, MentalState, NutritionStatus, VitalSigns};
use crate::models::{DraftRecord, PersistedRecord};
use crate::notify::Notifier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormStep {
    /// Patient, date, vitals and mental state.
    #[default]
    PatientAndVitals = 0,
    Nutrition = 1,
    Elimination = 2,
    /// Hydration and notes.
    HydrationAndNotes = 3,
}

impl FormStep {
    pub const LAST: FormStep = FormStep::HydrationAndNotes;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<FormStep> {
        match index {
            0 => Some(FormStep::PatientAndVitals),
            1 => Some(FormStep::Nutrition),
            2 => Some(FormStep::Elimination),
            3 => Some(FormStep::HydrationAndNotes),
            _ => None,
        }
    }

    pub fn next(self) -> FormStep {
        FormStep::from_index(self.index() + 1).unwrap_or(FormStep::LAST)
    }

    pub fn prev(self) -> FormStep {
        self.index()
            .checked_sub(1)
            .and_then(FormStep::from_index)
            .unwrap_or(FormStep::PatientAndVitals)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    Identity {
        patient_id: String,
        date_time: Option<NaiveDateTime>,
    },
    Vitals(VitalSigns),
    MentalState(MentalState),
    Nutrition(NutritionStatus),
    Elimination(EliminationStatus),
    Hydration(Option<HydrationLevel>),
    Notes(String),
    Next,
    Prev,
    Reset,
}

impl FormAction {
    /// Step whose fields this action edits; `None` for navigation actions.
    pub fn owning_step(&self) -> Option<FormStep> {
        match self {
            FormAction::Identity { .. } | FormAction::Vitals(_) | FormAction::MentalState(_) => {
                Some(FormStep::PatientAndVitals)
            }
            FormAction::Nutrition(_) => Some(FormStep::Nutrition),
            FormAction::Elimination(_) => Some(FormStep::Elimination),
            FormAction::Hydration(_) | FormAction::Notes(_) => Some(FormStep::HydrationAndNotes),
            FormAction::Next | FormAction::Prev | FormAction::Reset => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub step: FormStep,
    pub draft: DraftRecord,
}

/// Pure transition function.
pub fn reduce(mut state: FormState, action: FormAction) -> FormState {
    match action {
        FormAction::Identity {
            patient_id,
            date_time,
        } => {
            state.draft.patient_id = patient_id;
            state.draft.date_time = date_time;
        }
        FormAction::Vitals(vitals) => state.draft.vitals = vitals,
        FormAction::MentalState(mental) => state.draft.mental_state = mental,
        FormAction::Nutrition(nutrition) => state.draft.nutrition = nutrition,
        FormAction::Elimination(elimination) => state.draft.elimination = elimination,
        FormAction::Hydration(hydration) => state.draft.hydration = hydration,
        FormAction::Notes(notes) => state.draft.notes = notes,
        FormAction::Next => state.step = state.step.next(),
        FormAction::Prev => state.step = state.step.prev(),
        FormAction::Reset => state = FormState::default(),
    }
    state
}

/// Holds the draft while the record dialog is open. Dropping it discards the draft.
pub struct FormController {
    state: FormState,
    notifier: Notifier,
}

impl FormController {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            state: FormState::default(),
            notifier,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn step(&self) -> FormStep {
        self.state.step
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.state.draft
    }

    pub fn dispatch(&mut self, action: FormAction) {
        debug!(?action, step = self.state.step.index(), "form action");
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    pub fn next(&mut self) {
        self.dispatch(FormAction::Next);
    }

    pub fn prev(&mut self) {
        self.dispatch(FormAction::Prev);
    }

    pub fn reset(&mut self) {
        self.dispatch(FormAction::Reset);
    }

    /// Save the draft. On success the form resets; on failure the draft stays for a retry.
    pub async fn submit(&mut self, submitter: &mut RecordSubmitter) -> Result<PersistedRecord> {
        if let Err(errors) = self.state.draft.validate() {
            let err = ClinicError::from(errors);
            self.notifier.warning(err.to_string());
            return Err(err);
        }

        match submitter.submit(&self.state.draft).await {
            Ok(record) => {
                self.notifier.info("Record saved");
                self.reset();
                Ok(record)
            }
            Err(err) => {
                warn!("record submission failed: {}", err);
                self.notifier.error(format!("Could not save the record: {}", err));
                Err(err)
            }
        }
    }
}
