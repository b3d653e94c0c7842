use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    /// Free text, e.g. "120/80".
    pub blood_pressure: Option<String>,
    pub spo2: Option<f32>,
    pub temperature: Option<f32>,
    pub respiratory_rate: Option<f32>,
    pub heart_rate: Option<f32>,
}

impl VitalSigns {
    pub fn is_empty(&self) -> bool {
        *self == VitalSigns::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Oriented,
    PartiallyOriented,
    Disoriented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consciousness {
    Alert,
    Lethargic,
    Obtunded,
    Stuporous,
    Comatose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalState {
    Calm,
    Anxious,
    Agitated,
    Depressed,
    Apathetic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentalState {
    pub orientation: Option<Orientation>,
    pub consciousness: Option<Consciousness>,
    pub emotional_state: Option<EmotionalState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutritionType {
    Oral,
    Enteral,
    Parenteral,
    Fasting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    Full,
    Partial,
    Poor,
    Refused,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionStatus {
    pub types: BTreeSet<NutritionType>,
    pub acceptance: BTreeSet<Acceptance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrinaryTag {
    Spontaneous,
    Catheter,
    Diaper,
    Oliguria,
    Anuria,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntestinalTag {
    Normal,
    Constipated,
    Diarrhea,
    Ostomy,
    Absent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EliminationStatus {
    pub urinary: BTreeSet<UrinaryTag>,
    pub intestinal: BTreeSet<IntestinalTag>,
}

/// Daily fluid intake bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HydrationLevel {
    #[serde(rename = "under_500_ml")]
    Under500Ml,
    #[serde(rename = "500_to_1000_ml")]
    From500To1000Ml,
    #[serde(rename = "1000_to_1500_ml")]
    From1000To1500Ml,
    #[serde(rename = "over_1500_ml")]
    Over1500Ml,
}

/// In-progress clinical record held by the form controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DraftRecord {
    #[validate(length(min = 1, message = "select a patient before saving"))]
    pub patient_id: String,
    pub date_time: Option<NaiveDateTime>,
    pub vitals: VitalSigns,
    pub mental_state: MentalState,
    pub nutrition: NutritionStatus,
    pub elimination: EliminationStatus,
    pub hydration: Option<HydrationLevel>,
    pub notes: String,
}

/// Server-confirmed clinical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Resolved client-side from the loaded patient list; never sent to the backend.
    #[serde(default, skip_serializing)]
    pub patient_name: String,
    #[serde(flatten)]
    pub record: DraftRecord,
}
