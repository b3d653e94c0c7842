use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::session::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub email: Option<String>,
    pub hired_on: Option<NaiveDate>,
    pub active: bool,
}
