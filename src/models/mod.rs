//! Domain models shared by the session, record and clinic services.

pub mod exam;
pub mod finance;
pub mod inventory;
pub mod patient;
pub mod record;
pub mod session;
pub mod staff;
pub mod time_clock;

pub use exam::MedicalExam;
pub use finance::{DashboardSummary, EntryKind, FinancialEntry};
pub use inventory::{InventoryItem, InventoryKind};
pub use patient::{NewPatient, Patient};
pub use record::{DraftRecord, PersistedRecord};
pub use session::{Role, Session, UserProfile};
pub use staff::StaffMember;
pub use time_clock::TimeClockEntry;
