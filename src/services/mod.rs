//! Typed access to the clinic collections.

pub mod dashboard;
pub mod exams;
pub mod inventory;
pub mod patients;
pub mod staff;
pub mod time_clock;

pub use dashboard::DashboardService;
pub use exams::ExamService;
pub use inventory::InventoryService;
pub use patients::PatientService;
pub use staff::StaffService;
pub use time_clock::TimeClockService;
