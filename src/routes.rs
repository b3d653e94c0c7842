//! Application route table.

use std::fmt;

use crate::models::InventoryKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    FlowSelection,
    Dashboard,
    Staff,
    Patients,
    TimeClock,
    Records,
    MedicalExams,
    Inventory(Option<InventoryKind>),
    Settings(Option<String>),
    Admin(Option<String>),
}

/// First path segment, without slashes. `/` and `""` give `""`.
pub fn first_segment(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    let end = trimmed
        .find(|c: char| c == '/' || c == '?' || c == '#')
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

impl Route {
    /// Parse a browser path; unknown paths and unknown inventory types give `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or("");
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let head = parts.next().unwrap_or("");
        let tail = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let route = match (head, tail) {
            ("", None) => Route::Home,
            ("login", None) => Route::Login,
            ("flow-selection", None) => Route::FlowSelection,
            ("dashboard", None) => Route::Dashboard,
            ("staff", None) => Route::Staff,
            ("patients", None) => Route::Patients,
            ("time-clock", None) => Route::TimeClock,
            ("records", None) => Route::Records,
            ("medical-exams", None) => Route::MedicalExams,
            ("inventory", None) => Route::Inventory(None),
            ("inventory", Some(kind)) => Route::Inventory(Some(kind.parse().ok()?)),
            ("settings", section) => Route::Settings(section.map(str::to_string)),
            ("admin", section) => Route::Admin(section.map(str::to_string)),
            _ => return None,
        };
        Some(route)
    }

    pub fn segment(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Home => "",
            Route::FlowSelection => "flow-selection",
            Route::Dashboard => "dashboard",
            Route::Staff => "staff",
            Route::Patients => "patients",
            Route::TimeClock => "time-clock",
            Route::Records => "records",
            Route::MedicalExams => "medical-exams",
            Route::Inventory(_) => "inventory",
            Route::Settings(_) => "settings",
            Route::Admin(_) => "admin",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Inventory(Some(kind)) => format!("/inventory/{}", kind),
            Route::Settings(Some(section)) => format!("/settings/{}", section),
            Route::Admin(Some(section)) => format!("/admin/{}", section),
            other => format!("/{}", other.segment()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
