//! Clinic Desk
//!
//! Headless entry point: loads configuration, signs in with the credentials
//! from the environment when present, and reports which routes are open.

use anyhow::{Context, Result};
use clinic_desk::backend::Credentials;
use clinic_desk::routes::Route;
use clinic_desk::{config, telemetry, ClinicApp};
use tracing::{info, warn};

const ROUTES: &[&str] = &[
    "/",
    "/flow-selection",
    "/dashboard",
    "/staff",
    "/patients",
    "/time-clock",
    "/records",
    "/medical-exams",
    "/inventory",
    "/settings",
    "/admin",
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = config::load_config().context("failed to load configuration")?;
    telemetry::init_tracing(&config.logging);

    let app = ClinicApp::from_config(&config)
        .await
        .context("failed to start client")?;

    match (std::env::var("CLINIC_EMAIL"), std::env::var("CLINIC_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            let session = app
                .sessions()
                .sign_in(&Credentials { email, password })
                .await
                .context("sign-in failed")?;
            info!(user = %session.email, role = session.role.as_str(), "session ready");
        }
        _ => warn!("CLINIC_EMAIL/CLINIC_PASSWORD not set, checking routes signed out"),
    }

    for path in ROUTES {
        let verdict = app.navigate(path).await;
        let route = Route::parse(path).map(|r| r.to_string()).unwrap_or_default();
        println!("{:<16} {:?} ({})", route, verdict.decision, verdict.rule);
    }
    Ok(())
}
