use std::sync::Arc;
use std::time::Duration;

use clinic_desk::backend::{collections, Backend, Credentials, MemoryBackend};
use clinic_desk::guard::{
    AuthTimeoutPolicy, GuardDecision, RouteGuard, CONNECTION_ERROR_MESSAGE, DEFAULT_SESSION_TIMEOUT,
    RULE_TIMEOUT_FAIL_CLOSED,
};
use clinic_desk::local_state::LocalState;
use clinic_desk::models::{Role, UserProfile};
use clinic_desk::notify::{Level, Notifier};
use clinic_desk::SessionStore;

fn profile(id: &str, super_admin: bool, routes: &[&str]) -> UserProfile {
    UserProfile {
        user_id: id.to_string(),
        role: Role::Nurse,
        is_super_admin: super_admin,
        permitted_routes: routes.iter().map(|r| r.to_string()).collect(),
    }
}

fn backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new()
            .with_user("root@clinic.test", "pw", profile("u-root", true, &[]))
            .with_user("all@clinic.test", "pw", profile("u-all", false, &["*"]))
            .with_user("desk@clinic.test", "pw", profile("u-desk", false, &["patients"])),
    )
}

async fn signed_in(
    backend: &Arc<MemoryBackend>,
    email: &str,
    policy: AuthTimeoutPolicy,
) -> (RouteGuard, Notifier) {
    let sessions = Arc::new(SessionStore::new(backend.clone(), Arc::new(LocalState::ephemeral())));
    sessions
        .sign_in(&Credentials {
            email: email.to_string(),
            password: "pw".to_string(),
        })
        .await
        .expect("sign in");
    let notifier = Notifier::new();
    let guard = RouteGuard::new(sessions, notifier.clone(), DEFAULT_SESSION_TIMEOUT, policy);
    (guard, notifier)
}

const ALL_PATHS: &[&str] = &[
    "/",
    "/flow-selection",
    "/dashboard",
    "/staff",
    "/patients",
    "/time-clock",
    "/records",
    "/medical-exams",
    "/inventory",
    "/inventory/medication",
    "/settings",
    "/settings/users",
    "/admin",
    "/admin/roles",
];

#[tokio::test]
async fn signed_out_user_is_sent_to_login() {
    let backend = backend();
    let sessions = Arc::new(SessionStore::new(backend, Arc::new(LocalState::ephemeral())));
    let guard = RouteGuard::new(
        sessions,
        Notifier::new(),
        DEFAULT_SESSION_TIMEOUT,
        AuthTimeoutPolicy::FailClosed,
    );

    assert_eq!(guard.check("/patients").await.decision, GuardDecision::RedirectToLogin);
    assert_eq!(guard.check("/login").await.decision, GuardDecision::Allow);
}

#[tokio::test]
async fn super_admin_reaches_every_path() {
    let backend = backend();
    let (guard, _) = signed_in(&backend, "root@clinic.test", AuthTimeoutPolicy::FailClosed).await;
    for path in ALL_PATHS {
        let verdict = guard.check(path).await;
        assert_eq!(verdict.decision, GuardDecision::Allow, "{}", path);
    }
}

#[tokio::test]
async fn wildcard_reaches_everything_but_admin() {
    let backend = backend();
    let (guard, _) = signed_in(&backend, "all@clinic.test", AuthTimeoutPolicy::FailClosed).await;
    for path in ALL_PATHS {
        let verdict = guard.check(path).await;
        if path.starts_with("/admin") {
            assert_eq!(verdict.decision, GuardDecision::RedirectToDefault, "{}", path);
        } else {
            assert_eq!(verdict.decision, GuardDecision::Allow, "{}", path);
        }
    }
}

#[tokio::test]
async fn single_permission_allows_patients_only() {
    let backend = backend();
    let (guard, _) = signed_in(&backend, "desk@clinic.test", AuthTimeoutPolicy::FailClosed).await;
    assert!(guard.check("/patients").await.is_allowed());
    let staff = guard.check("/staff").await;
    assert_eq!(staff.decision, GuardDecision::RedirectToDefault);
    assert_eq!(staff.rule, "fallback.deny");
}

#[tokio::test(start_paused = true)]
async fn slow_session_fetch_fails_closed_with_notification() {
    let backend = backend();
    let (guard, notifier) = signed_in(&backend, "desk@clinic.test", AuthTimeoutPolicy::FailClosed).await;
    let mut notifications = notifier.subscribe();
    backend.set_session_delay(Duration::from_millis(6000));

    let verdict = guard.check("/patients").await;
    assert_eq!(verdict.decision, GuardDecision::RedirectToLogin);
    assert_eq!(verdict.rule, RULE_TIMEOUT_FAIL_CLOSED);

    let note = notifications.try_recv().expect("connection error notification");
    assert_eq!(note.level, Level::Error);
    assert_eq!(note.message, CONNECTION_ERROR_MESSAGE);
}

#[tokio::test(start_paused = true)]
async fn slow_session_fetch_fails_open_on_cached_permissions() {
    let backend = backend();
    let (guard, notifier) = signed_in(&backend, "desk@clinic.test", AuthTimeoutPolicy::FailOpen).await;
    let mut notifications = notifier.subscribe();
    backend.set_session_delay(Duration::from_millis(6000));

    let verdict = guard.check("/patients").await;
    assert_eq!(verdict.decision, GuardDecision::Allow);
    assert_eq!(verdict.rule, "permission.segment");

    let verdict = guard.check("/staff").await;
    assert_eq!(verdict.decision, GuardDecision::RedirectToDefault);
    assert_eq!(verdict.rule, "fallback.deny");
    assert!(notifications.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn fail_open_keeps_admin_reserved_for_super_admins() {
    let backend = backend();
    let (guard, _) = signed_in(&backend, "desk@clinic.test", AuthTimeoutPolicy::FailOpen).await;
    backend.set_session_delay(Duration::from_millis(6000));

    for path in ["/admin", "/admin/roles"] {
        let verdict = guard.check(path).await;
        assert_eq!(verdict.decision, GuardDecision::RedirectToDefault, "{}", path);
        assert_eq!(verdict.rule, "route.reserved.admin");
    }

    let (root, _) = signed_in(&backend, "root@clinic.test", AuthTimeoutPolicy::FailOpen).await;
    assert!(root.check("/admin/roles").await.is_allowed());
}

#[tokio::test(start_paused = true)]
async fn fetch_inside_the_bound_is_not_a_timeout() {
    let backend = backend();
    let (guard, _) = signed_in(&backend, "desk@clinic.test", AuthTimeoutPolicy::FailClosed).await;
    backend.set_session_delay(Duration::from_millis(4900));

    let verdict = guard.check("/patients").await;
    assert_eq!(verdict.decision, GuardDecision::Allow);
    assert_eq!(verdict.rule, "permission.segment");
}

#[tokio::test]
async fn expired_backend_session_redirects_to_login() {
    let backend = backend();
    let (guard, _) = signed_in(&backend, "desk@clinic.test", AuthTimeoutPolicy::FailClosed).await;
    backend.sign_out().await.unwrap();

    let verdict = guard.check("/patients").await;
    assert_eq!(verdict.decision, GuardDecision::RedirectToLogin);
    assert_eq!(verdict.rule, "session.unauthenticated");
}

#[tokio::test]
async fn permission_refresh_is_the_only_way_a_live_session_changes() {
    let backend = backend();
    let sessions = Arc::new(SessionStore::new(backend.clone(), Arc::new(LocalState::ephemeral())));
    sessions
        .sign_in(&Credentials {
            email: "desk@clinic.test".to_string(),
            password: "pw".to_string(),
        })
        .await
        .expect("sign in");
    let guard = RouteGuard::new(
        sessions.clone(),
        Notifier::new(),
        DEFAULT_SESSION_TIMEOUT,
        AuthTimeoutPolicy::FailClosed,
    );
    assert!(!guard.check("/staff").await.is_allowed());

    backend
        .update(
            collections::USER_PROFILES,
            "u-desk",
            serde_json::json!({ "permitted_routes": ["patients", "staff"] }),
        )
        .await
        .expect("profile update");

    let before = sessions.current().await.expect("session");
    assert!(!before.permits("staff"));
    assert!(!guard.check("/staff").await.is_allowed());

    let refreshed = sessions.refresh_permissions().await.expect("refresh");
    assert!(refreshed.permits("staff"));
    assert_eq!(sessions.current().await, Some(refreshed));

    let verdict = guard.check("/staff").await;
    assert_eq!(verdict.decision, GuardDecision::Allow);
    assert_eq!(verdict.rule, "permission.segment");
    assert!(guard.check("/patients").await.is_allowed());
}
