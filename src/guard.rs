//! Route guard
//!
//! Navigation is checked against an ordered rule table. The first rule that
//! produces a decision wins, and the verdict records which rule that was.
//!
//! The session lookup behind each check is raced against a fixed timeout.
//! What a timeout means is decided once at startup through
//! [`AuthTimeoutPolicy`].
//!
//! The lookup runs as its own task and is not cancelled when the timeout
//! wins. Its late result is dropped, so a fetch that eventually reports a
//! different outcome than the timeout branch assumed leaves the decision
//! stale until the next navigation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::models::Session;
use crate::notify::Notifier;
use crate::routes::first_segment;
use crate::session::SessionStore;

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Segment only super-admins may open.
pub const RESERVED_ADMIN_SEGMENT: &str = "admin";

/// Segments any signed-in user may open.
pub const PUBLIC_SEGMENTS: &[&str] = &["", "flow-selection"];

pub const LOGIN_SEGMENT: &str = "login";

pub const CONNECTION_ERROR_MESSAGE: &str =
    "Connection error: could not verify your session. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardVerdict {
    pub decision: GuardDecision,
    /// Id of the rule that decided.
    pub rule: &'static str,
}

impl GuardVerdict {
    pub fn is_allowed(&self) -> bool {
        self.decision == GuardDecision::Allow
    }
}

/// What to do when the session lookup does not answer in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthTimeoutPolicy {
    /// Treat the caller as authenticated and check the cached session's
    /// role and permissions.
    FailOpen,
    /// Deny and tell the user the connection failed.
    FailClosed,
}

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    LoginSegment,
    NoSession,
    SuperAdmin,
    ReservedSegment(&'static str),
    PublicSegment,
    WildcardPermission,
    SegmentPermission,
    Always,
}

#[derive(Debug, Clone, Copy)]
struct RuleSpec {
    id: &'static str,
    kind: RuleKind,
    decision: GuardDecision,
}

const GUARD_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "route.login.public",
        kind: RuleKind::LoginSegment,
        decision: GuardDecision::Allow,
    },
    RuleSpec {
        id: "session.unauthenticated",
        kind: RuleKind::NoSession,
        decision: GuardDecision::RedirectToLogin,
    },
    RuleSpec {
        id: "session.super_admin",
        kind: RuleKind::SuperAdmin,
        decision: GuardDecision::Allow,
    },
    RuleSpec {
        id: "route.reserved.admin",
        kind: RuleKind::ReservedSegment(RESERVED_ADMIN_SEGMENT),
        decision: GuardDecision::RedirectToDefault,
    },
    RuleSpec {
        id: "route.public",
        kind: RuleKind::PublicSegment,
        decision: GuardDecision::Allow,
    },
    RuleSpec {
        id: "permission.wildcard",
        kind: RuleKind::WildcardPermission,
        decision: GuardDecision::Allow,
    },
    RuleSpec {
        id: "permission.segment",
        kind: RuleKind::SegmentPermission,
        decision: GuardDecision::Allow,
    },
    RuleSpec {
        id: "fallback.deny",
        kind: RuleKind::Always,
        decision: GuardDecision::RedirectToDefault,
    },
];

pub const RULE_TIMEOUT_FAIL_CLOSED: &str = "auth.timeout.fail_closed";
pub const RULE_SESSION_ERROR: &str = "auth.session_error";

fn rule_matches(kind: RuleKind, segment: &str, session: Option<&Session>) -> bool {
    match kind {
        RuleKind::LoginSegment => segment == LOGIN_SEGMENT,
        RuleKind::NoSession => session.is_none(),
        RuleKind::SuperAdmin => session.map_or(false, |s| s.is_super_admin),
        RuleKind::ReservedSegment(reserved) => segment == reserved,
        RuleKind::PublicSegment => PUBLIC_SEGMENTS.contains(&segment),
        RuleKind::WildcardPermission => session.map_or(false, Session::has_wildcard),
        RuleKind::SegmentPermission => session.map_or(false, |s| s.permits(segment)),
        RuleKind::Always => true,
    }
}

/// Evaluate the rule table for a path and an already-resolved session.
pub fn evaluate(path: &str, session: Option<&Session>) -> GuardVerdict {
    evaluate_rules(path, session, false)
}

/// Evaluate the rule table with the caller already counted as signed in.
///
/// Role, reserved-segment and permission rules still apply to whatever
/// session is cached; without one only the public segments open.
pub fn evaluate_authenticated(path: &str, session: Option<&Session>) -> GuardVerdict {
    evaluate_rules(path, session, true)
}

fn evaluate_rules(path: &str, session: Option<&Session>, assume_signed_in: bool) -> GuardVerdict {
    let segment = first_segment(path);
    for rule in GUARD_RULES {
        if assume_signed_in && matches!(rule.kind, RuleKind::NoSession) {
            continue;
        }
        if rule_matches(rule.kind, segment, session) {
            return GuardVerdict {
                decision: rule.decision,
                rule: rule.id,
            };
        }
    }
    // The table ends with an unconditional rule.
    GuardVerdict {
        decision: GuardDecision::RedirectToDefault,
        rule: "fallback.deny",
    }
}

/// Rule ids in evaluation order.
pub fn rule_ids() -> Vec<&'static str> {
    GUARD_RULES.iter().map(|r| r.id).collect()
}

pub struct RouteGuard {
    sessions: Arc<SessionStore>,
    notifier: Notifier,
    timeout: Duration,
    on_timeout: AuthTimeoutPolicy,
}

impl RouteGuard {
    pub fn new(
        sessions: Arc<SessionStore>,
        notifier: Notifier,
        timeout: Duration,
        on_timeout: AuthTimeoutPolicy,
    ) -> Self {
        Self {
            sessions,
            notifier,
            timeout,
            on_timeout,
        }
    }

    pub fn policy(&self) -> AuthTimeoutPolicy {
        self.on_timeout
    }

    /// Decide whether navigation to `path` may proceed.
    #[instrument(skip(self))]
    pub async fn check(&self, path: &str) -> GuardVerdict {
        if first_segment(path) == LOGIN_SEGMENT {
            return evaluate(path, None);
        }

        let sessions = Arc::clone(&self.sessions);
        let lookup = tokio::spawn(async move { sessions.fetch_session().await });

        let session = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Ok(session))) => session,
            Ok(Ok(Err(e))) => {
                error!("session lookup failed: {}", e);
                self.notifier.error(CONNECTION_ERROR_MESSAGE);
                return GuardVerdict {
                    decision: GuardDecision::RedirectToLogin,
                    rule: RULE_SESSION_ERROR,
                };
            }
            Ok(Err(join_error)) => {
                error!("session lookup task failed: {}", join_error);
                self.notifier.error(CONNECTION_ERROR_MESSAGE);
                return GuardVerdict {
                    decision: GuardDecision::RedirectToLogin,
                    rule: RULE_SESSION_ERROR,
                };
            }
            Err(_) => return self.timed_out(path).await,
        };

        let verdict = evaluate(path, session.as_ref());
        debug!(decision = ?verdict.decision, rule = verdict.rule, "route checked");
        verdict
    }

    async fn timed_out(&self, path: &str) -> GuardVerdict {
        warn!(
            timeout_ms = self.timeout.as_millis() as u64,
            policy = ?self.on_timeout,
            "session lookup timed out"
        );
        match self.on_timeout {
            AuthTimeoutPolicy::FailOpen => {
                let cached = self.sessions.current().await;
                let verdict = evaluate_authenticated(path, cached.as_ref());
                debug!(decision = ?verdict.decision, rule = verdict.rule, "route checked against cached session");
                verdict
            }
            AuthTimeoutPolicy::FailClosed => {
                self.notifier.error(CONNECTION_ERROR_MESSAGE);
                GuardVerdict {
                    decision: GuardDecision::RedirectToLogin,
                    rule: RULE_TIMEOUT_FAIL_CLOSED,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use test_case::test_case;

    fn session(super_admin: bool, routes: &[&str]) -> Session {
        Session {
            user_id: "u1".into(),
            email: "u1@clinic.test".into(),
            role: Role::Nurse,
            is_super_admin: super_admin,
            permitted_routes: routes.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn rule_order_is_fixed() {
        assert_eq!(
            rule_ids(),
            vec![
                "route.login.public",
                "session.unauthenticated",
                "session.super_admin",
                "route.reserved.admin",
                "route.public",
                "permission.wildcard",
                "permission.segment",
                "fallback.deny",
            ]
        );
    }

    #[test_case("/patients" ; "protected page")]
    #[test_case("/" ; "landing")]
    #[test_case("/admin" ; "reserved")]
    fn no_session_redirects_to_login(path: &str) {
        let verdict = evaluate(path, None);
        assert_eq!(verdict.decision, GuardDecision::RedirectToLogin);
        assert_eq!(verdict.rule, "session.unauthenticated");
    }

    #[test]
    fn login_is_reachable_without_session() {
        assert!(evaluate("/login", None).is_allowed());
    }

    #[test_case("/admin")]
    #[test_case("/admin/users")]
    #[test_case("/staff")]
    #[test_case("/inventory/medication")]
    #[test_case("/settings/profile")]
    #[test_case("/")]
    fn super_admin_is_allowed_everywhere(path: &str) {
        let s = session(true, &[]);
        let verdict = evaluate(path, Some(&s));
        assert!(verdict.is_allowed(), "{} -> {:?}", path, verdict);
    }

    #[test_case("/dashboard")]
    #[test_case("/staff")]
    #[test_case("/time-clock")]
    #[test_case("/inventory/supply")]
    fn wildcard_allows_non_reserved(path: &str) {
        let s = session(false, &["*"]);
        assert!(evaluate(path, Some(&s)).is_allowed());
    }

    #[test]
    fn wildcard_does_not_open_reserved_segment() {
        let s = session(false, &["*"]);
        let verdict = evaluate("/admin", Some(&s));
        assert_eq!(verdict.decision, GuardDecision::RedirectToDefault);
        assert_eq!(verdict.rule, "route.reserved.admin");
    }

    #[test_case("/patients", GuardDecision::Allow ; "permitted")]
    #[test_case("/patients/p1", GuardDecision::Allow ; "permitted nested")]
    #[test_case("/staff", GuardDecision::RedirectToDefault ; "not permitted")]
    #[test_case("/flow-selection", GuardDecision::Allow ; "public flow selection")]
    #[test_case("/", GuardDecision::Allow ; "public landing")]
    fn specific_permission(path: &str, expected: GuardDecision) {
        let s = session(false, &["patients"]);
        assert_eq!(evaluate(path, Some(&s)).decision, expected);
    }

    #[test_case("/admin/roles", GuardDecision::RedirectToDefault, "route.reserved.admin" ; "reserved")]
    #[test_case("/staff", GuardDecision::RedirectToDefault, "fallback.deny" ; "not permitted")]
    #[test_case("/patients", GuardDecision::Allow, "permission.segment" ; "permitted")]
    fn assumed_sign_in_keeps_permission_rules(path: &str, expected: GuardDecision, rule: &str) {
        let s = session(false, &["patients"]);
        let verdict = evaluate_authenticated(path, Some(&s));
        assert_eq!(verdict.decision, expected);
        assert_eq!(verdict.rule, rule);
    }

    #[test]
    fn assumed_sign_in_without_cached_session_opens_public_segments_only() {
        assert!(evaluate_authenticated("/flow-selection", None).is_allowed());
        assert_eq!(
            evaluate_authenticated("/patients", None).decision,
            GuardDecision::RedirectToDefault
        );
        assert_eq!(
            evaluate_authenticated("/admin", None).decision,
            GuardDecision::RedirectToDefault
        );
    }
}
