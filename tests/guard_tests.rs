use schoolmule_portal::{
    access::{PUBLIC_PATHS, RouteClass, paths},
    guard::{GuardDecision, GuardInput, evaluate},
    models::{AccessDecision, DecisionOutcome, Role, Session},
};

// --- Test Utilities ---

const SAMPLE_PRIVATE_PATHS: [&str; 10] = [
    "/dashboard",
    "/messages",
    "/attendance",
    "/settings",
    "/parent/dashboard",
    "/parent/feedback",
    "/admin-panel",
    "/admin-panel/approvals",
    "/verify-email",
    "/school-approval",
];

fn session(role: Option<Role>, email: bool, school: bool) -> Session {
    Session {
        id: Some("u1".to_string()),
        username: "jdoe".to_string(),
        email: "jdoe@example.com".to_string(),
        school: Some("42".to_string()),
        role,
        is_verified_email: email,
        is_verified_school: school,
        active_term: None,
    }
}

fn verified(role: Role) -> Session {
    session(Some(role), true, true)
}

fn redirect(path: &str, has_token: bool, session: &Session) -> Option<&'static str> {
    evaluate(&GuardInput {
        path,
        has_token,
        session,
    })
    .redirect
}

// --- Anonymous visitors ---

#[test]
fn test_no_token_private_paths_redirect_home() {
    let anonymous = Session::default();
    for path in SAMPLE_PRIVATE_PATHS {
        assert_eq!(redirect(path, false, &anonymous), Some(paths::ROOT), "{path}");
    }
}

#[test]
fn test_no_token_public_paths_render() {
    let anonymous = Session::default();
    for path in PUBLIC_PATHS {
        assert_eq!(redirect(path, false, &anonymous), None, "{path}");
    }
}

#[test]
fn test_stale_session_is_cleared_without_validation() {
    let stale = verified(Role::Teacher);
    let decision = evaluate(&GuardInput {
        path: "/dashboard",
        has_token: false,
        session: &stale,
    });

    assert_eq!(
        decision,
        GuardDecision {
            clear_session: true,
            validate_session: false,
            redirect: Some(paths::ROOT),
        }
    );
}

#[test]
fn test_token_without_session_requests_validation_only() {
    let decision = evaluate(&GuardInput {
        path: "/attendance",
        has_token: true,
        session: &Session::default(),
    });

    assert_eq!(
        decision,
        GuardDecision {
            clear_session: false,
            validate_session: true,
            redirect: None,
        }
    );
}

#[test]
fn test_blank_id_counts_as_anonymous() {
    let blank = Session {
        id: Some(String::new()),
        ..verified(Role::Admin)
    };

    let without_token = evaluate(&GuardInput {
        path: "/login",
        has_token: false,
        session: &blank,
    });
    assert!(!without_token.clear_session);
    assert_eq!(without_token.redirect, None);

    let with_token = evaluate(&GuardInput {
        path: "/login",
        has_token: true,
        session: &blank,
    });
    assert!(with_token.validate_session);
    assert_eq!(with_token.redirect, None);
}

// --- Authenticated users ---

#[test]
fn test_public_paths_redirect_to_dashboard_when_signed_in() {
    for role in [Role::Admin, Role::Teacher, Role::Parent, Role::Other] {
        let user = verified(role);
        for path in PUBLIC_PATHS {
            assert_eq!(redirect(path, true, &user), Some(paths::DASHBOARD), "{path}");
        }
    }
}

#[test]
fn test_unverified_email_goes_to_verify_email() {
    let user = session(Some(Role::Teacher), false, false);

    assert_eq!(redirect("/dashboard", true, &user), Some(paths::VERIFY_EMAIL));
    assert_eq!(redirect("/admin-panel", true, &user), Some(paths::VERIFY_EMAIL));
    assert_eq!(redirect(paths::VERIFY_EMAIL, true, &user), None);
    assert_eq!(redirect("/verify-email-token?token=abc", true, &user), None);
}

#[test]
fn test_unverified_school_goes_to_school_approval() {
    for role in [Some(Role::Teacher), Some(Role::Parent), Some(Role::Other), None] {
        let user = session(role.clone(), true, false);
        assert_eq!(
            redirect("/admin-panel/approvals", true, &user),
            Some(paths::SCHOOL_APPROVAL),
            "{role:?}"
        );
        assert_eq!(redirect(paths::SCHOOL_APPROVAL, true, &user), None, "{role:?}");
    }
}

#[test]
fn test_admin_is_exempt_from_school_approval() {
    let admin = session(Some(Role::Admin), true, false);

    assert_eq!(redirect("/admin-panel/approvals", true, &admin), None);
    assert_eq!(redirect("/dashboard", true, &admin), None);
}

#[test]
fn test_admin_panel_requires_admin_role() {
    assert_eq!(
        redirect("/admin-panel/approvals", true, &verified(Role::Teacher)),
        Some(paths::DASHBOARD)
    );
    assert_eq!(redirect("/admin-panel/approvals", true, &verified(Role::Admin)), None);
}

#[test]
fn test_parent_is_confined_to_parent_scope() {
    let parent = verified(Role::Parent);

    assert_eq!(redirect("/dashboard", true, &parent), Some(paths::PARENT_DASHBOARD));
    assert_eq!(redirect("/messages", true, &parent), Some(paths::PARENT_DASHBOARD));
    assert_eq!(redirect("/parent/feedback", true, &parent), None);
    assert_eq!(redirect("/parent/report-cards/term-1", true, &parent), None);
    assert_eq!(redirect("/settings", true, &parent), None);
}

#[test]
fn test_parent_admin_panel_goes_to_dashboard_first() {
    // Rule order: the admin check fires before the parent-scope check.
    assert_eq!(
        redirect("/admin-panel", true, &verified(Role::Parent)),
        Some(paths::DASHBOARD)
    );
}

#[test]
fn test_parent_stays_on_pending_verification_pages() {
    let unverified_email = session(Some(Role::Parent), false, false);
    assert_eq!(redirect(paths::VERIFY_EMAIL, true, &unverified_email), None);

    let unapproved = session(Some(Role::Parent), true, false);
    assert_eq!(redirect(paths::SCHOOL_APPROVAL, true, &unapproved), None);
}

#[test]
fn test_missing_role_behaves_like_non_admin_non_parent() {
    let user = session(None, true, true);

    assert_eq!(redirect("/dashboard", true, &user), None);
    assert_eq!(redirect("/admin-panel", true, &user), Some(paths::DASHBOARD));
}

// --- Properties ---

fn all_sessions() -> Vec<Session> {
    let mut sessions = vec![Session::default()];
    for role in [None, Some(Role::Admin), Some(Role::Teacher), Some(Role::Parent), Some(Role::Other)] {
        for email in [false, true] {
            for school in [false, true] {
                sessions.push(session(role.clone(), email, school));
            }
        }
    }
    sessions
}

fn all_paths() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = PUBLIC_PATHS.to_vec();
    all.extend(SAMPLE_PRIVATE_PATHS);
    all.extend(["/verify-email-token", "/parent/communication", "/tuition-plans"]);
    all
}

#[test]
fn test_evaluation_is_idempotent() {
    for user in all_sessions() {
        for has_token in [false, true] {
            for path in all_paths() {
                let input = GuardInput {
                    path,
                    has_token,
                    session: &user,
                };
                assert_eq!(evaluate(&input), evaluate(&input));
            }
        }
    }
}

#[test]
fn test_redirects_always_settle() {
    for user in all_sessions() {
        for has_token in [false, true] {
            for start in all_paths() {
                let mut path = start;
                let mut hops = 0;
                while let Some(next) = redirect(path, has_token, &user) {
                    assert_ne!(next, path, "self-redirect at {path}");
                    path = next;
                    hops += 1;
                    assert!(
                        hops <= 3,
                        "redirect chain from {start} does not settle for {user:?} (token: {has_token})"
                    );
                }
            }
        }
    }
}

// --- Wire decision ---

#[test]
fn test_decision_is_pending_before_hydration() {
    let input = GuardInput {
        path: "/dashboard",
        has_token: false,
        session: &verified(Role::Teacher),
    };
    let decision = AccessDecision::from_pass(&input, false);

    assert_eq!(decision.outcome, DecisionOutcome::Pending);
    assert_eq!(decision.redirect_to, None);
    assert!(!decision.clear_session);
    assert!(!decision.validate_session);
    assert_eq!(decision.route_class, RouteClass::Authenticated);
}

#[test]
fn test_decision_after_hydration_carries_redirect() {
    let parent = verified(Role::Parent);
    let input = GuardInput {
        path: "/dashboard",
        has_token: true,
        session: &parent,
    };
    let decision = AccessDecision::from_pass(&input, true);

    assert_eq!(decision.outcome, DecisionOutcome::Redirect);
    assert_eq!(decision.redirect_to.as_deref(), Some(paths::PARENT_DASHBOARD));
}
