//! The route access decision table.
//!
//! Pure and synchronous: given the current path, durable-token presence and the
//! session, it returns what the caller must do. The controller applies the
//! result; the HTTP service returns it to the front end.

use crate::{
    access::{self, paths},
    models::{AccessDecision, DecisionOutcome, Session},
};

/// GuardInput
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub path: &'a str,
    pub has_token: bool,
    pub session: &'a Session,
}

/// GuardDecision
///
/// Side effects and at most one redirect for a single evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardDecision {
    /// Stale client state: the session outlived its token.
    pub clear_session: bool,
    /// Token present but the session was never populated.
    pub validate_session: bool,
    pub redirect: Option<&'static str>,
}

/// evaluate
///
/// Runs the rule table. The session side effects are independent of the
/// redirect; among redirect rules the first match wins.
pub fn evaluate(input: &GuardInput<'_>) -> GuardDecision {
    let authenticated = input.session.is_authenticated();

    GuardDecision {
        clear_session: !input.has_token && authenticated,
        validate_session: input.has_token && !authenticated,
        redirect: redirect_for(input),
    }
}

fn redirect_for(input: &GuardInput<'_>) -> Option<&'static str> {
    let path = access::normalize_path(input.path);
    let session = input.session;

    if !input.has_token {
        return (!access::is_public(path)).then_some(paths::ROOT);
    }
    if !session.is_authenticated() {
        // Waiting on session validation.
        return None;
    }

    if access::is_public(path) {
        return Some(paths::DASHBOARD);
    }

    let gate = pending_gate(session);
    if let Some(gate) = gate {
        if !gate.admits(path) {
            return Some(gate.target());
        }
        return None;
    }

    if access::is_admin_scoped(path) && !session.is_admin() {
        return Some(paths::DASHBOARD);
    }
    if session.is_parent() && !access::is_parent_scoped(path) {
        return Some(paths::PARENT_DASHBOARD);
    }
    None
}

/// A verification step the user must complete before anything else renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Email,
    School,
}

impl Gate {
    fn target(self) -> &'static str {
        match self {
            Gate::Email => paths::VERIFY_EMAIL,
            Gate::School => paths::SCHOOL_APPROVAL,
        }
    }

    fn admits(self, path: &str) -> bool {
        match self {
            Gate::Email => path == paths::VERIFY_EMAIL || path == paths::VERIFY_EMAIL_TOKEN,
            Gate::School => path == paths::SCHOOL_APPROVAL,
        }
    }
}

// Admins are exempt from school approval.
fn pending_gate(session: &Session) -> Option<Gate> {
    if !session.is_verified_email {
        Some(Gate::Email)
    } else if !session.is_admin() && !session.is_verified_school {
        Some(Gate::School)
    } else {
        None
    }
}

impl AccessDecision {
    /// Builds the wire decision for one pass. Before hydration nothing is decided.
    pub fn from_pass(input: &GuardInput<'_>, hydrated: bool) -> Self {
        let route_class = access::classify(input.path);
        if !hydrated {
            return AccessDecision {
                outcome: DecisionOutcome::Pending,
                redirect_to: None,
                clear_session: false,
                validate_session: false,
                route_class,
            };
        }

        let decision = evaluate(input);
        AccessDecision {
            outcome: match decision.redirect {
                Some(_) => DecisionOutcome::Redirect,
                None => DecisionOutcome::Render,
            },
            redirect_to: decision.redirect.map(str::to_string),
            clear_session: decision.clear_session,
            validate_session: decision.validate_session,
            route_class,
        }
    }
}
