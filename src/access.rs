//! Route classification for the SchoolMule front end.
//!
//! Every requested path falls into exactly one [`RouteClass`]. Public paths are
//! matched exactly; parent and admin scopes are matched by prefix.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Well-known redirect targets.
pub mod paths {
    pub const ROOT: &str = "/";
    pub const DASHBOARD: &str = "/dashboard";
    pub const PARENT_DASHBOARD: &str = "/parent/dashboard";
    pub const VERIFY_EMAIL: &str = "/verify-email";
    pub const VERIFY_EMAIL_TOKEN: &str = "/verify-email-token";
    pub const SCHOOL_APPROVAL: &str = "/school-approval";
}

/// Reachable without a session.
pub const PUBLIC_PATHS: [&str; 9] = [
    "/",
    "/login",
    "/signup",
    "/about",
    "/product",
    "/contact",
    "/demo",
    "/forgot-password",
    "/reset-password",
];

/// The only areas a PARENT may visit.
pub const PARENT_PREFIXES: [&str; 5] = [
    "/parent/dashboard",
    "/parent/feedback",
    "/parent/communication",
    "/settings",
    "/parent/report-cards",
];

pub const ADMIN_PREFIX: &str = "/admin-panel";

/// RouteClass
///
/// The access scope a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum RouteClass {
    Public,
    ParentScoped,
    AdminScoped,
    Authenticated,
}

/// Strips the query string and fragment; classification only looks at the path.
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    match &path[..end] {
        "" => paths::ROOT,
        p => p,
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&normalize_path(path))
}

pub fn is_parent_scoped(path: &str) -> bool {
    let path = normalize_path(path);
    PARENT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

pub fn is_admin_scoped(path: &str) -> bool {
    normalize_path(path).starts_with(ADMIN_PREFIX)
}

/// classify
///
/// Public wins over every scope, then admin, then parent.
pub fn classify(path: &str) -> RouteClass {
    if is_public(path) {
        RouteClass::Public
    } else if is_admin_scoped(path) {
        RouteClass::AdminScoped
    } else if is_parent_scoped(path) {
        RouteClass::ParentScoped
    } else {
        RouteClass::Authenticated
    }
}
