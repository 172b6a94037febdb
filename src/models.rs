use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::access::RouteClass;

// --- Client Session ---

/// Role
///
/// The roles the front end distinguishes. Any other non-blank string lands in
/// `Other`; a missing, blank or non-string role is `None` on the session.
/// Decoding always goes through `Role::parse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
    Other,
}

impl Role {
    /// Empty or blank values are treated as "no role".
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim() {
            "" => None,
            "ADMIN" => Some(Role::Admin),
            "TEACHER" => Some(Role::Teacher),
            "PARENT" => Some(Role::Parent),
            _ => Some(Role::Other),
        }
    }
}

/// Session
///
/// The client's belief about the current user. A session without a non-blank
/// `id` is anonymous. Persisted across reloads by the `SessionStore`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Session {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    // Tenant identifier; absent until the user is attached to a school.
    #[serde(deserialize_with = "lenient_string")]
    pub school: Option<String>,
    #[serde(deserialize_with = "lenient_role")]
    #[ts(type = "\"ADMIN\" | \"TEACHER\" | \"PARENT\" | \"OTHER\" | null")]
    #[schema(value_type = Option<String>, example = "PARENT")]
    pub role: Option<Role>,
    pub is_verified_email: bool,
    pub is_verified_school: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub active_term: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_parent(&self) -> bool {
        self.role == Some(Role::Parent)
    }
}

// --- Session Validation Service (wire schemas) ---

/// ValidatedProfile
///
/// The canonical profile returned by the session validation endpoint. The API is
/// loose about types: identifiers may be strings or numbers and any field may be
/// null, so every field is decoded leniently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: Option<String>,
    // Email verification flag; becomes `isVerifiedEmail` on the session.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_verified: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_verified_school: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub active_term: Option<String>,
}

impl From<ValidatedProfile> for Session {
    fn from(profile: ValidatedProfile) -> Self {
        Session {
            id: profile.user_id,
            username: profile.username.unwrap_or_default(),
            email: profile.email.unwrap_or_default(),
            school: profile.school,
            role: profile.role.as_deref().and_then(Role::parse),
            is_verified_email: profile.is_verified,
            is_verified_school: profile.is_verified_school,
            active_term: profile.active_term,
        }
    }
}

/// ValidateSessionResponse
///
/// Envelope of `GET /auth/validate-session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ValidateSessionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<ValidatedProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Strings are trimmed, numbers are stringified, everything else (null, empty,
/// bool, objects) reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Like `lenient_string`, but numbers are dropped too.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.as_deref().and_then(Role::parse))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

// --- Access-policy HTTP schemas ---

/// EvaluateRequest
///
/// Input of `POST /access/evaluate`: the same signals the in-process controller
/// observes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EvaluateRequest {
    #[schema(example = "/dashboard")]
    pub path: String,
    #[serde(default)]
    pub has_token: bool,
    #[serde(default = "default_hydrated")]
    pub hydrated: bool,
    #[serde(default)]
    pub session: Session,
}

fn default_hydrated() -> bool {
    true
}

/// DecisionOutcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum DecisionOutcome {
    /// Not hydrated yet: render nothing.
    Pending,
    Render,
    Redirect,
}

/// AccessDecision
///
/// Output of `POST /access/evaluate`. The caller applies the side effects
/// (`clearSession`, `validateSession`) and performs the redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccessDecision {
    pub outcome: DecisionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    pub clear_session: bool,
    pub validate_session: bool,
    pub route_class: RouteClass,
}

/// RouteSets
///
/// Output of `GET /routes`, so the front end can share the exact route tables.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RouteSets {
    pub public_paths: Vec<String>,
    pub parent_prefixes: Vec<String>,
    pub admin_prefix: String,
}
