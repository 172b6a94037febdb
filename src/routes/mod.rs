/// Router Module Index
///
/// Splits the access-policy service into routes that anyone may call and routes
/// that require the caller's bearer token.

/// Routes accessible without credentials (health, route tables, rule evaluation).
pub mod public;

/// Routes that forward the caller's bearer token to the SchoolMule API.
pub mod authenticated;
