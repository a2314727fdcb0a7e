/// Router Module Index
///
/// Routes are grouped by feature, not by access level: who may call what is
/// decided by the access policy for every route alike.

/// Account endpoints under `/api/auth`.
pub mod auth;

/// Liveness probe.
pub mod system;
