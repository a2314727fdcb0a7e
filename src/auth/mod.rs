//! Bearer-token authentication and role-based access.
//!
//! Request flow: [`filter::auth_filter`] classifies the path against the
//! [`policy::AccessPolicy`], validates any bearer token with the
//! [`token::TokenService`] and attaches a [`filter::RequestAuth`] to the
//! request. [`enforce::enforce_access`] then turns that context into a
//! pass / 401 / 403 decision.

pub mod enforce;
pub mod filter;
pub mod policy;
pub mod role;
pub mod token;

pub use enforce::{AccessDenied, authorize, enforce_access};
pub use filter::{AuthFilter, RequestAuth, auth_filter, bearer_token};
pub use policy::{AccessPolicy, AccessRule, PathPattern, Requirement};
pub use role::{Principal, Role, UnknownRole};
pub use token::{Claims, IssueError, TOKEN_TTL, TokenError, TokenService};
