//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between the
//! repository layer, the settings engine and the audit trail.

mod audit;
mod authz;
mod route_access;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use authz::{AccessAction, AccessDecision, Actor, AdminListAuthorizer, Authorizer};
pub use route_access::RouteAccessController;
