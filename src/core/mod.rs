//! Plant scheduling core: registry, matching engine, alarm and lifecycle.

pub mod audit;
pub mod error;
pub mod executor;
pub mod plant;

mod alarm;
mod engine;
mod registry;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, PlantError};
pub use executor::{FnExecutor, WorkExecutor};
pub use plant::{Plant, PlantStats, StationStats};
pub use registry::TaskStatus;
