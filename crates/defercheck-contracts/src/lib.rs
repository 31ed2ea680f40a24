//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for the schema/version
//! strings that appear in machine-readable I/O. Bump a version whenever the
//! corresponding JSON shape changes incompatibly.

pub const DC_DIAG_SCHEMA_VERSION: &str = "defercheck.diag@0.1.0";
pub const DC_REPORT_SCHEMA_VERSION: &str = "defercheck.report@0.1.0";
