//! Metric names recorded when the `metrics` feature is enabled.

/// GitHub install attempts, successful or not.
pub const INSTALLATION_ATTEMPTS_TOTAL: &str = "prompthub_skills_installation_attempts_total";
/// Failed GitHub installs.
pub const INSTALLATION_ERRORS_TOTAL: &str = "prompthub_skills_installation_errors_total";
/// Clone-and-register duration in seconds.
pub const INSTALLATION_DURATION_SECONDS: &str = "prompthub_skills_installation_duration_seconds";
/// Packages created by an import scan.
pub const SCAN_IMPORTED_TOTAL: &str = "prompthub_skills_scan_imported_total";
/// Packages an import scan skipped because the name was taken.
pub const SCAN_SKIPPED_TOTAL: &str = "prompthub_skills_scan_skipped_total";
/// Packages an import scan could not read, validate or store.
pub const SCAN_FAILED_TOTAL: &str = "prompthub_skills_scan_failed_total";
