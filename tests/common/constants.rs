//! Shared constants for end-to-end tests

// ============================================================================
// Timing
// ============================================================================

/// How long to wait for a freshly spawned server to answer `GET /`
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Test data
// ============================================================================

pub const JOB_COMPANY: &str = "Acme Corp";
pub const JOB_ROLE: &str = "Backend Engineer";
pub const JOB_LINK: &str = "https://careers.acme.example.com/jobs/42";
pub const JOB_APPLIED_DATE: &str = "2024-03-15T00:00:00.000Z";

/// Id that never matches a stored job
pub const UNKNOWN_JOB_ID: &str = "00000000-0000-4000-8000-000000000000";
