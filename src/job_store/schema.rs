//! SQLite schema for the job database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Job applications
// =============================================================================

const JOBS_TABLE_V1: Table = Table {
    name: "jobs",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("company", &SqlType::Text, non_null = true),
        sqlite_column!("role", &SqlType::Text, non_null = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'Applied'")
        ),
        // RFC 3339 UTC with milliseconds, so text order is chronological.
        sqlite_column!("applied_date", &SqlType::Text, non_null = true),
        sqlite_column!("job_link", &SqlType::Text),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
        sqlite_column!("updated_at", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_jobs_company_role", "company, role"),
        ("idx_jobs_status", "status"),
        ("idx_jobs_applied_date", "applied_date DESC"),
    ],
};

pub const JOB_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[JOBS_TABLE_V1],
    migration: None,
}];
