use super::models::{
    Aggregation, BulkInsertOutcome, GroupCount, GroupKey, GroupValue, JobPatch, JobRecord,
    JobSort, JobStatus, NewJob, Predicate, RejectedJob, SortDirection,
};
use super::schema::JOB_VERSIONED_SCHEMAS;
use super::validation::{apply_patch, validate_new_job, ValidJob};
use super::{JobStore, JobStoreError, JobStoreResult};
use crate::server::metrics::record_db_query;
use crate::sqlite_persistence::initialize_schema;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const JOB_COLUMNS: &str =
    "id, company, role, status, applied_date, job_link, created_at, updated_at";

pub struct SqliteJobStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteJobStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        info!("Opening job database at {:?}", path);
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open job database at {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        register_regexp_function(&conn).context("Failed to register regexp function")?;
        initialize_schema(&mut conn, JOB_VERSIONED_SCHEMAS, "job")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> JobStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> JobStoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let start = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| JobStoreError::LockPoisoned)?;
            f(&mut *conn)
        })
        .await?;
        record_db_query(operation, start.elapsed());
        result
    }
}

/// Registers `regexp(pattern, text)` so that `text REGEXP pattern` works in
/// queries. Compiled patterns are cached per statement.
fn register_regexp_function(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regex: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let is_match = match ctx.get_raw(1) {
                ValueRef::Text(text) => std::str::from_utf8(text)
                    .map(|text| regex.is_match(text))
                    .unwrap_or(false),
                _ => false,
            };
            Ok(is_match)
        },
    )
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time at the precision that survives a round trip through storage.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn conversion_error(column: usize, error: impl Into<BoxError>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, error.into())
}

fn parse_stored_datetime(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<JobRecord> {
    let status: String = row.get(3)?;
    let status = JobStatus::parse(&status)
        .ok_or_else(|| conversion_error(3, format!("Unknown job status '{}'", status)))?;

    Ok(JobRecord {
        id: row.get(0)?,
        company: row.get(1)?,
        role: row.get(2)?,
        status,
        applied_date: parse_stored_datetime(4, &row.get::<_, String>(4)?)?,
        job_link: row.get(5)?,
        created_at: parse_stored_datetime(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_stored_datetime(7, &row.get::<_, String>(7)?)?,
    })
}

/// A SQL condition with its positional parameters.
struct WhereClause {
    sql: String,
    params: Vec<Value>,
}

fn where_clause(predicate: &Predicate) -> WhereClause {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(status) = &predicate.status {
        conditions.push("status = ?");
        params.push(Value::Text(status.clone()));
    }
    if let Some(company) = &predicate.company {
        conditions.push("company REGEXP ?");
        params.push(Value::Text(company.as_str().to_string()));
    }
    if let Some(role) = &predicate.role {
        conditions.push("role REGEXP ?");
        params.push(Value::Text(role.as_str().to_string()));
    }
    if let Some(start) = &predicate.applied_date.start {
        conditions.push("applied_date >= ?");
        params.push(Value::Text(format_datetime(start)));
    }
    if let Some(end) = &predicate.applied_date.end {
        conditions.push("applied_date <= ?");
        params.push(Value::Text(format_datetime(end)));
    }

    let sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    WhereClause { sql, params }
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    }
}

fn order_by_sql(sort: JobSort) -> String {
    let (column, direction) = match sort {
        JobSort::AppliedDate(direction) => ("applied_date", direction),
    };
    format!(" ORDER BY {} {}, rowid ASC", column, direction_sql(direction))
}

fn aggregate_sql(aggregation: &Aggregation) -> String {
    let mut sql = match aggregation.group_by {
        GroupKey::Status => "SELECT status, COUNT(*) FROM jobs GROUP BY status".to_string(),
        GroupKey::AppliedYearMonth => "SELECT CAST(strftime('%Y', applied_date) AS INTEGER) AS year, \
             CAST(strftime('%m', applied_date) AS INTEGER) AS month, COUNT(*) \
             FROM jobs GROUP BY year, month"
            .to_string(),
    };
    if let Some(direction) = aggregation.sort {
        let direction = direction_sql(direction);
        match aggregation.group_by {
            GroupKey::Status => sql.push_str(&format!(" ORDER BY status {}", direction)),
            GroupKey::AppliedYearMonth => sql.push_str(&format!(
                " ORDER BY year {}, month {}",
                direction, direction
            )),
        }
    }
    if let Some(limit) = aggregation.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    sql
}

fn build_record(valid: ValidJob, now: DateTime<Utc>) -> JobRecord {
    JobRecord {
        id: Uuid::new_v4().to_string(),
        company: valid.company,
        role: valid.role,
        status: valid.status,
        applied_date: valid.applied_date.trunc_subsecs(3),
        job_link: valid.job_link,
        created_at: now,
        updated_at: now,
    }
}

fn insert_record(conn: &Connection, job: &JobRecord) -> rusqlite::Result<()> {
    conn.execute(
        &format!("INSERT INTO jobs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", JOB_COLUMNS),
        params![
            job.id,
            job.company,
            job.role,
            job.status.as_str(),
            format_datetime(&job.applied_date),
            job.job_link,
            format_datetime(&job.created_at),
            format_datetime(&job.updated_at),
        ],
    )?;
    Ok(())
}

fn select_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<JobRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
        params![id],
        row_to_job,
    )
    .optional()
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn count(&self, predicate: &Predicate) -> JobStoreResult<u64> {
        let clause = where_clause(predicate);
        self.with_conn("count_jobs", move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM jobs{}", clause.sql),
                params_from_iter(clause.params.iter()),
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    async fn find(
        &self,
        predicate: &Predicate,
        sort: JobSort,
        skip: u64,
        limit: u64,
    ) -> JobStoreResult<Vec<JobRecord>> {
        let mut clause = where_clause(predicate);
        let sql = format!(
            "SELECT {} FROM jobs{}{} LIMIT ? OFFSET ?",
            JOB_COLUMNS,
            clause.sql,
            order_by_sql(sort)
        );
        clause.params.push(Value::Integer(limit as i64));
        clause.params.push(Value::Integer(skip as i64));

        self.with_conn("find_jobs", move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let jobs = stmt
                .query_map(params_from_iter(clause.params.iter()), row_to_job)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(jobs)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> JobStoreResult<Option<JobRecord>> {
        let id = id.to_string();
        self.with_conn("find_job_by_id", move |conn| Ok(select_by_id(conn, &id)?))
            .await
    }

    async fn insert_one(&self, job: NewJob) -> JobStoreResult<JobRecord> {
        self.with_conn("insert_job", move |conn| {
            let now = now();
            let record = build_record(validate_new_job(&job, now)?, now);
            insert_record(conn, &record)?;
            debug!("Inserted job {} ({} / {})", record.id, record.company, record.role);
            Ok(record)
        })
        .await
    }

    async fn insert_many(&self, jobs: Vec<NewJob>) -> JobStoreResult<BulkInsertOutcome> {
        self.with_conn("insert_jobs", move |conn| {
            let now = now();
            let mut outcome = BulkInsertOutcome::default();
            let tx = conn.transaction()?;
            for (index, job) in jobs.iter().enumerate() {
                match validate_new_job(job, now) {
                    Ok(valid) => {
                        let record = build_record(valid, now);
                        insert_record(&tx, &record)?;
                        outcome.inserted.push(record);
                    }
                    Err(error) => outcome.rejected.push(RejectedJob { index, error }),
                }
            }
            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    async fn update_by_id(&self, id: &str, patch: JobPatch) -> JobStoreResult<Option<JobRecord>> {
        let id = id.to_string();
        self.with_conn("update_job", move |conn| {
            let Some(existing) = select_by_id(conn, &id)? else {
                return Ok(None);
            };
            let mut updated = apply_patch(&existing, &patch, now())?;
            updated.applied_date = updated.applied_date.trunc_subsecs(3);
            conn.execute(
                "UPDATE jobs SET company = ?1, role = ?2, status = ?3, applied_date = ?4, \
                 job_link = ?5, updated_at = ?6 WHERE id = ?7",
                params![
                    updated.company,
                    updated.role,
                    updated.status.as_str(),
                    format_datetime(&updated.applied_date),
                    updated.job_link,
                    format_datetime(&updated.updated_at),
                    id,
                ],
            )?;
            Ok(Some(updated))
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> JobStoreResult<bool> {
        let id = id.to_string();
        self.with_conn("delete_job", move |conn| {
            let deleted = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn aggregate(&self, aggregation: Aggregation) -> JobStoreResult<Vec<GroupCount>> {
        let sql = aggregate_sql(&aggregation);
        self.with_conn("aggregate_jobs", move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let groups = match aggregation.group_by {
                GroupKey::Status => stmt
                    .query_map([], |row| {
                        Ok(GroupCount {
                            key: GroupValue::Status(row.get(0)?),
                            count: row.get::<_, i64>(1)? as u64,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
                GroupKey::AppliedYearMonth => stmt
                    .query_map([], |row| {
                        Ok(GroupCount {
                            key: GroupValue::YearMonth {
                                year: row.get(0)?,
                                month: row.get(1)?,
                            },
                            count: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
            };
            Ok(groups)
        })
        .await
    }
}
