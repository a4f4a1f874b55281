mod file_config;

pub use file_config::{FileConfig, QueryConfig};

use crate::jobs::QuerySettings;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

const JOBS_DB_FILE_NAME: &str = "jobs.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub default_page_size: u64,
    pub max_pages: u64,
    pub monthly_stats_buckets: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub query: QuerySettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {}", s),
            },
            None => cli.logging_level.clone(),
        };

        let query_file = file.query.unwrap_or_default();
        let query = QuerySettings {
            default_page_size: query_file
                .default_page_size
                .unwrap_or(cli.default_page_size),
            max_pages: query_file.max_pages.unwrap_or(cli.max_pages),
            monthly_stats_buckets: query_file
                .monthly_stats_buckets
                .unwrap_or(cli.monthly_stats_buckets),
        };
        if query.default_page_size == 0 {
            bail!("default_page_size must be at least 1");
        }
        if query.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }

        Ok(AppConfig {
            db_dir,
            port,
            metrics_port,
            logging_level,
            query,
        })
    }

    pub fn jobs_db_path(&self) -> PathBuf {
        self.db_dir.join(JOBS_DB_FILE_NAME)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_dir(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.path().to_path_buf()),
            port: 5000,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            default_page_size: 10,
            max_pages: 10,
            monthly_stats_buckets: 6,
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("Headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_with_dir(&temp_dir), None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 5000);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Path);
        assert_eq!(config.query, QuerySettings::default());
        assert_eq!(config.jobs_db_path(), temp_dir.path().join("jobs.db"));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            ..cli_with_dir(&temp_dir)
        };
        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            port: Some(8080),
            logging_level: Some("body".to_string()),
            query: Some(QueryConfig {
                max_pages: Some(20),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 8080);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.query.max_pages, 20);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.query.default_page_size, 10);
        assert_eq!(config.query.monthly_stats_buckets, 6);

        let server_config = config.server_config();
        assert_eq!(server_config.port, 8080);
        assert_eq!(
            server_config.requests_logging_level,
            RequestsLoggingLevel::Body
        );
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            logging_level: Some("loud".to_string()),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("Invalid logging_level"));

        let cli = CliConfig {
            default_page_size: 0,
            ..cli_with_dir(&temp_dir)
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("default_page_size"));
    }
}
