//! Repository configuration
//!
//! Settings are read from `REPO_`-prefixed environment variables, with `__`
//! separating nested sections, after loading a `.env` file when present:
//!
//! * `REPO_DATABASE__URL` - PostgreSQL connection string
//! * `REPO_DATABASE__MAX_CONNECTIONS` - Pool size (default: 10)
//! * `REPO_TRANSLATOR__UNKNOWN_OPERATOR` - `verbatim`, `equality` or `reject` (default: verbatim)
//! * `REPO_PAGINATION__PAGE_SIZE` - Default page size (default: 10)
//! * `REPO_PAGINATION__MAX_PAGE_SIZE` - Upper bound on requested page sizes (default: 1000)
//! * `REPO_LOG_LEVEL` - Log filter for binaries and test harnesses (default: info)

use query_kernel::{PageDefaults, TranslatorOptions};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::pool::DatabaseConfig;

pub const ENV_PREFIX: &str = "REPO";

/// Complete configuration for a repository deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub database: DatabaseConfig,
    pub translator: TranslatorOptions,
    pub pagination: PageDefaults,
    pub log_level: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            translator: TranslatorOptions::default(),
            pagination: PageDefaults::default(),
            log_level: "info".to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Loads configuration from the environment
    pub fn from_env() -> Result<Self, DatabaseError> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    /// Loads configuration from an arbitrary `config` source
    pub fn from_source<S>(source: S) -> Result<Self, DatabaseError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_kernel::UnknownOperatorPolicy;

    #[test]
    fn test_defaults() {
        let config = RepositoryConfig::default();
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.translator.unknown_operator, UnknownOperatorPolicy::Verbatim);
    }

    #[test]
    fn test_load_from_json_source() {
        let source = config::File::from_str(
            r#"{
                "database": { "url": "postgres://db/app", "max_connections": 4 },
                "translator": { "unknown_operator": "reject" },
                "pagination": { "max_page_size": 50 }
            }"#,
            config::FileFormat::Json,
        );

        let config = RepositoryConfig::from_source(source).unwrap();

        assert_eq!(config.database.url, "postgres://db/app");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.translator.unknown_operator, UnknownOperatorPolicy::Reject);
        assert_eq!(config.pagination.max_page_size, 50);
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.log_level, "info");
    }
}
