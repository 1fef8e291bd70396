//! Infrastructure Database Layer
//!
//! This crate executes filter-driven repository operations on PostgreSQL
//! using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. `query_kernel` translates filter
//! maps and projections into calls on its `QueryBuilder` port; this crate
//! provides the port's PostgreSQL implementation and runs the result.
//!
//! - [`builder`]: `PgQueryBuilder`, rendering predicates, shape and projection to SQL
//! - [`execute`]: terminal executors (`first`, `get`, `count`, `paginate`,
//!   `update`, `delete`) and eager-load stitching
//! - [`repository`]: `Repository`, binding a model to a pool and translator
//! - [`config`] / [`pool`]: environment-driven configuration and pool creation
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, RecordStore, Repository, RepositoryConfig};
//!
//! let config = RepositoryConfig::from_env()?;
//! let pool = create_pool(&config.database).await?;
//! let users = Repository::from_config(pool, registry, "user", &config)?;
//! let user = users.fetch_one(&42.into(), &ProjectionSpec::new()).await?;
//! ```

pub mod pool;
pub mod error;
pub mod config;
pub mod sql;
pub mod builder;
pub mod execute;
pub mod repository;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, DatabaseConfig};
pub use error::DatabaseError;
pub use config::RepositoryConfig;
pub use builder::{EagerLoad, PgQueryBuilder};
pub use execute::Record;
pub use repository::{RecordStore, Repository, SaveOutcome};
