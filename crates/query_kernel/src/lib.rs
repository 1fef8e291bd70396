//! Query Kernel - filter translation for the repository layer
//!
//! This crate turns loosely structured filter maps into query builder calls:
//! - `field` / `field:operator` predicates with an operator alias table
//! - `order`, `limit`, `offset` and `group` shape directives
//! - projections with recursively eager-loaded relations
//!
//! It performs no I/O. Adapters implement [`ports::QueryBuilder`] and execute
//! the configured query.

pub mod error;
pub mod operator;
pub mod order;
pub mod filter;
pub mod relation;
pub mod projection;
pub mod ports;
pub mod pagination;
pub mod translator;

pub use error::QueryError;
pub use operator::{Operator, UnknownOperatorPolicy};
pub use order::{parse_order, Direction, OrderClause};
pub use filter::{CompiledFilter, FilterSpec, Predicate};
pub use relation::{ModelMeta, ModelRegistry, RelationDescriptor, RelationKind};
pub use projection::{ProjectionEntry, ProjectionSpec, ResolvedProjection, ResolvedRelation};
pub use ports::{QueryBuilder, RelationResolver};
pub use pagination::{Page, PageDefaults, PageRequest, PageWindow, Paginator};
pub use translator::{QueryFilterTranslator, QueryPlan, TranslatorOptions};
