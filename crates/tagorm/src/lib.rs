//! # tagorm
//!
//! Attribute-driven SQL mapping for Postgres.
//!
//! Record structs describe their columns with `#[record(...)]` attributes. From that
//! metadata tagorm renders SELECT column lists (with `COALESCE` defaults), JOIN
//! clauses, INSERT column/value pairs and UPDATE assignments, caches the per-type
//! metadata, and runs the resulting statements through a small CRUD facade.
//!
//! ## Records
//!
//! ```ignore
//! use tagorm::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Audit {
//!     #[record(column = "users.created_by")]
//!     created_by: Option<i64>,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[record(column = "users.id")]
//!     id: i64,
//!     #[record(column = "users.status", default = "active")]
//!     status: String,
//!     #[record(column = "teams.name", join = "LEFT JOIN teams ON teams.id = users.team_id")]
//!     team: Option<String>,
//!     // No attribute: flattened in place.
//!     audit: Audit,
//!     #[record(skip)]
//!     scratch: Vec<u8>,
//! }
//! ```
//!
//! ## Facade
//!
//! ```ignore
//! use tagorm::{Condition, Db, DbConfig, SelectOptions};
//!
//! let db = Db::new(tagorm::create_pool(&database_url)?, DbConfig::from_env()?);
//!
//! let id = db.create("users", &user, true).await?;
//! let user: User = db.get_one("users", &[Condition::eq("users.id", id)?]).await?;
//! let page: Vec<User> = db
//!     .get_all("users", &SelectOptions::new().order_by("users.id").limit(20))
//!     .await?;
//! db.update("users", "id", id, &user).await?;
//! db.delete("users", "id", id).await?;
//! ```
//!
//! ## Logging
//!
//! Statements are logged through `tracing` under the `tagorm.sql` target (debug on
//! execution, error on failure). Cache population is logged at trace level under
//! `tagorm.cache`.

pub mod bind;
pub mod cache;
pub mod client;
pub mod condition;
pub mod config;
pub mod db;
pub mod error;
pub mod field;
pub mod ident;
pub mod record;
pub mod row;
pub mod sql;
pub mod value;

pub use bind::{BindStyle, bind_named};
pub use cache::FieldCache;
pub use client::DbHandle;
pub use condition::Condition;
pub use config::DbConfig;
pub use db::{Db, SelectOptions};
pub use error::{DbError, DbResult, OrmError, OrmResult};
pub use field::{Assignment, ColumnValues, FieldDescriptor, NamedInsert};
pub use ident::Ident;
pub use record::{Record, RecordKey, RecordSource};
pub use row::{FromRow, RowExt};
pub use sql::{Sql, sql};
pub use value::{IntoValue, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "derive")]
pub use tagorm_derive::Record;

// Re-exported for generated code and callers implementing `DbHandle`.
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use deadpool_postgres;
