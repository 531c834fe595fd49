//! Helvetia SQL: client layer for the Helvetia seeding tools
//!
//! Provides two client implementations:
//!
//! - **`EmbeddedClient`**: In-process tables with unique-key enforcement.
//!   Ideal for tests and for exercising the pipeline without a server.
//!
//! - **`MySqlClient`**: One session against MySQL or a Vitess VTGate.
//!
//! Both implement the `SqlClient` trait. Statements are built with
//! [`Select`], [`Insert`] and [`Delete`]; the [`literal`] module holds the
//! inline escaping used by the fast bulk path.
//!
//! # Quick Start
//!
//! ```rust
//! use helvetia_sql::{EmbeddedClient, Insert, Select, SqlClient, TableRef, TableSpec};
//!
//! #[tokio::main]
//! async fn main() {
//!     let table = TableRef::qualified("user_keyspace", "user");
//!     let client = EmbeddedClient::with_tables([
//!         TableSpec::new(table.clone(), &["id", "uid"]).unique(&["id"]),
//!     ]);
//!
//!     let mut insert = Insert::new(table.clone(), &["id", "uid"]);
//!     insert.push_row(vec![1i64.into(), "u0".into()]);
//!     client.insert(&insert).await.unwrap();
//!
//!     let rows = client.select(&Select::new(table, &["uid"])).await.unwrap();
//!     assert_eq!(rows[0].get_str("uid"), Some("u0"));
//! }
//! ```

pub mod client;
pub mod embedded;
pub mod error;
pub mod literal;
pub mod remote;
pub mod statement;
pub mod value;

pub use client::SqlClient;
pub use embedded::{EmbeddedClient, TableSpec};
pub use error::{ErrorKind, SqlError, SqlResult};
pub use remote::{ConnectionConfig, MySqlClient};
pub use statement::{quote_ident, Delete, Insert, OnConflict, Select, TableRef, MAX_PLACEHOLDERS};
pub use value::{Row, SqlValue};
