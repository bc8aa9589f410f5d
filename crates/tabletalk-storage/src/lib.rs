//! Tabletalk storage crate - SQLite data store, schema introspection and
//! demo-data seeding.

pub mod db;
pub mod introspect;
pub mod seed;
pub mod store;

pub use db::Database;
pub use introspect::introspect;
pub use seed::{seed_company, SeedPlan, SeedReport};
pub use store::{DataStore, RowSet};
