pub mod config;
pub mod error;
pub mod frame;
pub mod safety;
pub mod schema;

pub use config::TabletalkConfig;
pub use error::{Result, TabletalkError};
pub use frame::{Column, ColumnType, TabularFrame, Value};
pub use safety::{GateDecision, QueryGate};
pub use schema::{ColumnDescriptor, SchemaFeed, TableDescriptor};
