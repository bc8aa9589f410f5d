//! Build a [`SchemaFeed`] from the live database.

use tracing::info;

use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::schema::{ColumnDescriptor, SchemaFeed, TableDescriptor};

use crate::db::Database;

/// Describe every user table via `sqlite_master` and `PRAGMA table_info`.
///
/// Primary-key columns get the role `key`, everything else `dimension`.
pub fn introspect(db: &Database, default_schema: &str, dialect: &str) -> Result<SchemaFeed> {
    let tables = db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .map_err(|e| TabletalkError::Storage(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| TabletalkError::Storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TabletalkError::Storage(e.to_string()))?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let mut info = conn
                .prepare("SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid")
                .map_err(|e| TabletalkError::Storage(e.to_string()))?;
            let columns = info
                .query_map([&name], |row| {
                    let col: String = row.get(0)?;
                    let decl: String = row.get(1)?;
                    let pk: i64 = row.get(2)?;
                    Ok((col, decl, pk))
                })
                .map_err(|e| TabletalkError::Storage(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| TabletalkError::Storage(e.to_string()))?
                .into_iter()
                .map(|(col, decl, pk)| {
                    let role = if pk > 0 { "key" } else { "dimension" };
                    ColumnDescriptor::generated(&col, &decl, role)
                })
                .collect();
            tables.push(TableDescriptor::generated(&name, default_schema, columns));
        }
        Ok(tables)
    })?;

    info!(tables = tables.len(), "Schema introspected");
    Ok(SchemaFeed {
        default_schema: default_schema.to_string(),
        dialect: dialect.to_string(),
        tables,
    })
}
