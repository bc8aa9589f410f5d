//! Schema feed: the table/column description used to ground query synthesis.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TabletalkError};

/// Whole-database description, serialized as YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFeed {
    pub default_schema: String,
    pub dialect: String,
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub schema: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub role: String,
    pub description: String,
    /// Default aggregation, `sum` for integer and decimal columns.
    #[serde(default)]
    pub agg: Option<String>,
}

impl TableDescriptor {
    /// Describe a table with generated title and description text.
    pub fn generated(name: &str, schema: &str, columns: Vec<ColumnDescriptor>) -> Self {
        let spaced = name.replace('_', " ");
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
            title: title_case(&spaced),
            description: format!("Table containing {} data.", spaced),
            columns,
        }
    }
}

impl ColumnDescriptor {
    /// Describe a column from its declared SQL type.
    pub fn generated(name: &str, declared_type: &str, role: &str) -> Self {
        let data_type = declared_type.to_uppercase();
        let agg = (data_type.contains("INT") || data_type.contains("DECIMAL"))
            .then(|| "sum".to_string());
        Self {
            name: name.to_string(),
            data_type,
            role: role.to_string(),
            description: format!("Column for {}.", name.replace('_', " ")),
            agg,
        }
    }
}

impl SchemaFeed {
    pub fn new(default_schema: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self {
            default_schema: default_schema.into(),
            dialect: dialect.into(),
            tables: Vec::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let feed: SchemaFeed = serde_yaml::from_str(&content)?;
        info!(tables = feed.tables.len(), "Schema feed loaded from {}", path.display());
        Ok(feed)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_yaml()?)?;
        info!(tables = self.tables.len(), "Schema feed written to {}", path.display());
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| TabletalkError::Schema(e.to_string()))
    }

    /// Text embedded in the synthesis prompt. Same as the YAML form.
    pub fn to_prompt_text(&self) -> Result<String> {
        self.to_yaml()
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
