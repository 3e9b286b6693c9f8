use crate::model::{Component, ComponentType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted projection of a [`Component`].
///
/// `component_type` is stored as its textual form; rows carrying a value
/// this build does not know are dropped at mapping time rather than
/// failing the whole query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbComponentRow {
    pub component_name: String,
    pub package_name: String,
    pub simple_name: String,
    pub component_type: String,
    pub exported: bool,
    pub pm_blocked: bool,
    pub ifw_blocked: bool,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl DbComponentRow {
    pub fn into_component(self) -> Option<Component> {
        let component_type = ComponentType::parse(&self.component_type)?;
        Some(Component {
            package_name: self.package_name,
            component_name: self.component_name,
            simple_name: self.simple_name,
            component_type,
            exported: self.exported,
            pm_blocked: self.pm_blocked,
            ifw_blocked: self.ifw_blocked,
            description: self.description,
        })
    }
}

pub(crate) fn rows_into_components(rows: Vec<DbComponentRow>) -> Vec<Component> {
    rows.into_iter()
        .filter_map(DbComponentRow::into_component)
        .collect()
}
