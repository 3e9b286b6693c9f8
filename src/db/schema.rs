//! SQL DDL for initializing the component cache schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `app_component` table (one row per declared entry point, keyed by the
///   globally unique component name)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Component cache (persisted shadow of the live component graph)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS app_component (
    component_name TEXT PRIMARY KEY NOT NULL,
    package_name TEXT NOT NULL,
    simple_name TEXT NOT NULL,
    component_type TEXT NOT NULL, -- activity | service | receiver | provider
    exported INTEGER NOT NULL DEFAULT 0,
    pm_blocked INTEGER NOT NULL DEFAULT 0,
    ifw_blocked INTEGER NOT NULL DEFAULT 0,
    description TEXT NULL,
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_app_component_package ON app_component(package_name);
CREATE INDEX IF NOT EXISTS idx_app_component_package_type ON app_component(package_name, component_type);
"#;
