//! Model validation: every rule, filter and dependent must reference known tables and columns.

use crate::config::{column_kind, ColumnKind, EntityDef, Rule};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate_model(entities: &[&EntityDef]) -> Result<(), ConfigError> {
    let tables: HashSet<&str> = entities.iter().map(|e| e.table).collect();
    let mut path_segments = HashSet::new();

    for entity in entities {
        if !path_segments.insert(entity.path_segment) {
            return Err(ConfigError::DuplicatePathSegment(entity.path_segment.to_string()));
        }

        for f in entity.filters {
            if column_kind(entity, f.column).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "filter column",
                    id: format!("{}.{}", entity.table, f.column),
                });
            }
        }

        let columns: HashSet<&str> = entity.columns.iter().map(|c| c.name).collect();
        for rules in entity.create_rules.iter().chain(entity.update_rules) {
            if !columns.contains(rules.field) {
                return Err(ConfigError::MissingReference {
                    kind: "rule field",
                    id: format!("{}.{}", entity.table, rules.field),
                });
            }
            for rule in rules.rules {
                if let Rule::Unique { table, .. } | Rule::Exists { table, .. } = rule {
                    if !tables.contains(table) {
                        return Err(ConfigError::MissingReference {
                            kind: "table",
                            id: table.to_string(),
                        });
                    }
                }
            }
        }

        // Create rules must make every column required: columns are NOT NULL.
        for c in entity.columns {
            let required = entity
                .create_rules
                .iter()
                .any(|r| r.field == c.name && r.rules.contains(&Rule::Required));
            if !required {
                return Err(ConfigError::Validation(format!(
                    "{}.{} must be required on create",
                    entity.table, c.name
                )));
            }
            if let ColumnKind::Text { max_len: 0 } = c.kind {
                return Err(ConfigError::Validation(format!(
                    "{}.{} has zero length",
                    entity.table, c.name
                )));
            }
        }

        if entity.update_rules.iter().any(|r| r.rules.contains(&Rule::Required)) {
            return Err(ConfigError::Validation(format!(
                "{}: update rules must not require fields",
                entity.table
            )));
        }

        for d in entity.dependents {
            if !tables.contains(d.table) {
                return Err(ConfigError::MissingReference {
                    kind: "dependent table",
                    id: d.table.to_string(),
                });
            }
        }
    }

    Ok(())
}
