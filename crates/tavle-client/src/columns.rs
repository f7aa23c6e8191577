use std::collections::HashSet;

use serde_json::Value;

use tavle_common::models::column::{
    renumber, sort_and_renumber, visible_first, ColumnDescriptor, ColumnUpdate, PersistedColumn,
    StoredColumn,
};
use tavle_common::models::options::WORKSPACE_KEY;

use crate::api::ReportClient;

/// Keeps the in-memory column model mirrored to the server-side preference
/// store under the `"workspace"` key.
///
/// The rendering widget reports layout changes in loose shapes (bare key
/// lists, full object lists); everything is normalized into
/// [`ColumnDescriptor`]s at this boundary before any ordering logic runs.
/// After every mutation the orders form a dense permutation of `[0, n)`
/// and the whole sequence is written back (full replace). Overlapping
/// writes are not sequenced against each other; the last write to complete
/// wins at the server.
pub struct ColumnSync {
    client: ReportClient,
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSync {
    pub fn new(client: ReportClient) -> Self {
        Self {
            client,
            columns: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Fetch and normalize the stored layout. Fail-soft: a missing key, a
    /// malformed blob, or a failed fetch all produce an empty set (the
    /// table renders unconfigured rather than crashing) and a warning.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> &[ColumnDescriptor] {
        self.columns = match self.client.option(WORKSPACE_KEY).await {
            Ok(Some(value)) => Self::normalize(value),
            Ok(None) => {
                tracing::warn!("No stored column workspace; starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load column workspace: {}", e);
                Vec::new()
            }
        };
        &self.columns
    }

    /// Toggle a column's visibility, then re-derive the total order:
    /// visible columns before hidden ones, ties broken by the previous
    /// order. An unknown key is logged and ignored.
    pub async fn set_visibility(&mut self, key: &str, visible: bool) -> &[ColumnDescriptor] {
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => column.visible = visible,
            None => {
                tracing::warn!("Ignoring visibility toggle for unknown column '{}'", key);
                return &self.columns;
            }
        }
        visible_first(&mut self.columns);
        self.persist().await;
        &self.columns
    }

    /// Apply a drag-and-drop result. Internal widget placeholders and
    /// unresolvable keys are dropped (logged, never an error); resolved
    /// columns keep the engine's current header, width, and visibility --
    /// the payload's own flags are never trusted. The result is exactly
    /// the resolved payload, renumbered densely.
    pub async fn set_order(&mut self, updates: Vec<ColumnUpdate>) -> &[ColumnDescriptor] {
        let mut reordered = Vec::with_capacity(updates.len());
        let mut seen = HashSet::new();

        for update in updates {
            let key = update.key();
            if update.is_internal() {
                tracing::debug!("Ignoring internal column '{}' in order update", key);
                continue;
            }
            if !seen.insert(key.to_string()) {
                tracing::warn!("Dropping duplicate column '{}' from order update", key);
                continue;
            }
            match self.columns.iter().find(|c| c.key == key) {
                Some(column) => reordered.push(column.clone()),
                None => {
                    tracing::warn!("Dropping unknown column '{}' from order update", key);
                }
            }
        }

        renumber(&mut reordered);
        self.columns = reordered;
        self.persist().await;
        &self.columns
    }

    /// Session-local width override; widths are never written back to the
    /// preference store.
    pub fn set_width(&mut self, key: &str, width: f64) {
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => column.width = Some(width),
            None => tracing::warn!("Ignoring width for unknown column '{}'", key),
        }
    }

    /// Overwrite the stored blob with the current sequence. A failed save
    /// is logged and the in-memory model stays as-is; the drift lasts
    /// until the next successful save.
    pub async fn persist(&self) {
        let payload: Vec<PersistedColumn> =
            self.columns.iter().map(|c| c.to_persisted()).collect();
        let value = serde_json::to_value(&payload).unwrap_or(Value::Null);
        if let Err(e) = self.client.set_option(WORKSPACE_KEY, value).await {
            tracing::error!("Failed to persist column workspace: {}", e);
        }
    }

    fn normalize(value: Value) -> Vec<ColumnDescriptor> {
        let entries = match value {
            Value::Array(entries) => entries,
            other => {
                tracing::warn!(
                    "Stored column workspace is not an array ({}); starting empty",
                    json_kind(&other)
                );
                return Vec::new();
            }
        };

        let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(entries.len());
        let mut seen = HashSet::new();
        for (position, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<StoredColumn>(entry) {
                Ok(stored) => {
                    if !seen.insert(stored.key.clone()) {
                        tracing::warn!("Dropping duplicate stored column '{}'", stored.key);
                        continue;
                    }
                    columns.push(stored.into_descriptor(position));
                }
                Err(e) => {
                    tracing::warn!("Dropping malformed column entry at position {}: {}", position, e);
                }
            }
        }

        // Sort by stored order, then renumber densely -- repairs drift
        // from prior partial writes
        sort_and_renumber(&mut columns);
        columns
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_applies_defaults_and_sorts() {
        let value = json!([
            {"key": "name", "order": 1, "visible": true},
            {"key": "age", "order": 0, "visible": false},
            {"key": "email"}
        ]);
        let columns = ColumnSync::normalize(value);

        let keys: Vec<_> = columns.iter().map(|c| c.key.as_str()).collect();
        // "email" had no order and takes its position (2)
        assert_eq!(keys, vec!["age", "name", "email"]);
        let orders: Vec<_> = columns.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(!columns[0].visible);
        assert!(columns[2].visible);
        assert_eq!(columns[2].header, "email");
    }

    #[test]
    fn test_normalize_repairs_duplicate_and_gapped_orders() {
        let value = json!([
            {"key": "a", "order": 0},
            {"key": "b", "order": 0},
            {"key": "c", "order": 5}
        ]);
        let columns = ColumnSync::normalize(value);
        let orders: Vec<_> = columns.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        let keys: Vec<_> = columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalize_drops_malformed_entries() {
        let value = json!([
            {"key": "a"},
            {"header": "no key"},
            "bare string",
            {"key": "a", "order": 9},
            {"key": "b"}
        ]);
        let columns = ColumnSync::normalize(value);
        let keys: Vec<_> = columns.iter().map(|c| c.key.as_str()).collect();
        // duplicate "a" and the two shapeless entries are gone
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_rejects_non_array_blob() {
        assert!(ColumnSync::normalize(json!({"key": "a"})).is_empty());
        assert!(ColumnSync::normalize(json!("workspace")).is_empty());
        assert!(ColumnSync::normalize(Value::Null).is_empty());
    }

    #[test]
    fn test_normalize_accepts_widths() {
        let value = json!([{"key": "a", "width": 120.5}]);
        let columns = ColumnSync::normalize(value);
        assert_eq!(columns[0].width, Some(120.5));
    }
}
