use serde::{Deserialize, Serialize};

/// Keys starting with this prefix belong to the rendering widget itself
/// (selection handles, row expanders) and never enter the column model.
pub const INTERNAL_COLUMN_PREFIX: &str = "_";

/// One table column as the client knows it.
///
/// `order` is dense and zero-based across visible and hidden columns
/// combined; every mutation re-establishes that invariant. `width` is a
/// session-local override and is stripped from the persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub header: String,
    pub order: usize,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl ColumnDescriptor {
    /// Create a fresh descriptor for a field key, with a humanized header.
    pub fn new(key: &str, order: usize) -> Self {
        Self {
            key: key.to_string(),
            header: humanize_header(key),
            order,
            visible: true,
            width: None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.key.starts_with(INTERNAL_COLUMN_PREFIX)
    }

    /// The wire form written to the preference store.
    pub fn to_persisted(&self) -> PersistedColumn {
        PersistedColumn {
            key: self.key.clone(),
            header: self.header.clone(),
            visible: self.visible,
            order: self.order,
        }
    }
}

/// Serialized column layout entry: exactly the four fields the preference
/// store holds, nothing session-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedColumn {
    pub key: String,
    pub header: String,
    pub visible: bool,
    pub order: usize,
}

/// One entry of a stored workspace blob as read back from the server.
/// Everything but `key` may be absent in blobs written by older clients.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredColumn {
    pub key: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub order: Option<usize>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub width: Option<f64>,
}

impl StoredColumn {
    /// Normalize into a descriptor. `position` is the entry's index in the
    /// incoming sequence and stands in for a missing `order`.
    pub fn into_descriptor(self, position: usize) -> ColumnDescriptor {
        let header = match self.header {
            Some(h) if !h.is_empty() => h,
            _ => self.key.clone(),
        };
        ColumnDescriptor {
            header,
            order: self.order.unwrap_or(position),
            visible: self.visible.unwrap_or(true),
            width: self.width,
            key: self.key,
        }
    }
}

/// A column mentioned in a reorder payload. The widget reports order
/// changes either as bare key strings or as full column objects; only the
/// key matters, the engine re-resolves everything else from its own state.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColumnUpdate {
    Key(String),
    Descriptor(ColumnRef),
}

/// Object-shaped reorder entry; extra widget fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRef {
    pub key: String,
}

impl ColumnUpdate {
    pub fn key(&self) -> &str {
        match self {
            ColumnUpdate::Key(k) => k,
            ColumnUpdate::Descriptor(d) => &d.key,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.key().starts_with(INTERNAL_COLUMN_PREFIX)
    }
}

impl From<&str> for ColumnUpdate {
    fn from(key: &str) -> Self {
        ColumnUpdate::Key(key.to_string())
    }
}

/// "first_name" -> "First Name"
pub fn humanize_header(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reassign dense orders `0..n` following the slice's current sequence.
pub fn renumber(columns: &mut [ColumnDescriptor]) {
    for (index, column) in columns.iter_mut().enumerate() {
        column.order = index;
    }
}

/// Stable sort by stored `order`, then renumber densely. Repairs gaps and
/// duplicates accumulated from partial writes.
pub fn sort_and_renumber(columns: &mut [ColumnDescriptor]) {
    columns.sort_by_key(|c| c.order);
    renumber(columns);
}

/// Derive the total order that places visible columns before hidden ones,
/// ties broken by the previous order, then renumber densely.
pub fn visible_first(columns: &mut [ColumnDescriptor]) {
    columns.sort_by_key(|c| (!c.visible, c.order));
    renumber(columns);
}
