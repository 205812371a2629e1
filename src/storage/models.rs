use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories that have a listing page. Records may carry other tags too.
pub const KNOWN_CATEGORIES: [&str; 4] = ["fisica", "programacao", "robotica", "atividades"];

// Column widths carried over from the original schema.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 250;
pub const MAX_LOCATION_LEN: usize = 150;
pub const MAX_CATEGORY_LEN: usize = 50;

pub fn is_known_category(category: &str) -> bool {
    KNOWN_CATEGORIES.contains(&category)
}

/// A catalog entry stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Relative filename (local store) or absolute URL (S3)
    pub location: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Fields of a record before the repository assigns an id.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub name: String,
    pub description: String,
    pub location: String,
    pub category: String,
}

impl NewFileRecord {
    pub(crate) fn into_record(self, id: u64) -> FileRecord {
        FileRecord {
            id,
            name: self.name,
            description: self.description,
            location: self.location,
            category: self.category,
            created_at: Utc::now(),
        }
    }
}

impl FileRecord {
    /// SQL `LIKE '%term%'` on name or description. ASCII letters compare
    /// case-insensitively, as SQLite does.
    pub fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return false;
        }
        let needle = term.to_ascii_lowercase();
        self.name.to_ascii_lowercase().contains(&needle)
            || self.description.to_ascii_lowercase().contains(&needle)
    }
}
