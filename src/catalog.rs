use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRecord {
    pub title: String,
    pub link: String,
}

impl BookRecord {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Immutable, ordered list of records loaded once at startup.
///
/// There are no mutating methods; once built, a store is shared behind an
/// `Arc` and only read.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    records: Vec<BookRecord>,
    fingerprint: String,
}

impl CatalogStore {
    pub fn from_records(records: Vec<BookRecord>) -> Self {
        let mut hasher = Sha256::new();
        for r in &records {
            hasher.update(r.title.as_bytes());
            hasher.update([0u8]);
            hasher.update(r.link.as_bytes());
            hasher.update([b'\n']);
        }
        Self {
            records,
            fingerprint: hex::encode(hasher.finalize()),
        }
    }

    /// Loads a catalog from a delimited file with a `title` and `link` header.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| CatalogError::CatalogLoad {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Reads rows by header name. A row without a `title` or `link` field is
    /// logged and skipped; the rest of the catalog still loads.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> CatalogResult<Self> {
        let load_err = |message: String| CatalogError::CatalogLoad {
            source_name: source_name.to_string(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().map_err(|e| load_err(e.to_string()))?;
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| load_err(format!("missing required column `{name}`")))
        };
        let title_col = column("title")?;
        let link_col = column("link")?;

        let mut records = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let line = idx + 2;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(
                        source = source_name,
                        line,
                        error = %e,
                        "skipping unreadable catalog row"
                    );
                    continue;
                }
            };
            match (row.get(title_col), row.get(link_col)) {
                (Some(title), Some(link)) => records.push(BookRecord::new(title, link)),
                _ => tracing::warn!(
                    source = source_name,
                    line,
                    fields = row.len(),
                    "skipping catalog row without title or link"
                ),
            }
        }

        Ok(Self::from_records(records))
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hex SHA-256 over every record, used to tell catalog revisions apart.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
