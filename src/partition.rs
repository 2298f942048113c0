//! Groups catalog records by the normalized first character of their title.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::BookRecord;

/// Group key: an uppercased alphabetic lead character, or the `#` catch-all.
///
/// The derived ordering is the publish order: letters ascending, `#` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Letter {
    Alpha(char),
    Other,
}

impl Letter {
    pub fn of_title(title: &str) -> Self {
        let Some(first) = title.chars().next() else {
            return Letter::Other;
        };
        let upper = first.to_uppercase().next().unwrap_or(first);
        if upper.is_alphabetic() {
            Letter::Alpha(upper)
        } else {
            Letter::Other
        }
    }

    /// Human-readable label used in page titles.
    pub fn label(&self) -> String {
        match self {
            Letter::Alpha(c) => c.to_string(),
            Letter::Other => "Numbers & Special".to_string(),
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Letter::Alpha(c) => write!(f, "{c}"),
            Letter::Other => f.write_str("#"),
        }
    }
}

impl Serialize for Letter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterGroup<'a> {
    pub letter: Letter,
    pub records: Vec<&'a BookRecord>,
}

impl LetterGroup<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Partitions records into letter groups, returned in publish order.
///
/// Records keep their catalog order inside each group, and every record lands
/// in exactly one group.
pub fn partition(records: &[BookRecord]) -> Vec<LetterGroup<'_>> {
    let mut groups: BTreeMap<Letter, Vec<&BookRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(Letter::of_title(&record.title))
            .or_default()
            .push(record);
    }
    groups
        .into_iter()
        .map(|(letter, records)| LetterGroup { letter, records })
        .collect()
}
