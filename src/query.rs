//! Read-only queries over the catalog and the published index.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::catalog::BookRecord;
use crate::error::{CatalogError, CatalogResult};
use crate::publish::{CatalogIndex, IndexRow};

pub const SEARCH_DISPLAY_LIMIT: usize = 20;

/// A validated, lowercased search keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword(String);

impl Keyword {
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::EmptyKeyword);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Joins command arguments with single spaces, as typed after `/search`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> CatalogResult<Self> {
        let joined = args
            .iter()
            .map(AsRef::as_ref)
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self::parse(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults<'a> {
    pub keyword: String,
    pub total: usize,
    pub shown: Vec<&'a BookRecord>,
}

impl SearchResults<'_> {
    /// Matches beyond the display limit.
    pub fn more(&self) -> usize {
        self.total - self.shown.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.more() > 0
    }

    pub fn overflow_note(&self) -> Option<String> {
        self.is_truncated().then(|| format!("{} more", self.more()))
    }
}

/// Case-insensitive substring search over titles, in catalog order.
pub fn search<'a>(records: &'a [BookRecord], keyword: &Keyword) -> SearchResults<'a> {
    let mut total = 0usize;
    let mut shown = Vec::new();
    for record in records {
        if record.title.to_lowercase().contains(keyword.as_str()) {
            total += 1;
            if shown.len() < SEARCH_DISPLAY_LIMIT {
                shown.push(record);
            }
        }
    }
    SearchResults {
        keyword: keyword.as_str().to_string(),
        total,
        shown,
    }
}

pub fn random_pick<'a, R: Rng + ?Sized>(
    records: &'a [BookRecord],
    rng: &mut R,
) -> CatalogResult<&'a BookRecord> {
    records.choose(rng).ok_or(CatalogError::EmptyCatalog)
}

/// Populated letters in publish order. `None` means publishing has not
/// finished yet.
pub fn list_index(index: Option<&CatalogIndex>) -> CatalogResult<Vec<IndexRow>> {
    match index {
        Some(index) if !index.is_empty() => Ok(index.rows()),
        _ => Err(CatalogError::IndexNotReady),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Letter;
    use crate::publish::IndexEntry;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn titles(results: &SearchResults<'_>) -> Vec<String> {
        results.shown.iter().map(|r| r.title.clone()).collect()
    }

    #[test]
    fn search_matches_case_insensitively_in_catalog_order() -> anyhow::Result<()> {
        let records = vec![
            BookRecord::new("Tempest Rising", "u1"),
            BookRecord::new("Romance Tale", "u2"),
            BookRecord::new("The Tempest", "u3"),
        ];
        let results = search(&records, &Keyword::parse("tempest")?);
        assert_eq!(titles(&results), vec!["Tempest Rising", "The Tempest"]);
        assert_eq!(results.total, 2);
        assert_eq!(results.overflow_note(), None);
        Ok(())
    }

    #[test]
    fn search_caps_display_and_reports_overflow() -> anyhow::Result<()> {
        let records: Vec<BookRecord> = (0..25)
            .map(|i| BookRecord::new(format!("Villainess Vol {i}"), format!("u{i}")))
            .collect();
        let results = search(&records, &Keyword::parse("VILLAINESS")?);
        assert_eq!(results.total, 25);
        assert_eq!(results.shown.len(), 20);
        assert_eq!(results.shown[19].title, "Villainess Vol 19");
        assert_eq!(results.overflow_note().as_deref(), Some("5 more"));
        Ok(())
    }

    #[test]
    fn search_without_match_is_empty_not_error() -> anyhow::Result<()> {
        let records = vec![BookRecord::new("Moon", "u1")];
        let results = search(&records, &Keyword::parse("xyz-no-match")?);
        assert_eq!(results.total, 0);
        assert!(results.shown.is_empty());
        assert!(!results.is_truncated());
        Ok(())
    }

    #[test]
    fn empty_keyword_is_rejected() {
        assert!(matches!(Keyword::parse(""), Err(CatalogError::EmptyKeyword)));
        assert!(matches!(Keyword::parse("   "), Err(CatalogError::EmptyKeyword)));
        assert!(matches!(
            Keyword::from_args::<&str>(&[]),
            Err(CatalogError::EmptyKeyword)
        ));
    }

    #[test]
    fn keyword_from_args_joins_with_spaces() -> anyhow::Result<()> {
        let kw = Keyword::from_args(&["Villainess", "Tempest"])?;
        assert_eq!(kw.as_str(), "villainess tempest");
        Ok(())
    }

    #[test]
    fn random_pick_on_empty_catalog_fails() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            random_pick(&[], &mut rng),
            Err(CatalogError::EmptyCatalog)
        ));
    }

    #[test]
    fn random_pick_single_record_is_deterministic() -> anyhow::Result<()> {
        let records = vec![BookRecord::new("Only", "u1")];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(random_pick(&records, &mut rng)?.title, "Only");
        }
        Ok(())
    }

    #[test]
    fn random_pick_reaches_every_record() -> anyhow::Result<()> {
        let records: Vec<BookRecord> = (0..4)
            .map(|i| BookRecord::new(format!("B{i}"), format!("u{i}")))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(random_pick(&records, &mut rng)?.title.clone());
        }
        assert_eq!(seen.len(), 4);
        Ok(())
    }

    #[test]
    fn list_index_before_publish_is_not_ready() {
        assert!(matches!(list_index(None), Err(CatalogError::IndexNotReady)));
        let empty = CatalogIndex::default();
        assert!(matches!(
            list_index(Some(&empty)),
            Err(CatalogError::IndexNotReady)
        ));
    }

    #[test]
    fn list_index_returns_letters_with_catch_all_last() -> anyhow::Result<()> {
        let index = CatalogIndex::from_entries([
            (
                Letter::Other,
                IndexEntry {
                    url: "https://telegra.ph/hash".to_string(),
                    count: 1,
                },
            ),
            (
                Letter::Alpha('A'),
                IndexEntry {
                    url: "https://telegra.ph/a".to_string(),
                    count: 3,
                },
            ),
        ]);
        let rows = list_index(Some(&index))?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].letter, Letter::Alpha('A'));
        assert_eq!(rows[0].url, "https://telegra.ph/a");
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[1].letter, Letter::Other);
        assert_eq!(rows[1].count, 1);
        Ok(())
    }
}
