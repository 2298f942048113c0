//! Sequential publishing of letter pages and the resulting catalog index.
//!
//! Pages are created one at a time with a fixed pause between calls, since
//! the page service applies its own flood control. A failed page is logged and
//! skipped; only a failed session setup aborts the run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};
use crate::page::PageDraft;
use crate::partition::{Letter, LetterGroup};

pub const DEFAULT_PUBLISH_DELAY: Duration = Duration::from_secs(10);

/// External page hosting service.
pub trait PageService {
    /// Opens an authoring session and returns its access token.
    fn create_account(&self, short_name: &str, author_name: &str) -> CatalogResult<String>;

    /// Creates a page and returns its path relative to the page base URL.
    fn create_page(&self, access_token: &str, page: &PageRequest<'_>) -> CatalogResult<String>;
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub draft: &'a PageDraft,
    pub author_name: &'a str,
    pub author_url: &'a str,
}

/// Waits between successive page creations.
pub trait Pacer {
    fn pause(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub short_name: String,
    pub account_author: String,
    pub page_author: String,
    pub page_author_url: String,
    pub title_prefix: String,
    pub page_base_url: String,
    pub delay: Duration,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            short_name: "MoonRead".to_string(),
            account_author: "Moon Read Catalog".to_string(),
            page_author: "Moon Read".to_string(),
            page_author_url: "https://t.me/moon_read".to_string(),
            title_prefix: "Moon Read Catalog".to_string(),
            page_base_url: "https://telegra.ph/".to_string(),
            delay: DEFAULT_PUBLISH_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub url: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRow {
    pub letter: Letter,
    pub url: String,
    pub count: usize,
}

/// Letter to published page mapping. Sparse: letters whose page failed to
/// publish have no entry. Built once by [`Publisher::publish_all`], read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogIndex {
    entries: BTreeMap<Letter, IndexEntry>,
}

impl CatalogIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = (Letter, IndexEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, letter: Letter) -> Option<&IndexEntry> {
        self.entries.get(&letter)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in publish order: letters ascending, `#` last.
    pub fn rows(&self) -> Vec<IndexRow> {
        self.entries
            .iter()
            .map(|(letter, entry)| IndexRow {
                letter: *letter,
                url: entry.url.clone(),
                count: entry.count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishFailure {
    pub letter: Letter,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub index: CatalogIndex,
    pub failures: Vec<PublishFailure>,
}

impl PublishReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Observes each page outcome as the run progresses.
pub trait PublishObserver {
    fn on_page(&self, _letter: Letter, _outcome: &CatalogResult<IndexEntry>) {}
}

impl PublishObserver for () {}

pub struct Publisher<'a, S: PageService, P: Pacer> {
    service: &'a S,
    pacer: &'a P,
    settings: &'a PublishSettings,
}

impl<'a, S: PageService, P: Pacer> Publisher<'a, S, P> {
    pub fn new(service: &'a S, pacer: &'a P, settings: &'a PublishSettings) -> Self {
        Self {
            service,
            pacer,
            settings,
        }
    }

    /// Opens one session, then publishes every group in the given order.
    ///
    /// Only a session failure is returned as an error; per-page failures are
    /// collected into the report.
    pub fn publish_all(
        &self,
        groups: &[LetterGroup<'_>],
        observer: &dyn PublishObserver,
    ) -> CatalogResult<PublishReport> {
        let token = self
            .service
            .create_account(&self.settings.short_name, &self.settings.account_author)
            .map_err(|e| match e {
                CatalogError::SessionInit { .. } => e,
                other => CatalogError::SessionInit {
                    message: other.to_string(),
                },
            })?;

        let outcomes = groups.iter().enumerate().map(|(i, group)| {
            let outcome = self.publish_group(&token, group);
            observer.on_page(group.letter, &outcome);
            if i + 1 < groups.len() {
                self.pacer.pause(self.settings.delay);
            }
            (group.letter, outcome)
        });

        Ok(collect_outcomes(outcomes))
    }

    fn publish_group(&self, token: &str, group: &LetterGroup<'_>) -> CatalogResult<IndexEntry> {
        let draft = PageDraft::for_group(&self.settings.title_prefix, group);
        let request = PageRequest {
            draft: &draft,
            author_name: &self.settings.page_author,
            author_url: &self.settings.page_author_url,
        };
        let path = self
            .service
            .create_page(token, &request)
            .map_err(|e| CatalogError::Publish {
                letter: group.letter.to_string(),
                message: match e {
                    CatalogError::Publish { message, .. } => message,
                    other => other.to_string(),
                },
            })?;

        match path.trim_start_matches('/') {
            "" => Err(CatalogError::Publish {
                letter: group.letter.to_string(),
                message: "page service returned an empty path".to_string(),
            }),
            path => Ok(IndexEntry {
                url: format!("{}{path}", self.settings.page_base_url),
                count: group.len(),
            }),
        }
    }
}

/// Folds per-letter outcomes into the index and the failure list.
pub fn collect_outcomes(
    outcomes: impl IntoIterator<Item = (Letter, CatalogResult<IndexEntry>)>,
) -> PublishReport {
    let mut entries = Vec::new();
    let mut failures = Vec::new();
    for (letter, outcome) in outcomes {
        match outcome {
            Ok(entry) => {
                tracing::info!(%letter, count = entry.count, url = %entry.url, "published page");
                entries.push((letter, entry));
            }
            Err(e) => {
                tracing::error!(%letter, error = %e, "failed to publish page");
                failures.push(PublishFailure {
                    letter,
                    message: e.to_string(),
                });
            }
        }
    }
    let report = PublishReport {
        index: CatalogIndex::from_entries(entries),
        failures,
    };
    tracing::info!(
        published = report.index.len(),
        failed = report.failures.len(),
        "publish run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BookRecord;
    use crate::partition::partition;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakePageService {
        fail_account: bool,
        fail_titles: Vec<String>,
        calls: RefCell<Vec<String>>,
    }

    impl PageService for FakePageService {
        fn create_account(&self, short_name: &str, _author_name: &str) -> CatalogResult<String> {
            self.calls.borrow_mut().push(format!("account:{short_name}"));
            if self.fail_account {
                return Err(CatalogError::SessionInit {
                    message: "refused".to_string(),
                });
            }
            Ok("token".to_string())
        }

        fn create_page(&self, access_token: &str, page: &PageRequest<'_>) -> CatalogResult<String> {
            assert_eq!(access_token, "token");
            let title = page.draft.title.clone();
            self.calls.borrow_mut().push(format!("page:{title}"));
            if self.fail_titles.contains(&title) {
                return Err(CatalogError::Transport {
                    message: "flood wait".to_string(),
                });
            }
            Ok(title.replace(' ', "-"))
        }
    }

    #[derive(Default)]
    struct RecordingPacer {
        pauses: RefCell<Vec<Duration>>,
    }

    impl Pacer for RecordingPacer {
        fn pause(&self, delay: Duration) {
            self.pauses.borrow_mut().push(delay);
        }
    }

    fn settings() -> PublishSettings {
        PublishSettings {
            title_prefix: "Cat".to_string(),
            page_base_url: "https://pages.test/".to_string(),
            ..PublishSettings::default()
        }
    }

    fn catalog() -> Vec<BookRecord> {
        vec![
            BookRecord::new("Apple", "u1"),
            BookRecord::new("Banana", "u2"),
            BookRecord::new("Cherry", "u3"),
            BookRecord::new("avocado", "u4"),
        ]
    }

    #[test]
    fn failed_letter_does_not_abort_remaining_pages() -> anyhow::Result<()> {
        let records = catalog();
        let groups = partition(&records);
        let service = FakePageService {
            fail_titles: vec!["Cat - B".to_string()],
            ..Default::default()
        };
        let pacer = RecordingPacer::default();
        let settings = settings();

        let report = Publisher::new(&service, &pacer, &settings).publish_all(&groups, &())?;

        assert!(report.is_partial());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].letter, Letter::Alpha('B'));
        assert_eq!(
            report.index.get(Letter::Alpha('A')),
            Some(&IndexEntry {
                url: "https://pages.test/Cat---A".to_string(),
                count: 2
            })
        );
        assert!(report.index.get(Letter::Alpha('B')).is_none());
        assert_eq!(report.index.get(Letter::Alpha('C')).map(|e| e.count), Some(1));
        Ok(())
    }

    #[test]
    fn pages_are_created_in_order_with_pause_between_calls_only() -> anyhow::Result<()> {
        let records = catalog();
        let groups = partition(&records);
        let service = FakePageService::default();
        let pacer = RecordingPacer::default();
        let settings = settings();

        Publisher::new(&service, &pacer, &settings).publish_all(&groups, &())?;

        assert_eq!(
            *service.calls.borrow(),
            vec!["account:MoonRead", "page:Cat - A", "page:Cat - B", "page:Cat - C"]
        );
        assert_eq!(*pacer.pauses.borrow(), vec![DEFAULT_PUBLISH_DELAY; 2]);
        Ok(())
    }

    #[test]
    fn failed_page_still_pauses_before_next() -> anyhow::Result<()> {
        let records = catalog();
        let groups = partition(&records);
        let service = FakePageService {
            fail_titles: vec!["Cat - A".to_string()],
            ..Default::default()
        };
        let pacer = RecordingPacer::default();
        let settings = settings();

        Publisher::new(&service, &pacer, &settings).publish_all(&groups, &())?;
        assert_eq!(pacer.pauses.borrow().len(), 2);
        Ok(())
    }

    #[test]
    fn session_failure_aborts_before_any_page() {
        let records = catalog();
        let groups = partition(&records);
        let service = FakePageService {
            fail_account: true,
            ..Default::default()
        };
        let pacer = RecordingPacer::default();
        let settings = settings();

        let err = Publisher::new(&service, &pacer, &settings)
            .publish_all(&groups, &())
            .unwrap_err();
        assert!(matches!(err, CatalogError::SessionInit { .. }));
        assert_eq!(service.calls.borrow().len(), 1);
        assert!(pacer.pauses.borrow().is_empty());
    }

    #[test]
    fn index_rows_follow_publish_order() {
        let index = CatalogIndex::from_entries([
            (
                Letter::Other,
                IndexEntry {
                    url: "u#".to_string(),
                    count: 1,
                },
            ),
            (
                Letter::Alpha('A'),
                IndexEntry {
                    url: "uA".to_string(),
                    count: 3,
                },
            ),
        ]);
        let rows: Vec<(String, String, usize)> = index
            .rows()
            .into_iter()
            .map(|r| (r.letter.to_string(), r.url, r.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A".to_string(), "uA".to_string(), 3),
                ("#".to_string(), "u#".to_string(), 1)
            ]
        );
    }
}
