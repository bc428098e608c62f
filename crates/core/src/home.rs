//! Homepage sections, fetched together and reused for an hour.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::book::Book;
use crate::cache::{Clock, SystemClock};
use crate::catalog::CatalogClient;
use crate::metrics::PERSIST_FAILURES;
use crate::store::{keys, load_json, save_json, KeyValueStore};

/// Books fetched per homepage section.
pub const SECTION_SIZE: u32 = 8;

/// Kids books shown at once.
pub const KIDS_SHOWN: usize = 4;

/// Age filter value meaning "every age group".
pub const ALL_AGES: &str = "all";

/// The four homepage sections plus when they were fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSnapshot {
    #[serde(default)]
    pub featured: Vec<Book>,
    #[serde(default)]
    pub fiction: Vec<Book>,
    #[serde(default)]
    pub science: Vec<Book>,
    #[serde(default)]
    pub kids: Vec<Book>,
    pub fetched_at: DateTime<Utc>,
}

impl HomeSnapshot {
    /// Up to four kids books in `age_group` (`"all"` for any).
    pub fn kids_for_age(&self, age_group: &str) -> Vec<Book> {
        self.kids
            .iter()
            .filter(|book| age_group == ALL_AGES || book.age_group.as_deref() == Some(age_group))
            .take(KIDS_SHOWN)
            .cloned()
            .collect()
    }
}

/// Loads homepage sections, preferring a recent stored snapshot.
pub struct HomeFeed {
    catalog: Arc<CatalogClient>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl HomeFeed {
    pub fn new(catalog: Arc<CatalogClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(catalog, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        catalog: Arc<CatalogClient>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            max_age: Duration::hours(1),
        }
    }

    /// The stored snapshot if younger than an hour, otherwise a fresh one.
    pub async fn load(&self) -> HomeSnapshot {
        if let Some(snapshot) = self.stored() {
            if self.clock.now() - snapshot.fetched_at < self.max_age {
                debug!("Using stored homepage snapshot from {}", snapshot.fetched_at);
                return snapshot;
            }
        }
        self.refresh().await
    }

    /// Fetch all sections concurrently and store the result.
    pub async fn refresh(&self) -> HomeSnapshot {
        let (featured, fiction, science, kids) = tokio::join!(
            self.catalog.list_all(0, SECTION_SIZE),
            self.catalog.by_category("fiction", 0, SECTION_SIZE),
            self.catalog.by_category("science", 0, SECTION_SIZE),
            self.catalog.by_category("kids", 0, SECTION_SIZE),
        );

        let snapshot = HomeSnapshot {
            featured: featured.data.books,
            fiction: fiction.data,
            science: science.data,
            kids: kids.data,
            fetched_at: self.clock.now(),
        };

        if let Err(e) = save_json(self.store.as_ref(), keys::HOME_SNAPSHOT, &snapshot) {
            warn!("Failed to store homepage snapshot: {}", e);
            PERSIST_FAILURES
                .with_label_values(&[keys::HOME_SNAPSHOT])
                .inc();
        }

        snapshot
    }

    fn stored(&self) -> Option<HomeSnapshot> {
        match load_json(self.store.as_ref(), keys::HOME_SNAPSHOT) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring unreadable homepage snapshot: {}", e);
                None
            }
        }
    }
}
