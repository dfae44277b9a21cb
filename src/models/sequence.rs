use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use log::debug;
use rand::Rng;
use tokio::sync::Mutex;

/// Pages that have not issued a lookup for this long are forgotten.
pub const PAGE_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Once this many pages are tracked, registering a new one evicts the page
/// that has been idle the longest.
pub const MAX_TRACKED_PAGES: usize = 4096;

fn generate_random_bytes(num_bytes: usize) -> Vec<u8> {
    let mut result = vec![0; num_bytes];
    rand::rng().fill(result.as_mut_slice());
    result
}

fn create_page_token() -> String {
    BASE64_URL_SAFE_NO_PAD.encode(generate_random_bytes(16))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub page: String,
    pub generation: u64,
}

struct PageGeneration {
    latest: u64,
    touched: Instant,
}

impl PageGeneration {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.touched) >= PAGE_IDLE_TIMEOUT
    }
}

/// Hands out increasing generation ids per page. A response is only worth
/// rendering if its ticket is still the latest for its page.
///
/// Only tokens created by [`LookupTracker::register`] are tracked, so lookups
/// from different pages never supersede each other and clients cannot add
/// entries of their own.
#[derive(Clone, Default)]
pub struct LookupTracker {
    pages: Arc<Mutex<HashMap<String, PageGeneration>>>,
}

impl LookupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a freshly rendered page.
    pub async fn register(&self) -> String {
        self.register_at(Instant::now()).await
    }

    async fn register_at(&self, now: Instant) -> String {
        let mut pages = self.pages.lock().await;
        pages.retain(|_, entry| !entry.expired(now));

        if pages.len() >= MAX_TRACKED_PAGES {
            let oldest = pages
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(page, _)| page.clone());
            if let Some(oldest) = oldest {
                debug!("tracking {} pages, evicting the oldest", pages.len());
                pages.remove(&oldest);
            }
        }

        let page = create_page_token();
        pages.insert(
            page.clone(),
            PageGeneration {
                latest: 0,
                touched: now,
            },
        );
        page
    }

    /// `None` when `page` was never registered or has expired; such a lookup
    /// is simply rendered without ordering.
    pub async fn begin(&self, page: &str) -> Option<Ticket> {
        self.begin_at(page, Instant::now()).await
    }

    async fn begin_at(&self, page: &str, now: Instant) -> Option<Ticket> {
        let mut pages = self.pages.lock().await;
        let entry = pages.get_mut(page)?;
        if entry.expired(now) {
            pages.remove(page);
            return None;
        }
        entry.latest += 1;
        entry.touched = now;
        Some(Ticket {
            page: page.to_string(),
            generation: entry.latest,
        })
    }

    pub async fn is_current(&self, ticket: &Ticket) -> bool {
        let pages = self.pages.lock().await;
        pages
            .get(&ticket.page)
            .is_some_and(|entry| entry.latest == ticket.generation)
    }

    #[cfg(test)]
    pub async fn tracked_pages(&self) -> usize {
        self.pages.lock().await.len()
    }
}
