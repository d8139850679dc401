//! Auto-scroll pre-step
//!
//! Infinite feeds only render more posts as the viewport moves. The loop
//! scrolls, waits, and re-counts until the count holds steady or the
//! iteration limit runs out.

use std::time::Duration;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cascade::Cascade;

/// Consecutive unchanged counts after which the feed is considered loaded.
const STABLE_RUNS: u32 = 2;

/// A live page that can be counted and scrolled.
pub trait ScrollHost {
    /// Posts currently rendered, by the same cascade the scraper uses.
    fn post_count(&self) -> usize;

    /// Move the viewport down by one screen.
    fn scroll_page(&mut self);
}

/// Replays captured page states, one per scroll. Scrolling past the last
/// capture stays on it.
pub struct SnapshotFeed {
    pages: Vec<String>,
    cascade: Cascade,
    position: usize,
}

impl SnapshotFeed {
    pub fn new(pages: Vec<String>, cascade: Cascade) -> Self {
        Self {
            pages,
            cascade,
            position: 0,
        }
    }

    /// HTML of the page state currently shown; empty when there are none.
    pub fn current_html(&self) -> &str {
        self.pages
            .get(self.position)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl ScrollHost for SnapshotFeed {
    fn post_count(&self) -> usize {
        let document = Html::parse_document(self.current_html());
        self.cascade.count_posts(&document.root_element())
    }

    fn scroll_page(&mut self) {
        if self.position + 1 < self.pages.len() {
            self.position += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    pub max_scrolls: u32,
    /// Pause after each scroll, in milliseconds
    pub delay_ms: u64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            max_scrolls: 10,
            delay_ms: 1200,
        }
    }
}

impl ScrollSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ScrollReport {
    /// The count stopped changing before the limit
    Stable { posts_loaded: usize },
    MaxScrollsReached { posts_loaded: usize },
}

impl ScrollReport {
    pub fn posts_loaded(&self) -> usize {
        match self {
            ScrollReport::Stable { posts_loaded } => *posts_loaded,
            ScrollReport::MaxScrollsReached { posts_loaded } => *posts_loaded,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScrollReport::Stable { .. } => "No more posts loading",
            ScrollReport::MaxScrollsReached { .. } => "Max scrolls reached",
        }
    }
}

/// Scroll `host` until its post count settles or `max_scrolls` runs out.
///
/// The previous count starts at zero, so a page that never renders a post
/// settles after two checks.
pub async fn auto_scroll<H: ScrollHost>(host: &mut H, settings: &ScrollSettings) -> ScrollReport {
    let mut last_count = 0;
    let mut same_count_runs = 0;

    for i in 0..settings.max_scrolls {
        let count = host.post_count();
        if count == last_count {
            same_count_runs += 1;
        } else {
            same_count_runs = 0;
        }
        debug!(iteration = i, count, same_count_runs, "scroll check");

        if same_count_runs >= STABLE_RUNS {
            info!(posts_loaded = count, "feed stopped growing");
            return ScrollReport::Stable {
                posts_loaded: count,
            };
        }

        last_count = count;
        host.scroll_page();
        tokio::time::sleep(settings.delay()).await;
    }

    let posts_loaded = host.post_count();
    info!(posts_loaded, max_scrolls = settings.max_scrolls, "scroll limit reached");
    ScrollReport::MaxScrollsReached { posts_loaded }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reveals the next batch size on every scroll, then stays at the last.
    struct FakeFeed {
        counts: Vec<usize>,
        position: usize,
        scrolls: usize,
    }

    impl FakeFeed {
        fn new(counts: &[usize]) -> Self {
            Self {
                counts: counts.to_vec(),
                position: 0,
                scrolls: 0,
            }
        }
    }

    impl ScrollHost for FakeFeed {
        fn post_count(&self) -> usize {
            self.counts[self.position.min(self.counts.len() - 1)]
        }

        fn scroll_page(&mut self) {
            self.position += 1;
            self.scrolls += 1;
        }
    }

    fn fast(max_scrolls: u32) -> ScrollSettings {
        ScrollSettings {
            max_scrolls,
            delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_stops_when_count_is_stable() {
        let mut feed = FakeFeed::new(&[5, 10, 15, 15]);
        let report = auto_scroll(&mut feed, &fast(10)).await;

        // 5, 10, 15 grow; 15 then 15 again makes two unchanged checks
        assert_eq!(report, ScrollReport::Stable { posts_loaded: 15 });
        assert_eq!(feed.scrolls, 4);
        assert_eq!(report.message(), "No more posts loading");
    }

    #[tokio::test]
    async fn test_stops_at_max_scrolls() {
        let mut feed = FakeFeed::new(&[1, 2, 3, 4, 5, 6, 7]);
        let report = auto_scroll(&mut feed, &fast(3)).await;

        assert_eq!(report, ScrollReport::MaxScrollsReached { posts_loaded: 4 });
        assert_eq!(feed.scrolls, 3);
        assert_eq!(report.posts_loaded(), 4);
    }

    #[tokio::test]
    async fn test_empty_page_settles() {
        let mut feed = FakeFeed::new(&[0]);
        let report = auto_scroll(&mut feed, &fast(10)).await;

        assert_eq!(report, ScrollReport::Stable { posts_loaded: 0 });
        assert_eq!(feed.scrolls, 1);
    }

    #[tokio::test]
    async fn test_zero_limit_only_measures() {
        let mut feed = FakeFeed::new(&[8]);
        let report = auto_scroll(&mut feed, &fast(0)).await;

        assert_eq!(report, ScrollReport::MaxScrollsReached { posts_loaded: 8 });
        assert_eq!(feed.scrolls, 0);
    }

    #[tokio::test]
    async fn test_snapshot_feed_replay() {
        let page = |n: usize| "<article><h3>p</h3></article>".repeat(n);
        let mut feed = SnapshotFeed::new(vec![page(2), page(4), page(4)], Cascade::default());

        assert_eq!(feed.post_count(), 2);
        let report = auto_scroll(&mut feed, &fast(10)).await;

        assert_eq!(report, ScrollReport::Stable { posts_loaded: 4 });
        assert_eq!(feed.position(), 2);
        assert_eq!(feed.current_html(), page(4));
    }

    #[test]
    fn test_snapshot_feed_counts_with_its_table() {
        use crate::cascade::Strategy;
        use crate::dom::Query;

        let html = r#"<article></article><div class="card"></div><div class="card"></div>"#;
        let cards = Cascade::new(vec![Strategy::select(
            "card",
            Query::attr_equals("class", "card"),
        )]);
        assert_eq!(SnapshotFeed::new(vec![html.to_string()], cards).post_count(), 2);
        assert_eq!(
            SnapshotFeed::new(vec![html.to_string()], Cascade::default()).post_count(),
            1
        );
    }

    #[test]
    fn test_snapshot_feed_empty() {
        let mut feed = SnapshotFeed::new(vec![], Cascade::default());
        feed.scroll_page();
        assert_eq!(feed.current_html(), "");
        assert_eq!(feed.post_count(), 0);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ScrollSettings::default();
        assert_eq!(settings.max_scrolls, 10);
        assert_eq!(settings.delay(), Duration::from_millis(1200));
    }
}
