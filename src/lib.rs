//! Feed scraper for rendered Reddit listing pages
//!
//! Turns a rendered feed into a list of post records:
//! - Container discovery through an ordered strategy cascade
//! - Per-field probes for title, author, subreddit, counts and permalink
//! - Abbreviated count parsing ("1.2K", "3M")
//! - Auto-scroll pre-step for infinite feeds
//! - Bounded session history, CSV/JSON export and dashboard analytics
//! - FFI interface for hosts that own the rendered page

pub mod analytics;
pub mod cascade;
pub mod config;
pub mod count;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
pub mod ffi;
pub mod model;
pub mod scrape;
pub mod scroll;
pub mod session;

pub use cascade::{count_posts, find_post_containers, Cascade, Diagnostics, Strategy};
pub use config::ScraperConfig;
pub use count::parse_count;
pub use dom::{Query, TreeNode};
pub use error::{Result, ScraperError};
pub use extract::extract_fields;
pub use model::{PageContext, PostRecord, ScrapeResult};
pub use scrape::{scrape, scrape_document, ScrapeOutcome};
pub use scroll::{auto_scroll, ScrollHost, ScrollReport, ScrollSettings};
pub use session::{Session, SessionStore};
