//! Scrape driver: cascade, then per-post extraction, then filtering.

use chrono::Utc;
use scraper::Html;
use tracing::{debug, info};

use crate::cascade::{Cascade, Diagnostics};
use crate::dom::TreeNode;
use crate::extract::extract_fields;
use crate::model::{PageContext, PostRecord, ScrapeResult};

/// Posts found in one tree, plus how they were found.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub posts: Vec<PostRecord>,
    pub strategy: Option<String>,
    pub diagnostics: Option<Diagnostics>,
}

/// Scrape every post under `root` with the given cascade.
///
/// Records whose title is empty after trimming are dropped; the rest keep
/// their document order.
pub fn scrape_with<N: TreeNode>(cascade: &Cascade, root: &N, ctx: &PageContext) -> ScrapeOutcome {
    let resolution = cascade.resolve(root);

    let mut posts = Vec::with_capacity(resolution.containers.len());
    for (idx, container) in resolution.containers.iter().enumerate() {
        let post = extract_fields(container, ctx);
        if post.title.trim().is_empty() {
            debug!(idx, "dropping post without title");
            continue;
        }
        debug!(idx, title = %post.title, "extracted post");
        posts.push(post);
    }

    info!(
        strategy = resolution.strategy.as_deref().unwrap_or("none"),
        containers = resolution.containers.len(),
        posts = posts.len(),
        "scrape complete"
    );

    ScrapeOutcome {
        posts,
        strategy: resolution.strategy,
        diagnostics: resolution.diagnostics,
    }
}

/// Scrape with the built-in strategy table.
pub fn scrape<N: TreeNode>(root: &N, ctx: &PageContext) -> ScrapeOutcome {
    scrape_with(&Cascade::default(), root, ctx)
}

/// Parse `html` and scrape it, stamping session metadata.
pub fn scrape_document_with(cascade: &Cascade, html: &str, page_url: &str) -> ScrapeResult {
    let document = Html::parse_document(html);
    let ctx = PageContext::new(page_url);
    let outcome = scrape_with(cascade, &document.root_element(), &ctx);

    ScrapeResult {
        success: true,
        posts: outcome.posts,
        page_url: page_url.to_string(),
        subreddit: ctx.subreddit(),
        timestamp: Utc::now().to_rfc3339(),
        strategy: outcome.strategy,
        diagnostics: outcome.diagnostics,
    }
}

pub fn scrape_document(html: &str, page_url: &str) -> ScrapeResult {
    scrape_document_with(&Cascade::default(), html, page_url)
}
