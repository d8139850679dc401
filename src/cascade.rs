//! Post container discovery
//!
//! Host markup drifts over time, so posts are located by an ordered table of
//! strategies, most specific first. The first strategy that matches anything
//! wins and the rest are skipped. When nothing matches, a summary of the
//! signatures actually present on the page is produced for tuning the table.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dom::{Query, TreeNode};

/// How many distinct `data-testid` values to sample on total failure.
const SAMPLE_TESTIDS: usize = 5;

/// One named lookup in the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub query: Query,
    /// Treat `query` matches as anchors (e.g. headings) and walk up from each
    /// to the nearest ancestor matching an earlier strategy's query.
    #[serde(default)]
    pub ancestor_walk: bool,
}

impl Strategy {
    pub fn select(name: &str, query: Query) -> Self {
        Self {
            name: name.to_string(),
            query,
            ancestor_walk: false,
        }
    }

    pub fn ancestor_walk(name: &str, anchor: Query) -> Self {
        Self {
            name: name.to_string(),
            query: anchor,
            ancestor_walk: true,
        }
    }
}

/// The built-in strategy table.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy::select("shreddit-post", Query::tag("shreddit-post")),
        Strategy::select(
            "post-container",
            Query::attr_equals("data-testid", "post-container"),
        ),
        Strategy::select("article", Query::tag("article")),
        Strategy::ancestor_walk("heading-ancestor", Query::tag("h3")),
    ]
}

/// Structural signatures found on a page where no strategy matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub shreddit_posts: usize,
    pub post_containers: usize,
    pub articles: usize,
    pub headings: usize,
    pub testid_elements: usize,
    pub sample_testids: Vec<String>,
}

impl Diagnostics {
    pub fn collect<N: TreeNode>(root: &N) -> Self {
        let testid_elements = root.find_all(&Query::attr_present("data-testid"));

        let mut sample_testids: Vec<String> = Vec::new();
        for el in &testid_elements {
            if sample_testids.len() >= SAMPLE_TESTIDS {
                break;
            }
            if let Some(id) = el.attr("data-testid") {
                if !sample_testids.iter().any(|s| s == id) {
                    sample_testids.push(id.to_string());
                }
            }
        }

        Self {
            shreddit_posts: root.find_all(&Query::tag("shreddit-post")).len(),
            post_containers: root
                .find_all(&Query::attr_equals("data-testid", "post-container"))
                .len(),
            articles: root.find_all(&Query::tag("article")).len(),
            headings: root.find_all(&Query::tag("h3")).len(),
            testid_elements: testid_elements.len(),
            sample_testids,
        }
    }
}

/// Outcome of running the cascade over one tree.
#[derive(Debug, Clone)]
pub struct Resolution<N> {
    /// Name of the winning strategy, if any matched
    pub strategy: Option<String>,
    pub containers: Vec<N>,
    /// Present only when every strategy came up empty
    pub diagnostics: Option<Diagnostics>,
}

/// An ordered table of strategies.
#[derive(Debug, Clone)]
pub struct Cascade {
    strategies: Vec<Strategy>,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new(default_strategies())
    }
}

impl Cascade {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Run strategies in order, stopping at the first non-empty one.
    pub fn resolve<N: TreeNode>(&self, root: &N) -> Resolution<N> {
        for (idx, strategy) in self.strategies.iter().enumerate() {
            let containers = if strategy.ancestor_walk {
                self.walk_to_ancestors(root, &strategy.query, idx)
            } else {
                root.find_all(&strategy.query)
            };
            debug!(strategy = %strategy.name, matches = containers.len(), "cascade strategy");

            if !containers.is_empty() {
                return Resolution {
                    strategy: Some(strategy.name.clone()),
                    containers,
                    diagnostics: None,
                };
            }
        }

        let diagnostics = Diagnostics::collect(root);
        warn!(?diagnostics, "no post containers found");
        Resolution {
            strategy: None,
            containers: vec![],
            diagnostics: Some(diagnostics),
        }
    }

    /// Just the containers, in document order.
    pub fn find_post_containers<N: TreeNode>(&self, root: &N) -> Vec<N> {
        self.resolve(root).containers
    }

    /// Number of posts this table currently sees under `root`.
    pub fn count_posts<N: TreeNode>(&self, root: &N) -> usize {
        self.find_post_containers(root).len()
    }

    // Earlier direct strategies supply the container signatures, tried in
    // priority order for each anchor.
    fn walk_to_ancestors<N: TreeNode>(&self, root: &N, anchor: &Query, idx: usize) -> Vec<N> {
        let signatures: Vec<&Query> = self.strategies[..idx]
            .iter()
            .filter(|s| !s.ancestor_walk)
            .map(|s| &s.query)
            .collect();

        root.find_all(anchor)
            .iter()
            .filter_map(|a| signatures.iter().find_map(|q| a.closest(q)))
            .collect()
    }
}

/// Locate post containers with the built-in strategy table.
pub fn find_post_containers<N: TreeNode>(root: &N) -> Vec<N> {
    Cascade::default().find_post_containers(root)
}

/// Number of posts the built-in cascade currently sees.
pub fn count_posts<N: TreeNode>(root: &N) -> usize {
    Cascade::default().count_posts(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn ids<N: TreeNode>(nodes: &[N]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.attr("id").unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_articles_only() {
        let html = r#"
        <main>
            <article id="p1"><h3>One</h3></article>
            <div><article id="p2"><h3>Two</h3></article></div>
            <article id="p3"><h3>Three</h3></article>
        </main>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let found = find_post_containers(&root);
        assert_eq!(ids(&found), vec!["p1", "p2", "p3"]);

        let resolution = Cascade::default().resolve(&root);
        assert_eq!(resolution.strategy.as_deref(), Some("article"));
        assert!(resolution.diagnostics.is_none());
    }

    #[test]
    fn test_higher_priority_short_circuits() {
        let html = r#"
        <main>
            <shreddit-post id="s1"><h3>Web component</h3></shreddit-post>
            <article id="a1"><h3>Generic</h3></article>
            <div data-testid="post-container" id="c1"><h3>Container</h3></div>
            <shreddit-post id="s2"><h3>Another</h3></shreddit-post>
        </main>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let resolution = Cascade::default().resolve(&root);
        assert_eq!(resolution.strategy.as_deref(), Some("shreddit-post"));
        assert_eq!(ids(&resolution.containers), vec!["s1", "s2"]);
    }

    #[test]
    fn test_post_container_beats_article() {
        let html = r#"
        <div data-testid="post-container" id="c1"><article id="inner"></article></div>
        <article id="a1"></article>
        "#;
        let document = Html::parse_document(html);
        let found = find_post_containers(&document.root_element());
        assert_eq!(ids(&found), vec!["c1"]);
    }

    #[test]
    fn test_heading_walk_climbs_out_of_scope() {
        // Scoped to a region inside a post, the direct queries see nothing,
        // but each heading walks up to the enclosing post.
        let html = r#"
        <article id="outer">
            <div id="region"><h3>Title</h3><div><h3>Subtitle</h3></div></div>
        </article>
        "#;
        let document = Html::parse_document(html);
        let region = document
            .root_element()
            .find_first(&Query::attr_equals("id", "region"))
            .unwrap();

        let resolution = Cascade::default().resolve(&region);
        assert_eq!(resolution.strategy.as_deref(), Some("heading-ancestor"));
        // One entry per heading; the walk does not deduplicate
        assert_eq!(ids(&resolution.containers), vec!["outer", "outer"]);
    }

    #[test]
    fn test_heading_walk_prefers_table_order() {
        // The article is the nearer ancestor, but shreddit-post is listed first
        let html = r#"
        <shreddit-post id="sp">
            <article id="art"><div id="region"><h3>Title</h3></div></article>
        </shreddit-post>
        "#;
        let document = Html::parse_document(html);
        let region = document
            .root_element()
            .find_first(&Query::attr_equals("id", "region"))
            .unwrap();

        let resolution = Cascade::default().resolve(&region);
        assert_eq!(resolution.strategy.as_deref(), Some("heading-ancestor"));
        assert_eq!(ids(&resolution.containers), vec!["sp"]);
    }

    #[test]
    fn test_walk_only_uses_earlier_signatures() {
        let html = r#"
        <div class="card" id="k1"><span><h3>First</h3></span></div>
        <div class="card" id="k2"><h3>Second</h3></div>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let cascade = Cascade::new(vec![
            Strategy::ancestor_walk("heading-ancestor", Query::tag("h3")),
            Strategy::select("card", Query::attr_equals("class", "card")),
        ]);
        let resolution = cascade.resolve(&root);
        assert_eq!(resolution.strategy.as_deref(), Some("card"));
        assert_eq!(ids(&resolution.containers), vec!["k1", "k2"]);
    }

    #[test]
    fn test_total_failure_diagnostics() {
        let html = r#"
        <div data-testid="header"></div>
        <div data-testid="sidebar"></div>
        <div data-testid="header"></div>
        <div><h3>Not a post</h3></div>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let resolution = Cascade::default().resolve(&root);
        assert!(resolution.containers.is_empty());
        assert!(resolution.strategy.is_none());

        let diag = resolution.diagnostics.unwrap();
        assert_eq!(diag.headings, 1);
        assert_eq!(diag.articles, 0);
        assert_eq!(diag.testid_elements, 3);
        assert_eq!(diag.sample_testids, vec!["header", "sidebar"]);
    }

    #[test]
    fn test_sample_testids_capped() {
        let html: String = (0..8)
            .map(|i| format!(r#"<span data-testid="t{}"></span>"#, i))
            .collect();
        let document = Html::parse_document(&html);
        let diag = Diagnostics::collect(&document.root_element());
        assert_eq!(diag.testid_elements, 8);
        assert_eq!(diag.sample_testids.len(), 5);
    }

    #[test]
    fn test_count_posts_follows_table() {
        let html = r#"
        <article><h3>A</h3></article>
        <section class="card"></section>
        <section class="card"></section>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        assert_eq!(count_posts(&root), 1);
        let cards = Cascade::new(vec![Strategy::select(
            "card",
            Query::attr_equals("class", "card"),
        )]);
        assert_eq!(cards.count_posts(&root), 2);
    }

    #[test]
    fn test_empty_document() {
        let document = Html::parse_document("");
        assert_eq!(count_posts(&document.root_element()), 0);
    }
}
