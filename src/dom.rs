//! Read-only tree queries
//!
//! The scraping core only needs a handful of lookups over the rendered page:
//! find descendants matching a structural signature, walk up to the nearest
//! matching ancestor, and read text or attributes. `TreeNode` captures that
//! surface; `scraper::ElementRef` implements it over parsed HTML.

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

/// One structural signature an element can match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Element tag name, e.g. `article` or `shreddit-post`
    Tag { name: String },
    /// Attribute equal to a value, e.g. `data-testid="post-container"`
    AttrEquals { name: String, value: String },
    /// Attribute containing a substring, e.g. `href*="/comments/"`
    AttrContains { name: String, needle: String },
    /// Attribute present with any value
    AttrPresent { name: String },
}

impl Query {
    pub fn tag(name: &str) -> Self {
        Query::Tag {
            name: name.to_string(),
        }
    }

    pub fn attr_equals(name: &str, value: &str) -> Self {
        Query::AttrEquals {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn attr_contains(name: &str, needle: &str) -> Self {
        Query::AttrContains {
            name: name.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn attr_present(name: &str) -> Self {
        Query::AttrPresent {
            name: name.to_string(),
        }
    }

    /// Render as a CSS selector string.
    pub fn to_css(&self) -> String {
        match self {
            Query::Tag { name } => name.clone(),
            Query::AttrEquals { name, value } => {
                format!("[{}=\"{}\"]", name, escape_css_string(value))
            }
            Query::AttrContains { name, needle } => {
                format!("[{}*=\"{}\"]", name, escape_css_string(needle))
            }
            Query::AttrPresent { name } => format!("[{}]", name),
        }
    }

    fn selector(&self) -> Option<Selector> {
        Selector::parse(&self.to_css()).ok()
    }
}

fn escape_css_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Minimal read-only view of an element in a rendered tree.
pub trait TreeNode: Sized + Clone {
    fn tag_name(&self) -> &str;

    fn attr(&self, name: &str) -> Option<&str>;

    /// Concatenated text of this element and its descendants.
    fn text_content(&self) -> String;

    /// Descendants matching `query`, in document order. Never includes `self`.
    fn find_all(&self, query: &Query) -> Vec<Self>;

    fn find_first(&self, query: &Query) -> Option<Self> {
        self.find_all(query).into_iter().next()
    }

    /// Nearest element matching `query`, starting at `self` and walking up.
    fn closest(&self, query: &Query) -> Option<Self>;
}

impl<'a> TreeNode for ElementRef<'a> {
    fn tag_name(&self) -> &str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text_content(&self) -> String {
        self.text().collect::<String>()
    }

    fn find_all(&self, query: &Query) -> Vec<Self> {
        let selector = match query.selector() {
            Some(s) => s,
            None => return vec![],
        };
        self.select(&selector).collect()
    }

    fn find_first(&self, query: &Query) -> Option<Self> {
        let selector = query.selector()?;
        self.select(&selector).next()
    }

    fn closest(&self, query: &Query) -> Option<Self> {
        let selector = query.selector()?;
        std::iter::once(self.clone())
            .chain(self.ancestors().filter_map(ElementRef::wrap))
            .find(|el| selector.matches(el))
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_query_to_css() {
        assert_eq!(Query::tag("article").to_css(), "article");
        assert_eq!(
            Query::attr_equals("data-testid", "post-container").to_css(),
            r#"[data-testid="post-container"]"#
        );
        assert_eq!(
            Query::attr_contains("href", "/comments/").to_css(),
            r#"[href*="/comments/"]"#
        );
        assert_eq!(Query::attr_present("data-testid").to_css(), "[data-testid]");
        assert_eq!(
            Query::attr_equals("title", r#"say "hi""#).to_css(),
            r#"[title="say \"hi\""]"#
        );
    }

    #[test]
    fn test_find_all_document_order() {
        let html = r#"
        <div>
            <article id="a">One</article>
            <section><article id="b">Two</article></section>
            <article id="c">Three</article>
        </div>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let ids: Vec<_> = root
            .find_all(&Query::tag("article"))
            .iter()
            .map(|el| el.attr("id").unwrap_or("").to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_closest_walks_up() {
        let html = r#"
        <article id="outer">
            <div class="inner"><h3>Title</h3></div>
        </article>
        "#;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let heading = root.find_first(&Query::tag("h3")).unwrap();
        let container = heading.closest(&Query::tag("article")).unwrap();
        assert_eq!(container.attr("id"), Some("outer"));

        assert!(heading.closest(&Query::tag("shreddit-post")).is_none());
        // closest() considers the element itself
        assert_eq!(heading.closest(&Query::tag("h3")).unwrap().tag_name(), "h3");
    }

    #[test]
    fn test_text_and_attr() {
        let html = r#"<a href="/user/alice" title="profile">  u/<b>alice</b>  </a>"#;
        let document = Html::parse_document(html);
        let link = document
            .root_element()
            .find_first(&Query::attr_contains("href", "/user/"))
            .unwrap();

        assert_eq!(link.attr("title"), Some("profile"));
        assert_eq!(normalize_ws(&link.text_content()), "u/alice");
        assert_eq!(link.attr("missing"), None);
    }

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
        assert_eq!(normalize_ws("   "), "");
    }

    #[test]
    fn test_query_deserialize() {
        let q: Query = serde_json::from_str(r#"{"kind":"attr_equals","name":"data-testid","value":"x"}"#)
            .unwrap();
        assert_eq!(q, Query::attr_equals("data-testid", "x"));
    }
}
