//! Field extraction for a single post element
//!
//! Each field has its own ordered list of named probes. Probes only read the
//! tree; the first one returning a non-empty value wins. A probe that finds
//! nothing leaves the field at its default, so one missing signal never
//! costs the rest of the record.

use tracing::trace;

use crate::count::parse_count;
use crate::dom::{normalize_ws, Query, TreeNode};
use crate::model::{PageContext, PostRecord};

/// Path segment marking a post's comment (detail) page.
pub const DETAIL_MARKER: &str = "/comments/";
/// Path segment marking a user profile page.
pub const PROFILE_MARKER: &str = "/user/";

type Probe<N> = fn(&N, &PageContext) -> Option<String>;

fn title_probes<N: TreeNode>() -> [(&'static str, Probe<N>); 4] {
    [
        ("heading", |el, _| text_of(el, &Query::tag("h3"))),
        ("post-title-attr", |el, _| own_attr(el, "post-title")),
        ("title-attr", |el, _| own_attr(el, "title")),
        ("detail-link-text", |el, _| {
            text_of(el, &Query::attr_contains("href", DETAIL_MARKER))
        }),
    ]
}

fn url_probes<N: TreeNode>() -> [(&'static str, Probe<N>); 1] {
    [("detail-link", |el, ctx| {
        attr_of(el, &Query::attr_contains("href", DETAIL_MARKER), "href")
            .map(|href| ctx.resolve_link(&href))
    })]
}

fn author_probes<N: TreeNode>() -> [(&'static str, Probe<N>); 2] {
    [
        ("author-marker", |el, _| {
            text_of(el, &Query::attr_equals("data-testid", "post_author_link"))
        }),
        ("profile-link", |el, _| {
            text_of(el, &Query::attr_contains("href", PROFILE_MARKER))
        }),
    ]
}

fn subreddit_probes<N: TreeNode>() -> [(&'static str, Probe<N>); 2] {
    [
        ("subreddit-marker", |el, _| {
            text_of(el, &Query::attr_equals("data-testid", "subreddit_link"))
                .map(|s| s.strip_prefix("r/").unwrap_or(&s).to_string())
                .filter(|s| !s.is_empty())
        }),
        ("page-path", |_, ctx| Some(ctx.subreddit())),
    ]
}

fn upvote_label_probes<N: TreeNode>() -> [(&'static str, Probe<N>); 2] {
    [
        ("upvote-label", |el, _| aria_label(el, "upvote")),
        ("point-label", |el, _| aria_label(el, "point")),
    ]
}

fn comment_label_probes<N: TreeNode>() -> [(&'static str, Probe<N>); 1] {
    [("comment-label", |el, _| aria_label(el, "comment"))]
}

/// Build a record from one post element. Never fails; undiscoverable fields
/// stay empty or zero.
pub fn extract_fields<N: TreeNode>(element: &N, ctx: &PageContext) -> PostRecord {
    PostRecord {
        title: first_match(&title_probes(), element, ctx).unwrap_or_default(),
        author: first_match(&author_probes(), element, ctx).unwrap_or_default(),
        subreddit: first_match(&subreddit_probes(), element, ctx).unwrap_or_default(),
        upvotes: first_match(&upvote_label_probes(), element, ctx)
            .map(|label| parse_count(&label))
            .unwrap_or(0),
        comments: first_match(&comment_label_probes(), element, ctx)
            .map(|label| parse_count(&label))
            .unwrap_or(0),
        url: first_match(&url_probes(), element, ctx).unwrap_or_default(),
    }
}

fn first_match<N: TreeNode>(
    probes: &[(&'static str, Probe<N>)],
    element: &N,
    ctx: &PageContext,
) -> Option<String> {
    probes.iter().find_map(|(name, probe)| {
        let value = probe(element, ctx).filter(|v| !v.is_empty())?;
        trace!(probe = *name, "field probe matched");
        Some(value)
    })
}

fn text_of<N: TreeNode>(element: &N, query: &Query) -> Option<String> {
    element
        .find_first(query)
        .map(|el| normalize_ws(&el.text_content()))
}

fn attr_of<N: TreeNode>(element: &N, query: &Query, attr: &str) -> Option<String> {
    element
        .find_first(query)
        .and_then(|el| el.attr(attr).map(str::to_string))
}

fn own_attr<N: TreeNode>(element: &N, attr: &str) -> Option<String> {
    element.attr(attr).map(normalize_ws)
}

fn aria_label<N: TreeNode>(element: &N, keyword: &str) -> Option<String> {
    attr_of(element, &Query::attr_contains("aria-label", keyword), "aria-label")
}
