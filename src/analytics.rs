//! Aggregates over one session's posts
//!
//! Everything here is a pure function of the post list. Ties in every ranking
//! keep first-seen order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::PostRecord;

pub const TOP_POSTS: usize = 5;
pub const TOP_AUTHORS: usize = 5;
pub const TOP_USERS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_posts: usize,
    pub unique_authors: usize,
    pub total_upvotes: u64,
    pub total_comments: u64,
    pub avg_upvotes: u64,
    pub avg_comments: u64,
}

/// Posts bucketed by upvotes: `<100`, `100..500`, `500..2000`, `>=2000`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementBuckets {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub viral: usize,
}

/// Posts bucketed by comments: `0`, `1..10`, `10..50`, `>=50`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBuckets {
    pub none: usize,
    pub few: usize,
    pub moderate: usize,
    pub many: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    pub author: String,
    pub posts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub author: String,
    pub posts: usize,
    pub total_upvotes: u64,
    pub total_comments: u64,
    pub avg_upvotes: u64,
    pub avg_comments: u64,
}

/// Everything the stats view shows for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub summary: Summary,
    pub engagement: EngagementBuckets,
    pub comment_activity: CommentBuckets,
    pub top_posts: Vec<PostRecord>,
    pub top_authors: Vec<AuthorCount>,
    pub user_stats: Vec<UserStats>,
}

impl SessionStats {
    pub fn compute(posts: &[PostRecord]) -> Self {
        Self {
            summary: summarize(posts),
            engagement: engagement_distribution(posts),
            comment_activity: comment_distribution(posts),
            top_posts: top_posts(posts, TOP_POSTS),
            top_authors: top_authors(posts, TOP_AUTHORS),
            user_stats: user_stats(posts, TOP_USERS),
        }
    }
}

pub fn summarize(posts: &[PostRecord]) -> Summary {
    let total_upvotes = posts.iter().fold(0u64, |acc, p| acc.saturating_add(p.upvotes));
    let total_comments = posts.iter().fold(0u64, |acc, p| acc.saturating_add(p.comments));
    let unique_authors = posts
        .iter()
        .map(|p| p.author.as_str())
        .collect::<HashSet<_>>()
        .len();

    Summary {
        total_posts: posts.len(),
        unique_authors,
        total_upvotes,
        total_comments,
        avg_upvotes: rounded_mean(total_upvotes, posts.len()),
        avg_comments: rounded_mean(total_comments, posts.len()),
    }
}

pub fn engagement_distribution(posts: &[PostRecord]) -> EngagementBuckets {
    let mut buckets = EngagementBuckets::default();
    for post in posts {
        match post.upvotes {
            0..=99 => buckets.low += 1,
            100..=499 => buckets.medium += 1,
            500..=1999 => buckets.high += 1,
            _ => buckets.viral += 1,
        }
    }
    buckets
}

pub fn comment_distribution(posts: &[PostRecord]) -> CommentBuckets {
    let mut buckets = CommentBuckets::default();
    for post in posts {
        match post.comments {
            0 => buckets.none += 1,
            1..=9 => buckets.few += 1,
            10..=49 => buckets.moderate += 1,
            _ => buckets.many += 1,
        }
    }
    buckets
}

/// Highest-upvoted posts, descending.
pub fn top_posts(posts: &[PostRecord], n: usize) -> Vec<PostRecord> {
    let mut sorted = posts.to_vec();
    sorted.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
    sorted.truncate(n);
    sorted
}

/// Most prolific authors by post count.
pub fn top_authors(posts: &[PostRecord], n: usize) -> Vec<AuthorCount> {
    let mut counts: Vec<AuthorCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        match index.get(post.author.as_str()) {
            Some(&i) => counts[i].posts += 1,
            None => {
                index.insert(&post.author, counts.len());
                counts.push(AuthorCount {
                    author: post.author.clone(),
                    posts: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.posts.cmp(&a.posts));
    counts.truncate(n);
    counts
}

/// Per-author totals and averages, most prolific first.
pub fn user_stats(posts: &[PostRecord], n: usize) -> Vec<UserStats> {
    let mut stats: Vec<UserStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        let i = *index.entry(post.author.as_str()).or_insert_with(|| {
            stats.push(UserStats {
                author: post.author.clone(),
                posts: 0,
                total_upvotes: 0,
                total_comments: 0,
                avg_upvotes: 0,
                avg_comments: 0,
            });
            stats.len() - 1
        });
        let user = &mut stats[i];
        user.posts += 1;
        user.total_upvotes = user.total_upvotes.saturating_add(post.upvotes);
        user.total_comments = user.total_comments.saturating_add(post.comments);
    }

    for user in &mut stats {
        user.avg_upvotes = rounded_mean(user.total_upvotes, user.posts);
        user.avg_comments = rounded_mean(user.total_comments, user.posts);
    }

    stats.sort_by(|a, b| b.posts.cmp(&a.posts));
    stats.truncate(n);
    stats
}

/// Posts whose title or author contains `query`, ignoring case.
/// An empty query keeps everything.
pub fn filter_posts<'a>(posts: &'a [PostRecord], query: &str) -> Vec<&'a PostRecord> {
    let needle = query.to_lowercase();
    posts
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&needle) || p.author.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Table ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Upvotes,
    Comments,
    /// Scrape order, unchanged
    #[default]
    Capture,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upvotes" => Ok(SortKey::Upvotes),
            "comments" => Ok(SortKey::Comments),
            "capture" | "recent" => Ok(SortKey::Capture),
            other => Err(format!(
                "unknown sort key '{}' (expected upvotes, comments or capture)",
                other
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Upvotes => "upvotes",
            SortKey::Comments => "comments",
            SortKey::Capture => "capture",
        };
        f.write_str(s)
    }
}

/// Stable descending sort by `key`.
pub fn sort_posts(posts: &mut [PostRecord], key: SortKey) {
    match key {
        SortKey::Upvotes => posts.sort_by(|a, b| b.upvotes.cmp(&a.upvotes)),
        SortKey::Comments => posts.sort_by(|a, b| b.comments.cmp(&a.comments)),
        SortKey::Capture => {}
    }
}

/// First `max_chars` characters plus "..." when longer.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// Half-up, 0 for an empty set. Widened so saturated totals cannot overflow.
fn rounded_mean(total: u64, count: usize) -> u64 {
    if count == 0 {
        return 0;
    }
    let count = count as u128;
    ((total as u128 * 2 + count) / (count * 2)) as u64
}
