//! CSV and JSON renderings of scraped posts.

use std::io::Write;

use crate::error::Result;
use crate::model::PostRecord;

pub const CSV_HEADERS: [&str; 8] = [
    "Index",
    "Title",
    "Author",
    "Subreddit",
    "Upvotes",
    "Comments",
    "URL",
    "Timestamp",
];

const SEP: char = ',';

/// Posts as pretty JSON (two-space indent).
pub fn to_json(posts: &[PostRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(posts)?)
}

/// Posts as CSV, one row per post with a 1-based index and the session
/// timestamp repeated on every row. No posts gives an empty string.
pub fn to_csv(posts: &[PostRecord], timestamp: &str) -> String {
    if posts.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let headers: Vec<String> = CSV_HEADERS.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &headers);

    for (i, post) in posts.iter().enumerate() {
        let row = vec![
            (i + 1).to_string(),
            post.title.clone(),
            post.author.clone(),
            post.subreddit.clone(),
            post.upvotes.to_string(),
            post.comments.to_string(),
            post.url.clone(),
            timestamp.to_string(),
        ];
        push_row(&mut out, &row);
    }
    out
}

pub fn write_csv<W: Write>(mut w: W, posts: &[PostRecord], timestamp: &str) -> Result<()> {
    w.write_all(to_csv(posts, timestamp).as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(mut w: W, posts: &[PostRecord]) -> Result<()> {
    w.write_all(to_json(posts)?.as_bytes())?;
    w.flush()?;
    Ok(())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_row(out: &mut String, row: &[String]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(SEP);
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}
