//! Text and date cleanup applied to every feed item before display.

use chrono::{DateTime, Local, Locale, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 120;
pub const ELLIPSIS: &str = "...";
pub const UNTITLED: &str = "untitled";
pub const UNKNOWN_DATE: &str = "unknown date";
pub const DEFAULT_LINK: &str = "#";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is a valid regex"));

/// Keep the first `max_chars` characters and mark the cut with an ellipsis.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + ELLIPSIS
}

pub fn clean_title(title: &str) -> String {
    truncate_text(title, MAX_TITLE_CHARS)
}

/// Flatten markup to its text content, then drop any tag syntax that was
/// hiding behind entities (`&lt;p&gt;`) before truncating.
pub fn clean_description(description: &str) -> String {
    let fragment = Html::parse_fragment(description);
    let text: String = fragment.root_element().text().collect();
    let text = TAG_PATTERN.replace_all(&text, "");
    truncate_text(text.trim(), MAX_DESCRIPTION_CHARS)
}

/// Parse the date formats seen in RSS and Atom feeds.
pub fn parse_date(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Local.from_local_datetime(&naive).earliest()
}

/// Format a raw feed date as `15 janv. 2025`, or the unknown-date sentinel.
pub fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(dt) => format_local(&dt),
        None => UNKNOWN_DATE.to_string(),
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    format_local(&timestamp.with_timezone(&Local))
}

fn format_local(dt: &DateTime<Local>) -> String {
    dt.format_localized("%-d %b %Y", Locale::fr_FR).to_string()
}
