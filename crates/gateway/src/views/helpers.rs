//! Formatting helpers shared by the templates.

use std::collections::HashMap;

use channeldesk_database::Page;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tera::{try_get_value, Value};

pub fn print_or_dashes(text: Option<&str>) -> String {
    match text {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => "---".to_string(),
    }
}

pub fn bootstrap_class_for(flash_type: &str) -> String {
    match flash_type {
        "success" => "alert-success",
        "error" => "alert-error",
        "alert" => "alert-danger",
        "notice" => "alert-info",
        other => other,
    }
    .to_string()
}

/// `1500 -> "1K"`, `1960 -> "2K"`, `2_400_000 -> "2M"`.
pub fn abbreviate_number(number: i64) -> String {
    let (divisor, suffix) = match number {
        0..=999 => return number.to_string(),
        1_000..=999_999 => (1e3, "K"),
        1_000_000..=999_999_999 => (1e6, "M"),
        1_000_000_000..=999_999_999_999 => (1e9, "B"),
        1_000_000_000_000..=999_999_999_999_999 => (1e12, "T"),
        _ => return number.to_string(),
    };

    let rounded = (number as f64 / divisor * 10.0).round() / 10.0;
    format!("{}{}", rounded.trunc() as i64, suffix)
}

pub fn short_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if time > now - Duration::hours(24) {
        time.format("%H:%M").to_string()
    } else if time > now - Duration::days(60) {
        time.format("%b %d").to_string()
    } else {
        time.format("%b %y").to_string()
    }
}

/// One entry of a pagination bar. `href` is `None` for the current page and
/// for disabled previous/next links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub label: String,
    pub href: Option<String>,
    pub current: bool,
}

/// Previous, numbered and next links for `page`, driven by the `param`
/// query parameter. Other parameters in `params` are carried along.
pub fn pagination_links<T>(
    page: &Page<T>,
    base_path: &str,
    param: &str,
    params: &[(String, String)],
) -> Vec<PageLink> {
    let total = page.total_pages();
    if total <= 1 {
        return Vec::new();
    }

    let href = |number: u32| {
        let mut query: Vec<String> = params
            .iter()
            .filter(|(key, _)| key != param)
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect();
        query.push(format!("{}={}", param, number));
        format!("{}?{}", base_path, query.join("&"))
    };

    let current = page.page.clamp(1, total);
    let mut links = Vec::with_capacity(total as usize + 2);

    links.push(PageLink {
        label: "← Previous".to_string(),
        href: (current > 1).then(|| href(current - 1)),
        current: false,
    });
    for number in 1..=total {
        links.push(PageLink {
            label: number.to_string(),
            href: (number != current).then(|| href(number)),
            current: number == current,
        });
    }
    links.push(PageLink {
        label: "Next →".to_string(),
        href: (current < total).then(|| href(current + 1)),
        current: false,
    });

    links
}

pub(crate) fn print_or_dashes_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    };
    Ok(Value::String(print_or_dashes(text.as_deref())))
}

pub(crate) fn bootstrap_class_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let flash_type = try_get_value!("bootstrap_class_for", "value", String, value);
    Ok(Value::String(bootstrap_class_for(&flash_type)))
}

pub(crate) fn abbreviate_number_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let number = try_get_value!("abbreviate_number", "value", i64, value);
    Ok(Value::String(abbreviate_number(number)))
}

pub(crate) fn short_time_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    if value.is_null() {
        return Ok(Value::String(print_or_dashes(None)));
    }
    let time = try_get_value!("short_time", "value", DateTime<Utc>, value);
    let now = match args.get("now") {
        Some(now) => try_get_value!("short_time", "now", DateTime<Utc>, now),
        None => Utc::now(),
    };
    Ok(Value::String(short_time(time, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_print_or_dashes() {
        assert_eq!(print_or_dashes(None), "---");
        assert_eq!(print_or_dashes(Some("  ")), "---");
        assert_eq!(print_or_dashes(Some("kw")), "kw");
    }

    #[test]
    fn test_bootstrap_class_for() {
        assert_eq!(bootstrap_class_for("success"), "alert-success");
        assert_eq!(bootstrap_class_for("error"), "alert-error");
        assert_eq!(bootstrap_class_for("alert"), "alert-danger");
        assert_eq!(bootstrap_class_for("notice"), "alert-info");
        assert_eq!(bootstrap_class_for("warning"), "warning");
    }

    #[test]
    fn test_abbreviate_number() {
        assert_eq!(abbreviate_number(0), "0");
        assert_eq!(abbreviate_number(999), "999");
        assert_eq!(abbreviate_number(1_000), "1K");
        assert_eq!(abbreviate_number(1_500), "1K");
        assert_eq!(abbreviate_number(1_960), "2K");
        assert_eq!(abbreviate_number(999_999), "1000K");
        assert_eq!(abbreviate_number(2_400_000), "2M");
        assert_eq!(abbreviate_number(7_000_000_000), "7B");
        assert_eq!(abbreviate_number(3_000_000_000_000), "3T");
        assert_eq!(abbreviate_number(-42), "-42");
        assert_eq!(abbreviate_number(5_000_000_000_000_000), "5000000000000000");
    }

    #[test]
    fn test_short_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(short_time(now - Duration::hours(2), now), "10:00");
        assert_eq!(short_time(now - Duration::days(3), now), "Jun 12");
        assert_eq!(short_time(now - Duration::days(200), now), "Nov 23");
    }

    #[test]
    fn test_pagination_links() {
        let page = Page::new(vec![1, 2], 2, 2, 5);
        let params = vec![
            ("message_search".to_string(), "hi there".to_string()),
            ("messages_page".to_string(), "2".to_string()),
        ];
        let links = pagination_links(&page, "/channels/1", "messages_page", &params);

        assert_eq!(links.len(), 5);
        assert_eq!(
            links[0].href.as_deref(),
            Some("/channels/1?message_search=hi%20there&messages_page=1")
        );
        assert!(links[2].current);
        assert_eq!(links[2].href, None);
        assert_eq!(
            links[4].href.as_deref(),
            Some("/channels/1?message_search=hi%20there&messages_page=3")
        );
    }

    #[test]
    fn test_single_page_has_no_links() {
        let page = Page::new(vec![1], 1, 10, 1);
        assert!(pagination_links(&page, "/channels", "channels_page", &[]).is_empty());
    }
}
