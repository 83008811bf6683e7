//! JSON-LD `ItemList` of `SportsEvent`s for search engines.

use chrono::{DateTime, SecondsFormat};
use serde_json::{json, Value};

use super::html::watch_link;
use crate::models::MatchRecord;

/// ISO 8601 start date: from `startTimeUnix` when present, else the raw
/// `startTime` string.
fn start_date(m: &MatchRecord) -> Option<String> {
    m.start_key()
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .or_else(|| m.start_time.clone().filter(|s| !s.trim().is_empty()))
}

fn event_url(domain: &str, m: &MatchRecord) -> String {
    if domain.is_empty() {
        watch_link(m)
    } else {
        format!("https://{}{}", domain, watch_link(m))
    }
}

pub fn item_list(matches: &[MatchRecord], domain: &str) -> Value {
    let items: Vec<Value> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let home = m.home_team();
            let away = m.away_team();
            let mut event = json!({
                "@type": "SportsEvent",
                "name": format!("{} vs {}", home, away),
                "description": format!("Watch {} vs {} live stream.", home, away),
                "url": event_url(domain, m),
                "homeTeam": {"@type": "SportsTeam", "name": home},
                "awayTeam": {"@type": "SportsTeam", "name": away},
            });
            if let Some(date) = start_date(m) {
                event["startDate"] = Value::String(date);
            }
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "item": event,
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "itemListElement": items,
    })
}

/// `<script>` tag holding the schema, safe to embed in HTML.
pub fn script_tag(schema: &Value) -> String {
    // `</` inside a string would close the script element early.
    let body = schema.to_string().replace("</", "<\\/");
    format!("<script type=\"application/ld+json\">{}</script>", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_list_positions_and_urls() {
        let matches = vec![
            MatchRecord::new("a").with_teams("Lakers", "Celtics"),
            MatchRecord::new("b"),
        ];
        let schema = item_list(&matches, "streams.example");

        assert_eq!(schema["@type"], "ItemList");
        let items = schema["itemListElement"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["position"], 1);
        assert_eq!(items[0]["item"]["name"], "Lakers vs Celtics");
        assert_eq!(items[0]["item"]["url"], "https://streams.example/watch/?streams=a");
        assert_eq!(items[1]["item"]["homeTeam"]["name"], "Home");
    }

    #[test]
    fn test_start_date_from_unix_millis() {
        let m = MatchRecord::new("a").with_start(1_700_000_000_000.0);
        assert_eq!(start_date(&m).as_deref(), Some("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn test_start_date_falls_back_to_text() {
        let mut m = MatchRecord::new("a");
        assert_eq!(start_date(&m), None);
        m.start_time = Some("Sat 8:00 PM".into());
        assert_eq!(start_date(&m).as_deref(), Some("Sat 8:00 PM"));

        let schema = item_list(&[MatchRecord::new("x")], "");
        assert!(schema["itemListElement"][0]["item"].get("startDate").is_none());
        assert_eq!(schema["itemListElement"][0]["item"]["url"], "/watch/?streams=x");
    }

    #[test]
    fn test_script_tag_cannot_close_early() {
        let m = MatchRecord::new("a").with_teams("</script><b>", "x");
        let tag = script_tag(&item_list(&[m], ""));
        assert_eq!(tag.matches("</script>").count(), 1);
        assert!(tag.starts_with("<script type=\"application/ld+json\">"));
    }
}
