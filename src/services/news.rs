//! Industry news for the home page widget, pulled from RSS feeds.
//!
//! Parsing is a handful of regexes over each `<item>`, not a full XML parser.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use moka::future::Cache;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NewsConfig;

const USER_AGENT: &str = "FreightThis News Aggregator/1.0";
const ITEMS_PER_FEED: usize = 4;
const MAX_ITEMS: usize = 8;
const SUMMARY_CHARS: usize = 150;
const DEFAULT_SUMMARY: &str = "Read more...";
const CACHE_KEY: &str = "news";

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item>(.*?)</item>").expect("Invalid regex"));
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<title><!\[CDATA\[(.*?)\]\]></title>|<title>(.*?)</title>").expect("Invalid regex")
});
static DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<description><!\[CDATA\[(.*?)\]\]></description>|<description>(.*?)</description>")
        .expect("Invalid regex")
});
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<link>(.*?)</link>").expect("Invalid regex"));
static PUB_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<pubDate>(.*?)</pubDate>").expect("Invalid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));
static DEC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(\d+);").expect("Invalid regex"));
static HEX_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#x([0-9a-fA-F]+);").expect("Invalid regex"));

const NAMED_ENTITIES: [(&str, &str); 7] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&#39;", "'"),
    ("&#8217;", "'"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub pub_date: String,
}

pub fn decode_html_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    for (entity, replacement) in NAMED_ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }

    let decoded = DEC_ENTITY_RE.replace_all(&decoded, |caps: &Captures| char_ref(caps, 10));
    HEX_ENTITY_RE
        .replace_all(&decoded, |caps: &Captures| char_ref(caps, 16))
        .into_owned()
}

/// Numeric character reference; left as-is when it names no valid char.
fn char_ref(caps: &Captures<'_>, radix: u32) -> String {
    u32::from_str_radix(&caps[1], radix)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| caps[0].to_string())
}

fn first_group(re: &Regex, haystack: &str) -> String {
    re.captures(haystack)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Up to four items from one feed document, in feed order.
pub fn parse_rss_feed(xml: &str) -> Vec<NewsItem> {
    let mut items = Vec::new();

    for caps in ITEM_RE.captures_iter(xml) {
        let item = &caps[1];

        let title = first_group(&TITLE_RE, item);
        let link = first_group(&LINK_RE, item);
        if title.is_empty() || link.is_empty() {
            continue;
        }

        let description = decode_html_entities(&first_group(&DESC_RE, item));
        let stripped = TAG_RE.replace_all(&description, "");
        let summary: String = stripped.chars().take(SUMMARY_CHARS).collect();
        let summary = summary.trim();

        items.push(NewsItem {
            title: decode_html_entities(&title),
            summary: if summary.is_empty() {
                DEFAULT_SUMMARY.to_string()
            } else {
                summary.to_string()
            },
            link,
            pub_date: first_group(&PUB_DATE_RE, item),
        });

        if items.len() >= ITEMS_PER_FEED {
            break;
        }
    }

    items
}

/// RSS dates are RFC 2822; some feeds use RFC 3339.
fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Newest first, undated items last, at most eight.
pub fn merge_feeds(feeds: Vec<Vec<NewsItem>>) -> Vec<NewsItem> {
    let mut all: Vec<NewsItem> = feeds.into_iter().flatten().collect();
    all.sort_by(|a, b| {
        let da = parse_pub_date(&a.pub_date);
        let db = parse_pub_date(&b.pub_date);
        // Option orders None first, so compare reversed for descending with None last.
        db.cmp(&da)
    });
    all.truncate(MAX_ITEMS);
    all
}

pub struct NewsAggregator {
    client: reqwest::Client,
    feeds: Vec<String>,
    cache: Cache<&'static str, Arc<Vec<NewsItem>>>,
}

impl NewsAggregator {
    pub fn new(cfg: &NewsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(cfg.cache_ttl_secs))
            .build();

        Ok(Self {
            client,
            feeds: cfg.feeds.clone(),
            cache,
        })
    }

    /// Cached merged headlines. Empty results are not cached.
    pub async fn latest(&self) -> Arc<Vec<NewsItem>> {
        if let Some(hit) = self.cache.get(CACHE_KEY).await {
            return hit;
        }

        let results = join_all(self.feeds.iter().map(|url| self.fetch_feed_or_empty(url))).await;
        let news = Arc::new(merge_feeds(results));
        if !news.is_empty() {
            self.cache.insert(CACHE_KEY, news.clone()).await;
        }
        news
    }

    async fn fetch_feed_or_empty(&self, url: &str) -> Vec<NewsItem> {
        match self.fetch_feed(url).await {
            Ok(items) => {
                debug!("Fetched {} news items from {}", items.len(), url);
                items
            }
            Err(e) => {
                warn!("Error fetching feed {}: {:#}", url, e);
                Vec::new()
            }
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<NewsItem>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch feed")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let xml = response.text().await.context("Failed to read feed body")?;
        Ok(parse_rss_feed(&xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss><channel>
<item>
  <title><![CDATA[Spot rates climb &amp; capacity tightens]]></title>
  <link>https://news.example.com/a</link>
  <pubDate>Tue, 04 Mar 2025 10:00:00 +0000</pubDate>
  <description><![CDATA[<p>Truckload <b>spot</b> rates rose for a third week.</p>]]></description>
</item>
<item>
  <title>Port volumes &#8217;steady&#8217;</title>
  <link>https://news.example.com/b</link>
  <pubDate>Mon, 03 Mar 2025 10:00:00 +0000</pubDate>
</item>
<item>
  <title>No link here</title>
</item>
<item>
  <title>Rail &#x26; intermodal</title>
  <link>https://news.example.com/c</link>
  <description>Intermodal &lt;em&gt;loads&lt;/em&gt; up 4&#37;</description>
</item>
<item><title>Four</title><link>https://news.example.com/d</link></item>
<item><title>Five</title><link>https://news.example.com/e</link></item>
</channel></rss>"#;

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("A &amp; B &lt;C&gt;"), "A & B <C>");
        assert_eq!(decode_html_entities("it&#8217;s &quot;ok&quot;"), "it's \"ok\"");
        assert_eq!(decode_html_entities("&#65;&#x42;&#x63;"), "ABc");
        assert_eq!(decode_html_entities("&#99999999;"), "&#99999999;");
    }

    #[test]
    fn test_parse_rss_feed() {
        let items = parse_rss_feed(FEED);
        assert_eq!(items.len(), 4);

        assert_eq!(items[0].title, "Spot rates climb & capacity tightens");
        assert_eq!(items[0].summary, "Truckload spot rates rose for a third week.");
        assert_eq!(items[0].pub_date, "Tue, 04 Mar 2025 10:00:00 +0000");

        assert_eq!(items[1].title, "Port volumes 'steady'");
        assert_eq!(items[1].summary, DEFAULT_SUMMARY);

        assert_eq!(items[2].title, "Rail & intermodal");
        assert_eq!(items[2].summary, "Intermodal loads up 4%");
        assert_eq!(items[3].link, "https://news.example.com/d");
    }

    #[test]
    fn test_summary_is_truncated() {
        let xml = format!(
            "<item><title>T</title><link>L</link><description>{}</description></item>",
            "é".repeat(400)
        );
        let items = parse_rss_feed(&xml);
        assert_eq!(items[0].summary.chars().count(), SUMMARY_CHARS);
    }

    #[test]
    fn test_merge_sorts_newest_first_and_limits() {
        let item = |title: &str, date: &str| NewsItem {
            title: title.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
            link: format!("https://news.example.com/{}", title),
            pub_date: date.to_string(),
        };
        let a = vec![
            item("old", "Mon, 03 Mar 2025 10:00:00 +0000"),
            item("undated", ""),
        ];
        let b = vec![item("new", "Wed, 05 Mar 2025 10:00:00 +0000")];
        let merged = merge_feeds(vec![a, b]);
        let titles: Vec<&str> = merged.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["new", "old", "undated"]);

        let many: Vec<NewsItem> = (0..12).map(|i| item(&i.to_string(), "")).collect();
        assert_eq!(merge_feeds(vec![many]).len(), MAX_ITEMS);
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_nothing() {
        let aggregator = NewsAggregator::new(&NewsConfig {
            feeds: vec!["http://127.0.0.1:9/feed".to_string()],
            fetch_timeout_secs: 1,
            cache_ttl_secs: 300,
        })
        .unwrap();
        assert!(aggregator.latest().await.is_empty());
    }
}
