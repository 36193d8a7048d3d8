use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use reqwest::header::{HeaderMap, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::FeedError;
use crate::feed::{link_uuid, FeedDocument, FeedEntry};
use crate::FeedSource;

// Structural queries for the profile activity page. Layout drift lands here.
const ENTRY_TIME_ATTR: &str = "data-time";
const ENTRY_LINK_ATTR: &str = "href";

lazy_static! {
    static ref TIMELINE_ITEMS: Selector =
        Selector::parse("#zh-profile-activity-page-list .zm-profile-section-item").unwrap();
    static ref ENTRY_LINK: Selector = Selector::parse(".zm-profile-section-main a").unwrap();
    static ref ENTRY_AUTHOR: Selector = Selector::parse(".author-link").unwrap();
    static ref ENTRY_CONTENT: Selector = Selector::parse("textarea.content").unwrap();
    static ref PAGE_TITLE: Selector = Selector::parse("title").unwrap();
    static ref PROFILE_DESCRIPTION: Selector =
        Selector::parse("div.zm-profile-header-description span.content").unwrap();
    static ref PROFILE_NAME: Selector = Selector::parse("div.title-section span.name").unwrap();
}

fn build_user_agent() -> HeaderMap {
    // Zhihu serves an error page to default client agents.
    let custom_user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, custom_user_agent.parse().unwrap());
    headers
}

pub async fn fetch_document(url: &str) -> Result<Html, FeedError> {
    let client = reqwest::Client::new();
    let response_text = client
        .get(url)
        .headers(build_user_agent())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(Html::parse_document(&response_text))
}

pub struct Extraction {
    pub feed: FeedDocument,
    pub omitted: usize, // timeline items dropped for missing required fields
}

pub fn extract_feed(document: &Html, source: &FeedSource) -> Result<Extraction, FeedError> {
    let base = Url::parse(&source.url)?;
    let origin = base.origin().ascii_serialization();

    let mut entries = Vec::new();
    let mut omitted = 0usize;
    for item in document.select(&TIMELINE_ITEMS) {
        match extract_entry(item, &origin, source.timezone) {
            Some(entry) => entries.push(entry),
            None => omitted += 1,
        }
    }

    let feed = FeedDocument {
        id: link_uuid(&source.url),
        title: first_text(document, &PAGE_TITLE),
        link: source.url.clone(),
        description: first_text(document, &PROFILE_DESCRIPTION),
        author: first_text(document, &PROFILE_NAME),
        created: Utc::now().with_timezone(&source.timezone),
        entries,
    };

    Ok(Extraction { feed, omitted })
}

fn extract_entry(item: ElementRef, origin: &str, timezone: Tz) -> Option<FeedEntry> {
    let epoch: i64 = item.value().attr(ENTRY_TIME_ATTR)?.parse().ok()?;
    let created = DateTime::from_timestamp(epoch, 0)?.with_timezone(&timezone);

    // The main block nests several anchors; the innermost one is the post.
    let anchor = item.select(&ENTRY_LINK).last()?;
    let title = anchor.text().collect::<String>();
    if title.is_empty() {
        return None;
    }
    let href = anchor.value().attr(ENTRY_LINK_ATTR)?;
    let link = if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        href.to_string()
    };

    let author = item
        .select(&ENTRY_AUTHOR)
        .last()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();
    let content = item
        .select(&ENTRY_CONTENT)
        .flat_map(|el| el.text())
        .collect::<String>();

    Some(FeedEntry {
        id: link_uuid(&link),
        title,
        author,
        link,
        created,
        content,
    })
}

fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
}
