use chrono::format::strftime::StrftimeItems;
use chrono::DateTime;
use chrono_tz::Tz;
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::error::FeedError;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const RSS_DOCS_URL: &str = "http://www.rssboard.org/rss-specification";

pub fn format_rfc822(datetime: DateTime<Tz>) -> String {
    let format = StrftimeItems::new("%a, %d %b %Y %H:%M:%S %z");
    datetime.format_with_items(format).to_string()
}

/// Deterministic UUID-shaped fingerprint of a link.
///
/// XOR-folds the link bytes into 16 bytes, then patches the version and
/// variant nibbles so the result reads as a valid UUID. Feed readers key
/// read-state off these values, so the algorithm must stay stable.
pub fn link_uuid(link: &str) -> String {
    let mut buf = [0u8; 16];
    for (i, byte) in link.bytes().enumerate() {
        buf[i % 16] ^= byte;
    }
    buf[8] = (buf[8] | 0x80) & 0xBF;
    buf[6] = (buf[6] | 0x40) & 0x4F;

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
        buf[8], buf[9], buf[10], buf[11], buf[12], buf[13], buf[14], buf[15],
    )
}

#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub link: String,
    pub created: DateTime<Tz>,
    pub content: String,
}

impl FeedEntry {
    fn to_item(&self) -> Item {
        let guid = GuidBuilder::default()
            .value(self.id.clone())
            .permalink(false)
            .build();

        let mut item = ItemBuilder::default();
        item.guid(Some(guid))
            .title(Some(self.title.clone()))
            .link(Some(self.link.clone()))
            .pub_date(Some(format_rfc822(self.created)))
            .description(Some(self.content.clone()));
        if !self.author.is_empty() {
            item.author(Some(self.author.clone()));
        }
        item.build()
    }
}

#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: String,
    pub created: DateTime<Tz>,
    pub entries: Vec<FeedEntry>,
}

impl FeedDocument {
    pub fn to_rss(&self) -> Result<String, FeedError> {
        let items: Vec<Item> = self.entries.iter().map(FeedEntry::to_item).collect();

        let app_name = env!("CARGO_PKG_NAME");
        let app_version = env!("CARGO_PKG_VERSION");

        let mut channel = ChannelBuilder::default();
        channel
            .title(self.title.clone())
            .link(self.link.clone())
            .description(self.description.clone())
            .last_build_date(Some(format_rfc822(self.created)))
            .generator(Some(format!("{} v{}", app_name, app_version)))
            .docs(Some(RSS_DOCS_URL.to_string()))
            .items(items);
        if !self.author.is_empty() {
            channel.managing_editor(Some(self.author.clone()));
        }

        let body = channel.build().write_to(Vec::new())?;
        Ok(format!(
            "{}{}",
            XML_DECLARATION,
            String::from_utf8_lossy(&body)
        ))
    }
}
