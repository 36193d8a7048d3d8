use thiserror::Error;

/// Only `UnknownTimezone` is fatal, and only at startup.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("upstream request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid source url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("feed serialization failed: {0}")]
    Render(#[from] rss::Error),
}
