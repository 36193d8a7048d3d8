use actix_web::{
    http::{header, Method},
    web, HttpRequest, HttpResponse, Responder,
};
use chrono_tz::Tz;
use clap::Parser;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub mod cache;
pub mod error;
pub mod feed;
pub mod zhihu;

use cache::CacheState;
use error::FeedError;

#[derive(Parser, Debug)]
#[clap(about, version)]
pub struct Args {
    #[clap(short, long, default_value = "https://www.zhihu.com/people/mr_lyc")]
    pub url: String,

    #[clap(short, long, default_value = "127.0.0.1")]
    pub ip: String,

    #[clap(short, long, default_value = "8080")]
    pub port: u16,

    #[clap(short, long, default_value = "600")]
    pub cache_lifetime: u64,

    #[clap(long, default_value = "/")]
    pub path: String,

    #[clap(short, long, default_value = "UTC")]
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct FeedSource {
    pub url: String,
    pub ttl: Duration,
    pub timezone: Tz,
}

impl FeedSource {
    pub fn from_args(args: &Args) -> Result<Self, FeedError> {
        let timezone: Tz = args
            .timezone
            .parse()
            .map_err(|_| FeedError::UnknownTimezone(args.timezone.clone()))?;

        Ok(FeedSource {
            url: args.url.clone(),
            ttl: Duration::from_secs(args.cache_lifetime),
            timezone,
        })
    }
}

pub struct AppState {
    pub source: FeedSource,
    pub cache: Mutex<CacheState>,
}

pub async fn serve_feed(app_data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let claimed_at = Instant::now();
    {
        let mut cache = app_data.cache.lock().await;
        if !cache.begin_refresh(claimed_at) {
            debug!(url = %app_data.source.url, "Serving cached rendering");
            return create_response(&req, cache.rendering(), cache.rendered_at());
        }
    }

    info!(url = %app_data.source.url, "Cache lifetime elapsed, refreshing feed");
    let rendering = match refresh_rendering(&app_data.source).await {
        Ok(rendering) => Some(rendering),
        Err(err) => {
            warn!(url = %app_data.source.url, error = %err, "Refresh failed, serving previous rendering");
            None
        }
    };

    let mut cache = app_data.cache.lock().await;
    cache.finish_refresh(rendering, claimed_at, app_data.source.ttl);
    create_response(&req, cache.rendering(), cache.rendered_at())
}

pub async fn refresh_rendering(source: &FeedSource) -> Result<String, FeedError> {
    let extraction = {
        let document = zhihu::fetch_document(&source.url).await?;
        zhihu::extract_feed(&document, source)?
    };
    if extraction.omitted > 0 {
        warn!(url = %source.url, omitted = extraction.omitted, "Timeline items missing required fields were dropped");
    }

    extraction.feed.to_rss()
}

fn create_response(req: &HttpRequest, body: &str, rendered_at: SystemTime) -> HttpResponse {
    let last_modified = header::HttpDate::from(rendered_at);

    let mut response = HttpResponse::Ok();
    response.insert_header((header::CONTENT_TYPE, "application/rss+xml"));
    response.insert_header((header::LAST_MODIFIED, last_modified.to_string()));

    if req.method() == Method::HEAD {
        response
            .insert_header((header::CONTENT_LENGTH, body.len()))
            .finish()
    } else {
        response.body(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_match_the_public_profile() {
        let args = Args::parse_from(["zhihu-rss-proxy"]);

        assert_eq!(args.url, "https://www.zhihu.com/people/mr_lyc");
        assert_eq!(args.ip, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert_eq!(args.cache_lifetime, 600);
        assert_eq!(args.path, "/");
        assert_eq!(args.timezone, "UTC");
    }

    #[test]
    fn source_carries_parsed_timezone_and_lifetime() {
        let args = Args::parse_from([
            "zhihu-rss-proxy",
            "--timezone",
            "Asia/Shanghai",
            "--cache-lifetime",
            "42",
        ]);
        let source = FeedSource::from_args(&args).unwrap();

        assert_eq!(source.timezone, chrono_tz::Asia::Shanghai);
        assert_eq!(source.ttl, Duration::from_secs(42));
    }

    #[test]
    fn source_rejects_unknown_timezones() {
        let args = Args::parse_from(["zhihu-rss-proxy", "--timezone", "Mars/Olympus"]);
        let result = FeedSource::from_args(&args);

        assert!(
            matches!(result, Err(FeedError::UnknownTimezone(name)) if name == "Mars/Olympus")
        );
    }
}
