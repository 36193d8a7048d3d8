use actix_web::http::Method;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zhihu_rss_proxy::cache::CacheState;
use zhihu_rss_proxy::{refresh_rendering, serve_feed, AppState, Args, FeedSource};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let address = format!("{}:{}", args.ip, args.port);
    let path = args.path.clone();

    let source = FeedSource::from_args(&args).map_err(|e| {
        error!(error = %e, "Invalid configuration");
        std::io::Error::new(std::io::ErrorKind::Other, "Invalid configuration")
    })?;

    // The first rendering happens before the listener opens, so the server
    // never serves an empty feed.
    let rendering = refresh_rendering(&source).await.map_err(|e| {
        error!(url = %source.url, error = %e, "Initial feed refresh failed");
        std::io::Error::new(std::io::ErrorKind::Other, "Initial feed refresh failed")
    })?;

    let app_state = web::Data::new(AppState {
        cache: Mutex::new(CacheState::new(rendering, Instant::now(), source.ttl)),
        source,
    });

    info!(
        "Serving feed for {} at http://{}{}",
        app_state.source.url, address, path
    );
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .route(&path, web::get().to(serve_feed))
            .route(&path, web::method(Method::HEAD).to(serve_feed))
    })
    .bind(&address)?
    .run()
    .await
}
