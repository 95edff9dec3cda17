use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, patch, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use curator_common::Config;
use curator_db::{CategoryStore, CreatorStore, SubredditStore, UserStore};
use scraperd_client::{ScraperStatus, ScraperdClient};

mod rest;

pub struct AppState {
    pub categories: CategoryStore,
    pub subreddits: SubredditStore,
    pub creators: CreatorStore,
    pub users: UserStore,
    pub scraperd: ScraperdClient,
    /// Last successful scraper status, served when scraperd times out.
    pub last_scraper_status: Mutex<Option<ScraperStatus>>,
    pub img_allowed_hosts: Vec<String>,
    /// Client for upstream image fetches: bounded timeout, no redirects.
    pub img_client: reqwest::Client,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("curator_api=info".parse()?)
                .add_directive("curator_db=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let pool = curator_db::connect(&config.database_url).await?;

    let img_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let state = Arc::new(AppState {
        categories: CategoryStore::new(pool.clone()),
        subreddits: SubredditStore::new(pool.clone()),
        creators: CreatorStore::new(pool.clone()),
        users: UserStore::new(pool),
        scraperd: ScraperdClient::new(&config.scraperd_base_url),
        last_scraper_status: Mutex::new(None),
        img_allowed_hosts: config.img_allowed_hosts.clone(),
        img_client,
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Categories
        .route(
            "/api/categories",
            get(rest::categories::list).post(rest::categories::create),
        )
        .route(
            "/api/categories/{id}",
            patch(rest::categories::update).delete(rest::categories::remove),
        )
        .route("/api/categories/merge", post(rest::categories::merge))
        .route("/api/categories/recount", post(rest::categories::recount))
        // Subreddits
        .route("/api/subreddits", get(rest::subreddits::list))
        .route("/api/subreddits/stats", get(rest::subreddits::stats))
        .route(
            "/api/subreddits/bulk-category",
            post(rest::subreddits::bulk_category),
        )
        .route(
            "/api/subreddits/bulk-review",
            post(rest::subreddits::bulk_review),
        )
        .route(
            "/api/subreddits/{id}/review",
            patch(rest::subreddits::set_review),
        )
        // Creators
        .route("/api/creators", get(rest::creators::list))
        .route("/api/creators/stats", get(rest::creators::stats))
        .route(
            "/api/creators/bulk-category",
            post(rest::creators::bulk_category),
        )
        .route(
            "/api/creators/bulk-review",
            post(rest::creators::bulk_review),
        )
        .route("/api/creators/{id}/review", patch(rest::creators::set_review))
        // Users
        .route("/api/users", get(rest::users::list))
        .route("/api/users/{id}/creator", patch(rest::users::set_creator))
        // Image proxy
        .route("/api/img", get(rest::img::proxy))
        // Scraper control proxy
        .route("/api/scraper/status", get(rest::scraper::status))
        .route("/api/scraper/start", post(rest::scraper::start))
        .route("/api/scraper/stop", post(rest::scraper::stop))
        .route("/api/scraper/success-rate", get(rest::scraper::success_rate))
        .route("/api/scraper/cost-metrics", get(rest::scraper::cost_metrics))
        .route("/api/scraper/cycle-status", get(rest::scraper::cycle_status))
        .with_state(state)
        // CORS: the dashboard frontend is served from its own origin
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Curation data changes constantly; only the image proxy opts into
        // caching (it sets its own header, which wins over this default).
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Curator API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
