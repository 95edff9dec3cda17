use std::env;

/// Default image-proxy allow-list: the CDNs the scraped rows link to.
const DEFAULT_IMG_HOSTS: &[&str] = &[
    "redd.it",
    "redditmedia.com",
    "redditstatic.com",
    "cdninstagram.com",
    "fbcdn.net",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Hosted Postgres
    pub database_url: String,

    // External scraper-control service
    pub scraperd_base_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Image proxy
    pub img_allowed_hosts: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            scraperd_base_url: env::var("SCRAPERD_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            img_allowed_hosts: env::var("IMG_ALLOWED_HOSTS")
                .map(|raw| {
                    raw.split(',')
                        .map(|h| h.trim().to_string())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    DEFAULT_IMG_HOSTS.iter().map(|h| h.to_string()).collect()
                }),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
