use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperdError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("scraperd API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("scraperd request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ScraperdError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScraperdError::Timeout
        } else {
            ScraperdError::Http(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperdError>;
