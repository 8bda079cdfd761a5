//! Error types for the animexin library.

/// Errors produced while fetching, decoding or resolving content.
///
/// Only catalog operations and configuration loading surface these to the
/// caller. Link resolution swallows them per source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A URL could not be parsed or joined against the site base.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Network failure or non-success status.
    #[error("http error: {0}")]
    Http(String),

    /// A response did not have the expected HTML or JSON shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Base64 or utf-8 decoding failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// A generic extractor gave up on a url.
    #[error("extract error: {0}")]
    Extract(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Http("status 503".to_string());
        assert_eq!(err.to_string(), "http error: status 503");
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_from_reqwest_error() {
        let err: Error = reqwest::Client::new().get("not a url").build().unwrap_err().into();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_from_json_error() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("parse error"));
    }
}
