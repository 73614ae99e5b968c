use thiserror::Error;

/// Everything that can go wrong while polling the stock API.
///
/// Each consumer keeps its own errors: a failed `/wanted` poll never reaches
/// the all-items card or the image cache.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode image {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. }
            | FetchError::Image { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_url() {
        let source = serde_json::from_str::<Vec<i32>>("<html>").unwrap_err();
        let err = FetchError::Decode {
            url: "http://localhost:8001/all".to_string(),
            source,
        };

        assert_eq!(err.url(), "http://localhost:8001/all");
        assert!(err.to_string().starts_with("invalid JSON from http://localhost:8001/all"));
    }

    #[test]
    fn status_error_message() {
        let err = FetchError::Status {
            url: "http://api/wanted".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(err.to_string(), "http://api/wanted returned status 500 Internal Server Error");
    }
}
