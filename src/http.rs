// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Errors and helpers for talking to HTTP services.

use reqwest::header::{self, HeaderMap};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Builds the HTTP client shared by every request to Reddit.
///
/// `user_agent` should follow Reddit's API rules: a unique, descriptive
/// string. Reddit aggressively throttles generic user agents.
pub fn client(user_agent: &str) -> HTTPResult<Client> {
    Ok(ClientBuilder::new().user_agent(user_agent).build()?)
}

/// The result of an HTTP request.
pub type HTTPResult<T> = Result<T, HTTPError>;

/// Indicates an error has occurred when making an HTTP call.
#[derive(Debug, Error)]
pub enum HTTPError {
    /// The access token was rejected, or the token exchange failed.
    #[error("Not authorized: HTTP {0}")]
    Auth(StatusCode),

    /// The OAuth server accepted the request but refused to issue a token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Too many requests. `retry_after` is the server's suggested delay,
    /// if it provided one.
    #[error("Rate limited{}", retry_hint(.retry_after))]
    RateLimit {
        /// How long the server asked us to wait.
        retry_after: Option<Duration>,
    },

    /// The resource no longer exists.
    #[error("Resource not found")]
    NotFound,

    /// Reddit itself failed.
    #[error("Server error: HTTP {0}")]
    Server(StatusCode),

    /// Any other unsuccessful HTTP status code.
    #[error("Request returned HTTP {0}")]
    Http(StatusCode),

    /// A network-level failure while making the request or reading the body.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A missing Content-Type header in a response.
    #[error("Missing Content-Type header")]
    MissingContentType,

    /// An invalid Content-Type header.
    #[error("Invalid Content-Type header value: {0}")]
    InvalidContentType(#[from] header::ToStrError),

    /// A Content-Type that is not understood by the service.
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// The response body claimed to be JSON but could not be parsed.
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl HTTPError {
    /// Classifies an unsuccessful status code.
    ///
    /// `headers` are consulted for rate limit hints.
    pub fn from_status(status: StatusCode, headers: &HeaderMap) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HTTPError::Auth(status),
            StatusCode::NOT_FOUND => HTTPError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => HTTPError::RateLimit {
                retry_after: retry_after(headers),
            },
            s if s.is_server_error() => HTTPError::Server(s),
            s => HTTPError::Http(s),
        }
    }

    /// True if the same request might succeed if it is simply tried again
    /// later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HTTPError::RateLimit { .. } | HTTPError::Server(_) | HTTPError::Transport(_)
        )
    }
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(" (retry after {}s)", d.as_secs()))
        .unwrap_or_default()
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    [header::RETRY_AFTER.as_str(), "x-ratelimit-reset"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.trim().parse::<f64>().ok())
        .map(|secs| Duration::from_secs(secs.max(0.0).ceil() as u64))
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn it_classifies_unauthorized_responses() {
        let err = HTTPError::from_status(StatusCode::UNAUTHORIZED, &HeaderMap::new());
        assert!(matches!(err, HTTPError::Auth(StatusCode::UNAUTHORIZED)));
    }

    #[test]
    fn it_classifies_forbidden_responses() {
        let err = HTTPError::from_status(StatusCode::FORBIDDEN, &HeaderMap::new());
        assert!(matches!(err, HTTPError::Auth(StatusCode::FORBIDDEN)));
    }

    #[test]
    fn it_classifies_missing_resources() {
        let err = HTTPError::from_status(StatusCode::NOT_FOUND, &HeaderMap::new());
        assert!(matches!(err, HTTPError::NotFound));
    }

    #[test]
    fn it_reads_retry_after_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("7"));
        let err = HTTPError::from_status(StatusCode::TOO_MANY_REQUESTS, &headers);
        assert!(matches!(
            err,
            HTTPError::RateLimit { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));
    }

    #[test]
    fn it_reads_reddit_ratelimit_reset_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("12.4"));
        let err = HTTPError::from_status(StatusCode::TOO_MANY_REQUESTS, &headers);
        assert!(matches!(
            err,
            HTTPError::RateLimit { retry_after: Some(d) } if d == Duration::from_secs(13)
        ));
    }

    #[test]
    fn it_tolerates_rate_limits_without_hints() {
        let err = HTTPError::from_status(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new());
        assert!(matches!(err, HTTPError::RateLimit { retry_after: None }));
        assert_eq!(err.to_string(), "Rate limited");
    }

    #[test]
    fn it_classifies_server_errors() {
        let err = HTTPError::from_status(StatusCode::BAD_GATEWAY, &HeaderMap::new());
        assert!(matches!(err, HTTPError::Server(StatusCode::BAD_GATEWAY)));
    }

    #[test]
    fn it_classifies_other_statuses() {
        let err = HTTPError::from_status(StatusCode::CONFLICT, &HeaderMap::new());
        assert!(matches!(err, HTTPError::Http(StatusCode::CONFLICT)));
    }

    #[test]
    fn it_treats_rate_limits_and_server_errors_as_transient() {
        assert!(HTTPError::RateLimit { retry_after: None }.is_transient());
        assert!(HTTPError::Server(StatusCode::SERVICE_UNAVAILABLE).is_transient());
    }

    #[test]
    fn it_treats_auth_failures_as_permanent() {
        assert!(!HTTPError::Auth(StatusCode::FORBIDDEN).is_transient());
        assert!(!HTTPError::NotFound.is_transient());
    }
}
