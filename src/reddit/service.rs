// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! HTTPS connector for the Reddit API.
//!
//! Service structures in this module provide a low-level way to interact
//! with the Reddit API over HTTPS, essentially a specialized HTTPS client
//! specifically for Reddit. They know how to send a [`Request`] and parse
//! the JSON that comes back, and nothing about what that JSON means.

use crate::auth::{Authenticator, Session};
use crate::conf::ClientConfig;
use crate::http::{self, HTTPError, HTTPResult};
use futures::future::BoxFuture;
use log::{debug, trace};
use reqwest::multipart::{Form, Part};
pub use reqwest::Method;
use reqwest::{RequestBuilder, header};
use serde_json::Value;
use std::fmt;

/// Query or form parameters for a request, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Creates an empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any existing value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.0.push((key, value)),
        }
    }

    /// Sets `key` to `value` and returns the parameters, for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// The value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// An optional request body.
#[derive(Clone, PartialEq)]
pub enum Body {
    /// A JSON document, sent as `application/json`.
    Json(Value),

    /// A file upload, sent as `multipart/form-data` alongside the params.
    File {
        /// Name of the multipart field.
        field: String,
        /// File name reported to the server.
        file_name: String,
        /// Raw file contents.
        contents: Vec<u8>,
    },
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Json(value) => write!(f, "Json({value})"),
            Body::File {
                field,
                file_name,
                contents,
            } => write!(
                f,
                "File {{ field: {field}, file_name: {file_name}, {} bytes }}",
                contents.len()
            ),
        }
    }
}

/// A single call to the Reddit API.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    params: Params,
    body: Option<Body>,
}

impl Request {
    /// Creates a request with the given HTTP `method` for `path`.
    ///
    /// `path` is relative to the API base, e.g., `/api/vote`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.set(key, value);
        self
    }

    /// Replaces all parameters.
    pub fn params(self, params: Params) -> Self {
        Self { params, ..self }
    }

    /// Attaches a body.
    pub fn body(self, body: Body) -> Self {
        let body = Some(body);
        Self { body, ..self }
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, relative to the API base.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request's parameters.
    pub fn parameters(&self) -> &Params {
        &self.params
    }

    /// The request body, if any.
    pub fn payload(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}

/// Executes requests against the Reddit API.
///
/// Using this trait, clients can implement different ways of connecting
/// to the Reddit API, such as an actual connector for production code,
/// and a mocked connector for testing purposes. The trait is object-safe
/// so that a [`Client`](crate::reddit::Client) can hold any service behind
/// a pointer without becoming generic itself.
pub trait Service: Send + Sync {
    /// Sends `request` and returns the parsed JSON response.
    ///
    /// An empty response body is returned as [`Value::Null`].
    fn execute(&self, request: Request) -> BoxFuture<'_, HTTPResult<Value>>;
}

/// A service that contacts the Reddit API directly over HTTPS.
pub struct RedditService<A: Authenticator> {
    client: reqwest::Client,
    config: ClientConfig,
    session: Session<A>,
}

impl<A: Authenticator> RedditService<A> {
    /// Creates a new Reddit service that authenticates through `session`.
    pub fn new(session: Session<A>, config: ClientConfig) -> HTTPResult<Self> {
        let client = http::client(config.user_agent())?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    fn uri(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.config.api_base())
    }

    fn build(&self, request: Request, bearer: &str) -> RequestBuilder {
        let Request {
            method,
            path,
            params,
            body,
        } = request;
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        let builder = self
            .client
            .request(method.clone(), self.uri(&path))
            .bearer_auth(bearer)
            .query(&[("raw_json", "1")]);

        match body {
            Some(Body::Json(value)) => builder.query(&pairs).json(&value),
            Some(Body::File {
                field,
                file_name,
                contents,
            }) => {
                let form = params
                    .iter()
                    .fold(Form::new(), |form, (k, v)| {
                        form.text(k.to_string(), v.to_string())
                    })
                    .part(field, Part::bytes(contents).file_name(file_name));
                builder.multipart(form)
            }
            None if method == Method::GET || method == Method::DELETE => builder.query(&pairs),
            None => builder.form(&pairs),
        }
    }

    async fn send(&self, request: Request) -> HTTPResult<Value> {
        debug!("{} {}", request.method(), request.path());
        trace!("params: {:?}", request.parameters());

        let bearer = self.session.bearer().await?;
        let resp = self.build(request, &bearer).send().await?;

        if !resp.status().is_success() {
            return Err(HTTPError::from_status(resp.status(), resp.headers()));
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|value| value.to_str())
            .transpose()?
            .map(String::from);
        let body = resp.text().await?;
        parse_body(content_type.as_deref(), &body)
    }
}

impl<A: Authenticator> Service for RedditService<A> {
    fn execute(&self, request: Request) -> BoxFuture<'_, HTTPResult<Value>> {
        Box::pin(self.send(request))
    }
}

fn parse_body(content_type: Option<&str>, body: &str) -> HTTPResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    match content_type {
        None => Err(HTTPError::MissingContentType),
        Some(ct) if ct.starts_with("application/json") => Ok(serde_json::from_str(body)?),
        Some(ct) => Err(HTTPError::UnexpectedContentType(ct.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, TokenData};
    use crate::test_utils::FrozenClock;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct StaticAuthenticator;

    impl Authenticator for StaticAuthenticator {
        async fn authenticate(&self) -> HTTPResult<TokenData> {
            Ok(TokenData {
                access_token: String::from("abc"),
                token_type: String::from("bearer"),
                expires_in: 3600,
                scope: String::from("*"),
                refresh_token: None,
            })
        }

        async fn refresh(&self, _token: &AccessToken) -> HTTPResult<TokenData> {
            self.authenticate().await
        }
    }

    fn service() -> RedditService<StaticAuthenticator> {
        let session = Session::new(StaticAuthenticator, Arc::new(FrozenClock::default()));
        RedditService::new(session, ClientConfig::default()).unwrap()
    }

    #[test]
    fn it_returns_a_uri_for_paths() {
        let actual_uri = service().uri("/user/mipadi/comments");
        let expected_uri = "https://oauth.reddit.com/user/mipadi/comments";
        assert_eq!(actual_uri, expected_uri);
    }

    #[test]
    fn it_returns_a_uri_for_paths_without_a_leading_slash() {
        let actual_uri = service().uri("api/vote");
        assert_eq!(actual_uri, "https://oauth.reddit.com/api/vote");
    }

    #[test]
    fn it_sends_get_params_in_the_query_string() {
        let request = Request::get("/r/rust/new").param("limit", 25);
        let built = service().build(request, "abc").build().unwrap();
        assert_eq!(built.method(), Method::GET);
        assert_eq!(built.url().query(), Some("raw_json=1&limit=25"));
        assert!(built.body().is_none());
    }

    #[test]
    fn it_sends_post_params_as_a_form() {
        let request = Request::post("/api/vote").param("dir", 1).param("id", "t1_abc");
        let built = service().build(request, "abc").build().unwrap();
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(std::str::from_utf8(body).unwrap(), "dir=1&id=t1_abc");
        assert_eq!(
            built.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn it_sends_json_bodies() {
        let body = Body::Json(serde_json::json!({"name": "t2_abc"}));
        let request = Request::put("/api/v1/me/friends/mipadi").body(body);
        let built = service().build(request, "abc").build().unwrap();
        assert_eq!(
            built.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    mod params {
        use super::super::*;

        #[test]
        fn it_replaces_existing_keys() {
            let params = Params::new().with("after", "t3_a").with("after", "t3_b");
            assert_eq!(params.get("after"), Some("t3_b"));
            assert_eq!(params.iter().count(), 1);
        }

        #[test]
        fn it_preserves_insertion_order() {
            let params: Params = [("limit", "25"), ("sort", "new")].into_iter().collect();
            let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
            assert_eq!(keys, vec!["limit", "sort"]);
        }

        #[test]
        fn it_removes_keys() {
            let mut params = Params::new().with("after", "t3_a");
            assert_eq!(params.remove("after"), Some(String::from("t3_a")));
            assert_eq!(params.remove("after"), None);
            assert!(params.is_empty());
        }
    }

    mod body_parsing {
        use super::super::*;

        #[test]
        fn it_parses_json() {
            let value = parse_body(Some("application/json; charset=UTF-8"), r#"{"a": 1}"#);
            assert_eq!(value.unwrap(), serde_json::json!({"a": 1}));
        }

        #[test]
        fn it_treats_empty_bodies_as_null() {
            assert_eq!(parse_body(None, "").unwrap(), Value::Null);
        }

        #[test]
        fn it_rejects_html() {
            let err = parse_body(Some("text/html"), "<html></html>").unwrap_err();
            assert!(matches!(err, HTTPError::UnexpectedContentType(ct) if ct == "text/html"));
        }

        #[test]
        fn it_requires_a_content_type() {
            let err = parse_body(None, "{}").unwrap_err();
            assert!(matches!(err, HTTPError::MissingContentType));
        }
    }
}
