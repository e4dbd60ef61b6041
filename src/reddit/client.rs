// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Clients for reading data from the Reddit API.

use crate::auth::{AuthError, Credentials, PasswordAuthenticator, Session};
use crate::clock::SystemClock;
use crate::conf::ClientConfig;
use crate::http::HTTPError;
use crate::listing::{Listing, Paginator};
use crate::reddit::service::{Params, RedditService, Request, Service};
use crate::stream::{self, StreamConfig};
use crate::thing::{self, Hydrate, Item, Message, Subreddit, Thing, User, WikiPage};
use futures::Stream;
use itertools::Itertools;
use log::{debug, warn};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A handle to the Reddit API.
///
/// Clients are cheap to clone; every clone shares the same underlying
/// [`Service`], and therefore the same access token. Every thing hydrated
/// by a client keeps a clone of it for follow-up requests.
#[derive(Clone)]
pub struct Client {
    service: Arc<dyn Service>,
}

impl Client {
    /// Creates a client that sends its requests through `service`.
    pub fn new(service: impl Service + 'static) -> Self {
        let service = Arc::new(service);
        Self { service }
    }

    /// Creates a client for a Reddit "script" app, using credentials
    /// and configuration from the environment.
    ///
    /// See [`Credentials::from_env()`] and [`ClientConfig::from_env()`] for
    /// the variables that are read.
    pub fn from_env() -> Result<Self, Error> {
        let credentials = Credentials::from_env()?;
        let config = ClientConfig::from_env();
        let authenticator = PasswordAuthenticator::new(credentials, &config)?;
        let session = Session::new(authenticator, Arc::new(SystemClock));
        let service = RedditService::new(session, config)?;
        Ok(Self::new(service))
    }

    /// Sends `request` and returns the raw JSON response.
    ///
    /// Reddit reports some failures with a successful status code and a
    /// list of errors in the body. Those are returned as [`Error::Api`].
    pub async fn request(&self, request: Request) -> Result<Value, Error> {
        let response = self.service.execute(request).await?;
        check_api_errors(&response)?;
        Ok(response)
    }

    /// Sends `request` and hydrates the response.
    pub async fn fetch<T: Hydrate>(&self, request: Request) -> Result<T, Error> {
        let raw = self.request(request).await?;
        Ok(T::hydrate(self, raw)?)
    }

    /// Fetches a single page of a listing.
    pub async fn listing<T: Hydrate>(&self, path: &str, params: Params) -> Result<Listing<T>, Error> {
        self.fetch(Request::get(path).params(params)).await
    }

    /// Creates a paginator over the listing at `path`.
    pub fn paginator<T: Hydrate>(&self, path: impl Into<String>, params: Params) -> Paginator<T> {
        Paginator::new(self.clone(), path, params)
    }

    /// Fetches up to `limit` items from the listing at `path`, following
    /// cursors across as many pages as necessary.
    pub async fn collect<T: Hydrate>(
        &self,
        path: impl Into<String>,
        params: Params,
        limit: usize,
    ) -> Result<Listing<T>, Error> {
        self.paginator(path, params).collect(limit).await
    }

    /// Polls the listing at `path` forever, yielding each item once.
    ///
    /// See [`stream::stream()`] for details.
    pub fn stream<T>(
        &self,
        path: &str,
        params: Params,
        config: StreamConfig,
    ) -> impl Stream<Item = Result<T, Error>> + Send + use<T>
    where
        T: Hydrate + Thing + 'static,
    {
        stream::stream(self.clone(), path.to_string(), params, config)
    }

    /// Looks up things by [fullname](crate::thing::Fullname).
    pub async fn info(&self, fullnames: &[&str]) -> Result<Listing<Item>, Error> {
        let params = Params::new().with("id", fullnames.iter().join(","));
        self.listing("/api/info", params).await
    }

    /// The authenticated user.
    pub async fn me(&self) -> Result<User, Error> {
        let raw = self.request(Request::get("/api/v1/me")).await?;
        Ok(User::from_data(self, raw)?)
    }

    /// A user by username.
    pub async fn user(&self, username: &str) -> Result<User, Error> {
        self.fetch(Request::get(format!("/user/{username}/about"))).await
    }

    /// A subreddit by name, without the `r/` prefix.
    pub async fn subreddit(&self, name: &str) -> Result<Subreddit, Error> {
        self.fetch(Request::get(format!("/r/{name}/about"))).await
    }

    /// A page from Reddit's site-wide wiki.
    pub async fn wikipage(&self, page: &str) -> Result<WikiPage, Error> {
        WikiPage::load(self, None, page).await
    }

    /// Names of the pages in Reddit's site-wide wiki.
    pub async fn wikipages(&self) -> Result<Vec<String>, Error> {
        let raw = self.request(Request::get("/wiki/pages")).await?;
        Ok(string_list(raw.get("data")))
    }

    /// Names of subreddits about `query`.
    pub async fn find_subreddits(&self, query: &str) -> Result<Vec<String>, Error> {
        let params = Params::new().with("query", query);
        let raw = self
            .request(Request::get("/api/subreddits_by_topic").params(params))
            .await?;
        let names = match raw {
            Value::Array(entries) => entries
                .iter()
                .filter_map(|entry| entry.get("name").and_then(Value::as_str))
                .map(String::from)
                .collect(),
            _ => vec![],
        };
        Ok(names)
    }

    /// Subreddits in one of Reddit's directories.
    pub fn subreddits(&self, directory: SubredditWhere) -> Paginator<Subreddit> {
        self.paginator(format!("/subreddits/{directory}"), Params::new())
    }

    /// The authenticated user's inbox: comment replies, mentions, and
    /// private messages.
    pub fn inbox(&self) -> Paginator<Item> {
        self.paginator("/message/inbox", Params::new())
    }

    /// Unread items in the authenticated user's inbox.
    pub fn unread(&self) -> Paginator<Item> {
        self.paginator("/message/unread", Params::new())
    }

    /// Private messages sent by the authenticated user.
    pub fn sent(&self) -> Paginator<Message> {
        self.paginator("/message/sent", Params::new())
    }

    /// Sends a private message to `to`, which is either a username or
    /// `/r/subreddit` to message a subreddit's moderators.
    pub async fn compose(&self, to: &str, subject: &str, text: &str) -> Result<(), Error> {
        let request = Request::post("/api/compose")
            .param("api_type", "json")
            .param("subject", subject)
            .param("text", text)
            .param("to", to);
        self.request(request).await?;
        Ok(())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// One of Reddit's subreddit directories.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubredditWhere {
    /// Subreddits ordered by activity.
    Popular,
    /// Newest subreddits first.
    New,
    /// Subreddits restricted to Premium members.
    Gold,
    /// Subreddits new accounts are subscribed to.
    Default,
}

impl fmt::Display for SubredditWhere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubredditWhere::Popular => "popular",
            SubredditWhere::New => "new",
            SubredditWhere::Gold => "gold",
            SubredditWhere::Default => "default",
        };
        write!(f, "{name}")
    }
}

fn check_api_errors(response: &Value) -> Result<(), Error> {
    let Some(errors) = response.pointer("/json/errors").and_then(Value::as_array) else {
        return Ok(());
    };
    if errors.is_empty() {
        return Ok(());
    }

    let errors: Vec<String> = errors.iter().map(describe_api_error).collect();
    warn!("Reddit rejected request: {}", errors.iter().join("; "));
    Err(Error::Api(errors))
}

// Reddit's errors are `[code, message, field]` triples.
fn describe_api_error(error: &Value) -> String {
    match error.as_array().map(Vec::as_slice) {
        Some([code, message, field, ..]) if !field.is_null() => format!(
            "{}: {} ({})",
            code.as_str().unwrap_or_default(),
            message.as_str().unwrap_or_default(),
            field.as_str().unwrap_or_default(),
        ),
        Some([code, message, ..]) => format!(
            "{}: {}",
            code.as_str().unwrap_or_default(),
            message.as_str().unwrap_or_default(),
        ),
        _ => error.to_string(),
    }
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_else(|| {
            debug!("Expected a list of strings, found {value:?}");
            vec![]
        })
}

/// A client error.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying HTTP service.
    #[error("Service error: {0}")]
    Service(#[from] HTTPError),

    /// An error parsing data.
    #[error("Parse error: {0}")]
    Parse(#[from] thing::Error),

    /// Reddit accepted the request but refused to carry it out.
    #[error("Reddit API error: {}", .0.join("; "))]
    Api(Vec<String>),

    /// An action succeeded, but the thing it acted on could not be
    /// refreshed afterwards, so the local copy is out of date.
    #[error("{action} succeeded, but refreshing afterwards failed: {source}")]
    StaleState {
        /// The action that succeeded.
        action: &'static str,
        /// Why the refresh failed.
        source: Box<Error>,
    },

    /// Credentials could not be loaded.
    #[error("Credentials error: {0}")]
    Credentials(#[from] AuthError),
}

impl Error {
    /// True if retrying the request later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Service(err) => err.is_transient(),
            _ => false,
        }
    }

    /// True if the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Service(HTTPError::NotFound))
    }
}
