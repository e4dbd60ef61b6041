// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! OAuth2 authentication for the Reddit API.
//!
//! An [`AccessToken`] is a plain value that knows when it expires. The
//! network exchange that produces tokens lives behind the [`Authenticator`]
//! trait, and a [`Session`] ties the two together, handing out bearer
//! tokens and refreshing them when they expire.

use crate::clock::{Clock, DateTime, TimeDelta, Utc};
use crate::conf::ClientConfig;
use crate::http::{self, HTTPError, HTTPResult};
use log::{debug, trace};
use reqwest::header;
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Tokens are considered expired this many seconds before the server
/// actually expires them, to avoid racing the server's clock.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// Token data as returned by Reddit's token endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TokenData {
    /// The bearer credential.
    pub access_token: String,

    /// Kind of token; always `bearer` for Reddit.
    pub token_type: String,

    /// Lifetime of the token in seconds.
    pub expires_in: i64,

    /// Space-separated scopes the token is valid for.
    pub scope: String,

    /// Only issued for "permanent" web and installed app grants.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Token(TokenData),
    Error { error: String },
}

/// An OAuth2 access token and its expiration date.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessToken {
    access_token: String,
    token_type: String,
    refresh_token: Option<String>,
    scope: String,
    expires_in: i64,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a new token from the token endpoint's response.
    ///
    /// `clock` marks the time the token was issued.
    pub fn new(data: TokenData, clock: &dyn Clock) -> Self {
        let expires_at = Self::expiry(data.expires_in, clock);
        Self {
            access_token: data.access_token,
            token_type: data.token_type,
            refresh_token: data.refresh_token,
            scope: data.scope,
            expires_in: data.expires_in,
            expires_at,
        }
    }

    fn expiry(expires_in: i64, clock: &dyn Clock) -> DateTime<Utc> {
        clock.now() + TimeDelta::seconds(expires_in - EXPIRY_MARGIN_SECS)
    }

    /// True if the token should no longer be used.
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        clock.now() > self.expires_at
    }

    /// Replaces this token with freshly-issued token data.
    ///
    /// Every field is overwritten, including the refresh token.
    pub fn refresh(&mut self, data: TokenData, clock: &dyn Clock) {
        *self = Self::new(data, clock);
    }

    /// The bearer credential.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Kind of token.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Token that can be exchanged for a new access token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Scopes the token is valid for.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The lifetime of the token, in seconds, as issued by the server.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// When the token should be considered expired.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Credentials for a Reddit "script" application.
#[derive(Clone, Debug)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a new set of credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Retrieves credentials from `$REDDIT_CLIENT_ID`,
    /// `$REDDIT_CLIENT_SECRET`, `$REDDIT_USERNAME`, and `$REDDIT_PASSWORD`.
    ///
    /// Returns an error naming the first variable that cannot be read.
    pub fn from_env() -> AuthResult<Self> {
        let var = |name: &'static str| env::var(name).map_err(|err| AuthError::Env(name, err));
        Ok(Self {
            client_id: var("REDDIT_CLIENT_ID")?,
            client_secret: var("REDDIT_CLIENT_SECRET")?,
            username: var("REDDIT_USERNAME")?,
            password: var("REDDIT_PASSWORD")?,
        })
    }

    /// The application's client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The Reddit account the application acts on behalf of.
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Standard result type for credential loading.
pub type AuthResult<T> = Result<T, AuthError>;

/// Indicates an error when loading credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An error occurred while retrieving a credential from the environment.
    #[error("Environment error for ${0}: {1}")]
    Env(&'static str, #[source] env::VarError),
}

/// Exchanges credentials for access tokens.
///
/// Implementations perform the network exchange; they never store tokens.
pub trait Authenticator: Send + Sync {
    /// Obtains a brand new token.
    fn authenticate(&self) -> impl Future<Output = HTTPResult<TokenData>> + Send;

    /// Obtains a replacement for an expired token.
    fn refresh(&self, token: &AccessToken) -> impl Future<Output = HTTPResult<TokenData>> + Send;
}

/// Authenticates a script application with the OAuth2 password grant.
#[derive(Debug)]
pub struct PasswordAuthenticator {
    credentials: Credentials,
    auth_url: String,
    client: reqwest::Client,
}

impl PasswordAuthenticator {
    /// Creates a new authenticator that exchanges `credentials` at the
    /// token endpoint named in `config`.
    pub fn new(credentials: Credentials, config: &ClientConfig) -> HTTPResult<Self> {
        let client = http::client(config.user_agent())?;
        let auth_url = config.auth_url().to_string();
        Ok(Self {
            credentials,
            auth_url,
            client,
        })
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> HTTPResult<TokenData> {
        trace!("POST {} grant_type={}", self.auth_url, form[0].1);
        let resp = self
            .client
            .post(&self.auth_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HTTPError::from_status(resp.status(), resp.headers()));
        }

        match resp.json::<TokenResponse>().await? {
            TokenResponse::Token(data) => Ok(data),
            TokenResponse::Error { error } => Err(HTTPError::Authentication(error)),
        }
    }
}

impl Authenticator for PasswordAuthenticator {
    async fn authenticate(&self) -> HTTPResult<TokenData> {
        self.exchange(&[
            ("grant_type", "password"),
            ("username", &self.credentials.username),
            ("password", &self.credentials.password),
        ])
        .await
    }

    async fn refresh(&self, token: &AccessToken) -> HTTPResult<TokenData> {
        match token.refresh_token() {
            Some(refresh_token) => {
                self.exchange(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ])
                .await
            }
            // Script apps never get refresh tokens, so just log in again.
            None => self.authenticate().await,
        }
    }
}

/// Hands out valid bearer tokens, authenticating and refreshing as needed.
///
/// All callers share one token. The lock is held for the duration of a
/// token exchange, so when several requests notice an expired token at
/// once, only the first performs the exchange and the rest wait for it
/// and reuse the new token.
pub struct Session<A: Authenticator> {
    authenticator: A,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<AccessToken>>,
}

impl<A: Authenticator> Session<A> {
    /// Creates a session that has not authenticated yet.
    pub fn new(authenticator: A, clock: Arc<dyn Clock>) -> Self {
        Self {
            authenticator,
            clock,
            token: Mutex::new(None),
        }
    }

    /// A bearer credential that is valid right now.
    pub async fn bearer(&self) -> HTTPResult<String> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_mut() {
            if token.is_expired(self.clock.as_ref()) {
                debug!("Access token expired at {}, refreshing", token.expires_at());
                let data = self.authenticator.refresh(token).await?;
                token.refresh(data, self.clock.as_ref());
            }
            return Ok(token.access_token().to_string());
        }

        debug!("Authenticating with Reddit");
        let data = self.authenticator.authenticate().await?;
        let token = AccessToken::new(data, self.clock.as_ref());
        let bearer = token.access_token().to_string();
        *guard = Some(token);
        Ok(bearer)
    }

    /// A snapshot of the current token, if the session has authenticated.
    pub async fn token(&self) -> Option<AccessToken> {
        self.token.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::FrozenClock;

    fn token_data(token: &str) -> super::TokenData {
        super::TokenData {
            access_token: token.to_string(),
            token_type: String::from("bearer"),
            expires_in: 3600,
            scope: String::from("*"),
            refresh_token: None,
        }
    }

    mod access_token {
        use super::super::*;
        use super::token_data;
        use crate::test_utils::FrozenClock;

        #[test]
        fn it_expires_ten_seconds_early() {
            let clock = FrozenClock::default();
            let token = AccessToken::new(token_data("abc"), &clock);
            let expected = clock.now() + TimeDelta::seconds(3590);
            assert_eq!(token.expires_at(), expected);
        }

        #[test]
        fn it_is_not_expired_before_the_margin() {
            let clock = FrozenClock::default();
            let token = AccessToken::new(token_data("abc"), &clock);
            clock.advance(3500);
            assert!(!token.is_expired(&clock));
        }

        #[test]
        fn it_is_not_expired_exactly_at_the_expiry_instant() {
            let clock = FrozenClock::default();
            let token = AccessToken::new(token_data("abc"), &clock);
            clock.advance(3590);
            assert!(!token.is_expired(&clock));
        }

        #[test]
        fn it_is_expired_inside_the_margin() {
            let clock = FrozenClock::default();
            let token = AccessToken::new(token_data("abc"), &clock);
            clock.advance(3595);
            assert!(token.is_expired(&clock));
        }

        #[test]
        fn it_replaces_every_field_on_refresh() {
            let clock = FrozenClock::default();
            let mut data = token_data("abc");
            data.refresh_token = Some(String::from("refresh-me"));
            let mut token = AccessToken::new(data, &clock);

            clock.advance(4000);
            assert!(token.is_expired(&clock));

            let mut fresh = token_data("def");
            fresh.expires_in = 60;
            fresh.scope = String::from("read");
            token.refresh(fresh, &clock);

            assert_eq!(token.access_token(), "def");
            assert_eq!(token.scope(), "read");
            assert_eq!(token.expires_in(), 60);
            assert_eq!(token.refresh_token(), None);
            assert_eq!(token.expires_at(), clock.now() + TimeDelta::seconds(50));
            assert!(!token.is_expired(&clock));
        }

        #[test]
        fn it_parses_token_responses() {
            let json = r#"{
                "access_token": "abc",
                "token_type": "bearer",
                "expires_in": 86400,
                "scope": "*"
            }"#;
            let data: TokenData = serde_json::from_str(json).unwrap();
            assert_eq!(data.access_token, "abc");
            assert_eq!(data.expires_in, 86400);
            assert!(data.refresh_token.is_none());
        }

        #[test]
        fn it_recognizes_token_errors() {
            let json = r#"{"error": "invalid_grant"}"#;
            let resp: TokenResponse = serde_json::from_str(json).unwrap();
            assert!(matches!(resp, TokenResponse::Error { error } if error == "invalid_grant"));
        }
    }

    mod credentials {
        use super::super::*;
        use temp_env::{with_var_unset, with_vars};

        #[test]
        fn it_loads_credentials_from_the_environment() {
            with_vars(
                [
                    ("REDDIT_CLIENT_ID", Some("client")),
                    ("REDDIT_CLIENT_SECRET", Some("secret")),
                    ("REDDIT_USERNAME", Some("mipadi")),
                    ("REDDIT_PASSWORD", Some("hunter2")),
                ],
                || {
                    let credentials = Credentials::from_env().unwrap();
                    assert_eq!(credentials.client_id(), "client");
                    assert_eq!(credentials.username(), "mipadi");
                },
            )
        }

        #[test]
        fn it_names_the_missing_variable() {
            with_var_unset("REDDIT_CLIENT_ID", || {
                let err = Credentials::from_env().unwrap_err();
                assert!(matches!(
                    err,
                    AuthError::Env("REDDIT_CLIENT_ID", env::VarError::NotPresent)
                ));
            })
        }
    }

    mod session {
        use super::super::*;
        use super::token_data;
        use crate::test_utils::FrozenClock;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        #[derive(Default)]
        struct CountingAuthenticator {
            logins: AtomicUsize,
            refreshes: AtomicUsize,
        }

        impl Authenticator for Arc<CountingAuthenticator> {
            async fn authenticate(&self) -> HTTPResult<TokenData> {
                let n = self.logins.fetch_add(1, Ordering::SeqCst);
                Ok(token_data(&format!("login-{n}")))
            }

            async fn refresh(&self, _token: &AccessToken) -> HTTPResult<TokenData> {
                // Give other callers a chance to pile up behind the lock.
                tokio::time::sleep(Duration::from_millis(50)).await;
                let n = self.refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(token_data(&format!("refresh-{n}")))
            }
        }

        struct FailingAuthenticator;

        impl Authenticator for FailingAuthenticator {
            async fn authenticate(&self) -> HTTPResult<TokenData> {
                Err(HTTPError::Authentication(String::from("invalid_grant")))
            }

            async fn refresh(&self, _token: &AccessToken) -> HTTPResult<TokenData> {
                Err(HTTPError::Authentication(String::from("invalid_grant")))
            }
        }

        #[tokio::test]
        async fn it_authenticates_on_first_use() {
            let auth = Arc::new(CountingAuthenticator::default());
            let session = Session::new(auth.clone(), Arc::new(FrozenClock::default()));
            assert!(session.token().await.is_none());
            assert_eq!(session.bearer().await.unwrap(), "login-0");
            assert_eq!(session.bearer().await.unwrap(), "login-0");
            assert_eq!(auth.logins.load(Ordering::SeqCst), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn it_refreshes_expired_tokens_once_for_concurrent_callers() {
            let auth = Arc::new(CountingAuthenticator::default());
            let clock = Arc::new(FrozenClock::default());
            let session = Arc::new(Session::new(auth.clone(), clock.clone()));
            session.bearer().await.unwrap();

            clock.advance(3600);

            let handles: Vec<_> = (0..5)
                .map(|_| {
                    let session = session.clone();
                    tokio::spawn(async move { session.bearer().await.unwrap() })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.await.unwrap(), "refresh-0");
            }
            assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
            assert_eq!(auth.logins.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn it_surfaces_authentication_failures() {
            let session = Session::new(FailingAuthenticator, Arc::new(FrozenClock::default()));
            let err = session.bearer().await.unwrap_err();
            assert!(matches!(err, HTTPError::Authentication(_)));
            assert!(session.token().await.is_none());
        }
    }

    #[test]
    fn it_uses_a_frozen_clock_that_can_advance() {
        use crate::clock::Clock;
        let clock = FrozenClock::default();
        let before = clock.now();
        clock.advance(10);
        assert_eq!((clock.now() - before).num_seconds(), 10);
    }
}
