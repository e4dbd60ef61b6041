// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Environment and configuration utilities.

use std::env;

/// Where and how the client talks to Reddit.
///
/// The defaults point at Reddit's production OAuth endpoints. Any of them
/// can be overridden from the environment with [`ClientConfig::from_env()`],
/// which is mostly useful for pointing the client at a local mock server.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    api_base: String,
    auth_url: String,
    user_agent: String,
}

impl ClientConfig {
    /// Base URL for authenticated API calls.
    pub const DEFAULT_API_BASE: &'static str = "https://oauth.reddit.com";

    /// URL used to exchange credentials for an access token.
    pub const DEFAULT_AUTH_URL: &'static str = "https://www.reddit.com/api/v1/access_token";

    /// Reads overrides from `$REDDIT_API_BASE`, `$REDDIT_AUTH_URL`, and
    /// `$REDDIT_USER_AGENT`, falling back to the defaults for anything
    /// that is unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use snoocore::conf::ClientConfig;
    /// # use temp_env::with_var;
    /// # with_var("REDDIT_API_BASE", Some("http://localhost:8080"), || {
    /// let config = ClientConfig::from_env();
    /// assert_eq!(config.api_base(), "http://localhost:8080");
    /// # });
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: env::var("REDDIT_API_BASE").unwrap_or(defaults.api_base),
            auth_url: env::var("REDDIT_AUTH_URL").unwrap_or(defaults.auth_url),
            user_agent: env::var("REDDIT_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    /// Sets the API base URL.
    pub fn with_api_base(self, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        Self { api_base, ..self }
    }

    /// Sets the token exchange URL.
    pub fn with_auth_url(self, auth_url: impl Into<String>) -> Self {
        let auth_url = auth_url.into();
        Self { auth_url, ..self }
    }

    /// Sets the user agent.
    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        Self { user_agent, ..self }
    }

    /// Base URL for authenticated API calls, without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// URL used to exchange credentials for an access token.
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// User agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// An appropriate default user agent to use when making HTTP requests.
    pub fn default_user_agent() -> String {
        format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::from(Self::DEFAULT_API_BASE),
            auth_url: String::from(Self::DEFAULT_AUTH_URL),
            user_agent: Self::default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use temp_env::{with_var, with_vars_unset};

    const VARS: [&str; 3] = ["REDDIT_API_BASE", "REDDIT_AUTH_URL", "REDDIT_USER_AGENT"];

    #[test]
    fn it_returns_user_agent_with_version_number() {
        let user_agent = ClientConfig::default_user_agent();
        let version_re = Regex::new(r"^[a-z]+ v\d+\.\d+\.\d+(-(alpha|beta)\.\d+)?$").unwrap();
        assert!(
            version_re.is_match(&user_agent),
            "{} does not match {}",
            user_agent,
            version_re,
        );
    }

    #[test]
    fn it_uses_production_endpoints_by_default() {
        with_vars_unset(VARS, || {
            let config = ClientConfig::from_env();
            assert_eq!(config, ClientConfig::default());
            assert_eq!(config.api_base(), "https://oauth.reddit.com");
            assert_eq!(
                config.auth_url(),
                "https://www.reddit.com/api/v1/access_token"
            );
        })
    }

    #[test]
    fn it_reads_the_user_agent_from_the_environment() {
        with_var("REDDIT_USER_AGENT", Some("linux:snoocore-tests:v1"), || {
            let config = ClientConfig::from_env();
            assert_eq!(config.user_agent(), "linux:snoocore-tests:v1");
        })
    }

    #[test]
    fn it_strips_trailing_slashes_from_the_api_base() {
        let config = ClientConfig::default().with_api_base("http://localhost:9999/");
        assert_eq!(config.api_base(), "http://localhost:9999");
    }

    #[test]
    fn it_overrides_the_auth_url() {
        let config = ClientConfig::default().with_auth_url("http://localhost:9999/token");
        assert_eq!(config.auth_url(), "http://localhost:9999/token");
    }
}
