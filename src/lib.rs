// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! snoocore is the core of a typed client for the Reddit API. It
//! authenticates against Reddit's OAuth2 endpoints, sends requests, and turns
//! the JSON that comes back into typed things: comments, submissions,
//! messages, users, subreddits, and wiki pages.
//!
//! Every list endpoint is exposed as a [`Listing`](listing::Listing) that can
//! be walked page by page with a [`Paginator`](listing::Paginator), and any
//! listing can be polled as a live, deduplicated
//! [stream](stream::stream()).
//!
//! # Examples
//!
//! Print the newest comments posted to r/rust as they arrive:
//!
//! ```no_run
//! use futures::StreamExt;
//! use snoocore::reddit::Client;
//! use snoocore::stream::StreamConfig;
//! use snoocore::thing::{Comment, Subreddit};
//!
//! # async fn run() -> Result<(), snoocore::reddit::Error> {
//! let client = Client::from_env()?;
//! let rust: Subreddit = client.subreddit("rust").await?;
//! let mut comments = Box::pin(rust.stream::<Comment>("comments", StreamConfig::default()));
//! while let Some(comment) = comments.next().await {
//!     let comment = comment?;
//!     let author = comment.author().unwrap_or("[deleted]");
//!     println!("{author}: {}", comment.body().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Upvote and save the top post of the week:
//!
//! ```no_run
//! use snoocore::capability::{Saveable, Votable};
//! use snoocore::reddit::Client;
//! use snoocore::thing::subreddit::TimePeriod;
//!
//! # async fn run() -> Result<(), snoocore::reddit::Error> {
//! let client = Client::from_env()?;
//! let rust = client.subreddit("rust").await?;
//! let top = rust.top(TimePeriod::Week).collect(1).await?;
//! if let Some(mut post) = top.into_vec().into_iter().next() {
//!     post.upvote().await?;
//!     post.save(None).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Credentials
//!
//! [`Client::from_env()`](reddit::Client::from_env) authenticates as a
//! Reddit "script" app. Register an app at <https://www.reddit.com/prefs/apps>
//! and set the following environment variables:
//!
//! - `REDDIT_CLIENT_ID`
//! - `REDDIT_CLIENT_SECRET`
//! - `REDDIT_USERNAME`
//! - `REDDIT_PASSWORD`
//!
//! See [`conf::ClientConfig`] for optional settings, such as the user agent.
//!
//! # License
//!
//! snoocore is licensed under the terms of the [Apache License 2.0]. Please
//! see the LICENSE file accompanying this source code or visit the previous
//! link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0

pub mod auth;
pub mod capability;
pub mod clock;
pub mod conf;
pub mod http;
pub mod listing;
pub mod reddit;
pub mod stream;
pub mod thing;

#[cfg(test)]
mod test_utils;
