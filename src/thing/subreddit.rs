// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Subreddits.

use crate::capability::{self, Createable, Refreshable};
use crate::clock::{self, DateTime, Utc};
use crate::listing::Paginator;
use crate::reddit::client::string_list;
use crate::reddit::service::{Params, Request};
use crate::reddit::{Client, Error};
use crate::stream::StreamConfig;
use crate::thing::{self, Comment, Hydrate, Item, Kind, Submission, Thing, WikiPage, unwrap_kind};
use futures::Stream;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// A subreddit.
#[derive(Debug)]
pub struct Subreddit {
    client: Client,
    data: SubredditData,
}

#[derive(Clone, Debug, Deserialize)]
struct SubredditData {
    id: String,
    name: String,
    display_name: String,
    created_utc: f64,

    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    public_description: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    subreddit_type: Option<String>,
    #[serde(default)]
    subscribers: Option<u64>,
    #[serde(default)]
    accounts_active: Option<u64>,
    #[serde(default)]
    over18: bool,
    #[serde(default)]
    quarantine: bool,
    #[serde(default)]
    user_is_moderator: bool,
    #[serde(default)]
    user_is_subscriber: bool,
    #[serde(default)]
    user_is_banned: bool,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Time window for [`Subreddit::top()`] and [`Subreddit::controversial()`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TimePeriod {
    /// The past hour.
    Hour,
    /// The past day.
    #[default]
    Day,
    /// The past week.
    Week,
    /// The past month.
    Month,
    /// The past year.
    Year,
    /// All time.
    All,
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let period = match self {
            TimePeriod::Hour => "hour",
            TimePeriod::Day => "day",
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
            TimePeriod::Year => "year",
            TimePeriod::All => "all",
        };
        write!(f, "{period}")
    }
}

impl Subreddit {
    pub(crate) fn from_data(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let mut raw = raw;
        if let Some(map) = raw.as_object_mut() {
            map.remove("created");
        }
        let data = thing::hydrate_fields(raw)?;
        let client = client.clone();
        Ok(Self { client, data })
    }

    /// The subreddit's name, without the `r/` prefix.
    pub fn display_name(&self) -> &str {
        &self.data.display_name
    }

    /// The title shown in the browser tab.
    pub fn title(&self) -> Option<&str> {
        self.data.title.as_deref()
    }

    /// The short description shown in search results.
    pub fn public_description(&self) -> Option<&str> {
        self.data.public_description.as_deref()
    }

    /// The sidebar, as Markdown.
    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// Path to the subreddit, e.g., `/r/rust/`.
    pub fn url(&self) -> Option<&str> {
        self.data.url.as_deref()
    }

    /// `public`, `private`, `restricted`, and so on.
    pub fn subreddit_type(&self) -> Option<&str> {
        self.data.subreddit_type.as_deref()
    }

    /// Number of subscribers.
    pub fn subscribers(&self) -> Option<u64> {
        self.data.subscribers
    }

    /// Number of users viewing the subreddit right now.
    pub fn accounts_active(&self) -> Option<u64> {
        self.data.accounts_active
    }

    /// True if the subreddit is marked NSFW.
    pub fn over18(&self) -> bool {
        self.data.over18
    }

    /// Alias for [`Subreddit::over18()`].
    pub fn is_nsfw(&self) -> bool {
        self.over18()
    }

    /// True if Reddit has quarantined the subreddit.
    pub fn is_quarantined(&self) -> bool {
        self.data.quarantine
    }

    /// True if you moderate the subreddit.
    pub fn user_is_moderator(&self) -> bool {
        self.data.user_is_moderator
    }

    /// Alias for [`Subreddit::user_is_moderator()`].
    pub fn is_moderator(&self) -> bool {
        self.user_is_moderator()
    }

    /// True if you are subscribed.
    pub fn user_is_subscriber(&self) -> bool {
        self.data.user_is_subscriber
    }

    /// Alias for [`Subreddit::user_is_subscriber()`].
    pub fn is_subscriber(&self) -> bool {
        self.user_is_subscriber()
    }

    /// True if you are banned from the subreddit.
    pub fn user_is_banned(&self) -> bool {
        self.data.user_is_banned
    }

    fn path(&self, resource: &str) -> String {
        format!("/r/{}/{resource}", self.display_name())
    }

    fn listing<T: Hydrate>(&self, resource: &str, params: Params) -> Paginator<T> {
        self.client.paginator(self.path(resource), params)
    }

    /// Hot posts.
    pub fn hot(&self) -> Paginator<Submission> {
        self.listing("hot", Params::new())
    }

    /// Newest posts.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(&self) -> Paginator<Submission> {
        self.listing("new", Params::new())
    }

    /// Rising posts.
    pub fn rising(&self) -> Paginator<Submission> {
        self.listing("rising", Params::new())
    }

    /// Top posts over `period`.
    pub fn top(&self, period: TimePeriod) -> Paginator<Submission> {
        self.listing("top", Params::new().with("t", period))
    }

    /// Most controversial posts over `period`.
    pub fn controversial(&self, period: TimePeriod) -> Paginator<Submission> {
        self.listing("controversial", Params::new().with("t", period))
    }

    /// Newest comments across all posts.
    pub fn comments(&self) -> Paginator<Comment> {
        self.listing("comments", Params::new())
    }

    /// A live feed of one of the subreddit's listings, e.g., `comments` or
    /// `new`.
    pub fn stream<T>(
        &self,
        listing: &str,
        config: StreamConfig,
    ) -> impl Stream<Item = Result<T, Error>> + Send + use<T>
    where
        T: Hydrate + Thing + 'static,
    {
        self.client.stream(&self.path(listing), Params::new(), config)
    }

    /// Reported comments and posts. Moderators only.
    pub fn reported(&self) -> Paginator<Item> {
        self.listing("about/reports", Params::new())
    }

    /// Comments and posts caught by the spam filter. Moderators only.
    pub fn spam(&self) -> Paginator<Item> {
        self.listing("about/spam", Params::new())
    }

    /// Comments and posts awaiting review. Moderators only.
    pub fn modqueue(&self) -> Paginator<Item> {
        self.listing("about/modqueue", Params::new())
    }

    /// Posts no moderator has reviewed yet. Moderators only.
    pub fn unmoderated(&self) -> Paginator<Item> {
        self.listing("about/unmoderated", Params::new())
    }

    /// Recently edited comments and posts. Moderators only.
    pub fn edited(&self) -> Paginator<Item> {
        self.listing("about/edited", Params::new())
    }

    /// Accepts a pending invitation to moderate the subreddit.
    pub async fn accept_moderator_invite(&mut self) -> Result<(), Error> {
        let request = Request::post(self.path("api/accept_moderator_invite"))
            .param("api_type", "json");
        capability::act_then_refresh(self, "accept_moderator_invite", request).await
    }

    /// Stops moderating the subreddit.
    pub async fn leave_moderator(&mut self) -> Result<(), Error> {
        let request = Request::post("/api/leavemoderator").param("id", self.fullname());
        capability::act_then_refresh(self, "leave_moderator", request).await
    }

    /// Stops being an approved submitter in the subreddit.
    pub async fn leave_contributor(&mut self) -> Result<(), Error> {
        let request = Request::post("/api/leavecontributor").param("id", self.fullname());
        capability::act_then_refresh(self, "leave_contributor", request).await
    }

    /// The subreddit's settings, as Reddit reports them. Moderators only.
    pub async fn settings(&self) -> Result<Map<String, Value>, Error> {
        let mut response = self.client.request(Request::get(self.path("about/edit"))).await?;
        match response.get_mut("data").map(Value::take) {
            Some(Value::Object(settings)) => Ok(settings),
            _ => Err(thing::Error::MissingField(String::from("data")).into()),
        }
    }

    /// A page from the subreddit's wiki.
    pub async fn wikipage(&self, page: &str) -> Result<WikiPage, Error> {
        WikiPage::load(&self.client, Some(self.display_name()), page).await
    }

    /// Names of the pages in the subreddit's wiki.
    pub async fn wikipages(&self) -> Result<Vec<String>, Error> {
        let raw = self.client.request(Request::get(self.path("wiki/pages"))).await?;
        Ok(string_list(raw.get("data")))
    }
}

impl Hydrate for Subreddit {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        Self::from_data(client, unwrap_kind(raw, Kind::Subreddit)?)
    }
}

impl Thing for Subreddit {
    fn fullname(&self) -> &str {
        &self.data.name
    }

    fn id(&self) -> &str {
        &self.data.id
    }

    fn client(&self) -> &Client {
        &self.client
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.data.extra
    }
}

impl Refreshable for Subreddit {
    async fn refresh(&mut self) -> Result<(), Error> {
        let raw = self.client.request(Request::get(self.path("about"))).await?;
        *self = Self::hydrate(&self.client, raw)?;
        Ok(())
    }
}

impl Createable for Subreddit {
    fn created_utc(&self) -> DateTime<Utc> {
        clock::from_timestamp(self.data.created_utc)
    }
}
