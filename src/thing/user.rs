// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reddit user accounts.

use crate::capability::{self, Createable, Refreshable};
use crate::clock::{self, DateTime, Utc};
use crate::listing::Paginator;
use crate::reddit::service::{Body, Params, Request};
use crate::reddit::{Client, Error};
use crate::stream::StreamConfig;
use crate::thing::{self, Comment, Hydrate, Item, Kind, Submission, Thing, unwrap_kind};
use futures::Stream;
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// A Reddit user account.
#[derive(Debug)]
pub struct User {
    client: Client,
    data: UserData,
}

#[derive(Clone, Debug, Deserialize)]
struct UserData {
    id: String,
    name: String,
    username: String,
    created_utc: f64,

    #[serde(default)]
    link_karma: i64,
    #[serde(default)]
    comment_karma: i64,
    #[serde(default)]
    is_friend: bool,
    #[serde(default)]
    is_gold: bool,
    #[serde(default)]
    is_mod: bool,
    #[serde(default)]
    has_verified_email: bool,
    #[serde(default)]
    hide_from_robots: bool,
    #[serde(default)]
    is_suspended: bool,
    #[serde(default)]
    icon_img: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A trophy on a user's profile.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Trophy {
    /// The trophy's name, e.g., "Verified Email".
    pub name: String,
    /// Extra detail, such as the year of a "Reddit Premium" trophy.
    #[serde(default)]
    pub description: Option<String>,
    /// A 70x70 icon for the trophy.
    #[serde(default)]
    pub icon_70: Option<String>,
    /// A page about the trophy.
    #[serde(default)]
    pub url: Option<String>,
}

impl User {
    /// Builds a user from account data.
    ///
    /// Reddit sends the username in the `name` field. It is moved to
    /// `username`, and `name` is replaced with the account's fullname so
    /// that users can be handled like any other thing.
    pub(crate) fn from_data(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let Value::Object(mut map) = raw else {
            return Err(thing::Error::NotAnObject(thing::type_name(&raw)));
        };
        map.remove("created");

        let id = map
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| thing::Error::MissingField(String::from("id")))?;
        let fullname = format!("{}_{id}", Kind::Account);
        if let Some(username) = map.remove("name") {
            map.insert(String::from("username"), username);
        }
        map.insert(String::from("name"), Value::String(fullname));
        map.entry("is_suspended").or_insert(Value::Bool(false));

        let data = thing::hydrate_fields(Value::Object(map))?;
        let client = client.clone();
        Ok(Self { client, data })
    }

    /// The user's username.
    pub fn username(&self) -> &str {
        &self.data.username
    }

    /// Karma earned from posts.
    pub fn link_karma(&self) -> i64 {
        self.data.link_karma
    }

    /// Karma earned from comments.
    pub fn comment_karma(&self) -> i64 {
        self.data.comment_karma
    }

    /// URL of the user's avatar.
    pub fn icon_img(&self) -> Option<&str> {
        self.data.icon_img.as_deref()
    }

    /// True if you have added the user as a friend.
    pub fn is_friend(&self) -> bool {
        self.data.is_friend
    }

    /// Alias for [`User::is_friend()`].
    pub fn friend(&self) -> bool {
        self.is_friend()
    }

    /// True if the user has Reddit Premium.
    pub fn is_gold(&self) -> bool {
        self.data.is_gold
    }

    /// Alias for [`User::is_gold()`].
    pub fn gold(&self) -> bool {
        self.is_gold()
    }

    /// True if the user moderates at least one subreddit.
    pub fn is_mod(&self) -> bool {
        self.data.is_mod
    }

    /// Alias for [`User::is_mod()`].
    pub fn moderator(&self) -> bool {
        self.is_mod()
    }

    /// True if the user has verified their email address.
    pub fn has_verified_email(&self) -> bool {
        self.data.has_verified_email
    }

    /// Alias for [`User::has_verified_email()`].
    pub fn verified_email(&self) -> bool {
        self.has_verified_email()
    }

    /// True if the user asked search engines not to index their profile.
    pub fn hide_from_robots(&self) -> bool {
        self.data.hide_from_robots
    }

    /// Alias for [`User::hide_from_robots()`].
    pub fn is_hidden_from_robots(&self) -> bool {
        self.hide_from_robots()
    }

    /// True if the account is suspended. Absent on active accounts.
    pub fn is_suspended(&self) -> bool {
        self.data.is_suspended
    }

    /// Alias for [`User::is_suspended()`].
    pub fn suspended(&self) -> bool {
        self.is_suspended()
    }

    fn path(&self, resource: &str) -> String {
        format!("/user/{}/{resource}", self.username())
    }

    /// The user's comments and posts, newest first.
    pub fn overview(&self) -> Paginator<Item> {
        self.client.paginator(self.path("overview"), Params::new())
    }

    /// The user's comments, newest first.
    pub fn comments(&self) -> Paginator<Comment> {
        self.client.paginator(self.path("comments"), Params::new())
    }

    /// The user's posts, newest first.
    pub fn submitted(&self) -> Paginator<Submission> {
        self.client.paginator(self.path("submitted"), Params::new())
    }

    /// Comments and posts by the user that were gilded.
    pub fn gilded(&self) -> Paginator<Item> {
        self.client.paginator(self.path("gilded"), Params::new())
    }

    /// Posts the user upvoted. Only visible to the user themselves.
    pub fn upvoted(&self) -> Paginator<Submission> {
        self.client.paginator(self.path("upvoted"), Params::new())
    }

    /// Posts the user downvoted. Only visible to the user themselves.
    pub fn downvoted(&self) -> Paginator<Submission> {
        self.client.paginator(self.path("downvoted"), Params::new())
    }

    /// Posts the user hid. Only visible to the user themselves.
    pub fn hidden(&self) -> Paginator<Submission> {
        self.client.paginator(self.path("hidden"), Params::new())
    }

    /// Comments and posts the user saved. Only visible to the user
    /// themselves.
    pub fn saved(&self) -> Paginator<Item> {
        self.client.paginator(self.path("saved"), Params::new())
    }

    /// A live feed of one of the user's listings, e.g., `comments`.
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

    /// Gives the user Reddit Premium for `months` months.
    pub async fn give_gold(&mut self, months: u32) -> Result<(), Error> {
        let request = Request::post(format!("/api/v1/gold/give/{}", self.username()))
            .param("months", months);
        capability::act_then_refresh(self, "give_gold", request).await
    }

    /// Sends the user a private message, optionally on behalf of a
    /// subreddit you moderate.
    pub async fn message(
        &self,
        subject: &str,
        text: &str,
        from_subreddit: Option<&str>,
    ) -> Result<(), Error> {
        let mut request = Request::post("/api/compose")
            .param("api_type", "json")
            .param("subject", subject)
            .param("text", text)
            .param("to", self.username());
        if let Some(subreddit) = from_subreddit {
            request = request.param("from_sr", subreddit);
        }
        capability::act(self, request).await
    }

    /// Adds the user to your friends.
    pub async fn add_friend(&self) -> Result<(), Error> {
        let request = Request::put(format!("/api/v1/me/friends/{}", self.username()))
            .body(Body::Json(json!({"name": self.username()})));
        capability::act(self, request).await
    }

    /// Removes the user from your friends.
    pub async fn remove_friend(&self) -> Result<(), Error> {
        let request = Request::delete(format!("/api/v1/me/friends/{}", self.username()))
            .param("id", self.fullname());
        capability::act(self, request).await
    }

    /// The trophies on the user's profile.
    pub async fn trophies(&self) -> Result<Vec<Trophy>, Error> {
        let path = format!("/api/v1/user/{}/trophies", self.username());
        let response = self.client.request(Request::get(path)).await?;
        let trophies = response
            .pointer("/data/trophies")
            .and_then(Value::as_array)
            .ok_or_else(|| thing::Error::MissingField(String::from("data.trophies")))?;
        trophies
            .iter()
            .map(|trophy| {
                let data = trophy.get("data").cloned().unwrap_or_default();
                serde_json::from_value::<Trophy>(data).map_err(|err| thing::Error::from(err).into())
            })
            .collect()
    }
}

impl Hydrate for User {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        Self::from_data(client, unwrap_kind(raw, Kind::Account)?)
    }
}

impl Thing for User {
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

impl Refreshable for User {
    async fn refresh(&mut self) -> Result<(), Error> {
        let request = Request::get(self.path("about"));
        let raw = self.client.request(request).await?;
        *self = Self::hydrate(&self.client, raw)?;
        Ok(())
    }
}

impl Createable for User {
    fn created_utc(&self) -> DateTime<Utc> {
        clock::from_timestamp(self.data.created_utc)
    }
}
