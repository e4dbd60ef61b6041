// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Behavior shared by several kinds of [things](crate::thing::Thing).
//!
//! Each capability is a trait with a fixed set of methods. The request
//! logic behind them is written once, in terms of
//! [`Thing::fullname()`] and [`Thing::client()`], so any thing that
//! implements a capability gets the same behavior.
//!
//! Methods that change a thing on Reddit's side, like
//! [`Votable::upvote()`] or [`Editable::edit()`], re-fetch the thing
//! afterwards and replace its state in place. If the action succeeds but
//! the re-fetch does not, they return [`Error::StaleState`] so the caller
//! knows the action happened even though the local copy is out of date.

use crate::clock::{Clock, DateTime, Local, TimeDelta, Utc};
use crate::reddit::service::{Params, Request};
use crate::reddit::{Client, Error};
use crate::thing::{self, Hydrate, Kind, Thing};
use log::debug;
use serde_json::Value;
use std::fmt;
use std::ops::Sub;

/// Things that can be re-fetched from Reddit.
pub trait Refreshable: Thing + Sized {
    /// Re-fetches the thing and replaces all of its state in place.
    fn refresh(&mut self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Things that have a creation date.
pub trait Createable {
    /// The date the item was created, in UTC.
    fn created_utc(&self) -> DateTime<Utc>;

    /// The date the item was created, in local time.
    fn created_local(&self) -> DateTime<Local> {
        self.created_utc().with_timezone(&Local)
    }

    /// The age of the item.
    ///
    /// `clock` is a source of time from which the age can be derived.
    /// Generally [`SystemClock`](crate::clock::SystemClock) is used.
    fn age<C: Clock + ?Sized>(&self, clock: &C) -> TimeDelta {
        clock.now().sub(self.created_utc())
    }
}

/// Direction of a vote.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteDirection {
    /// An upvote.
    Up,
    /// A downvote.
    Down,
    /// Withdraws an earlier vote.
    Clear,
}

impl VoteDirection {
    fn as_param(&self) -> i8 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
            VoteDirection::Clear => 0,
        }
    }
}

/// Things that can be voted on.
pub trait Votable: Refreshable {
    /// `Some(true)` if you upvoted the thing, `Some(false)` if you
    /// downvoted it, and `None` if you have not voted.
    fn likes(&self) -> Option<bool>;

    /// True if you upvoted the thing.
    fn is_upvoted(&self) -> bool {
        self.likes() == Some(true)
    }

    /// True if you downvoted the thing.
    fn is_downvoted(&self) -> bool {
        self.likes() == Some(false)
    }

    /// Upvotes the thing.
    fn upvote(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        vote(self, VoteDirection::Up)
    }

    /// Downvotes the thing.
    fn downvote(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        vote(self, VoteDirection::Down)
    }

    /// Removes your vote from the thing.
    fn clear_vote(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        vote(self, VoteDirection::Clear)
    }
}

/// Things that can be saved.
pub trait Saveable: Refreshable {
    /// Saves the thing, optionally to a named category.
    fn save(&mut self, category: Option<&str>) -> impl Future<Output = Result<(), Error>> + Send {
        let mut request = Request::post("/api/save").param("id", self.fullname());
        if let Some(category) = category {
            request = request.param("category", category);
        }
        act_then_refresh(self, "save", request)
    }

    /// Unsaves the thing.
    fn unsave(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/unsave").param("id", self.fullname());
        act_then_refresh(self, "unsave", request)
    }
}

/// How a moderator or admin marks a thing as official.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Distinguish {
    /// Distinguish as a moderator.
    Yes,
    /// Remove the distinction.
    No,
    /// Distinguish as an admin.
    Admin,
    /// A special distinction, e.g., for Reddit employees.
    Special,
}

impl fmt::Display for Distinguish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let how = match self {
            Distinguish::Yes => "yes",
            Distinguish::No => "no",
            Distinguish::Admin => "admin",
            Distinguish::Special => "special",
        };
        write!(f, "{how}")
    }
}

/// Things that moderators can act on.
pub trait Moderateable: Refreshable {
    /// Who distinguished the thing (`moderator`, `admin`, or `special`),
    /// if anyone did.
    fn distinguished_by(&self) -> Option<&str>;

    /// True if the thing is stickied.
    fn is_stickied(&self) -> bool;

    /// True if the thing was distinguished by a privileged user.
    fn is_distinguished(&self) -> bool {
        self.distinguished_by().is_some()
    }

    /// Approves the thing.
    fn approve(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/approve").param("id", self.fullname());
        act_then_refresh(self, "approve", request)
    }

    /// Removes the thing.
    fn remove(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/remove")
            .param("id", self.fullname())
            .param("spam", false);
        act_then_refresh(self, "remove", request)
    }

    /// Removes the thing and trains the spam filter on it.
    fn spam(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/remove")
            .param("id", self.fullname())
            .param("spam", true);
        act_then_refresh(self, "spam", request)
    }

    /// Distinguishes the thing.
    fn distinguish(&mut self, how: Distinguish) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/distinguish")
            .param("api_type", "json")
            .param("how", how)
            .param("id", self.fullname());
        act_then_refresh(self, "distinguish", request)
    }

    /// Reports the thing to the subreddit's moderators.
    ///
    /// `reason` may be at most 100 characters long.
    fn report(&self, reason: &str) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/report")
            .param("api_type", "json")
            .param("reason", reason)
            .param("thing_id", self.fullname());
        act(self, request)
    }

    /// Stops reports on the thing from reaching the mod queue.
    fn ignore_reports(&self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/ignore_reports").param("id", self.fullname());
        act(self, request)
    }

    /// Undoes [`Moderateable::ignore_reports()`].
    fn unignore_reports(&self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/unignore_reports").param("id", self.fullname());
        act(self, request)
    }
}

/// Things that can be replied to.
pub trait Repliable: Thing + Sized {
    /// The kind of thing a reply creates.
    type Reply: Hydrate + Send;

    /// Replies to the thing and returns the new reply.
    fn reply(&self, text: &str) -> impl Future<Output = Result<Self::Reply, Error>> + Send {
        reply(self, text)
    }
}

/// Things that can be gilded.
pub trait Gildable: Refreshable {
    /// Gives gold to the author of the thing.
    fn gild(&mut self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post(format!("/api/v1/gold/gild/{}", self.fullname()));
        act_then_refresh(self, "gild", request)
    }
}

/// Things that show up in the inbox.
pub trait Inboxable: Thing + Sized {
    /// Marks the thing as read.
    fn mark_as_read(&self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/read_message").param("id", self.fullname());
        act(self, request)
    }

    /// Marks the thing as unread.
    fn mark_as_unread(&self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/unread_message").param("id", self.fullname());
        act(self, request)
    }

    /// Blocks the author of the thing.
    fn block_author(&self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/block").param("id", self.fullname());
        act(self, request)
    }
}

/// Things whose text the author can change.
pub trait Editable: Refreshable {
    /// When the thing was last edited, if it ever was.
    fn edited_at(&self) -> Option<DateTime<Utc>>;

    /// True if the thing was edited.
    fn is_edited(&self) -> bool {
        self.edited_at().is_some()
    }

    /// Replaces the thing's text.
    fn edit(&mut self, text: &str) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/editusertext")
            .param("api_type", "json")
            .param("text", text)
            .param("thing_id", self.fullname());
        act_then_refresh(self, "edit", request)
    }

    /// Deletes the thing.
    ///
    /// The local copy is not refreshed, since deleted things can no
    /// longer be fetched meaningfully.
    fn delete(&self) -> impl Future<Output = Result<(), Error>> + Send {
        let request = Request::post("/api/del").param("id", self.fullname());
        act(self, request)
    }
}

/// Sends `request` on behalf of `thing`, ignoring the response body.
pub(crate) async fn act<T: Thing + ?Sized>(thing: &T, request: Request) -> Result<(), Error> {
    thing.client().request(request).await?;
    Ok(())
}

/// Sends `request` on behalf of `thing`, then refreshes `thing`.
///
/// A failed action is returned as-is. A failed refresh after a successful
/// action is wrapped in [`Error::StaleState`].
pub(crate) async fn act_then_refresh<T: Refreshable>(
    thing: &mut T,
    action: &'static str,
    request: Request,
) -> Result<(), Error> {
    debug!("Performing {action} on {}", thing.fullname());
    act(thing, request).await?;
    thing.refresh().await.map_err(|source| Error::StaleState {
        action,
        source: Box::new(source),
    })
}

async fn vote<T: Refreshable>(thing: &mut T, direction: VoteDirection) -> Result<(), Error> {
    let request = Request::post("/api/vote")
        .param("dir", direction.as_param())
        .param("id", thing.fullname());
    act_then_refresh(thing, "vote", request).await
}

async fn reply<T: Repliable>(thing: &T, text: &str) -> Result<T::Reply, Error> {
    let request = Request::post("/api/comment")
        .param("api_type", "json")
        .param("text", text)
        .param("thing_id", thing.fullname());
    let client = thing.client();
    let mut response = client.request(request).await?;
    let created = response
        .pointer_mut("/json/data/things/0")
        .map(Value::take)
        .ok_or_else(|| thing::Error::MissingField(String::from("json.data.things")))?;
    Ok(T::Reply::hydrate(client, created)?)
}

/// Fetches the raw data of the thing named `fullname` via `/api/info`,
/// checking that it is of the `expected` kind.
pub(crate) async fn info_data(
    client: &Client,
    fullname: &str,
    expected: Kind,
) -> Result<Value, Error> {
    let params = Params::new().with("id", fullname);
    let mut response = client.request(Request::get("/api/info").params(params)).await?;
    let child = response
        .pointer_mut("/data/children/0")
        .map(Value::take)
        .ok_or_else(|| thing::Error::MissingField(format!("data.children for {fullname}")))?;
    Ok(thing::unwrap_kind(child, expected)?)
}
