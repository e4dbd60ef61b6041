// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reddit comments.

use crate::capability::{
    self, Createable, Editable, Gildable, Inboxable, Moderateable, Refreshable, Repliable,
    Saveable, Votable,
};
use crate::clock::{self, DateTime, Utc};
use crate::listing::Listing;
use crate::reddit::{Client, Error};
use crate::thing::{self, Hydrate, Kind, MoreComments, Thing, unwrap_kind};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A Reddit comment.
#[derive(Debug)]
pub struct Comment {
    client: Client,
    data: CommentData,
}

/// Whether a comment or post was edited, as Reddit reports it: either
/// `false` or the time of the edit.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum Edited {
    Flag(bool),
    At(f64),
}

impl Edited {
    pub(crate) fn date(edited: &Option<Edited>) -> Option<DateTime<Utc>> {
        match edited {
            Some(Edited::At(ts)) => Some(clock::from_timestamp(*ts)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct CommentData {
    id: String,
    name: String,
    link_id: String,
    parent_id: String,
    created_utc: f64,

    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    author_flair_css_class: Option<String>,
    #[serde(default)]
    author_flair_text: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    subreddit_id: Option<String>,
    #[serde(default)]
    link_title: Option<String>,
    #[serde(default)]
    link_author: Option<String>,
    #[serde(default)]
    link_url: Option<String>,
    #[serde(default)]
    approved_by: Option<String>,
    #[serde(default)]
    banned_by: Option<String>,
    #[serde(default)]
    distinguished: Option<String>,
    #[serde(default)]
    num_reports: Option<u64>,
    #[serde(default)]
    likes: Option<bool>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    gilded: u64,
    #[serde(default)]
    saved: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    score_hidden: bool,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    edited: Option<Edited>,
    #[serde(default)]
    replies: Option<Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A reply in a comment tree: either a loaded comment or a placeholder for
/// comments that still need to be fetched.
#[derive(Debug)]
pub enum Reply {
    /// A loaded comment.
    Comment(Comment),
    /// Comments that were not included in the response.
    More(MoreComments),
}

impl Comment {
    pub(crate) fn from_data(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let mut raw = raw;
        if let Some(map) = raw.as_object_mut() {
            // Only the UTC timestamp is meaningful; "created" is in the
            // server's local time zone.
            map.remove("created");

            // Comment replies in the inbox carry a context link instead of
            // the submission's fullname.
            let has_link_id = map
                .get("link_id")
                .and_then(Value::as_str)
                .is_some_and(|link_id| !link_id.is_empty());
            if !has_link_id {
                let link_id = map
                    .get("context")
                    .and_then(Value::as_str)
                    .and_then(submission_from_context);
                if let Some(link_id) = link_id {
                    map.insert(String::from("link_id"), Value::String(link_id));
                }
            }
        }
        let data = thing::hydrate_fields(raw)?;
        let client = client.clone();
        Ok(Self { client, data })
    }

    /// The comment's author, or `None` if the account was deleted.
    pub fn author(&self) -> Option<&str> {
        self.data.author.as_deref()
    }

    /// The author's flair CSS class.
    pub fn author_flair_css_class(&self) -> Option<&str> {
        self.data.author_flair_css_class.as_deref()
    }

    /// The author's flair text.
    pub fn author_flair_text(&self) -> Option<&str> {
        self.data.author_flair_text.as_deref()
    }

    /// The comment's body, as Markdown.
    pub fn body(&self) -> Option<&str> {
        self.data.body.as_deref()
    }

    /// The comment's body, as HTML.
    pub fn body_html(&self) -> Option<&str> {
        self.data.body_html.as_deref()
    }

    /// Name of the subreddit the comment was posted to.
    pub fn subreddit(&self) -> Option<&str> {
        self.data.subreddit.as_deref()
    }

    /// Fullname of the subreddit the comment was posted to.
    pub fn subreddit_id(&self) -> Option<&str> {
        self.data.subreddit_id.as_deref()
    }

    /// Fullname of the submission the comment belongs to.
    pub fn link_id(&self) -> &str {
        &self.data.link_id
    }

    /// Alias for [`Comment::link_id()`].
    pub fn link_name(&self) -> &str {
        self.link_id()
    }

    /// Fullname of the comment or submission this comment replies to.
    pub fn parent_id(&self) -> &str {
        &self.data.parent_id
    }

    /// Alias for [`Comment::parent_id()`].
    pub fn parent_name(&self) -> &str {
        self.parent_id()
    }

    /// Title of the parent submission.
    ///
    /// Only present when the comment was loaded outside its thread, such
    /// as from a user's comment history.
    pub fn link_title(&self) -> Option<&str> {
        self.data.link_title.as_deref()
    }

    /// Author of the parent submission. See [`Comment::link_title()`].
    pub fn link_author(&self) -> Option<&str> {
        self.data.link_author.as_deref()
    }

    /// URL of the parent submission. See [`Comment::link_title()`].
    pub fn link_url(&self) -> Option<&str> {
        self.data.link_url.as_deref()
    }

    /// The moderator who approved the comment, if you can see it.
    pub fn approved_by(&self) -> Option<&str> {
        self.data.approved_by.as_deref()
    }

    /// The moderator who removed the comment, if you can see it.
    pub fn banned_by(&self) -> Option<&str> {
        self.data.banned_by.as_deref()
    }

    /// Alias for [`Comment::banned_by()`].
    pub fn removed_by(&self) -> Option<&str> {
        self.banned_by()
    }

    /// Number of reports, if you moderate the subreddit.
    pub fn num_reports(&self) -> Option<u64> {
        self.data.num_reports
    }

    /// The comment's karma score.
    pub fn score(&self) -> i64 {
        self.data.score
    }

    /// Number of times the comment was gilded.
    pub fn gilded(&self) -> u64 {
        self.data.gilded
    }

    /// Alias for [`Comment::gilded()`].
    pub fn gold_count(&self) -> u64 {
        self.gilded()
    }

    /// True if you saved the comment.
    pub fn saved(&self) -> bool {
        self.data.saved
    }

    /// Alias for [`Comment::saved()`].
    pub fn is_saved(&self) -> bool {
        self.saved()
    }

    /// True if the comment is archived and can no longer be voted on.
    pub fn archived(&self) -> bool {
        self.data.archived
    }

    /// Alias for [`Comment::archived()`].
    pub fn is_archived(&self) -> bool {
        self.archived()
    }

    /// True if the comment's score is hidden.
    pub fn score_hidden(&self) -> bool {
        self.data.score_hidden
    }

    /// Alias for [`Comment::score_hidden()`].
    pub fn is_score_hidden(&self) -> bool {
        self.score_hidden()
    }

    /// True if the comment has loaded replies.
    pub fn has_replies(&self) -> bool {
        self.data.replies.is_some()
    }

    /// The comment's replies.
    ///
    /// Reddit only includes replies when the comment is loaded as part of
    /// its thread. The replies are hydrated fresh on every call.
    pub fn replies(&self) -> Result<Vec<Reply>, thing::Error> {
        match &self.data.replies {
            Some(replies) => {
                let listing: Listing<Reply> = Listing::hydrate(&self.client, replies.clone())?;
                Ok(listing.into_vec())
            }
            None => Ok(vec![]),
        }
    }

    /// A link to the comment on the web.
    pub fn permalink(&self) -> String {
        let submission_id = self.link_id().trim_start_matches("t3_");
        let subreddit = self.subreddit().unwrap_or_default();
        format!(
            "https://www.reddit.com/r/{subreddit}/comments/{submission_id}//{}",
            self.id()
        )
    }
}

/// Extracts the submission's fullname from a context link such as
/// `/r/rust/comments/1kt9x0h/what_is_rust/mz2j4kq/?context=3`.
fn submission_from_context(context: &str) -> Option<String> {
    let mut segments = context.split('/').skip_while(|segment| *segment != "comments");
    segments
        .nth(1)
        .filter(|id| !id.is_empty())
        .map(|id| format!("t3_{id}"))
}

impl Reply {
    /// The reply's fullname.
    pub fn fullname(&self) -> &str {
        match self {
            Reply::Comment(comment) => comment.fullname(),
            Reply::More(more) => more.fullname(),
        }
    }
}

impl Hydrate for Reply {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        if raw.get("kind").and_then(Value::as_str) == Some(Kind::More.prefix()) {
            MoreComments::hydrate(client, raw).map(Reply::More)
        } else {
            Comment::hydrate(client, raw).map(Reply::Comment)
        }
    }
}

impl Hydrate for Comment {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        Self::from_data(client, unwrap_kind(raw, Kind::Comment)?)
    }
}

impl Thing for Comment {
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

impl Refreshable for Comment {
    async fn refresh(&mut self) -> Result<(), Error> {
        let raw = capability::info_data(&self.client, self.fullname(), Kind::Comment).await?;
        *self = Self::from_data(&self.client, raw)?;
        Ok(())
    }
}

impl Createable for Comment {
    fn created_utc(&self) -> DateTime<Utc> {
        clock::from_timestamp(self.data.created_utc)
    }
}

impl Editable for Comment {
    fn edited_at(&self) -> Option<DateTime<Utc>> {
        Edited::date(&self.data.edited)
    }
}

impl Gildable for Comment {}

impl Inboxable for Comment {}

impl Moderateable for Comment {
    fn distinguished_by(&self) -> Option<&str> {
        self.data.distinguished.as_deref()
    }

    fn is_stickied(&self) -> bool {
        self.data.stickied
    }
}

impl Repliable for Comment {
    type Reply = Comment;
}

impl Saveable for Comment {}

impl Votable for Comment {
    fn likes(&self) -> Option<bool> {
        self.data.likes
    }
}
