// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reddit posts: links and self posts.

use crate::capability::{
    self, Createable, Editable, Gildable, Moderateable, Refreshable, Repliable, Saveable, Votable,
};
use crate::clock::{self, DateTime, Utc};
use crate::listing::Listing;
use crate::reddit::service::Request;
use crate::reddit::{Client, Error};
use crate::thing::comment::{Edited, Reply};
use crate::thing::{self, Comment, Hydrate, Kind, Thing, unwrap_kind};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A Reddit post.
#[derive(Debug)]
pub struct Submission {
    client: Client,
    data: SubmissionData,
}

#[derive(Clone, Debug, Deserialize)]
struct SubmissionData {
    id: String,
    name: String,
    title: String,
    created_utc: f64,

    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    subreddit_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    selftext_html: Option<String>,
    #[serde(default)]
    link_flair_text: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    approved_by: Option<String>,
    #[serde(default)]
    banned_by: Option<String>,
    #[serde(default)]
    distinguished: Option<String>,
    #[serde(default)]
    likes: Option<bool>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    gilded: u64,
    #[serde(default)]
    saved: bool,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    edited: Option<Edited>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Submission {
    pub(crate) fn from_data(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let mut raw = raw;
        if let Some(map) = raw.as_object_mut() {
            map.remove("created");
        }
        let data = thing::hydrate_fields(raw)?;
        let client = client.clone();
        Ok(Self { client, data })
    }

    /// The post's title.
    pub fn title(&self) -> &str {
        &self.data.title
    }

    /// The post's author, or `None` if the account was deleted.
    pub fn author(&self) -> Option<&str> {
        self.data.author.as_deref()
    }

    /// Name of the subreddit the post was made to.
    pub fn subreddit(&self) -> Option<&str> {
        self.data.subreddit.as_deref()
    }

    /// Fullname of the subreddit the post was made to.
    pub fn subreddit_id(&self) -> Option<&str> {
        self.data.subreddit_id.as_deref()
    }

    /// The URL the post links to. For self posts, this is the post itself.
    pub fn url(&self) -> Option<&str> {
        self.data.url.as_deref()
    }

    /// The domain of the post's URL.
    pub fn domain(&self) -> Option<&str> {
        self.data.domain.as_deref()
    }

    /// Path to the post on reddit.com.
    pub fn permalink(&self) -> Option<&str> {
        self.data.permalink.as_deref()
    }

    /// Body of a self post, as Markdown.
    pub fn selftext(&self) -> Option<&str> {
        self.data.selftext.as_deref()
    }

    /// Body of a self post, as HTML.
    pub fn selftext_html(&self) -> Option<&str> {
        self.data.selftext_html.as_deref()
    }

    /// The post's flair text.
    pub fn link_flair_text(&self) -> Option<&str> {
        self.data.link_flair_text.as_deref()
    }

    /// URL of the post's thumbnail, or a keyword like `self` or `default`.
    pub fn thumbnail(&self) -> Option<&str> {
        self.data.thumbnail.as_deref()
    }

    pub fn approved_by(&self) -> Option<&str> {
        self.data.approved_by.as_deref()
    }

    pub fn banned_by(&self) -> Option<&str> {
        self.data.banned_by.as_deref()
    }

    /// Alias for [`Submission::banned_by()`].
    pub fn removed_by(&self) -> Option<&str> {
        self.banned_by()
    }

    pub fn score(&self) -> i64 {
        self.data.score
    }

    pub fn num_comments(&self) -> u64 {
        self.data.num_comments
    }

    pub fn gilded(&self) -> u64 {
        self.data.gilded
    }

    /// Alias for [`Submission::gilded()`].
    pub fn gold_count(&self) -> u64 {
        self.gilded()
    }

    pub fn saved(&self) -> bool {
        self.data.saved
    }

    /// Alias for [`Submission::saved()`].
    pub fn is_saved(&self) -> bool {
        self.saved()
    }

    /// True if the post is marked NSFW.
    pub fn over_18(&self) -> bool {
        self.data.over_18
    }

    /// Alias for [`Submission::over_18()`].
    pub fn is_nsfw(&self) -> bool {
        self.over_18()
    }

    /// True if this is a self post rather than a link.
    pub fn is_self(&self) -> bool {
        self.data.is_self
    }

    /// Alias for [`Submission::is_self()`].
    pub fn is_self_post(&self) -> bool {
        self.is_self()
    }

    /// True if you hid the post.
    pub fn hidden(&self) -> bool {
        self.data.hidden
    }

    /// Alias for [`Submission::hidden()`].
    pub fn is_hidden(&self) -> bool {
        self.hidden()
    }

    pub fn archived(&self) -> bool {
        self.data.archived
    }

    /// Alias for [`Submission::archived()`].
    pub fn is_archived(&self) -> bool {
        self.archived()
    }

    /// True if the post no longer accepts comments.
    pub fn is_locked(&self) -> bool {
        self.data.locked
    }

    /// Hides the post from your listings.
    pub async fn hide(&mut self) -> Result<(), Error> {
        let request = Request::post("/api/hide").param("id", self.fullname());
        capability::act_then_refresh(self, "hide", request).await
    }

    /// Undoes [`Submission::hide()`].
    pub async fn unhide(&mut self) -> Result<(), Error> {
        let request = Request::post("/api/unhide").param("id", self.fullname());
        capability::act_then_refresh(self, "unhide", request).await
    }

    /// The post's top-level comments, with as many replies as Reddit
    /// includes in a single response.
    pub async fn comments(&self) -> Result<Vec<Reply>, Error> {
        let request = Request::get(format!("/comments/{}", self.id()));
        let mut response = self.client.request(request).await?;

        // Reddit returns the post itself followed by its comment tree.
        let tree = response
            .get_mut(1)
            .map(Value::take)
            .ok_or_else(|| thing::Error::MissingField(String::from("comment tree")))?;
        let listing: Listing<Reply> = Listing::hydrate(&self.client, tree)?;
        Ok(listing.into_vec())
    }
}

impl Hydrate for Submission {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        Self::from_data(client, unwrap_kind(raw, Kind::Link)?)
    }
}

impl Thing for Submission {
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

impl Refreshable for Submission {
    async fn refresh(&mut self) -> Result<(), Error> {
        let raw = capability::info_data(&self.client, self.fullname(), Kind::Link).await?;
        *self = Self::from_data(&self.client, raw)?;
        Ok(())
    }
}

impl Createable for Submission {
    fn created_utc(&self) -> DateTime<Utc> {
        clock::from_timestamp(self.data.created_utc)
    }
}

impl Editable for Submission {
    fn edited_at(&self) -> Option<DateTime<Utc>> {
        Edited::date(&self.data.edited)
    }
}

impl Gildable for Submission {}

impl Moderateable for Submission {
    fn distinguished_by(&self) -> Option<&str> {
        self.data.distinguished.as_deref()
    }

    fn is_stickied(&self) -> bool {
        self.data.stickied
    }
}

impl Repliable for Submission {
    type Reply = Comment;
}

impl Saveable for Submission {}

impl Votable for Submission {
    fn likes(&self) -> Option<bool> {
        self.data.likes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestService, listing_of, load_json};
    use serde_json::json;

    fn submission() -> Submission {
        let client = TestService::new().client();
        Submission::hydrate(&client, load_json("submission")).unwrap()
    }

    mod hydration {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn it_reads_declared_fields() {
            let submission = submission();
            assert_eq!(submission.fullname(), "t3_1kt9x0h");
            assert_eq!(submission.title(), "What are you working on this week?");
            assert_eq!(submission.author(), Some("mipadi"));
            assert_eq!(submission.subreddit(), Some("rust"));
            assert_eq!(submission.num_comments(), 12);
            assert!(submission.is_self());
        }

        #[test]
        fn it_reads_edited_false_as_never_edited() {
            let submission = submission();
            assert!(!submission.is_edited());
            assert_eq!(submission.edited_at(), None);
        }

        #[test]
        fn it_treats_empty_selftext_as_absent() {
            let client = TestService::new().client();
            let mut raw = load_json("submission");
            raw["data"]["selftext"] = json!("");
            let submission = Submission::hydrate(&client, raw).unwrap();
            assert_eq!(submission.selftext(), None);
        }

        #[test]
        fn it_rejects_comments() {
            let client = TestService::new().client();
            let err = Submission::hydrate(&client, load_json("comment")).unwrap_err();
            assert!(matches!(err, thing::Error::UnexpectedKind { expected: "t3", .. }));
        }
    }

    mod aliases {
        use super::*;
        use pretty_assertions::assert_eq;

        macro_rules! alias_test {
            ($canonical:ident, $alias:ident) => {
                paste::paste! {
                    #[test]
                    fn [<it_aliases_ $alias _to_ $canonical>]() {
                        let submission = submission();
                        assert_eq!(submission.$canonical(), submission.$alias());
                    }
                }
            };
        }

        alias_test!(saved, is_saved);
        alias_test!(gilded, gold_count);
        alias_test!(over_18, is_nsfw);
        alias_test!(is_self, is_self_post);
        alias_test!(hidden, is_hidden);
        alias_test!(archived, is_archived);
        alias_test!(banned_by, removed_by);
    }

    mod actions {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn it_hides_and_refreshes() {
            let service = TestService::new();
            let client = service.client();
            let mut submission = Submission::hydrate(&client, load_json("submission")).unwrap();
            let mut refreshed = load_json("submission");
            refreshed["data"]["hidden"] = json!(true);
            service.respond(json!({}));
            service.respond(listing_of(vec![refreshed], None, None));

            submission.hide().await.unwrap();
            assert!(submission.is_hidden());
            assert_eq!(service.requests()[0].path(), "/api/hide");
        }

        #[tokio::test]
        async fn it_saves_into_a_category() {
            let service = TestService::new();
            let client = service.client();
            let mut submission = Submission::hydrate(&client, load_json("submission")).unwrap();
            service.respond(json!({}));
            service.respond(listing_of(vec![load_json("submission")], None, None));

            submission.save(Some("reading")).await.unwrap();
            let request = &service.requests()[0];
            assert_eq!(request.path(), "/api/save");
            assert_eq!(request.parameters().get("category"), Some("reading"));
        }

        #[tokio::test]
        async fn it_loads_the_comment_tree() {
            let service = TestService::new();
            let client = service.client();
            let submission = Submission::hydrate(&client, load_json("submission")).unwrap();
            service.respond(json!([
                listing_of(vec![load_json("submission")], None, None),
                listing_of(vec![load_json("comment"), load_json("more")], None, None),
            ]));

            let comments = submission.comments().await.unwrap();
            assert_eq!(comments.len(), 2);
            assert_eq!(comments[0].fullname(), "t1_mz2h0cp");
            assert!(matches!(comments[1], Reply::More(_)));
            assert_eq!(service.requests()[0].path(), "/comments/1kt9x0h");
        }
    }
}
