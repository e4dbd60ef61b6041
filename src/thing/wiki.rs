// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Wiki pages and their revision history.
//!
//! Wiki pages are not things: they have no fullname and are addressed by
//! subreddit and page name instead.

use crate::capability::Createable;
use crate::clock::{self, DateTime, Utc};
use crate::listing::Paginator;
use crate::reddit::service::{Params, Request};
use crate::reddit::{Client, Error};
use crate::thing::{self, Hydrate};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A wiki page.
#[derive(Debug)]
pub struct WikiPage {
    client: Client,
    subreddit: Option<String>,
    name: String,
    data: WikiPageData,
}

#[derive(Clone, Debug, Deserialize)]
struct WikiPageData {
    #[serde(default)]
    content_md: Option<String>,
    #[serde(default)]
    content_html: Option<String>,
    #[serde(default)]
    may_revise: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    revision_id: Option<String>,
    #[serde(default)]
    revision_by: Option<NestedUser>,
    #[serde(default)]
    revision_date: Option<f64>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A user as nested in wiki responses: `{"kind": "t2", "data": {...}}`.
#[derive(Clone, Debug, Deserialize)]
struct NestedUser {
    data: NestedUserData,
}

#[derive(Clone, Debug, Deserialize)]
struct NestedUserData {
    name: String,
}

impl NestedUser {
    fn name(&self) -> &str {
        &self.data.name
    }
}

impl WikiPage {
    /// Loads `page` from `subreddit`'s wiki, or from the site-wide wiki if
    /// `subreddit` is `None`.
    pub(crate) async fn load(
        client: &Client,
        subreddit: Option<&str>,
        page: &str,
    ) -> Result<Self, Error> {
        let path = wiki_path(subreddit, &format!("wiki/{page}"));
        let raw = client.request(Request::get(path)).await?;
        let data = match raw {
            Value::Object(mut map) => map
                .remove("data")
                .ok_or_else(|| thing::Error::MissingField(String::from("data")))?,
            other => return Err(thing::Error::NotAnObject(thing::type_name(&other)).into()),
        };
        Ok(Self {
            client: client.clone(),
            subreddit: subreddit.map(String::from),
            name: page.to_string(),
            data: thing::hydrate_fields(data)?,
        })
    }

    /// The page's name, e.g., `index`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The subreddit the page belongs to, or `None` for the site-wide wiki.
    pub fn subreddit(&self) -> Option<&str> {
        self.subreddit.as_deref()
    }

    /// The page's content, as Markdown.
    pub fn content_md(&self) -> Option<&str> {
        self.data.content_md.as_deref()
    }

    /// The page's content, as HTML.
    pub fn content_html(&self) -> Option<&str> {
        self.data.content_html.as_deref()
    }

    /// True if you are allowed to edit the page.
    pub fn may_revise(&self) -> bool {
        self.data.may_revise
    }

    /// The reason given for the latest revision.
    pub fn reason(&self) -> Option<&str> {
        self.data.reason.as_deref()
    }

    /// ID of the latest revision.
    pub fn revision_id(&self) -> Option<&str> {
        self.data.revision_id.as_deref()
    }

    /// Username of whoever made the latest revision.
    pub fn revision_by(&self) -> Option<&str> {
        self.data.revision_by.as_ref().map(NestedUser::name)
    }

    /// When the latest revision was made.
    pub fn revision_date(&self) -> Option<DateTime<Utc>> {
        self.data.revision_date.map(clock::from_timestamp)
    }

    /// Attributes Reddit sent that are not declared above.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.data.extra.get(name)
    }

    /// The page's revision history, newest first.
    pub fn revisions(&self) -> Paginator<WikiPageRevision> {
        let path = wiki_path(self.subreddit(), &format!("wiki/revisions/{}", self.name));
        self.client.paginator(path, Params::new())
    }

    /// Re-fetches the page and replaces its state in place.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        *self = Self::load(&self.client, self.subreddit.as_deref(), &self.name).await?;
        Ok(())
    }

    /// Replaces the page's content.
    pub async fn edit(&mut self, content: &str, reason: Option<&str>) -> Result<(), Error> {
        let mut request = Request::post(wiki_path(self.subreddit(), "api/wiki/edit"))
            .param("content", content)
            .param("page", &self.name);
        if let Some(reason) = reason {
            request = request.param("reason", reason);
        }

        debug!("Editing wiki page {}", self.name);
        self.client.request(request).await?;
        self.refresh().await.map_err(|source| Error::StaleState {
            action: "edit",
            source: Box::new(source),
        })
    }
}

fn wiki_path(subreddit: Option<&str>, resource: &str) -> String {
    match subreddit {
        Some(subreddit) => format!("/r/{subreddit}/{resource}"),
        None => format!("/{resource}"),
    }
}

/// A single revision of a wiki page.
#[derive(Debug)]
pub struct WikiPageRevision {
    data: RevisionData,
}

#[derive(Clone, Debug, Deserialize)]
struct RevisionData {
    id: String,
    timestamp: f64,

    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    author: Option<NestedUser>,
    #[serde(default)]
    revision_hidden: bool,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl WikiPageRevision {
    /// The revision's ID.
    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// Name of the revised page.
    pub fn page(&self) -> Option<&str> {
        self.data.page.as_deref()
    }

    /// The reason given for the revision.
    pub fn reason(&self) -> Option<&str> {
        self.data.reason.as_deref()
    }

    /// Username of whoever made the revision.
    pub fn author(&self) -> Option<&str> {
        self.data.author.as_ref().map(NestedUser::name)
    }

    /// True if a moderator hid the revision from the history.
    pub fn is_hidden(&self) -> bool {
        self.data.revision_hidden
    }

    /// Attributes Reddit sent that are not declared above.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.data.extra.get(name)
    }
}

// Revisions arrive as bare objects, without a kind envelope.
impl Hydrate for WikiPageRevision {
    fn hydrate(_client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let data = thing::hydrate_fields(raw)?;
        Ok(Self { data })
    }
}

impl Createable for WikiPageRevision {
    fn created_utc(&self) -> DateTime<Utc> {
        clock::from_timestamp(self.data.timestamp)
    }
}
