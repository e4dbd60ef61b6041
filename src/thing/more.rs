// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Placeholders for comments that were left out of a response.

use crate::reddit::Client;
use crate::thing::{self, Hydrate, Kind, Thing, unwrap_kind};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Stands in for comments in a thread that Reddit did not include in a
/// response, usually because the thread is large or deeply nested.
#[derive(Debug)]
pub struct MoreComments {
    client: Client,
    data: MoreData,
}

#[derive(Clone, Debug, Deserialize)]
struct MoreData {
    id: String,
    name: String,

    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    depth: u64,
    #[serde(default)]
    children: Option<Vec<String>>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl MoreComments {
    pub(crate) fn from_data(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let data = thing::hydrate_fields(raw)?;
        let client = client.clone();
        Ok(Self { client, data })
    }

    /// Fullname of the comment or post the missing comments reply to.
    pub fn parent_id(&self) -> Option<&str> {
        self.data.parent_id.as_deref()
    }

    /// Number of comments left out, including their replies.
    pub fn count(&self) -> u64 {
        self.data.count
    }

    /// Nesting depth of the missing comments.
    pub fn depth(&self) -> u64 {
        self.data.depth
    }

    /// IDs of the missing top-level comments.
    ///
    /// Empty when the placeholder is a "continue this thread" link.
    pub fn children(&self) -> &[String] {
        self.data.children.as_deref().unwrap_or_default()
    }
}

impl Hydrate for MoreComments {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        Self::from_data(client, unwrap_kind(raw, Kind::More)?)
    }
}

impl Thing for MoreComments {
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
