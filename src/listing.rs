// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Pages of things and cursors to walk through them.
//!
//! Every list endpoint in the Reddit API returns the same shape: a
//! `Listing` with an ordered array of children and two opaque cursors,
//! `before` and `after`. Passing `after` back to the same endpoint yields
//! the next page; a missing `after` means the feed is exhausted.

use crate::http::HTTPError;
use crate::reddit::service::{Params, Request};
use crate::reddit::{Client, Error};
use crate::thing::{self, Hydrate};
use log::{debug, trace};
use serde_json::Value;
use std::marker::PhantomData;

/// The most items Reddit returns in a single page.
pub const MAX_PAGE_SIZE: usize = 100;

/// An ordered page (or several concatenated pages) of things.
#[derive(Debug)]
pub struct Listing<T> {
    children: Vec<T>,
    before: Option<String>,
    after: Option<String>,
}

impl<T> Listing<T> {
    fn new(children: Vec<T>, before: Option<String>, after: Option<String>) -> Self {
        let before = before.filter(|s| !s.is_empty());
        let after = after.filter(|s| !s.is_empty());
        Self {
            children,
            before,
            after,
        }
    }

    /// The cursor for the page before this one.
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    /// The cursor for the page after this one, or `None` if there is
    /// nothing more to read.
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    /// True if the feed has no more pages.
    pub fn is_exhausted(&self) -> bool {
        self.after.is_none()
    }

    /// Number of things in the listing.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True if the listing holds no things.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterates over the things in the listing, in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.children.iter()
    }

    /// The first thing in the listing.
    pub fn first(&self) -> Option<&T> {
        self.children.first()
    }

    /// Consumes the listing, returning its things.
    pub fn into_vec(self) -> Vec<T> {
        self.children
    }
}

impl<T> IntoIterator for Listing<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Listing<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl<T: Hydrate> Hydrate for Listing<T> {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let mut data = match raw {
            Value::Object(mut map) => map
                .remove("data")
                .ok_or_else(|| thing::Error::MissingField(String::from("data")))?,
            other => return Err(thing::Error::NotAnObject(thing::type_name(&other))),
        };

        let children = match data.get_mut("children").map(Value::take) {
            Some(Value::Array(children)) => children,
            Some(Value::Null) | None => vec![],
            Some(_) => return Err(thing::Error::MissingField(String::from("data.children"))),
        };
        let children = children
            .into_iter()
            .map(|child| T::hydrate(client, child))
            .collect::<Result<Vec<_>, _>>()?;

        let before = cursor(&data, "before");
        let after = cursor(&data, "after");
        Ok(Self::new(children, before, after))
    }
}

fn cursor(data: &Value, name: &str) -> Option<String> {
    data.get(name).and_then(Value::as_str).map(String::from)
}

/// Walks a listing endpoint page by page.
///
/// Pages are always fetched one after another, since each request needs
/// the cursor returned by the one before it.
#[derive(Debug)]
pub struct Paginator<T> {
    client: Client,
    path: String,
    params: Params,
    after: Option<String>,
    fetched: usize,
    exhausted: bool,
    marker: PhantomData<fn() -> T>,
}

impl<T: Hydrate> Paginator<T> {
    /// Creates a paginator for the listing at `path`.
    ///
    /// An `after` cursor in `params` is used as the starting point.
    pub fn new(client: Client, path: impl Into<String>, params: Params) -> Self {
        let mut params = params;
        let after = params.remove("after");
        Self {
            client,
            path: path.into(),
            params,
            after,
            fetched: 0,
            exhausted: false,
            marker: PhantomData,
        }
    }

    /// The cursor the next page will be fetched from.
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    /// Fetches the next page, or returns `None` once the feed is
    /// exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Listing<T>>, Error> {
        if self.exhausted {
            return Ok(None);
        }
        self.fetch(None).await.map(Some)
    }

    async fn fetch(&mut self, limit: Option<usize>) -> Result<Listing<T>, Error> {
        let mut params = self.params.clone();
        if let Some(limit) = limit {
            params.set("limit", limit);
        }
        if let Some(after) = &self.after {
            params.set("after", after);
        }
        if self.fetched > 0 {
            params.set("count", self.fetched);
        }

        trace!("Fetching {} after {:?}", self.path, self.after);
        let listing: Listing<T> = self
            .client
            .fetch(Request::get(&self.path).params(params))
            .await?;

        self.fetched += listing.len();
        self.after = listing.after.clone();
        self.exhausted = self.after.is_none();
        Ok(listing)
    }

    /// Fetches up to `limit` things, following cursors across as many
    /// pages as needed.
    ///
    /// Stops early if the feed runs out. If a page after the first one
    /// cannot be found, the things collected so far are returned.
    /// The result's `before` cursor comes from the first page and its
    /// `after` cursor from the last page fetched.
    pub async fn collect(mut self, limit: usize) -> Result<Listing<T>, Error> {
        let mut children = Vec::new();
        let mut before = None;
        let mut first = true;

        while children.len() < limit && !self.exhausted {
            let remaining = limit - children.len();
            let page = match self.fetch(Some(remaining.min(MAX_PAGE_SIZE))).await {
                Ok(page) => page,
                Err(Error::Service(HTTPError::NotFound)) if !first => {
                    debug!("{} ended early after {} items", self.path, children.len());
                    break;
                }
                Err(err) => return Err(err),
            };

            if first {
                before = page.before.clone();
                first = false;
            }
            let empty = page.is_empty();
            children.extend(page.children);
            if empty {
                break;
            }
        }

        children.truncate(limit);
        debug!("Collected {} items from {}", children.len(), self.path);
        Ok(Listing::new(children, before, self.after))
    }
}
