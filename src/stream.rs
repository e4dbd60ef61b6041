// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Live feeds built by polling a listing.
//!
//! A [`stream()`] turns a ranked listing, such as a subreddit's newest
//! comments, into a feed of things as they appear. Each poll reads the head
//! of the listing and yields only the things it has not yielded before.
//!
//! To keep memory constant no matter how long a stream runs, it only
//! remembers the most recent fullnames it has seen (see [`SeenSet`]). A
//! thing that drops out of that window and later shows up at the head of
//! the listing again is yielded a second time. With the default capacity
//! this requires several hundred newer things to arrive in between, so in
//! practice it happens only on extremely busy feeds.
//!
//! Only the first page of the listing is read on each poll. If more than a
//! page of new things arrives between two polls, the ones that were pushed
//! past the first page are never seen. Lowering the poll interval is the
//! way to keep up with a busy feed.

use crate::listing::{Listing, MAX_PAGE_SIZE};
use crate::reddit::service::Params;
use crate::reddit::{Client, Error};
use crate::thing::{Hydrate, Thing};
use futures::Stream;
use log::{debug, trace, warn};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// How a [`stream()`] polls.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
    /// How long to wait between polls.
    pub interval: Duration,

    /// How many fullnames to remember. Never fewer than the page size.
    pub seen_capacity: usize,

    /// Yield each poll's new things oldest first instead of in the
    /// listing's order.
    pub oldest_first: bool,

    /// Fullnames to treat as already seen, e.g., from a previous run.
    pub resume: Vec<String>,
}

impl StreamConfig {
    /// Default time between polls.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Default number of fullnames remembered.
    ///
    /// Comfortably larger than one full page, so that a page of things
    /// that are all still at the head is never yielded twice.
    pub const DEFAULT_SEEN_CAPACITY: usize = 5 * MAX_PAGE_SIZE;

    /// Sets the time between polls.
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Sets the number of fullnames remembered.
    ///
    /// A capacity smaller than the stream's page size is raised to the page
    /// size, so an unchanged page is never yielded twice.
    pub fn with_seen_capacity(self, seen_capacity: usize) -> Self {
        Self {
            seen_capacity,
            ..self
        }
    }

    /// Yields each poll's new things oldest first.
    pub fn oldest_first(self) -> Self {
        Self {
            oldest_first: true,
            ..self
        }
    }

    /// Treats `fullnames` as already seen.
    pub fn resume_from(self, fullnames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let resume = fullnames.into_iter().map(Into::into).collect();
        Self { resume, ..self }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            seen_capacity: Self::DEFAULT_SEEN_CAPACITY,
            oldest_first: false,
            resume: vec![],
        }
    }
}

/// A set of fullnames that forgets its oldest entries once it is full.
#[derive(Debug)]
pub struct SeenSet {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl SeenSet {
    /// Creates a set that remembers at most `capacity` fullnames.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Adds `fullname` to the set, evicting the oldest entry if the set is
    /// full. Returns false if `fullname` was already in the set.
    pub fn insert(&mut self, fullname: &str) -> bool {
        if self.members.contains(fullname) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                trace!("Forgetting {evicted}");
                self.members.remove(&evicted);
            }
        }
        self.order.push_back(fullname.to_string());
        self.members.insert(fullname.to_string());
        true
    }

    /// True if `fullname` is in the set.
    pub fn contains(&self, fullname: &str) -> bool {
        self.members.contains(fullname)
    }

    /// Number of fullnames in the set.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The most fullnames the set will hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

struct Poller<T> {
    client: Client,
    path: String,
    params: Params,
    config: StreamConfig,
    seen: SeenSet,
    pending: VecDeque<T>,
    polled: bool,
    finished: bool,
}

impl<T: Hydrate + Thing> Poller<T> {
    fn new(client: Client, path: String, params: Params, config: StreamConfig) -> Self {
        // Always read the head of the feed.
        let mut params = params;
        params.remove("after");
        if params.get("limit").is_none() {
            params.set("limit", MAX_PAGE_SIZE);
        }

        let page_size = params
            .get("limit")
            .and_then(|limit| limit.parse::<usize>().ok())
            .unwrap_or(MAX_PAGE_SIZE);
        let mut seen = SeenSet::new(config.seen_capacity.max(page_size));
        for fullname in &config.resume {
            seen.insert(fullname);
        }

        Self {
            client,
            path,
            params,
            config,
            seen,
            pending: VecDeque::new(),
            polled: false,
            finished: false,
        }
    }

    async fn poll(&mut self) -> Result<(), Error> {
        if self.polled {
            tokio::time::sleep(self.config.interval).await;
        }
        self.polled = true;

        let listing: Listing<T> = self.client.listing(&self.path, self.params.clone()).await?;
        let mut fresh: Vec<T> = listing
            .into_iter()
            .filter(|thing| self.seen.insert(thing.fullname()))
            .collect();
        if self.config.oldest_first {
            fresh.reverse();
        }

        debug!("Poll of {} found {} new items", self.path, fresh.len());
        self.pending.extend(fresh);
        Ok(())
    }
}

/// Polls the listing at `path` forever, yielding each thing once.
///
/// The first poll happens immediately; later ones wait
/// [`StreamConfig::interval`] after the previous one. Things found by a
/// poll are yielded in the listing's order, which for most feeds is newest
/// first, unless [`StreamConfig::oldest_first`] is set.
///
/// Transient failures, like rate limiting or server errors, are yielded
/// as errors and polling carries on. Any other failure is yielded and ends
/// the stream. Dropping the stream stops polling.
pub fn stream<T>(
    client: Client,
    path: String,
    params: Params,
    config: StreamConfig,
) -> impl Stream<Item = Result<T, Error>> + Send + 'static
where
    T: Hydrate + Thing + 'static,
{
    let poller = Poller::new(client, path, params, config);
    futures::stream::unfold(poller, |mut poller| async move {
        loop {
            if let Some(thing) = poller.pending.pop_front() {
                return Some((Ok(thing), poller));
            }
            if poller.finished {
                return None;
            }
            match poller.poll().await {
                Ok(()) => continue,
                Err(err) if err.is_transient() => {
                    warn!("Poll of {} failed, will retry: {err}", poller.path);
                    return Some((Err(err), poller));
                }
                Err(err) => {
                    warn!("Poll of {} failed, stopping: {err}", poller.path);
                    poller.finished = true;
                    return Some((Err(err), poller));
                }
            }
        }
    })
}
