use crate::clock::{Clock, DateTime, TimeDelta, Utc};
use crate::http::{HTTPError, HTTPResult};
use crate::reddit::Client;
use crate::reddit::service::{Request, Service};
use futures::future::{self, BoxFuture};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex};

pub fn do_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn load_data(file: &str) -> String {
    fs::read_to_string(format!("tests/data/{file}.json")).expect("could not find test data")
}

pub fn load_json(file: &str) -> Value {
    serde_json::from_str(&load_data(file)).expect("test data is not valid JSON")
}

/// Wraps `children` in a listing envelope.
pub fn listing_of(children: Vec<Value>, after: Option<&str>, before: Option<&str>) -> Value {
    json!({
        "kind": "Listing",
        "data": {
            "after": after,
            "before": before,
            "dist": children.len(),
            "children": children,
        }
    })
}

/// A listing of minimal comments with the given IDs, in order.
pub fn comment_listing(ids: &[&str], after: Option<&str>) -> Value {
    let children = ids
        .iter()
        .map(|id| {
            json!({
                "kind": "t1",
                "data": {
                    "id": id,
                    "name": format!("t1_{id}"),
                    "link_id": "t3_1kt9x0h",
                    "parent_id": "t3_1kt9x0h",
                    "author": "mipadi",
                    "body": format!("Comment {id}"),
                    "subreddit": "rust",
                    "created_utc": 1748020380.0,
                }
            })
        })
        .collect();
    listing_of(children, after, None)
}

#[derive(Default)]
struct Exchange {
    responses: VecDeque<HTTPResult<Value>>,
    requests: Vec<Request>,
}

/// Answers requests with canned responses, in the order they were queued,
/// and records every request it receives.
///
/// Once the queue runs dry, every request fails with
/// [`HTTPError::NotFound`].
#[derive(Clone, Default)]
pub struct TestService {
    exchange: Arc<Mutex<Exchange>>,
}

impl TestService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: Value) {
        self.push(Ok(response));
    }

    pub fn fail(&self, error: HTTPError) {
        self.push(Err(error));
    }

    fn push(&self, response: HTTPResult<Value>) {
        let mut exchange = self.exchange.lock().expect("poisoned test service");
        exchange.responses.push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        let exchange = self.exchange.lock().expect("poisoned test service");
        exchange.requests.clone()
    }

    pub fn client(&self) -> Client {
        Client::new(self.clone())
    }
}

impl Service for TestService {
    fn execute(&self, request: Request) -> BoxFuture<'_, HTTPResult<Value>> {
        let mut exchange = self.exchange.lock().expect("poisoned test service");
        exchange.requests.push(request);
        let response = exchange
            .responses
            .pop_front()
            .unwrap_or(Err(HTTPError::NotFound));
        Box::pin(future::ready(response))
    }
}

pub struct FrozenClock {
    datetime: Mutex<DateTime<Utc>>,
}

impl FrozenClock {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        let datetime = Mutex::new(datetime);
        FrozenClock { datetime }
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        let mut datetime = self.datetime.lock().expect("poisoned clock");
        *datetime += TimeDelta::seconds(secs);
    }
}

impl Default for FrozenClock {
    fn default() -> Self {
        let datetime = DateTime::parse_from_rfc3339("2025-05-23T10:13:00-07:00")
            .expect("invalid date supplied")
            .with_timezone(&Utc);
        Self::new(datetime)
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        *self.datetime.lock().expect("poisoned clock")
    }
}
