// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! A "thing" in the Reddit sense.
//!
//! Historically in the Reddit API and its old source code, a "Thing" was
//! any element of the Reddit system: users, posts, comments, etc. This
//! module encapsulates that idea and provides an easy way to more or less
//! work with JSON data from the Reddit API.
//!
//! Every thing is _hydrated_ from a JSON object. Hydration follows the same
//! steps for every kind of thing:
//!
//! 1. Empty strings, arrays, and objects become `null`. Reddit is not
//!    consistent about whether "nothing" is `""` or `null`, so after
//!    hydration it is always absent.
//! 2. Fields that need a transformation before they are useful, such as
//!    timestamps and nested reply trees, are held privately and exposed
//!    through dedicated accessors.
//! 3. Everything else is deserialized into the thing's fixed schema. Fields
//!    Reddit sends that the schema does not declare are kept in an
//!    "extra attributes" bag, available through [`Thing::attribute()`].
//!
//! Behavior shared by several kinds of thing, like voting or editing, lives
//! in the [`capability`](crate::capability) module.

pub mod comment;
pub mod message;
pub mod more;
pub mod submission;
pub mod subreddit;
pub mod user;
pub mod wiki;

pub use comment::{Comment, Reply};
pub use message::Message;
pub use more::MoreComments;
pub use submission::Submission;
pub use subreddit::Subreddit;
pub use user::User;
pub use wiki::{WikiPage, WikiPageRevision};

use crate::reddit::Client;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// The kind of a thing, as encoded in the prefix of its fullname.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// A comment (`t1`).
    Comment,
    /// A user account (`t2`).
    Account,
    /// A link or self post (`t3`).
    Link,
    /// A private message (`t4`).
    Message,
    /// A subreddit (`t5`).
    Subreddit,
    /// An award (`t6`).
    Award,
    /// A placeholder for comments that were not loaded (`more`).
    More,
}

impl Kind {
    /// The discriminator Reddit uses for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Kind::Comment => "t1",
            Kind::Account => "t2",
            Kind::Link => "t3",
            Kind::Message => "t4",
            Kind::Subreddit => "t5",
            Kind::Award => "t6",
            Kind::More => "more",
        }
    }

    /// Looks up a kind by its discriminator.
    ///
    /// # Examples
    ///
    /// ```
    /// use snoocore::thing::Kind;
    /// assert_eq!(Kind::from_prefix("t3"), Some(Kind::Link));
    /// assert_eq!(Kind::from_prefix("t9"), None);
    /// ```
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "t1" => Some(Kind::Comment),
            "t2" => Some(Kind::Account),
            "t3" => Some(Kind::Link),
            "t4" => Some(Kind::Message),
            "t5" => Some(Kind::Subreddit),
            "t6" => Some(Kind::Award),
            "more" => Some(Kind::More),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

static FULLNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(t[1-6])_([0-9a-z]+)$").expect("invalid fullname regex"));

/// A globally unique identifier combining a [`Kind`] and a base-36 ID.
///
/// # Examples
///
/// ```
/// use snoocore::thing::{Fullname, Kind};
/// let fullname: Fullname = "t1_mz2h0cp".parse().unwrap();
/// assert_eq!(fullname.kind(), Kind::Comment);
/// assert_eq!(fullname.id(), "mz2h0cp");
/// assert_eq!(fullname.to_string(), "t1_mz2h0cp");
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Fullname {
    kind: Kind,
    id: String,
}

impl Fullname {
    /// Creates a fullname from its parts.
    pub fn new(kind: Kind, id: impl Into<String>) -> Self {
        let id = id.into();
        Self { kind, id }
    }

    /// The kind of thing this fullname refers to.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The ID without the kind prefix.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl FromStr for Fullname {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = FULLNAME_RE
            .captures(s)
            .ok_or_else(|| Error::InvalidFullname(s.to_string()))?;
        let kind = Kind::from_prefix(&caps[1]).ok_or_else(|| Error::InvalidFullname(s.to_string()))?;
        Ok(Self::new(kind, &caps[2]))
    }
}

impl fmt::Display for Fullname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.id)
    }
}

/// Common behavior for every hydrated Reddit entity.
pub trait Thing: Send + Sync {
    /// The thing's globally unique [fullname](Fullname), e.g., `t1_mz2h0cp`.
    fn fullname(&self) -> &str;

    /// The thing's ID, without the kind prefix.
    fn id(&self) -> &str;

    /// The client this thing was loaded with, used for further requests.
    fn client(&self) -> &Client;

    /// Attributes Reddit sent that this thing's schema does not declare.
    fn extra(&self) -> &Map<String, Value>;

    /// Looks up an undeclared attribute by name.
    ///
    /// Returns `None` if Reddit did not send the attribute at all, and
    /// `Some(Value::Null)` if it sent an empty or null value.
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.extra().get(name)
    }
}

/// Converts raw JSON from the Reddit API into a typed value.
pub trait Hydrate: Sized {
    /// Builds a value from `raw`, keeping a handle to `client` for
    /// follow-up requests.
    fn hydrate(client: &Client, raw: Value) -> Result<Self, Error>;
}

/// True if `value` is an empty string, array, or object.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Replaces empty strings, arrays, and objects in a JSON object's values
/// with `null`.
///
/// Only the top level is normalized; nested objects are left alone so
/// that they can be hydrated on their own terms.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Value};
/// use snoocore::thing::normalize;
/// let map = normalize(json!({"body": "", "score": 0})).unwrap();
/// assert_eq!(map["body"], Value::Null);
/// assert_eq!(map["score"], json!(0));
/// assert!(!map.contains_key("author"));
/// ```
pub fn normalize(raw: Value) -> Result<Map<String, Value>, Error> {
    match raw {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| if is_empty(&v) { (k, Value::Null) } else { (k, v) })
            .collect()),
        other => Err(Error::NotAnObject(type_name(&other))),
    }
}

/// Normalizes `raw` and deserializes it into the schema `D`.
pub(crate) fn hydrate_fields<D: DeserializeOwned>(raw: Value) -> Result<D, Error> {
    let map = normalize(raw)?;
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Splits a `{"kind": ..., "data": {...}}` envelope, checking the kind.
pub(crate) fn unwrap_kind(raw: Value, expected: Kind) -> Result<Value, Error> {
    let (kind, data) = split_envelope(raw)?;
    if kind == expected.prefix() {
        Ok(data)
    } else {
        Err(Error::UnexpectedKind {
            expected: expected.prefix(),
            found: kind,
        })
    }
}

fn split_envelope(raw: Value) -> Result<(String, Value), Error> {
    let Value::Object(mut map) = raw else {
        return Err(Error::NotAnObject(type_name(&raw)));
    };
    let kind = match map.remove("kind") {
        Some(Value::String(kind)) => kind,
        _ => return Err(Error::MissingField(String::from("kind"))),
    };
    let data = map
        .remove("data")
        .ok_or_else(|| Error::MissingField(String::from("data")))?;
    Ok((kind, data))
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Any thing that can appear in a listing.
#[derive(Debug)]
pub enum Item {
    /// A comment.
    Comment(Comment),
    /// A user account.
    User(User),
    /// A link or self post.
    Submission(Submission),
    /// A private message.
    Message(Message),
    /// A subreddit.
    Subreddit(Subreddit),
    /// Comments that have not been loaded yet.
    More(MoreComments),
}

impl Item {
    /// The kind of thing this item holds.
    pub fn kind(&self) -> Kind {
        match self {
            Item::Comment(_) => Kind::Comment,
            Item::User(_) => Kind::Account,
            Item::Submission(_) => Kind::Link,
            Item::Message(_) => Kind::Message,
            Item::Subreddit(_) => Kind::Subreddit,
            Item::More(_) => Kind::More,
        }
    }

    fn inner(&self) -> &dyn Thing {
        match self {
            Item::Comment(t) => t,
            Item::User(t) => t,
            Item::Submission(t) => t,
            Item::Message(t) => t,
            Item::Subreddit(t) => t,
            Item::More(t) => t,
        }
    }

    /// The comment, if this item is one.
    pub fn into_comment(self) -> Option<Comment> {
        match self {
            Item::Comment(c) => Some(c),
            _ => None,
        }
    }

    /// The submission, if this item is one.
    pub fn into_submission(self) -> Option<Submission> {
        match self {
            Item::Submission(s) => Some(s),
            _ => None,
        }
    }

    /// The message, if this item is one.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Item::Message(m) => Some(m),
            _ => None,
        }
    }

    /// True if this item is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(self, Item::Comment(_))
    }

    /// True if this item is a submission.
    pub fn is_submission(&self) -> bool {
        matches!(self, Item::Submission(_))
    }
}

impl Hydrate for Item {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, Error> {
        let (kind, data) = split_envelope(raw)?;
        let item = match Kind::from_prefix(&kind) {
            Some(Kind::Comment) => Item::Comment(Comment::from_data(client, data)?),
            Some(Kind::Account) => Item::User(User::from_data(client, data)?),
            Some(Kind::Link) => Item::Submission(Submission::from_data(client, data)?),
            Some(Kind::Message) => Item::Message(Message::from_data(client, data)?),
            Some(Kind::Subreddit) => Item::Subreddit(Subreddit::from_data(client, data)?),
            Some(Kind::More) => Item::More(MoreComments::from_data(client, data)?),
            Some(Kind::Award) | None => return Err(Error::UnknownKind(kind)),
        };
        Ok(item)
    }
}

impl Thing for Item {
    fn fullname(&self) -> &str {
        self.inner().fullname()
    }

    fn id(&self) -> &str {
        self.inner().id()
    }

    fn client(&self) -> &Client {
        self.inner().client()
    }

    fn extra(&self) -> &Map<String, Value> {
        self.inner().extra()
    }
}

/// An error hydrating Reddit data.
#[derive(Debug, Error)]
pub enum Error {
    /// The JSON did not fit the thing's schema, e.g., a required field
    /// was missing or had the wrong type.
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A JSON object was expected.
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A structural field was missing from the response.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A listing contained a kind of thing this library does not know.
    #[error("Unknown kind of thing: {0}")]
    UnknownKind(String),

    /// A thing of a specific kind was expected, but another arrived.
    #[error("Expected a thing of kind {expected}, found {found}")]
    UnexpectedKind {
        /// The kind that was expected.
        expected: &'static str,
        /// The kind that was found.
        found: String,
    },

    /// A string was not a valid fullname.
    #[error("Invalid fullname: {0}")]
    InvalidFullname(String),
}

#[cfg(test)]
mod tests {
    mod normalization {
        use super::super::*;
        use pretty_assertions::assert_eq;
        use serde_json::json;

        #[test]
        fn it_nulls_empty_strings_arrays_and_objects() {
            let map = normalize(json!({
                "body": "",
                "mod_reports": [],
                "media_embed": {},
            }))
            .unwrap();
            assert_eq!(map["body"], Value::Null);
            assert_eq!(map["mod_reports"], Value::Null);
            assert_eq!(map["media_embed"], Value::Null);
        }

        #[test]
        fn it_keeps_falsy_scalars() {
            let map = normalize(json!({"score": 0, "saved": false, "author": "mipadi"})).unwrap();
            assert_eq!(map["score"], json!(0));
            assert_eq!(map["saved"], json!(false));
            assert_eq!(map["author"], json!("mipadi"));
        }

        #[test]
        fn it_does_not_materialize_missing_fields() {
            let map = normalize(json!({"score": 1})).unwrap();
            assert!(!map.contains_key("body"));
        }

        #[test]
        fn it_only_normalizes_the_top_level() {
            let map = normalize(json!({"replies": {"data": {"children": []}}})).unwrap();
            assert_eq!(map["replies"], json!({"data": {"children": []}}));
        }

        #[test]
        fn it_rejects_non_objects() {
            let err = normalize(json!([1, 2, 3])).unwrap_err();
            assert!(matches!(err, Error::NotAnObject("array")));
        }
    }

    mod envelopes {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn it_unwraps_the_expected_kind() {
            let data = unwrap_kind(json!({"kind": "t1", "data": {"id": "a"}}), Kind::Comment);
            assert_eq!(data.unwrap(), json!({"id": "a"}));
        }

        #[test]
        fn it_rejects_other_kinds() {
            let err = unwrap_kind(json!({"kind": "t3", "data": {}}), Kind::Comment).unwrap_err();
            assert!(matches!(
                err,
                Error::UnexpectedKind { expected: "t1", found } if found == "t3"
            ));
        }

        #[test]
        fn it_requires_a_kind() {
            let err = unwrap_kind(json!({"data": {}}), Kind::Comment).unwrap_err();
            assert!(matches!(err, Error::MissingField(f) if f == "kind"));
        }

        #[test]
        fn it_requires_data() {
            let err = unwrap_kind(json!({"kind": "t1"}), Kind::Comment).unwrap_err();
            assert!(matches!(err, Error::MissingField(f) if f == "data"));
        }
    }

    mod fullnames {
        use super::super::*;

        #[test]
        fn it_parses_fullnames() {
            let fullname: Fullname = "t3_1kt9x0h".parse().unwrap();
            assert_eq!(fullname.kind(), Kind::Link);
            assert_eq!(fullname.id(), "1kt9x0h");
        }

        #[test]
        fn it_rejects_unknown_prefixes() {
            assert!("t9_abc".parse::<Fullname>().is_err());
        }

        #[test]
        fn it_rejects_malformed_ids() {
            assert!("t1_ABC".parse::<Fullname>().is_err());
            assert!("t1_".parse::<Fullname>().is_err());
            assert!("mipadi".parse::<Fullname>().is_err());
        }

        #[test]
        fn it_round_trips_through_display() {
            let fullname = Fullname::new(Kind::Subreddit, "2qh1i");
            assert_eq!(fullname.to_string(), "t5_2qh1i");
            assert_eq!(fullname.to_string().parse::<Fullname>().unwrap(), fullname);
        }
    }

    mod dispatch {
        use super::super::*;
        use crate::test_utils::{TestService, load_data};
        use serde_json::json;

        #[test]
        fn it_hydrates_each_kind_into_its_variant() {
            let client = TestService::new().client();
            let raw: Value = serde_json::from_str(&load_data("listing_mixed")).unwrap();
            let children = raw["data"]["children"].as_array().unwrap().clone();
            let kinds: Vec<Kind> = children
                .into_iter()
                .map(|child| Item::hydrate(&client, child).unwrap().kind())
                .collect();
            assert_eq!(
                kinds,
                vec![Kind::Comment, Kind::Link, Kind::Message, Kind::More]
            );
        }

        #[test]
        fn it_rejects_unknown_kinds() {
            let client = TestService::new().client();
            let err = Item::hydrate(&client, json!({"kind": "t9", "data": {}})).unwrap_err();
            assert!(matches!(err, Error::UnknownKind(k) if k == "t9"));
        }

        #[test]
        fn it_exposes_the_fullname_of_any_item() {
            let client = TestService::new().client();
            let raw: Value = serde_json::from_str(&load_data("listing_mixed")).unwrap();
            let first = raw["data"]["children"][0].clone();
            let item = Item::hydrate(&client, first).unwrap();
            assert_eq!(item.fullname(), "t1_mz2h0cp");
            assert_eq!(item.id(), "mz2h0cp");
            assert!(item.is_comment());
            assert!(item.into_comment().is_some());
        }
    }
}
