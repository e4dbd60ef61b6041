// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Private messages.

use crate::capability::{Createable, Inboxable, Repliable};
use crate::clock::{self, DateTime, Utc};
use crate::reddit::Client;
use crate::thing::{self, Hydrate, Kind, Thing, unwrap_kind};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A private message, or a comment reply as it appears in the inbox.
#[derive(Debug)]
pub struct Message {
    client: Client,
    data: MessageData,
}

#[derive(Clone, Debug, Deserialize)]
struct MessageData {
    id: String,
    name: String,
    created_utc: f64,

    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    dest: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    first_message_name: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    distinguished: Option<String>,
    #[serde(default)]
    new: bool,
    #[serde(default)]
    was_comment: bool,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Message {
    pub(crate) fn from_data(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        let mut raw = raw;
        if let Some(map) = raw.as_object_mut() {
            map.remove("created");
            // Message threads are fetched separately.
            map.remove("replies");
        }
        let data = thing::hydrate_fields(raw)?;
        let client = client.clone();
        Ok(Self { client, data })
    }

    /// The sender, or `None` for messages sent by a subreddit.
    pub fn author(&self) -> Option<&str> {
        self.data.author.as_deref()
    }

    /// The recipient.
    pub fn dest(&self) -> Option<&str> {
        self.data.dest.as_deref()
    }

    /// The message's subject line.
    pub fn subject(&self) -> Option<&str> {
        self.data.subject.as_deref()
    }

    /// The message body, as Markdown.
    pub fn body(&self) -> Option<&str> {
        self.data.body.as_deref()
    }

    /// The message body, as HTML.
    pub fn body_html(&self) -> Option<&str> {
        self.data.body_html.as_deref()
    }

    /// For comment replies, the path to the comment in its thread.
    pub fn context(&self) -> Option<&str> {
        self.data.context.as_deref()
    }

    /// Fullname of the first message in the conversation.
    pub fn first_message_name(&self) -> Option<&str> {
        self.data.first_message_name.as_deref()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.data.parent_id.as_deref()
    }

    /// For comment replies and modmail, the subreddit involved.
    pub fn subreddit(&self) -> Option<&str> {
        self.data.subreddit.as_deref()
    }

    pub fn distinguished(&self) -> Option<&str> {
        self.data.distinguished.as_deref()
    }

    /// True if the message is unread.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(&self) -> bool {
        self.data.new
    }

    /// Alias for [`Message::new()`].
    pub fn is_unread(&self) -> bool {
        self.new()
    }

    /// True if this is a reply to one of your comments or posts rather than
    /// a private message.
    pub fn was_comment(&self) -> bool {
        self.data.was_comment
    }

    /// Alias for [`Message::was_comment()`].
    pub fn is_comment_reply(&self) -> bool {
        self.was_comment()
    }
}

impl Hydrate for Message {
    fn hydrate(client: &Client, raw: Value) -> Result<Self, thing::Error> {
        Self::from_data(client, unwrap_kind(raw, Kind::Message)?)
    }
}

impl Thing for Message {
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

impl Createable for Message {
    fn created_utc(&self) -> DateTime<Utc> {
        clock::from_timestamp(self.data.created_utc)
    }
}

impl Inboxable for Message {}

impl Repliable for Message {
    type Reply = Message;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestService, load_json};
    use pretty_assertions::assert_eq;

    fn message() -> Message {
        let client = TestService::new().client();
        Message::hydrate(&client, load_json("message")).unwrap()
    }

    #[test]
    fn it_reads_declared_fields() {
        let message = message();
        assert_eq!(message.fullname(), "t4_2nsmvnx");
        assert_eq!(message.author(), Some("rustacean"));
        assert_eq!(message.dest(), Some("mipadi"));
        assert_eq!(message.subject(), Some("Your crate"));
        assert_eq!(message.subreddit(), None);
    }

    #[test]
    fn it_aliases_new_to_is_unread() {
        let message = message();
        assert!(message.new());
        assert_eq!(message.new(), message.is_unread());
    }

    #[test]
    fn it_aliases_was_comment_to_is_comment_reply() {
        let message = message();
        assert!(!message.was_comment());
        assert_eq!(message.was_comment(), message.is_comment_reply());
    }

    #[test]
    fn it_does_not_expose_replies_as_an_attribute() {
        assert_eq!(message().attribute("replies"), None);
    }
}
