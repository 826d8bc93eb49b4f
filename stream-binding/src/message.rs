/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use bytes::Bytes;
use std::collections::HashMap;
use uuid::Uuid;

/// Header carrying the MIME type of the payload.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

///
/// [`Message`] is the unit carried by a [`DirectChannel`][crate::DirectChannel].
///
/// The payload is opaque bytes and travels through channels and binders untouched.
///
/// # Examples
///
/// ```
/// use stream_binding::MessageBuilder;
///
/// let message = MessageBuilder::with_payload("hello")
///     .header("content-type", "text/plain")
///     .build();
///
/// assert_eq!(message.payload().as_ref(), b"hello");
/// assert_eq!(message.header("content-type"), Some("text/plain"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: Uuid,
    headers: HashMap<String, String>,
    payload: Bytes,
}

impl Message {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE_HEADER)
    }

    pub(crate) fn set_header_if_absent(&mut self, key: &str, value: &str) {
        if !self.headers.contains_key(key) {
            self.headers.insert(key.to_string(), value.to_string());
        }
    }
}

/// Builder for [`Message`]; every built message gets a fresh v4 id.
pub struct MessageBuilder {
    headers: HashMap<String, String>,
    payload: Bytes,
}

impl MessageBuilder {
    pub fn with_payload(payload: impl Into<Bytes>) -> Self {
        Self {
            headers: HashMap::new(),
            payload: payload.into(),
        }
    }

    /// Starts from an existing message, keeping its headers and payload.
    pub fn from_message(message: &Message) -> Self {
        Self {
            headers: message.headers.clone(),
            payload: message.payload.clone(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Message {
        Message {
            id: Uuid::new_v4(),
            headers: self.headers,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageBuilder, CONTENT_TYPE_HEADER};

    #[test]
    fn builder_assigns_distinct_ids() {
        let first = MessageBuilder::with_payload("a").build();
        let second = MessageBuilder::with_payload("a").build();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.payload(), second.payload());
    }

    #[test]
    fn set_header_if_absent_keeps_existing_value() {
        let mut message = MessageBuilder::with_payload("{}")
            .header(CONTENT_TYPE_HEADER, "application/json")
            .build();

        message.set_header_if_absent(CONTENT_TYPE_HEADER, "text/plain");
        message.set_header_if_absent("trace", "abc");

        assert_eq!(message.content_type(), Some("application/json"));
        assert_eq!(message.header("trace"), Some("abc"));
    }

    #[test]
    fn from_message_copies_headers_and_payload() {
        let original = MessageBuilder::with_payload(vec![0u8, 1, 2])
            .header("k", "v")
            .build();

        let copy = MessageBuilder::from_message(&original).build();

        assert_eq!(copy.payload().as_ref(), &[0u8, 1, 2]);
        assert_eq!(copy.header("k"), Some("v"));
        assert_ne!(copy.id(), original.id());
    }
}
