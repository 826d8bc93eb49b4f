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

//! In-process subscribable channels.
//!
//! A [`DirectChannel`] hands every message to exactly one subscriber, rotating
//! through subscribers round-robin and failing over to the next one when a
//! handler reports an error.

pub(crate) mod handler_identity;

use crate::channel::handler_identity::HandlerIdentityKey;
use crate::message::{Message, CONTENT_TYPE_HEADER};
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn, Level};

const COMPONENT: &str = "direct_channel";

/// Failures raised while dispatching a message through a channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeliveryError {
    NoSubscribers(String),
    HandlerFailed(String),
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::NoSubscribers(channel) => {
                write!(f, "channel '{channel}' has no subscribers")
            }
            DeliveryError::HandlerFailed(reason) => write!(f, "message handler failed: {reason}"),
        }
    }
}

impl Error for DeliveryError {}

/// Receives messages dispatched by a [`DirectChannel`].
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, message: Message) -> Result<(), DeliveryError>;
}

/// Unicast, round-robin, failover channel.
pub struct DirectChannel {
    name: String,
    content_type: Option<String>,
    subscribers: RwLock<Vec<HandlerIdentityKey>>,
    next_subscriber: AtomicUsize,
}

impl DirectChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content_type: None,
            subscribers: RwLock::new(Vec::new()),
            next_subscriber: AtomicUsize::new(0),
        }
    }

    /// Stamps `content_type` onto sent messages that do not carry one.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Adds `handler`. Returns `false` if this exact handler is already subscribed.
    pub async fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> bool {
        let key = HandlerIdentityKey::new(handler);
        let mut subscribers = self.subscribers.write().await;
        if subscribers.contains(&key) {
            return false;
        }
        subscribers.push(key);

        debug!(
            event = events::CHANNEL_SUBSCRIBE,
            component = COMPONENT,
            channel = self.name.as_str(),
            subscribers = subscribers.len(),
            "handler subscribed"
        );
        true
    }

    /// Removes `handler`. Returns `false` if it was not subscribed.
    pub async fn unsubscribe(&self, handler: &Arc<dyn MessageHandler>) -> bool {
        let key = HandlerIdentityKey::new(handler.clone());
        let mut subscribers = self.subscribers.write().await;
        let Some(position) = subscribers.iter().position(|existing| existing == &key) else {
            return false;
        };
        subscribers.remove(position);

        debug!(
            event = events::CHANNEL_UNSUBSCRIBE,
            component = COMPONENT,
            channel = self.name.as_str(),
            subscribers = subscribers.len(),
            "handler unsubscribed"
        );
        true
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Dispatches `message` to one subscriber.
    pub async fn send(&self, mut message: Message) -> Result<(), DeliveryError> {
        if let Some(content_type) = self.content_type.as_deref() {
            message.set_header_if_absent(CONTENT_TYPE_HEADER, content_type);
        }

        let handlers: Vec<Arc<dyn MessageHandler>> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(HandlerIdentityKey::handler)
            .collect();

        if handlers.is_empty() {
            debug!(
                event = events::CHANNEL_NO_SUBSCRIBERS,
                component = COMPONENT,
                channel = self.name.as_str(),
                msg_id = %fields::format_message_id(&message),
                "dropping message with no subscribers"
            );
            return Err(DeliveryError::NoSubscribers(self.name.clone()));
        }

        let start = self.next_subscriber.fetch_add(1, Ordering::Relaxed) % handlers.len();
        let mut last_error = None;

        for offset in 0..handlers.len() {
            let handler = &handlers[(start + offset) % handlers.len()];
            match handler.handle_message(message.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if tracing::enabled!(Level::WARN) {
                        warn!(
                            event = events::CHANNEL_DISPATCH_FAILED,
                            component = COMPONENT,
                            channel = self.name.as_str(),
                            msg_id = %fields::format_message_id(&message),
                            content_type = %fields::format_content_type(&message),
                            err = %err,
                            "handler failed, trying next subscriber"
                        );
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DeliveryError::NoSubscribers(self.name.clone())))
    }
}
