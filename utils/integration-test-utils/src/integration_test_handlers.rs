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

use async_trait::async_trait;
use std::time::Duration;
use stream_binding::{DeliveryError, Message, MessageHandler};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// Stores every message it receives and wakes waiters on each arrival.
#[derive(Default)]
pub struct CollectingHandler {
    message_store: Mutex<Vec<Message>>,
    arrived: Notify,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn received(&self) -> Vec<Message> {
        self.message_store.lock().await.clone()
    }

    /// Waits until at least `count` messages arrived, or `within` elapses.
    /// Returns the messages seen so far in either case.
    pub async fn wait_for_messages(&self, count: usize, within: Duration) -> Vec<Message> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let notified = self.arrived.notified();
            {
                let store = self.message_store.lock().await;
                if store.len() >= count {
                    return store.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.received().await;
            }
        }
    }
}

#[async_trait]
impl MessageHandler for CollectingHandler {
    async fn handle_message(&self, message: Message) -> Result<(), DeliveryError> {
        debug!("collecting handler received msg: {}", message.id());
        self.message_store.lock().await.push(message);
        self.arrived.notify_waiters();
        Ok(())
    }
}

/// Rejects every message.
pub struct FailingHandler {
    reason: String,
}

impl FailingHandler {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl MessageHandler for FailingHandler {
    async fn handle_message(&self, _message: Message) -> Result<(), DeliveryError> {
        Err(DeliveryError::HandlerFailed(self.reason.clone()))
    }
}
