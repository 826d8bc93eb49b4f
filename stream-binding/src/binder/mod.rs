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

//! Binder contract.
//!
//! A [`Binder`] adapts one transport. Given a destination name and a local
//! channel it attaches the channel to the transport side of that destination and
//! returns a [`Binding`] that can later be released.
//!
//! ```
//! use std::sync::Arc;
//! use stream_binding::{
//!     Binder, Binding, ConsumerProperties, DirectChannel, InMemoryBinder, ProducerProperties,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let binder = InMemoryBinder::new();
//! let output = Arc::new(DirectChannel::new("orders-out"));
//! let input = Arc::new(DirectChannel::new("orders-in"));
//!
//! let producer = binder
//!     .bind_producer("orders", output, &ProducerProperties::default())
//!     .await
//!     .unwrap();
//! let consumer = binder
//!     .bind_consumer("orders", None, input, &ConsumerProperties::default())
//!     .await
//!     .unwrap();
//!
//! // Both sides share one transport channel.
//! assert_eq!(binder.destination_count().await, 1);
//!
//! producer.unbind().await.unwrap();
//! consumer.unbind().await.unwrap();
//! assert!(!producer.is_bound());
//! # });
//! ```

pub(crate) mod binding;
pub(crate) mod in_memory;
pub(crate) mod properties;

pub use binding::{Binding, BindingRole, SubscriptionBinding};
pub use in_memory::InMemoryBinder;
pub use properties::{ConsumerProperties, ProducerProperties};

use crate::channel::{DeliveryError, DirectChannel, MessageHandler};
use crate::message::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Failures reported by a binder or one of its bindings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BinderError {
    /// The transport cannot be reached right now; a later attempt may succeed.
    Unavailable(String),
    InvalidArgument(String),
    Internal(String),
}

impl Display for BinderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BinderError::Unavailable(reason) => write!(f, "transport unavailable: {reason}"),
            BinderError::InvalidArgument(reason) => write!(f, "invalid argument: {reason}"),
            BinderError::Internal(reason) => write!(f, "internal binder error: {reason}"),
        }
    }
}

impl Error for BinderError {}

/// Transport adapter producing [`Binding`]s for named destinations.
///
/// Implementations must be safe to call concurrently for the same destination:
/// any transport-side state created on first use has to be created exactly once.
#[async_trait]
pub trait Binder: Send + Sync {
    /// Attaches `input` as a consumer of destination `name`. Binders that do not
    /// support consumer groups ignore `group`.
    async fn bind_consumer(
        &self,
        name: &str,
        group: Option<&str>,
        input: Arc<DirectChannel>,
        properties: &ConsumerProperties,
    ) -> Result<Arc<dyn Binding>, BinderError>;

    /// Attaches destination `name` so that messages sent on `output` reach it.
    async fn bind_producer(
        &self,
        name: &str,
        output: Arc<DirectChannel>,
        properties: &ProducerProperties,
    ) -> Result<Arc<dyn Binding>, BinderError>;

    fn extended_consumer_properties(&self, _channel_name: &str) -> ConsumerProperties {
        ConsumerProperties::default()
    }

    fn extended_producer_properties(&self, _channel_name: &str) -> ProducerProperties {
        ProducerProperties::default()
    }
}

/// Looks up binders by configuration name.
pub trait BinderFactory: Send + Sync {
    /// `None` asks for the default binder.
    fn get_binder(&self, configuration_name: Option<&str>) -> Option<Arc<dyn Binder>>;
}

/// Name-keyed binder table with an optional explicit default.
///
/// When no default is configured and exactly one binder is registered, that
/// binder serves as the default.
#[derive(Default)]
pub struct DefaultBinderFactory {
    binders: HashMap<String, Arc<dyn Binder>>,
    default_binder: Option<String>,
}

impl DefaultBinderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binder(mut self, name: &str, binder: Arc<dyn Binder>) -> Self {
        self.binders.insert(name.to_string(), binder);
        self
    }

    pub fn with_default_binder(mut self, name: &str) -> Self {
        self.default_binder = Some(name.to_string());
        self
    }
}

impl BinderFactory for DefaultBinderFactory {
    fn get_binder(&self, configuration_name: Option<&str>) -> Option<Arc<dyn Binder>> {
        match configuration_name.or(self.default_binder.as_deref()) {
            Some(name) => self.binders.get(name).cloned(),
            None if self.binders.len() == 1 => self.binders.values().next().cloned(),
            None => None,
        }
    }
}

/// Handler that re-sends every message it receives on another channel.
pub struct ForwardingHandler {
    target: Arc<DirectChannel>,
}

impl ForwardingHandler {
    pub fn new(target: Arc<DirectChannel>) -> Self {
        Self { target }
    }
}

#[async_trait]
impl MessageHandler for ForwardingHandler {
    async fn handle_message(&self, message: Message) -> Result<(), DeliveryError> {
        self.target.send(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Binder, BinderError, BinderFactory, DefaultBinderFactory, ForwardingHandler,
        InMemoryBinder,
    };
    use crate::channel::{DeliveryError, DirectChannel, MessageHandler};
    use crate::message::MessageBuilder;
    use std::error::Error;
    use std::sync::Arc;

    #[test]
    fn factory_prefers_explicit_name_then_default() {
        let memory: Arc<dyn Binder> = Arc::new(InMemoryBinder::new());
        let audit: Arc<dyn Binder> = Arc::new(InMemoryBinder::new());
        let factory = DefaultBinderFactory::new()
            .with_binder("memory", memory.clone())
            .with_binder("audit", audit.clone())
            .with_default_binder("memory");

        let selected = factory.get_binder(Some("audit")).expect("audit binder");
        assert!(Arc::ptr_eq(&selected, &audit));

        let selected = factory.get_binder(None).expect("default binder");
        assert!(Arc::ptr_eq(&selected, &memory));

        assert!(factory.get_binder(Some("kafka")).is_none());
    }

    #[test]
    fn factory_uses_single_binder_without_explicit_default() {
        let only: Arc<dyn Binder> = Arc::new(InMemoryBinder::new());
        let factory = DefaultBinderFactory::new().with_binder("memory", only.clone());

        let selected = factory.get_binder(None).expect("sole binder");
        assert!(Arc::ptr_eq(&selected, &only));

        let ambiguous = DefaultBinderFactory::new()
            .with_binder("a", Arc::new(InMemoryBinder::new()))
            .with_binder("b", Arc::new(InMemoryBinder::new()));
        assert!(ambiguous.get_binder(None).is_none());
    }

    #[tokio::test]
    async fn forwarding_handler_surfaces_target_errors() {
        let target = Arc::new(DirectChannel::new("target"));
        let handler = ForwardingHandler::new(target);

        let result = handler
            .handle_message(MessageBuilder::with_payload("x").build())
            .await;

        assert_eq!(
            result,
            Err(DeliveryError::NoSubscribers("target".to_string()))
        );
    }

    #[test]
    fn binder_error_display_is_stable() {
        let error = BinderError::Unavailable("broker down".to_string());

        assert_eq!(error.to_string(), "transport unavailable: broker down");
        assert!(error.source().is_none());
    }
}
