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

//! # stream-binding
//!
//! `stream-binding` resolves symbolic destination names to live, bound
//! in-process channels. The first resolution of a name creates a local output
//! channel, binds it as a producer through a pluggable [`Binder`], caches the
//! result and registers the channel for shutdown. Later resolutions return the
//! cached channel. Concurrent first resolutions of one name bind exactly once.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use stream_binding::{
//!     BinderAwareChannelResolver, Binding, BindingLifecycle, BindingService,
//!     BindingServiceProperties, DefaultBinderFactory, DynamicDestinationsBindable, InMemoryBinder,
//!     MessageBuilder, SubscribableChannelFactory,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let binder = Arc::new(InMemoryBinder::new());
//! let factory = DefaultBinderFactory::new().with_binder("memory", binder.clone());
//! let service = Arc::new(BindingService::new(
//!     BindingServiceProperties::default(),
//!     Arc::new(factory),
//! ));
//! let registry = Arc::new(DynamicDestinationsBindable::new());
//! let resolver = BinderAwareChannelResolver::new(
//!     service.clone(),
//!     SubscribableChannelFactory::new(service.clone()),
//!     registry.clone(),
//! );
//! let lifecycle = BindingLifecycle::new(service.clone());
//! lifecycle.add_bindable(registry).await;
//! lifecycle.start().await;
//!
//! let orders = resolver.resolve_destination("orders").await.unwrap();
//! let again = resolver.resolve_destination("orders").await.unwrap();
//! assert!(Arc::ptr_eq(&orders, &again));
//!
//! // Nobody consumes "orders" yet, so the transport channel has no subscribers.
//! assert!(orders.send(MessageBuilder::with_payload("hello").build()).await.is_err());
//!
//! assert!(lifecycle.stop().await.is_empty());
//! let binding = resolver.producer_binding("orders").await.unwrap();
//! assert!(!binding.is_bound());
//! # });
//! ```
//!
//! ## Layers
//!
//! - Channel: [`DirectChannel`], [`MessageHandler`], [`Message`]
//! - Binder: the [`Binder`]/[`Binding`] contract and the [`InMemoryBinder`]
//! - Binding service: binder selection, properties, tracked bindings
//! - Resolver: [`BinderAwareChannelResolver`] and its destination cache
//! - Lifecycle: [`BindingLifecycle`] unbinding every [`Bindable`] on stop
//!
//! ## Observability model
//!
//! Components emit `tracing` events and never install a global subscriber.
//! Binaries and tests initialise `tracing_subscriber` once at process start.

mod binder;
mod binding_service;
mod channel;
mod lifecycle;
mod message;
mod resolver;

#[doc(hidden)]
pub mod observability;

pub use binder::{
    Binder, BinderError, BinderFactory, Binding, BindingRole, ConsumerProperties,
    DefaultBinderFactory, ForwardingHandler, InMemoryBinder, ProducerProperties,
    SubscriptionBinding,
};
pub use binding_service::{
    BindingError, BindingProperties, BindingService, BindingServiceProperties, ConfigError,
    DEFAULT_CONTENT_TYPE,
};
pub use channel::{DeliveryError, DirectChannel, MessageHandler};
pub use lifecycle::{
    Bindable, BindingLifecycle, BindingTargets, DynamicDestinationsBindable, UnbindFailure,
};
pub use message::{Message, MessageBuilder, CONTENT_TYPE_HEADER};
pub use resolver::{
    BinderAwareChannelResolver, NewDestinationCallback, ResolutionError,
    SubscribableChannelFactory,
};
