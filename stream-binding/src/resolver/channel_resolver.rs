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

//! Binder-aware destination resolver.
//!
//! Resolution order for a name:
//!
//! 1. reject invalid names before any side effect
//! 2. return a statically registered channel as-is
//! 3. reject names outside the configured dynamic-destination allow-list
//! 4. return the cached channel, or create, bind, cache and register a new one
//!
//! Step 4 runs at most once per name even under concurrent resolution. A failed
//! bind caches nothing, so a later call may try again.

use crate::binder::{Binding, ProducerProperties};
use crate::binding_service::{BindingError, BindingService};
use crate::channel::DirectChannel;
use crate::lifecycle::DynamicDestinationsBindable;
use crate::observability::{events, fields};
use crate::resolver::channel_factory::SubscribableChannelFactory;
use crate::resolver::destination_cache::{CachedDestination, DestinationCache};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const COMPONENT: &str = "channel_resolver";

/// Hook invoked once for every newly created destination, before it is bound.
/// It may adjust the producer properties used for the bind.
pub type NewDestinationCallback =
    Arc<dyn Fn(&str, &Arc<DirectChannel>, &mut ProducerProperties) + Send + Sync>;

/// Failures raised by [`BinderAwareChannelResolver::resolve_destination`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolutionError {
    /// Empty, blank or otherwise malformed name. Nothing was created.
    InvalidDestination(String),
    /// The name is not on the configured dynamic-destination allow-list.
    DestinationNotAllowed(String),
    /// The producer bind failed. Nothing was cached; the caller may retry.
    BindingFailed {
        destination: String,
        source: BindingError,
    },
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::InvalidDestination(name) => {
                write!(f, "invalid destination name {name:?}")
            }
            ResolutionError::DestinationNotAllowed(name) => {
                write!(f, "destination '{name}' is not an allowed dynamic destination")
            }
            ResolutionError::BindingFailed {
                destination,
                source,
            } => write!(f, "failed to bind destination '{destination}': {source}"),
        }
    }
}

impl Error for ResolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResolutionError::BindingFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn validate_destination_name(name: &str) -> Result<(), ResolutionError> {
    if name.trim().is_empty() || name.chars().any(|c| c.is_ascii_control()) {
        return Err(ResolutionError::InvalidDestination(name.to_string()));
    }
    Ok(())
}

/// Resolves destination names to bound output channels.
pub struct BinderAwareChannelResolver {
    binding_service: Arc<BindingService>,
    channel_factory: SubscribableChannelFactory,
    dynamic_destinations: Arc<DynamicDestinationsBindable>,
    new_destination_callback: Option<NewDestinationCallback>,
    static_channels: RwLock<HashMap<String, Arc<DirectChannel>>>,
    cache: DestinationCache,
}

impl BinderAwareChannelResolver {
    pub fn new(
        binding_service: Arc<BindingService>,
        channel_factory: SubscribableChannelFactory,
        dynamic_destinations: Arc<DynamicDestinationsBindable>,
    ) -> Self {
        Self {
            binding_service,
            channel_factory,
            dynamic_destinations,
            new_destination_callback: None,
            static_channels: RwLock::new(HashMap::new()),
            cache: DestinationCache::new(),
        }
    }

    pub fn with_new_destination_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &Arc<DirectChannel>, &mut ProducerProperties) + Send + Sync + 'static,
    {
        self.new_destination_callback = Some(Arc::new(callback));
        self
    }

    /// Registers a channel that resolves to itself without any binding.
    pub async fn register_channel(&self, name: &str, channel: Arc<DirectChannel>) {
        self.static_channels
            .write()
            .await
            .insert(name.to_string(), channel);
    }

    /// Resolves `name` to a channel, binding a new producer on first use.
    ///
    /// Once the binder has returned a producer binding, it is tracked, registered
    /// for shutdown and cached without further suspension, so dropping this
    /// future cannot strand it. Dropping it while the binder itself is still
    /// binding leaves any partial transport state to the binder.
    pub async fn resolve_destination(
        &self,
        name: &str,
    ) -> Result<Arc<DirectChannel>, ResolutionError> {
        if let Err(err) = validate_destination_name(name) {
            warn!(
                event = events::RESOLVE_REJECTED,
                component = COMPONENT,
                destination = ?name,
                reason = fields::REASON_INVALID_DESTINATION,
                "rejected destination"
            );
            return Err(err);
        }

        debug!(
            event = events::RESOLVE_START,
            component = COMPONENT,
            destination = name,
            "resolving destination"
        );

        if let Some(channel) = self.static_channels.read().await.get(name) {
            debug!(
                event = events::RESOLVE_STATIC_CHANNEL,
                component = COMPONENT,
                destination = name,
                "resolved statically registered channel"
            );
            return Ok(channel.clone());
        }

        if !self
            .binding_service
            .properties()
            .is_dynamic_destination_allowed(name)
        {
            warn!(
                event = events::RESOLVE_REJECTED,
                component = COMPONENT,
                destination = name,
                reason = fields::REASON_NOT_ALLOWED,
                "rejected destination"
            );
            return Err(ResolutionError::DestinationNotAllowed(name.to_string()));
        }

        if let Some(cached) = self.cache.get(name).await {
            debug!(
                event = events::RESOLVE_CACHE_HIT,
                component = COMPONENT,
                destination = name,
                "resolved cached destination"
            );
            return Ok(cached.channel);
        }

        let cached = self
            .cache
            .get_or_try_insert_with(name, || self.bind_new_destination(name))
            .await
            .inspect_err(|err| {
                warn!(
                    event = events::RESOLVE_FAILED,
                    component = COMPONENT,
                    destination = name,
                    err = %err,
                    "unable to resolve destination"
                );
            })?;
        Ok(cached.channel)
    }

    async fn bind_new_destination(&self, name: &str) -> Result<CachedDestination, ResolutionError> {
        let channel = Arc::new(self.channel_factory.create_output(name));
        let mut properties = self.binding_service.properties().producer_properties(name);
        if let Some(callback) = self.new_destination_callback.as_ref() {
            callback(name, &channel, &mut properties);
        }

        let binding = self
            .binding_service
            .bind_producer_with(name, channel.clone(), properties)
            .await
            .map_err(|source| ResolutionError::BindingFailed {
                destination: name.to_string(),
                source,
            })?;

        self.dynamic_destinations.add_output(name, &channel).await;

        info!(
            event = events::RESOLVE_BIND_OK,
            component = COMPONENT,
            destination = name,
            content_type = channel.content_type().unwrap_or_default(),
            "bound new dynamic destination"
        );
        Ok(CachedDestination { channel, binding })
    }

    /// Producer binding created for `name`, if it has been resolved.
    pub async fn producer_binding(&self, name: &str) -> Option<Arc<dyn Binding>> {
        self.cache.get(name).await.map(|cached| cached.binding)
    }

    /// Names resolved dynamically so far, sorted. Static channels are not included.
    pub async fn resolved_destinations(&self) -> Vec<String> {
        self.cache.names().await
    }

    pub async fn resolved_count(&self) -> usize {
        self.cache.len().await
    }
}
