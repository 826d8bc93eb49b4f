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

//! Binding service layer.
//!
//! Picks the binder for a binding name, merges configured and binder-supplied
//! properties, delegates bind/unbind calls, and keeps track of the bindings it
//! issued so they can be released by name. It owns no channels.

pub(crate) mod config;

pub use config::{BindingProperties, BindingServiceProperties, ConfigError, DEFAULT_CONTENT_TYPE};

use crate::binder::{Binder, BinderError, BinderFactory, Binding, ProducerProperties};
use crate::channel::DirectChannel;
use crate::observability::{events, fields};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "binding_service";

/// Failures raised by [`BindingService`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindingError {
    /// No binder is registered under the configured (or default) name.
    BinderNotFound(String),
    InvalidProperties(String),
    Binder(BinderError),
    /// Unbind was requested for a name with no tracked binding.
    NotBound(String),
}

impl Display for BindingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingError::BinderNotFound(binder) => write!(f, "no binder found for '{binder}'"),
            BindingError::InvalidProperties(reason) => {
                write!(f, "invalid binding properties: {reason}")
            }
            BindingError::Binder(err) => write!(f, "binder failed: {err}"),
            BindingError::NotBound(name) => write!(f, "no binding found for '{name}'"),
        }
    }
}

impl Error for BindingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BindingError::Binder(err) => Some(err),
            _ => None,
        }
    }
}

/// Binds channels through the configured binders and tracks what it bound.
///
/// Tracking maps are only locked between awaits, so a producer binding returned
/// by a binder is recorded in the same poll that receives it. Dropping a bind
/// future after the binder has answered does not lose the binding.
pub struct BindingService {
    properties: BindingServiceProperties,
    binder_factory: Arc<dyn BinderFactory>,
    producer_bindings: Mutex<HashMap<String, Vec<Arc<dyn Binding>>>>,
    consumer_bindings: Mutex<HashMap<String, Vec<Arc<dyn Binding>>>>,
}

impl BindingService {
    pub fn new(
        properties: BindingServiceProperties,
        binder_factory: Arc<dyn BinderFactory>,
    ) -> Self {
        Self {
            properties,
            binder_factory,
            producer_bindings: Mutex::new(HashMap::new()),
            consumer_bindings: Mutex::new(HashMap::new()),
        }
    }

    pub fn properties(&self) -> &BindingServiceProperties {
        &self.properties
    }

    fn binder_for(&self, name: &str) -> Result<Arc<dyn Binder>, BindingError> {
        let binder_name = self.properties.binder_name(name);
        self.binder_factory.get_binder(binder_name).ok_or_else(|| {
            BindingError::BinderNotFound(fields::format_binder(binder_name).to_string())
        })
    }

    /// Binds `output` as the producer for binding `name` using configured properties.
    pub async fn bind_producer(
        &self,
        name: &str,
        output: Arc<DirectChannel>,
    ) -> Result<Arc<dyn Binding>, BindingError> {
        let properties = self.properties.producer_properties(name);
        self.bind_producer_with(name, output, properties).await
    }

    /// Binds `output` as a producer for binding `name` using caller supplied properties.
    ///
    /// Every producer bound under `name` is tracked; [`Self::unbind_producers`]
    /// releases all of them.
    pub async fn bind_producer_with(
        &self,
        name: &str,
        output: Arc<DirectChannel>,
        mut properties: ProducerProperties,
    ) -> Result<Arc<dyn Binding>, BindingError> {
        let binder = self.binder_for(name)?;
        properties.merge_extension_defaults(&binder.extended_producer_properties(name).extension);
        properties
            .validate()
            .map_err(|e| BindingError::InvalidProperties(e.to_string()))?;

        let destination = self.properties.binding_destination(name);
        let binder_name = fields::format_binder(self.properties.binder_name(name));
        debug!(
            event = events::BINDING_SERVICE_BIND_START,
            component = COMPONENT,
            binding_name = name,
            destination,
            role = "producer",
            binder = binder_name,
            "binding producer"
        );

        let binding = match binder.bind_producer(destination, output, &properties).await {
            Ok(binding) => binding,
            Err(err) => {
                warn!(
                    event = events::BINDING_SERVICE_BIND_FAILED,
                    component = COMPONENT,
                    binding_name = name,
                    destination,
                    role = "producer",
                    binder = binder_name,
                    err = %err,
                    "unable to bind producer"
                );
                return Err(BindingError::Binder(err));
            }
        };

        let producers = {
            let mut producer_bindings = self.producer_bindings.lock();
            let tracked = producer_bindings.entry(name.to_string()).or_default();
            tracked.push(binding.clone());
            tracked.len()
        };
        debug!(
            event = events::BINDING_SERVICE_BIND_OK,
            component = COMPONENT,
            binding_name = name,
            destination,
            role = "producer",
            binder = binder_name,
            producers,
            "bound producer"
        );
        Ok(binding)
    }

    /// Binds `input` as a consumer for binding `name`.
    ///
    /// The configured destination may list several comma separated destinations;
    /// one binding is created per destination. If any bind fails, bindings already
    /// created by this call are released before the error is returned.
    pub async fn bind_consumer(
        &self,
        name: &str,
        input: Arc<DirectChannel>,
    ) -> Result<Vec<Arc<dyn Binding>>, BindingError> {
        let binder = self.binder_for(name)?;
        let mut properties = self.properties.consumer_properties(name);
        properties.merge_extension_defaults(&binder.extended_consumer_properties(name).extension);
        properties
            .validate()
            .map_err(|e| BindingError::InvalidProperties(e.to_string()))?;

        let group = self.properties.group(name);
        let destinations: Vec<&str> = self
            .properties
            .binding_destination(name)
            .split(',')
            .map(str::trim)
            .filter(|destination| !destination.is_empty())
            .collect();
        if destinations.is_empty() {
            return Err(BindingError::InvalidProperties(format!(
                "binding '{name}' has no destination"
            )));
        }

        let mut created: Vec<Arc<dyn Binding>> = Vec::with_capacity(destinations.len());
        for destination in destinations {
            debug!(
                event = events::BINDING_SERVICE_BIND_START,
                component = COMPONENT,
                binding_name = name,
                destination,
                role = "consumer",
                group = fields::format_group(group),
                "binding consumer"
            );

            match binder
                .bind_consumer(destination, group, input.clone(), &properties)
                .await
            {
                Ok(binding) => created.push(binding),
                Err(err) => {
                    warn!(
                        event = events::BINDING_SERVICE_BIND_FAILED,
                        component = COMPONENT,
                        binding_name = name,
                        destination,
                        role = "consumer",
                        group = fields::format_group(group),
                        err = %err,
                        "unable to bind consumer"
                    );
                    rollback_bindings(name, &created).await;
                    return Err(BindingError::Binder(err));
                }
            }
        }

        debug!(
            event = events::BINDING_SERVICE_BIND_OK,
            component = COMPONENT,
            binding_name = name,
            role = "consumer",
            group = fields::format_group(group),
            "bound consumer"
        );

        self.consumer_bindings
            .lock()
            .entry(name.to_string())
            .or_default()
            .extend(created.iter().cloned());
        Ok(created)
    }

    /// Releases every producer binding tracked for `name`. All bindings are
    /// attempted; the first failure is returned.
    pub async fn unbind_producers(&self, name: &str) -> Result<(), BindingError> {
        let removed = self.producer_bindings.lock().remove(name);
        let Some(bindings) = removed else {
            warn!(
                event = events::BINDING_SERVICE_UNBIND_MISSING,
                component = COMPONENT,
                binding_name = name,
                role = "producer",
                "trying to unbind a producer with no tracked binding"
            );
            return Err(BindingError::NotBound(name.to_string()));
        };

        unbind_all(name, bindings).await
    }

    /// Releases every consumer binding tracked for `name`. All bindings are
    /// attempted; the first failure is returned.
    pub async fn unbind_consumers(&self, name: &str) -> Result<(), BindingError> {
        let removed = self.consumer_bindings.lock().remove(name);
        let Some(bindings) = removed else {
            warn!(
                event = events::BINDING_SERVICE_UNBIND_MISSING,
                component = COMPONENT,
                binding_name = name,
                role = "consumer",
                "trying to unbind a consumer with no tracked binding"
            );
            return Err(BindingError::NotBound(name.to_string()));
        };

        unbind_all(name, bindings).await
    }

    pub async fn producer_bindings(&self, name: &str) -> Vec<Arc<dyn Binding>> {
        self.producer_bindings
            .lock()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn consumer_bindings(&self, name: &str) -> Vec<Arc<dyn Binding>> {
        self.consumer_bindings
            .lock()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

async fn unbind_logged(name: &str, binding: &dyn Binding) -> Result<(), BindingError> {
    match binding.unbind().await {
        Ok(()) => {
            debug!(
                event = events::BINDING_SERVICE_UNBIND_OK,
                component = COMPONENT,
                binding_name = name,
                destination = binding.name(),
                role = %binding.role(),
                "unbound binding"
            );
            Ok(())
        }
        Err(err) => {
            warn!(
                event = events::BINDING_SERVICE_UNBIND_FAILED,
                component = COMPONENT,
                binding_name = name,
                destination = binding.name(),
                role = %binding.role(),
                err = %err,
                "unable to unbind binding"
            );
            Err(BindingError::Binder(err))
        }
    }
}

async fn unbind_all(name: &str, bindings: Vec<Arc<dyn Binding>>) -> Result<(), BindingError> {
    let mut first_error = None;
    for binding in bindings {
        if let Err(err) = unbind_logged(name, binding.as_ref()).await {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

async fn rollback_bindings(name: &str, created: &[Arc<dyn Binding>]) {
    for binding in created {
        // Failures are already logged by unbind_logged.
        let _ = unbind_logged(name, binding.as_ref()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingError, BindingProperties, BindingService, BindingServiceProperties};
    use crate::binder::{
        Binder, BinderError, Binding, BindingRole, ConsumerProperties, DefaultBinderFactory,
        InMemoryBinder, ProducerProperties,
    };
    use crate::channel::DirectChannel;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex as StdMutex};

    /// Records the destinations and properties the service hands to the binder.
    struct RecordingBinder {
        inner: InMemoryBinder,
        fail_on: Option<String>,
        producer_calls: StdMutex<Vec<(String, ProducerProperties)>>,
        consumer_calls: StdMutex<Vec<(String, Option<String>)>>,
    }

    impl RecordingBinder {
        fn new() -> Self {
            Self {
                inner: InMemoryBinder::new(),
                fail_on: None,
                producer_calls: StdMutex::new(Vec::new()),
                consumer_calls: StdMutex::new(Vec::new()),
            }
        }

        fn failing_on(destination: &str) -> Self {
            Self {
                fail_on: Some(destination.to_string()),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Binder for RecordingBinder {
        async fn bind_consumer(
            &self,
            name: &str,
            group: Option<&str>,
            input: Arc<DirectChannel>,
            properties: &ConsumerProperties,
        ) -> Result<Arc<dyn Binding>, BinderError> {
            self.consumer_calls
                .lock()
                .expect("lock consumer_calls")
                .push((name.to_string(), group.map(str::to_string)));
            if self.fail_on.as_deref() == Some(name) {
                return Err(BinderError::Unavailable(name.to_string()));
            }
            self.inner
                .bind_consumer(name, group, input, properties)
                .await
        }

        async fn bind_producer(
            &self,
            name: &str,
            output: Arc<DirectChannel>,
            properties: &ProducerProperties,
        ) -> Result<Arc<dyn Binding>, BinderError> {
            self.producer_calls
                .lock()
                .expect("lock producer_calls")
                .push((name.to_string(), properties.clone()));
            if self.fail_on.as_deref() == Some(name) {
                return Err(BinderError::Unavailable(name.to_string()));
            }
            self.inner.bind_producer(name, output, properties).await
        }

        fn extended_producer_properties(&self, _channel_name: &str) -> ProducerProperties {
            let mut extension = Map::new();
            extension.insert("acks".to_string(), Value::from("all"));
            extension.insert("linger_ms".to_string(), json!(100));
            ProducerProperties {
                extension,
                ..Default::default()
            }
        }
    }

    fn service_with(
        properties: BindingServiceProperties,
        binder: Arc<RecordingBinder>,
    ) -> BindingService {
        let factory = DefaultBinderFactory::new().with_binder("memory", binder);
        BindingService::new(properties, Arc::new(factory))
    }

    #[tokio::test]
    async fn bind_producer_uses_configured_destination_and_merged_extension() {
        let mut producer = ProducerProperties::default();
        producer.extension.insert("linger_ms".to_string(), json!(5));
        let properties = BindingServiceProperties::default().with_binding(
            "output",
            BindingProperties {
                destination: Some("orders".to_string()),
                producer: Some(producer),
                ..Default::default()
            },
        );
        let binder = Arc::new(RecordingBinder::new());
        let service = service_with(properties, binder.clone());

        let binding = service
            .bind_producer("output", Arc::new(DirectChannel::new("output")))
            .await
            .expect("producer binds");

        assert_eq!(binding.name(), "orders");
        assert_eq!(binding.role(), BindingRole::Producer);
        let calls = binder.producer_calls.lock().expect("lock producer_calls");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "orders");
        assert_eq!(calls[0].1.extension.get("linger_ms"), Some(&json!(5)));
        assert_eq!(calls[0].1.extension.get("acks"), Some(&Value::from("all")));
    }

    #[tokio::test]
    async fn bind_producer_without_binder_fails() {
        let properties = BindingServiceProperties {
            default_binder: Some("kafka".to_string()),
            ..Default::default()
        };
        let service = service_with(properties, Arc::new(RecordingBinder::new()));

        let result = service
            .bind_producer("output", Arc::new(DirectChannel::new("output")))
            .await;

        assert_eq!(
            result.err(),
            Some(BindingError::BinderNotFound("kafka".to_string()))
        );
    }

    #[tokio::test]
    async fn binder_failure_is_wrapped_and_not_tracked() {
        let binder = Arc::new(RecordingBinder::failing_on("output"));
        let service = service_with(BindingServiceProperties::default(), binder);

        let result = service
            .bind_producer("output", Arc::new(DirectChannel::new("output")))
            .await;

        assert!(matches!(
            result,
            Err(BindingError::Binder(BinderError::Unavailable(_)))
        ));
        assert!(service.producer_bindings("output").await.is_empty());
    }

    #[tokio::test]
    async fn unbind_producers_releases_tracked_binding_once() {
        let service = service_with(
            BindingServiceProperties::default(),
            Arc::new(RecordingBinder::new()),
        );
        let binding = service
            .bind_producer("output", Arc::new(DirectChannel::new("output")))
            .await
            .expect("producer binds");

        service
            .unbind_producers("output")
            .await
            .expect("unbind succeeds");
        assert!(!binding.is_bound());

        assert_eq!(
            service.unbind_producers("output").await,
            Err(BindingError::NotBound("output".to_string()))
        );
    }

    #[tokio::test]
    async fn unbind_producers_releases_every_producer_bound_under_a_name() {
        let service = service_with(
            BindingServiceProperties::default(),
            Arc::new(RecordingBinder::new()),
        );
        let first = service
            .bind_producer("output", Arc::new(DirectChannel::new("output")))
            .await
            .expect("first producer binds");
        let second = service
            .bind_producer("output", Arc::new(DirectChannel::new("output")))
            .await
            .expect("second producer binds");

        assert_eq!(service.producer_bindings("output").await.len(), 2);

        service
            .unbind_producers("output")
            .await
            .expect("unbind succeeds");
        assert!(!first.is_bound());
        assert!(!second.is_bound());
        assert!(service.producer_bindings("output").await.is_empty());
    }

    #[tokio::test]
    async fn bind_consumer_binds_each_listed_destination_with_group() {
        let properties = BindingServiceProperties::default().with_binding(
            "input",
            BindingProperties {
                destination: Some("orders, refunds".to_string()),
                group: Some("billing".to_string()),
                ..Default::default()
            },
        );
        let binder = Arc::new(RecordingBinder::new());
        let service = service_with(properties, binder.clone());

        let bindings = service
            .bind_consumer("input", Arc::new(DirectChannel::new("input")))
            .await
            .expect("consumers bind");

        assert_eq!(bindings.len(), 2);
        assert_eq!(service.consumer_bindings("input").await.len(), 2);
        let calls = binder.consumer_calls.lock().expect("lock consumer_calls").clone();
        assert_eq!(
            calls,
            vec![
                ("orders".to_string(), Some("billing".to_string())),
                ("refunds".to_string(), Some("billing".to_string())),
            ]
        );

        service
            .unbind_consumers("input")
            .await
            .expect("unbind succeeds");
        assert!(bindings.iter().all(|binding| !binding.is_bound()));
    }

    #[tokio::test]
    async fn bind_consumer_rolls_back_on_partial_failure() {
        let properties = BindingServiceProperties::default().with_binding(
            "input",
            BindingProperties {
                destination: Some("orders,refunds".to_string()),
                ..Default::default()
            },
        );
        let binder = Arc::new(RecordingBinder::failing_on("refunds"));
        let service = service_with(properties, binder.clone());

        let result = service
            .bind_consumer("input", Arc::new(DirectChannel::new("input")))
            .await;

        assert!(result.is_err());
        assert!(service.consumer_bindings("input").await.is_empty());
        let orders = binder
            .inner
            .destination("orders")
            .await
            .expect("orders transport channel");
        assert_eq!(orders.subscriber_count().await, 0);
    }
}
