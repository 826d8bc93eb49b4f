//! Reference binder backed by in-process channels.
//!
//! Every destination name maps to one transport-side [`DirectChannel`], created
//! by whichever consumer or producer binds first. Consumer groups are ignored.

use crate::binder::binding::{Binding, BindingRole, SubscriptionBinding};
use crate::binder::properties::{ConsumerProperties, ProducerProperties};
use crate::binder::{Binder, BinderError, ForwardingHandler};
use crate::channel::{DirectChannel, MessageHandler};
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const COMPONENT: &str = "in_memory_binder";

#[derive(Default)]
pub struct InMemoryBinder {
    destinations: Mutex<HashMap<String, Arc<DirectChannel>>>,
}

impl InMemoryBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport-side channel for `name`, if any binding created it.
    pub async fn destination(&self, name: &str) -> Option<Arc<DirectChannel>> {
        self.destinations.lock().await.get(name).cloned()
    }

    pub async fn destination_count(&self) -> usize {
        self.destinations.lock().await.len()
    }

    async fn destination_or_create(&self, name: &str) -> Arc<DirectChannel> {
        let mut destinations = self.destinations.lock().await;
        if let Some(existing) = destinations.get(name) {
            debug!(
                event = events::BINDER_DESTINATION_REUSE,
                component = COMPONENT,
                destination = name,
                "reusing transport channel"
            );
            return existing.clone();
        }

        let created = Arc::new(DirectChannel::new(name));
        destinations.insert(name.to_string(), created.clone());
        debug!(
            event = events::BINDER_DESTINATION_CREATE,
            component = COMPONENT,
            destination = name,
            "created transport channel"
        );
        created
    }
}

fn validate_name(name: &str) -> Result<(), BinderError> {
    if name.trim().is_empty() {
        return Err(BinderError::InvalidArgument(
            "destination name must not be blank".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl Binder for InMemoryBinder {
    async fn bind_consumer(
        &self,
        name: &str,
        group: Option<&str>,
        input: Arc<DirectChannel>,
        _properties: &ConsumerProperties,
    ) -> Result<Arc<dyn Binding>, BinderError> {
        validate_name(name)?;

        let transport = self.destination_or_create(name).await;
        let handler: Arc<dyn MessageHandler> = Arc::new(ForwardingHandler::new(input.clone()));
        transport.subscribe(handler.clone()).await;

        debug!(
            event = events::BINDER_BIND_CONSUMER_OK,
            component = COMPONENT,
            destination = name,
            group = fields::format_group(group),
            channel = input.name(),
            "bound consumer"
        );

        Ok(Arc::new(SubscriptionBinding::new(
            name,
            group,
            BindingRole::Consumer,
            transport,
            handler,
        )))
    }

    async fn bind_producer(
        &self,
        name: &str,
        output: Arc<DirectChannel>,
        _properties: &ProducerProperties,
    ) -> Result<Arc<dyn Binding>, BinderError> {
        validate_name(name)?;

        let transport = self.destination_or_create(name).await;
        let handler: Arc<dyn MessageHandler> = Arc::new(ForwardingHandler::new(transport));
        output.subscribe(handler.clone()).await;

        debug!(
            event = events::BINDER_BIND_PRODUCER_OK,
            component = COMPONENT,
            destination = name,
            channel = output.name(),
            "bound producer"
        );

        Ok(Arc::new(SubscriptionBinding::new(
            name,
            None,
            BindingRole::Producer,
            output,
            handler,
        )))
    }
}
