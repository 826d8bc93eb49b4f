//! Registry of outputs created by the resolver.

use crate::binder::BindingRole;
use crate::binding_service::BindingService;
use crate::channel::DirectChannel;
use crate::lifecycle::{unbind_names, Bindable, UnbindFailure};
use crate::observability::events;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

const COMPONENT: &str = "dynamic_destinations";

/// Tracks dynamically created output channels so their producer bindings can
/// be released on shutdown. Channels are held weakly; the resolver owns them.
///
/// Registration never suspends, so a resolver that has bound a producer also
/// registers it before it can be cancelled.
#[derive(Default)]
pub struct DynamicDestinationsBindable {
    outputs: Mutex<HashMap<String, Weak<DirectChannel>>>,
}

impl DynamicDestinationsBindable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_output(&self, name: &str, channel: &Arc<DirectChannel>) {
        let mut outputs = self.outputs.lock();
        outputs.insert(name.to_string(), Arc::downgrade(channel));
        debug!(
            event = events::LIFECYCLE_OUTPUT_REGISTERED,
            component = COMPONENT,
            binding_name = name,
            outputs = outputs.len(),
            "registered dynamic output"
        );
    }

    /// The registered channel for `name`, if it is still alive.
    pub async fn output(&self, name: &str) -> Option<Arc<DirectChannel>> {
        self.outputs.lock().get(name).and_then(Weak::upgrade)
    }
}

#[async_trait]
impl Bindable for DynamicDestinationsBindable {
    async fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.outputs.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Unbinds every registered output and forgets it, so a later shutdown
    /// does not try again.
    async fn unbind_outputs(&self, binding_service: &BindingService) -> Vec<UnbindFailure> {
        let drained: Vec<String> = {
            let mut outputs = self.outputs.lock();
            let mut names: Vec<String> = outputs.drain().map(|(name, _)| name).collect();
            names.sort();
            names
        };

        unbind_names(binding_service, BindingRole::Producer, drained).await
    }
}
