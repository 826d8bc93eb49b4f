//! Creates local channels for binding targets.

use crate::binding_service::BindingService;
use crate::channel::DirectChannel;
use std::sync::Arc;

/// Builds [`DirectChannel`]s that carry the content type configured for their binding name.
pub struct SubscribableChannelFactory {
    binding_service: Arc<BindingService>,
}

impl SubscribableChannelFactory {
    pub fn new(binding_service: Arc<BindingService>) -> Self {
        Self { binding_service }
    }

    pub fn create_output(&self, name: &str) -> DirectChannel {
        self.create(name)
    }

    pub fn create_input(&self, name: &str) -> DirectChannel {
        self.create(name)
    }

    fn create(&self, name: &str) -> DirectChannel {
        let content_type = self.binding_service.properties().content_type(name);
        DirectChannel::new(name).with_content_type(content_type)
    }
}
