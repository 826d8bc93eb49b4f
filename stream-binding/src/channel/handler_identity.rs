//! Pointer identity for subscribed message handlers.

use crate::channel::MessageHandler;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Compares handlers by the address of their shared allocation, so the same
/// `Arc` subscribed twice is recognised while two equal-looking handlers are not.
#[derive(Clone)]
pub(crate) struct HandlerIdentityKey {
    handler: Arc<dyn MessageHandler>,
}

impl HandlerIdentityKey {
    pub(crate) fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self { handler }
    }

    pub(crate) fn handler(&self) -> Arc<dyn MessageHandler> {
        self.handler.clone()
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.handler) as *const ()
    }
}

impl PartialEq for HandlerIdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for HandlerIdentityKey {}

impl Debug for HandlerIdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerIdentityKey")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::HandlerIdentityKey;
    use crate::channel::{DeliveryError, MessageHandler};
    use crate::message::Message;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopHandler;

    #[async_trait]
    impl MessageHandler for NoopHandler {
        async fn handle_message(&self, _message: Message) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[test]
    fn handler_identity_uses_allocation_not_value() {
        let shared: Arc<dyn MessageHandler> = Arc::new(NoopHandler);
        let other: Arc<dyn MessageHandler> = Arc::new(NoopHandler);

        let key_a = HandlerIdentityKey::new(shared.clone());
        let key_b = HandlerIdentityKey::new(shared);
        let key_c = HandlerIdentityKey::new(other);

        assert_eq!(key_a, key_b);
        assert_ne!(key_a, key_c);
        assert_ne!(key_b, key_c);
    }
}
