use std::sync::Arc;
use stream_binding::{BindingService, DirectChannel};

/// Binds a fresh input channel as a consumer of binding `name` and returns it.
pub(crate) async fn bind_input(binding_service: &BindingService, name: &str) -> Arc<DirectChannel> {
    let input = Arc::new(DirectChannel::new(&format!("{name}-input")));
    binding_service
        .bind_consumer(name, input.clone())
        .await
        .expect("consumer binding should succeed");
    input
}
