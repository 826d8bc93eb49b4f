//! Canonical structured event names used across `stream-binding`.

// Channel dispatch events.
pub const CHANNEL_SUBSCRIBE: &str = "channel_subscribe";
pub const CHANNEL_UNSUBSCRIBE: &str = "channel_unsubscribe";
pub const CHANNEL_DISPATCH_FAILED: &str = "channel_dispatch_failed";
pub const CHANNEL_NO_SUBSCRIBERS: &str = "channel_no_subscribers";

// Binder events.
pub const BINDER_DESTINATION_CREATE: &str = "binder_destination_create";
pub const BINDER_DESTINATION_REUSE: &str = "binder_destination_reuse";
pub const BINDER_BIND_CONSUMER_OK: &str = "binder_bind_consumer_ok";
pub const BINDER_BIND_PRODUCER_OK: &str = "binder_bind_producer_ok";
pub const BINDING_UNBIND_OK: &str = "binding_unbind_ok";
pub const BINDING_UNBIND_NOOP: &str = "binding_unbind_noop";

// Binding service events.
pub const BINDING_SERVICE_BIND_START: &str = "binding_service_bind_start";
pub const BINDING_SERVICE_BIND_OK: &str = "binding_service_bind_ok";
pub const BINDING_SERVICE_BIND_FAILED: &str = "binding_service_bind_failed";
pub const BINDING_SERVICE_UNBIND_OK: &str = "binding_service_unbind_ok";
pub const BINDING_SERVICE_UNBIND_FAILED: &str = "binding_service_unbind_failed";
pub const BINDING_SERVICE_UNBIND_MISSING: &str = "binding_service_unbind_missing";

// Resolver events.
pub const RESOLVE_START: &str = "resolve_start";
pub const RESOLVE_CACHE_HIT: &str = "resolve_cache_hit";
pub const RESOLVE_STATIC_CHANNEL: &str = "resolve_static_channel";
pub const RESOLVE_BIND_OK: &str = "resolve_bind_ok";
pub const RESOLVE_REJECTED: &str = "resolve_rejected";
pub const RESOLVE_FAILED: &str = "resolve_failed";

// Lifecycle events.
pub const LIFECYCLE_START: &str = "lifecycle_start";
pub const LIFECYCLE_STOP_START: &str = "lifecycle_stop_start";
pub const LIFECYCLE_STOP_OK: &str = "lifecycle_stop_ok";
pub const LIFECYCLE_UNBIND_FAILED: &str = "lifecycle_unbind_failed";
pub const LIFECYCLE_OUTPUT_REGISTERED: &str = "lifecycle_output_registered";
