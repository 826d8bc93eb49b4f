//! Binding handles and the subscription-backed implementation used by binders.

use crate::binder::BinderError;
use crate::channel::{DirectChannel, MessageHandler};
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "binding";

/// Role a local channel plays relative to its destination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BindingRole {
    Consumer,
    Producer,
}

impl Display for BindingRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingRole::Consumer => write!(f, "consumer"),
            BindingRole::Producer => write!(f, "producer"),
        }
    }
}

/// Handle to one active bind operation.
///
/// A binding starts bound and moves to unbound exactly once. Calling
/// [`Binding::unbind`] on an unbound binding succeeds without doing anything.
#[async_trait]
pub trait Binding: Send + Sync {
    /// Destination name this binding is attached to.
    fn name(&self) -> &str;

    fn role(&self) -> BindingRole;

    fn group(&self) -> Option<&str> {
        None
    }

    fn is_bound(&self) -> bool;

    async fn unbind(&self) -> Result<(), BinderError>;
}

/// A binding that owns one handler subscription on one channel.
pub struct SubscriptionBinding {
    name: String,
    group: Option<String>,
    role: BindingRole,
    channel: Arc<DirectChannel>,
    handler: Arc<dyn MessageHandler>,
    bound: AtomicBool,
}

impl SubscriptionBinding {
    /// `handler` must already be subscribed to `channel`.
    pub fn new(
        name: &str,
        group: Option<&str>,
        role: BindingRole,
        channel: Arc<DirectChannel>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            name: name.to_string(),
            group: group.map(str::to_string),
            role,
            channel,
            handler,
            bound: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Binding for SubscriptionBinding {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> BindingRole {
        self.role
    }

    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    async fn unbind(&self) -> Result<(), BinderError> {
        if !self.bound.swap(false, Ordering::AcqRel) {
            debug!(
                event = events::BINDING_UNBIND_NOOP,
                component = COMPONENT,
                destination = self.name.as_str(),
                role = %self.role,
                "binding already unbound"
            );
            return Ok(());
        }

        self.channel.unsubscribe(&self.handler).await;
        debug!(
            event = events::BINDING_UNBIND_OK,
            component = COMPONENT,
            destination = self.name.as_str(),
            role = %self.role,
            group = fields::format_group(self.group.as_deref()),
            channel = self.channel.name(),
            "binding unbound"
        );
        Ok(())
    }
}
