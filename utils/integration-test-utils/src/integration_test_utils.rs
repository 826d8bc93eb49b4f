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

use crate::RecordingBinder;
use std::sync::Arc;
use std::time::Duration;
use stream_binding::{
    BinderAwareChannelResolver, BindingLifecycle, BindingService, BindingServiceProperties,
    DefaultBinderFactory, DynamicDestinationsBindable, SubscribableChannelFactory,
};

/// Upper bound for a message to travel through in-memory bindings in tests.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Installs a fmt subscriber once per test binary. Later calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fully wired resolver stack around one [`RecordingBinder`].
pub struct Wiring {
    pub binder: Arc<RecordingBinder>,
    pub binding_service: Arc<BindingService>,
    pub registry: Arc<DynamicDestinationsBindable>,
    pub resolver: Arc<BinderAwareChannelResolver>,
    pub lifecycle: BindingLifecycle,
}

/// Wires `binder` as the only binder behind a binding service, resolver and
/// started lifecycle.
pub async fn wiring(properties: BindingServiceProperties, binder: RecordingBinder) -> Wiring {
    let binder = Arc::new(binder);
    let factory = DefaultBinderFactory::new().with_binder("recording", binder.clone());
    let binding_service = Arc::new(BindingService::new(properties, Arc::new(factory)));
    let registry = Arc::new(DynamicDestinationsBindable::new());
    let resolver = Arc::new(BinderAwareChannelResolver::new(
        binding_service.clone(),
        SubscribableChannelFactory::new(binding_service.clone()),
        registry.clone(),
    ));

    let lifecycle = BindingLifecycle::new(binding_service.clone());
    lifecycle.add_bindable(registry.clone()).await;
    lifecycle.start().await;

    Wiring {
        binder,
        binding_service,
        registry,
        resolver,
        lifecycle,
    }
}
