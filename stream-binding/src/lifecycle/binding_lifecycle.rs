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

use crate::binding_service::BindingService;
use crate::lifecycle::{Bindable, UnbindFailure};
use crate::observability::events;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const COMPONENT: &str = "binding_lifecycle";

/// Start/stop driver for a set of [`Bindable`]s.
///
/// A new lifecycle is stopped. [`BindingLifecycle::stop`] only unbinds after
/// [`BindingLifecycle::start`]; stopping a stopped lifecycle does nothing.
pub struct BindingLifecycle {
    binding_service: Arc<BindingService>,
    bindables: Mutex<Vec<Arc<dyn Bindable>>>,
    running: AtomicBool,
}

impl BindingLifecycle {
    pub fn new(binding_service: Arc<BindingService>) -> Self {
        Self {
            binding_service,
            bindables: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    pub async fn add_bindable(&self, bindable: Arc<dyn Bindable>) {
        self.bindables.lock().await.push(bindable);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let bindables = self.bindables.lock().await.len();
        info!(
            event = events::LIFECYCLE_START,
            component = COMPONENT,
            bindables,
            "binding lifecycle started"
        );
    }

    /// Unbinds every input, then every output, of every registered bindable.
    ///
    /// Returns the binding names that failed to unbind; each failure has already
    /// been logged.
    pub async fn stop(&self) -> Vec<UnbindFailure> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Vec::new();
        }

        let bindables: Vec<Arc<dyn Bindable>> = self.bindables.lock().await.clone();
        debug!(
            event = events::LIFECYCLE_STOP_START,
            component = COMPONENT,
            bindables = bindables.len(),
            "stopping binding lifecycle"
        );

        let mut failures = Vec::new();
        for bindable in &bindables {
            failures.extend(bindable.unbind_inputs(&self.binding_service).await);
        }
        for bindable in &bindables {
            failures.extend(bindable.unbind_outputs(&self.binding_service).await);
        }

        for failure in &failures {
            warn!(
                event = events::LIFECYCLE_UNBIND_FAILED,
                component = COMPONENT,
                binding_name = failure.binding_name.as_str(),
                role = %failure.role,
                err = %failure.error,
                "unable to unbind during shutdown"
            );
        }

        info!(
            event = events::LIFECYCLE_STOP_OK,
            component = COMPONENT,
            failures = failures.len(),
            "binding lifecycle stopped"
        );
        failures
    }
}
