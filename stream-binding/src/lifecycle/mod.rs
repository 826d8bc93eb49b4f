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

//! Shutdown-scoped unbinding.
//!
//! A [`Bindable`] names the binding targets it owns. [`BindingLifecycle`]
//! collects bindables and, when stopped, asks the [`BindingService`] to unbind
//! every input and then every output. A failure on one binding name is logged
//! and reported but does not stop the remaining names from being unbound.

mod binding_lifecycle;
mod dynamic_destinations;

pub use binding_lifecycle::BindingLifecycle;
pub use dynamic_destinations::DynamicDestinationsBindable;

use crate::binder::BindingRole;
use crate::binding_service::{BindingError, BindingService};
use async_trait::async_trait;
use std::fmt::{Display, Formatter};

/// One binding name that could not be unbound.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnbindFailure {
    pub binding_name: String,
    pub role: BindingRole,
    pub error: BindingError,
}

impl Display for UnbindFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unable to unbind {} '{}': {}",
            self.role, self.binding_name, self.error
        )
    }
}

/// Owner of named binding targets whose bindings are released on shutdown.
#[async_trait]
pub trait Bindable: Send + Sync {
    async fn input_names(&self) -> Vec<String> {
        Vec::new()
    }

    async fn output_names(&self) -> Vec<String> {
        Vec::new()
    }

    async fn unbind_inputs(&self, binding_service: &BindingService) -> Vec<UnbindFailure> {
        let names = self.input_names().await;
        unbind_names(binding_service, BindingRole::Consumer, names).await
    }

    async fn unbind_outputs(&self, binding_service: &BindingService) -> Vec<UnbindFailure> {
        let names = self.output_names().await;
        unbind_names(binding_service, BindingRole::Producer, names).await
    }
}

/// Unbinds `names` in order, collecting the names that failed.
pub(crate) async fn unbind_names(
    binding_service: &BindingService,
    role: BindingRole,
    names: Vec<String>,
) -> Vec<UnbindFailure> {
    let mut failures = Vec::new();
    for name in names {
        let result = match role {
            BindingRole::Consumer => binding_service.unbind_consumers(&name).await,
            BindingRole::Producer => binding_service.unbind_producers(&name).await,
        };
        if let Err(error) = result {
            failures.push(UnbindFailure {
                binding_name: name,
                role,
                error,
            });
        }
    }
    failures
}

/// Fixed set of input and output binding names.
#[derive(Clone, Debug, Default)]
pub struct BindingTargets {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl BindingTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: &str) -> Self {
        self.inputs.push(name.to_string());
        self
    }

    pub fn with_output(mut self, name: &str) -> Self {
        self.outputs.push(name.to_string());
        self
    }
}

#[async_trait]
impl Bindable for BindingTargets {
    async fn input_names(&self) -> Vec<String> {
        self.inputs.clone()
    }

    async fn output_names(&self) -> Vec<String> {
        self.outputs.clone()
    }
}
