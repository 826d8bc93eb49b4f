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

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stream_binding::{
    Binder, BinderError, Binding, ConsumerProperties, DirectChannel, InMemoryBinder,
    ProducerProperties,
};
use tokio::sync::Mutex;
use tracing::debug;

/// [`InMemoryBinder`] wrapper that records every binding it hands out.
///
/// Producer binds can be slowed down to widen race windows, or switched to
/// fail with [`BinderError::Unavailable`].
#[derive(Default)]
pub struct RecordingBinder {
    inner: InMemoryBinder,
    producer_bindings: Mutex<Vec<Arc<dyn Binding>>>,
    consumer_bindings: Mutex<Vec<Arc<dyn Binding>>>,
    producer_bind_calls: AtomicUsize,
    bind_delay: Option<Duration>,
    fail_producers: AtomicBool,
}

impl RecordingBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_delay(mut self, delay: Duration) -> Self {
        self.bind_delay = Some(delay);
        self
    }

    pub fn set_fail_producers(&self, fail: bool) {
        self.fail_producers.store(fail, Ordering::SeqCst);
    }

    /// Number of `bind_producer` calls, failed ones included.
    pub fn producer_bind_calls(&self) -> usize {
        self.producer_bind_calls.load(Ordering::SeqCst)
    }

    pub async fn producer_bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.producer_bindings.lock().await.clone()
    }

    pub async fn consumer_bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.consumer_bindings.lock().await.clone()
    }

    pub fn in_memory(&self) -> &InMemoryBinder {
        &self.inner
    }
}

#[async_trait]
impl Binder for RecordingBinder {
    async fn bind_consumer(
        &self,
        name: &str,
        group: Option<&str>,
        input: Arc<DirectChannel>,
        properties: &ConsumerProperties,
    ) -> Result<Arc<dyn Binding>, BinderError> {
        let binding = self
            .inner
            .bind_consumer(name, group, input, properties)
            .await?;
        self.consumer_bindings.lock().await.push(binding.clone());
        Ok(binding)
    }

    async fn bind_producer(
        &self,
        name: &str,
        output: Arc<DirectChannel>,
        properties: &ProducerProperties,
    ) -> Result<Arc<dyn Binding>, BinderError> {
        let call = self.producer_bind_calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("recording binder: bind_producer #{call} for {name}");

        if let Some(delay) = self.bind_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_producers.load(Ordering::SeqCst) {
            return Err(BinderError::Unavailable(format!(
                "producer binds to '{name}' are switched off"
            )));
        }

        let binding = self.inner.bind_producer(name, output, properties).await?;
        self.producer_bindings.lock().await.push(binding.clone());
        Ok(binding)
    }
}
