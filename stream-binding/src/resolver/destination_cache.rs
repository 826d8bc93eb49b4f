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

//! Destination cache with at-most-one initialisation per name.
//!
//! The map lock is held only long enough to fetch or insert the per-name cell.
//! Initialisation runs inside the cell, so concurrent callers for one name wait
//! on that name alone while other names proceed. A cell whose initialiser failed
//! is removed from the map once no other caller holds it, so failures on many
//! distinct names leave nothing behind.

use crate::binder::Binding;
use crate::channel::DirectChannel;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

#[derive(Clone)]
pub(crate) struct CachedDestination {
    pub(crate) channel: Arc<DirectChannel>,
    pub(crate) binding: Arc<dyn Binding>,
}

pub(crate) struct DestinationCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<CachedDestination>>>>,
}

impl DestinationCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the initialised entry for `name`, if any.
    pub(crate) async fn get(&self, name: &str) -> Option<CachedDestination> {
        let entries = self.entries.lock().await;
        entries.get(name).and_then(|cell| cell.get().cloned())
    }

    /// Returns the entry for `name`, running `init` only if no entry exists yet.
    ///
    /// `init` runs at most once concurrently per name. If it fails, nothing is
    /// stored and the error is returned to this caller.
    pub(crate) async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        name: &str,
        init: F,
    ) -> Result<CachedDestination, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedDestination, E>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_try_init(init).await.cloned();
        if result.is_err() {
            self.forget_if_unused(name, cell).await;
        }
        result
    }

    /// Removes the failed `cell` unless another caller still holds it. Callers
    /// only clone cells under the map lock, and `cell` is released before the
    /// lock is, so the last failing holder always sees a count of two.
    async fn forget_if_unused(&self, name: &str, cell: Arc<OnceCell<CachedDestination>>) {
        let mut entries = self.entries.lock().await;
        let unused = entries.get(name).is_some_and(|current| {
            Arc::ptr_eq(current, &cell) && Arc::strong_count(&cell) == 2 && !cell.initialized()
        });
        drop(cell);
        if unused {
            entries.remove(name);
        }
    }

    pub(crate) async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    /// Names with an initialised entry, sorted.
    pub(crate) async fn names(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
