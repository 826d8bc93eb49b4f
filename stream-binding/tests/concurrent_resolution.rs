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

mod support;

use futures::future::join_all;
use integration_test_utils::{
    init_logging, wiring, CollectingHandler, RecordingBinder, DELIVERY_TIMEOUT,
};
use std::sync::Arc;
use std::time::Duration;
use stream_binding::{Binding, BindingServiceProperties, MessageBuilder, ResolutionError};

const RESOLVERS: usize = 16;
const BIND_DELAY: Duration = Duration::from_millis(50);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_resolutions_bind_once() {
    init_logging();

    let wiring = wiring(
        BindingServiceProperties::default(),
        RecordingBinder::new().with_bind_delay(BIND_DELAY),
    )
    .await;

    let tasks = (0..RESOLVERS).map(|_| {
        let resolver = wiring.resolver.clone();
        tokio::spawn(async move { resolver.resolve_destination("foo").await })
    });
    let channels: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| {
            joined
                .expect("task should complete")
                .expect("resolution should succeed")
        })
        .collect();

    assert_eq!(channels.len(), RESOLVERS);
    assert!(channels
        .iter()
        .all(|channel| Arc::ptr_eq(channel, &channels[0])));
    assert_eq!(wiring.binder.producer_bind_calls(), 1);
    assert_eq!(wiring.binder.producer_bindings().await.len(), 1);
    assert_eq!(wiring.resolver.resolved_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_names_resolve_independently() {
    init_logging();

    let wiring = wiring(
        BindingServiceProperties::default(),
        RecordingBinder::new().with_bind_delay(BIND_DELAY),
    )
    .await;

    let names: Vec<String> = (0..8).map(|index| format!("dest-{index}")).collect();
    let tasks = names.iter().cloned().map(|name| {
        let resolver = wiring.resolver.clone();
        tokio::spawn(async move { resolver.resolve_destination(&name).await })
    });
    for joined in join_all(tasks).await {
        joined
            .expect("task should complete")
            .expect("resolution should succeed");
    }

    assert_eq!(wiring.binder.producer_bind_calls(), names.len());
    assert_eq!(wiring.resolver.resolved_destinations().await, names);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_leave_no_entry() {
    init_logging();

    let wiring = wiring(BindingServiceProperties::default(), RecordingBinder::new()).await;
    wiring.binder.set_fail_producers(true);

    let tasks = (0..4).map(|_| {
        let resolver = wiring.resolver.clone();
        tokio::spawn(async move { resolver.resolve_destination("flaky").await })
    });
    for joined in join_all(tasks).await {
        let result = joined.expect("task should complete");
        assert!(matches!(
            result,
            Err(ResolutionError::BindingFailed { .. })
        ));
    }
    assert!(wiring.resolver.resolved_destinations().await.is_empty());
    assert!(wiring.binder.producer_bindings().await.is_empty());

    wiring.binder.set_fail_producers(false);
    wiring
        .resolver
        .resolve_destination("flaky")
        .await
        .expect("retry should succeed");
    assert_eq!(wiring.binder.producer_bindings().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn consumer_and_producer_racing_on_fresh_name_share_one_transport_channel() {
    init_logging();

    let wiring = wiring(BindingServiceProperties::default(), RecordingBinder::new()).await;

    let resolver = wiring.resolver.clone();
    let producer = tokio::spawn(async move { resolver.resolve_destination("race").await });
    let consumer = support::bind_input(&wiring.binding_service, "race");
    let (producer, input) = tokio::join!(producer, consumer);
    let output = producer
        .expect("task should complete")
        .expect("resolution should succeed");

    assert_eq!(wiring.binder.in_memory().destination_count().await, 1);

    let collecting = Arc::new(CollectingHandler::new());
    input.subscribe(collecting.clone()).await;
    output
        .send(MessageBuilder::with_payload("raced").build())
        .await
        .expect("send should succeed");
    let received = collecting.wait_for_messages(1, DELIVERY_TIMEOUT).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].payload().as_ref(), b"raced");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_resolution_leaves_nothing_bound_after_shutdown() {
    init_logging();

    let wiring = wiring(
        BindingServiceProperties::default(),
        RecordingBinder::new().with_bind_delay(BIND_DELAY),
    )
    .await;

    let cancelled = tokio::time::timeout(
        BIND_DELAY / 5,
        wiring.resolver.resolve_destination("slow"),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(wiring.resolver.resolved_count().await, 0);

    wiring
        .resolver
        .resolve_destination("slow")
        .await
        .expect("resolution after cancellation should succeed");
    assert_eq!(wiring.binder.producer_bind_calls(), 2);
    assert_eq!(wiring.binding_service.producer_bindings("slow").await.len(), 1);

    assert!(wiring.lifecycle.stop().await.is_empty());
    let bindings = wiring.binder.producer_bindings().await;
    assert_eq!(bindings.len(), 1);
    assert!(bindings.iter().all(|binding| !binding.is_bound()));
}
