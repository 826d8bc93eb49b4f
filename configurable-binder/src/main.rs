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

mod config;

use crate::config::Config;
use async_trait::async_trait;
use clap::Parser;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stream_binding::{
    BinderAwareChannelResolver, BindingLifecycle, BindingService, BindingTargets,
    DefaultBinderFactory, DeliveryError, DynamicDestinationsBindable, InMemoryBinder, Message,
    MessageBuilder, MessageHandler, SubscribableChannelFactory,
};
use tracing::{info, warn};

const IN_MEMORY_BINDER: &str = "memory";

#[derive(Parser)]
#[command()]
struct BinderArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

/// Logs every message delivered to a demo input.
struct LoggingHandler {
    binding_name: String,
    received: AtomicUsize,
}

#[async_trait]
impl MessageHandler for LoggingHandler {
    async fn handle_message(&self, message: Message) -> Result<(), DeliveryError> {
        self.received.fetch_add(1, Ordering::Relaxed);
        info!(
            binding_name = self.binding_name.as_str(),
            msg_id = %message.id(),
            content_type = message.content_type().unwrap_or("none"),
            payload = %String::from_utf8_lossy(message.payload()),
            "received message"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started configurable-binder");

    let args = BinderArgs::parse();
    let config = Config::from_file(&args.config)?;

    let binder_factory = DefaultBinderFactory::new()
        .with_binder(IN_MEMORY_BINDER, Arc::new(InMemoryBinder::new()))
        .with_default_binder(IN_MEMORY_BINDER);
    let binding_service = Arc::new(BindingService::new(
        config.binding_service.clone(),
        Arc::new(binder_factory),
    ));
    let channel_factory = SubscribableChannelFactory::new(binding_service.clone());
    let registry = Arc::new(DynamicDestinationsBindable::new());
    let resolver = BinderAwareChannelResolver::new(
        binding_service.clone(),
        SubscribableChannelFactory::new(binding_service.clone()),
        registry.clone(),
    )
    .with_new_destination_callback(|name, channel, _properties| {
        info!(
            binding_name = name,
            channel = channel.name(),
            "creating dynamic destination"
        );
    });

    let mut targets = BindingTargets::new();
    let mut handlers = Vec::new();
    for name in &config.demo.destinations {
        let input = Arc::new(channel_factory.create_input(name));
        let handler = Arc::new(LoggingHandler {
            binding_name: name.clone(),
            received: AtomicUsize::new(0),
        });
        input.subscribe(handler.clone()).await;
        binding_service.bind_consumer(name, input).await?;
        targets = targets.with_input(name);
        handlers.push(handler);
    }

    let lifecycle = BindingLifecycle::new(binding_service.clone());
    lifecycle.add_bindable(Arc::new(targets)).await;
    lifecycle.add_bindable(registry).await;
    lifecycle.start().await;

    for name in &config.demo.destinations {
        let output = resolver.resolve_destination(name).await?;
        let message = MessageBuilder::with_payload(config.demo.payload.clone()).build();
        if let Err(err) = output.send(message).await {
            warn!(binding_name = name.as_str(), err = %err, "unable to publish");
        }
    }

    let failures = lifecycle.stop().await;
    for handler in &handlers {
        info!(
            binding_name = handler.binding_name.as_str(),
            received = handler.received.load(Ordering::Relaxed),
            "demo destination summary"
        );
    }
    info!(
        resolved = resolver.resolved_destinations().await.len(),
        unbind_failures = failures.len(),
        "configurable-binder finished"
    );

    Ok(())
}
