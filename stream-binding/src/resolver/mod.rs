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

//! Destination name resolution with lazy producer binding.

mod channel_factory;
mod channel_resolver;
mod destination_cache;

pub use channel_factory::SubscribableChannelFactory;
pub use channel_resolver::{BinderAwareChannelResolver, NewDestinationCallback, ResolutionError};
