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

mod integration_test_handlers;
pub use integration_test_handlers::{CollectingHandler, FailingHandler};
mod recording_binder;
pub use recording_binder::RecordingBinder;
mod integration_test_utils;
pub use integration_test_utils::{init_logging, wiring, Wiring, DELIVERY_TIMEOUT};
