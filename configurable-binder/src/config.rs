/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
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

use serde::{Deserialize, Serialize};
use std::path::Path;
use stream_binding::{BindingServiceProperties, ConfigError};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) binding_service: BindingServiceProperties,
    pub(crate) demo: DemoConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    pub(crate) destinations: Vec<String>,
    pub(crate) payload: String,
}

impl Config {
    pub(crate) fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            json5::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.binding_service.validate()?;
        if config.demo.destinations.is_empty() {
            return Err(ConfigError::Invalid {
                binding: "demo".to_string(),
                reason: "at least one destination is required".to_string(),
            });
        }
        Ok(config)
    }

    pub(crate) fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json5_str(&contents)
    }
}
