//! Binding configuration, loaded from json5.

use crate::binder::{ConsumerProperties, ProducerProperties};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Content type used when a binding does not configure one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Failures while loading or validating binding configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid { binding: String, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "unable to read binding configuration: {err}"),
            ConfigError::Parse(reason) => {
                write!(f, "unable to parse binding configuration: {reason}")
            }
            ConfigError::Invalid { binding, reason } => {
                write!(f, "invalid configuration for binding '{binding}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Per-binding settings. Every field is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BindingProperties {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub binder: Option<String>,
    #[serde(default)]
    pub consumer: Option<ConsumerProperties>,
    #[serde(default)]
    pub producer: Option<ProducerProperties>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BindingServiceProperties {
    #[serde(default)]
    pub default_binder: Option<String>,
    /// When non-empty, only these names may be resolved dynamically.
    #[serde(default)]
    pub dynamic_destinations: Vec<String>,
    #[serde(default)]
    pub bindings: HashMap<String, BindingProperties>,
}

impl BindingServiceProperties {
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        let properties: Self =
            json5::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        properties.validate()?;
        Ok(properties)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json5_str(&contents)
    }

    pub fn with_binding(mut self, name: &str, binding: BindingProperties) -> Self {
        self.bindings.insert(name.to_string(), binding);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, binding) in &self.bindings {
            let invalid = |reason: String| ConfigError::Invalid {
                binding: name.clone(),
                reason,
            };

            if let Some(destination) = binding.destination.as_deref() {
                if destination.trim().is_empty() {
                    return Err(invalid("destination must not be blank".to_string()));
                }
            }
            if let Some(consumer) = binding.consumer.as_ref() {
                consumer.validate().map_err(|e| invalid(e.to_string()))?;
            }
            if let Some(producer) = binding.producer.as_ref() {
                producer.validate().map_err(|e| invalid(e.to_string()))?;
            }
        }
        Ok(())
    }

    pub fn binding_properties(&self, name: &str) -> Option<&BindingProperties> {
        self.bindings.get(name)
    }

    /// Configured destination for `name`, or `name` itself.
    pub fn binding_destination<'a>(&'a self, name: &'a str) -> &'a str {
        self.bindings
            .get(name)
            .and_then(|binding| binding.destination.as_deref())
            .unwrap_or(name)
    }

    pub fn group(&self, name: &str) -> Option<&str> {
        self.bindings
            .get(name)
            .and_then(|binding| binding.group.as_deref())
    }

    pub fn content_type(&self, name: &str) -> &str {
        self.bindings
            .get(name)
            .and_then(|binding| binding.content_type.as_deref())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Binder configured for `name`, falling back to `default_binder`.
    pub fn binder_name(&self, name: &str) -> Option<&str> {
        self.bindings
            .get(name)
            .and_then(|binding| binding.binder.as_deref())
            .or(self.default_binder.as_deref())
    }

    pub fn consumer_properties(&self, name: &str) -> ConsumerProperties {
        self.bindings
            .get(name)
            .and_then(|binding| binding.consumer.clone())
            .unwrap_or_default()
    }

    pub fn producer_properties(&self, name: &str) -> ProducerProperties {
        self.bindings
            .get(name)
            .and_then(|binding| binding.producer.clone())
            .unwrap_or_default()
    }

    /// `true` when no allow-list is configured or `name` is on it.
    pub fn is_dynamic_destination_allowed(&self, name: &str) -> bool {
        self.dynamic_destinations.is_empty()
            || self
                .dynamic_destinations
                .iter()
                .any(|allowed| allowed == name)
    }
}
