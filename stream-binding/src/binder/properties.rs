//! Common consumer/producer properties handed to binders.
//!
//! Transport specific settings travel in the opaque `extension` map; this crate
//! never interprets them.

use crate::binder::BinderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ConsumerProperties {
    pub concurrency: u32,
    pub partitioned: bool,
    pub max_attempts: u32,
    pub back_off_initial_interval_ms: u64,
    pub back_off_max_interval_ms: u64,
    pub back_off_multiplier: f64,
    pub use_native_decoding: bool,
    pub extension: Map<String, Value>,
}

impl Default for ConsumerProperties {
    fn default() -> Self {
        Self {
            concurrency: 1,
            partitioned: false,
            max_attempts: 3,
            back_off_initial_interval_ms: 1000,
            back_off_max_interval_ms: 10000,
            back_off_multiplier: 2.0,
            use_native_decoding: false,
            extension: Map::new(),
        }
    }
}

impl ConsumerProperties {
    pub fn validate(&self) -> Result<(), BinderError> {
        if self.concurrency < 1 {
            return Err(BinderError::InvalidArgument(
                "consumer concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_attempts < 1 {
            return Err(BinderError::InvalidArgument(
                "consumer max_attempts must be at least 1".to_string(),
            ));
        }
        if self.back_off_initial_interval_ms > self.back_off_max_interval_ms {
            return Err(BinderError::InvalidArgument(
                "consumer back_off_initial_interval_ms exceeds back_off_max_interval_ms"
                    .to_string(),
            ));
        }
        if self.back_off_multiplier.is_nan() || self.back_off_multiplier < 1.0 {
            return Err(BinderError::InvalidArgument(
                "consumer back_off_multiplier must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Fills extension keys missing here from `defaults`.
    pub fn merge_extension_defaults(&mut self, defaults: &Map<String, Value>) {
        merge_missing(&mut self.extension, defaults);
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ProducerProperties {
    pub partition_count: u32,
    pub required_groups: Vec<String>,
    pub use_native_encoding: bool,
    pub error_channel_enabled: bool,
    pub extension: Map<String, Value>,
}

impl Default for ProducerProperties {
    fn default() -> Self {
        Self {
            partition_count: 1,
            required_groups: Vec::new(),
            use_native_encoding: false,
            error_channel_enabled: false,
            extension: Map::new(),
        }
    }
}

impl ProducerProperties {
    pub fn validate(&self) -> Result<(), BinderError> {
        if self.partition_count < 1 {
            return Err(BinderError::InvalidArgument(
                "producer partition_count must be at least 1".to_string(),
            ));
        }
        if self.required_groups.iter().any(|group| group.trim().is_empty()) {
            return Err(BinderError::InvalidArgument(
                "producer required_groups must not contain blank names".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_partitioned(&self) -> bool {
        self.partition_count > 1
    }

    /// Fills extension keys missing here from `defaults`.
    pub fn merge_extension_defaults(&mut self, defaults: &Map<String, Value>) {
        merge_missing(&mut self.extension, defaults);
    }
}

fn merge_missing(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, value) in defaults {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsumerProperties, ProducerProperties};
    use serde_json::{json, Map, Value};

    #[test]
    fn defaults_are_valid() {
        assert!(ConsumerProperties::default().validate().is_ok());
        assert!(ProducerProperties::default().validate().is_ok());
        assert!(!ProducerProperties::default().is_partitioned());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let consumer = ConsumerProperties {
            concurrency: 0,
            ..Default::default()
        };
        assert!(consumer.validate().is_err());

        let consumer = ConsumerProperties {
            back_off_multiplier: 0.5,
            ..Default::default()
        };
        assert!(consumer.validate().is_err());

        let producer = ProducerProperties {
            partition_count: 0,
            ..Default::default()
        };
        assert!(producer.validate().is_err());

        let producer = ProducerProperties {
            required_groups: vec![" ".to_string()],
            ..Default::default()
        };
        assert!(producer.validate().is_err());
    }

    #[test]
    fn extension_defaults_do_not_override_configured_keys() {
        let mut producer = ProducerProperties::default();
        producer
            .extension
            .insert("linger_ms".to_string(), json!(5));

        let mut defaults = Map::new();
        defaults.insert("linger_ms".to_string(), json!(100));
        defaults.insert("compression".to_string(), Value::from("none"));
        producer.merge_extension_defaults(&defaults);

        assert_eq!(producer.extension.get("linger_ms"), Some(&json!(5)));
        assert_eq!(
            producer.extension.get("compression"),
            Some(&Value::from("none"))
        );
    }

    #[test]
    fn partial_json_uses_field_defaults() {
        let consumer: ConsumerProperties =
            serde_json::from_str(r#"{ "concurrency": 4 }"#).expect("valid consumer properties");

        assert_eq!(consumer.concurrency, 4);
        assert_eq!(consumer.max_attempts, 3);
        assert!(serde_json::from_str::<ConsumerProperties>(r#"{ "bogus": 1 }"#).is_err());
    }
}
