// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sample configuration.
//!
//! The configuration lists which menu items to read and how to label the
//! resulting samples. It is usually loaded from a YAML file:
//!
//! ```yaml
//! location: My home
//! sampleConfigs:
//!   - entityType: ENTITY_TYPE_DEVICE
//!     entityName: Alpha Innotec SWCV 92K3
//!     sampleType: SAMPLE_TYPE_TEMPERATURE
//!     sampleName: Flow
//!     metricType: METRIC_TYPE_GAUGE
//!     valueMultiplier: 1.0
//!     navigation: Informatie > Temperaturen
//!     item: Aanvoer
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{EntityType, MetricType, SampleType};

/// Configuration for one poll: where the heat pump is and what to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Location recorded on every measurement.
    pub location: String,
    /// Samples to read, in output order.
    #[serde(default)]
    pub sample_configs: Vec<SampleConfig>,
}

impl Config {
    /// Reads and validates a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid YAML,
    /// or fails validation.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::from_yaml(&contents)?;
        tracing::info!(
            path = %path.display(),
            samples = config.sample_configs.len(),
            "Loaded sample configuration"
        );
        Ok(config)
    }

    /// Parses and validates a YAML configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.set_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Fills in defaults for omitted optional values.
    pub fn set_defaults(&mut self) {
        for sample_config in &mut self.sample_configs {
            sample_config.set_defaults();
        }
    }

    /// Checks that every sample configuration can be resolved.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, sample_config) in self.sample_configs.iter().enumerate() {
            if sample_config.navigation.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "sample config {index} ({}) has an empty navigation path",
                    sample_config.sample_name
                )));
            }
            if sample_config.item.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "sample config {index} ({}) has an empty item name",
                    sample_config.sample_name
                )));
            }
        }
        Ok(())
    }
}

/// Describes one value to read from the heat pump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleConfig {
    /// Kind of entity the sample belongs to.
    #[serde(default)]
    pub entity_type: EntityType,
    /// Name of the entity.
    #[serde(default)]
    pub entity_name: String,
    /// Physical quantity being measured.
    #[serde(default)]
    pub sample_type: SampleType,
    /// Name of the sample.
    #[serde(default)]
    pub sample_name: String,
    /// How consecutive readings relate.
    #[serde(default)]
    pub metric_type: MetricType,

    /// Factor applied to the extracted value. Zero means "not set" and is
    /// replaced by `1.0`.
    #[serde(default)]
    pub value_multiplier: f64,
    /// Menu path of the page holding the item, segments joined by `" > "`.
    #[serde(alias = "navigationPath")]
    pub navigation: String,
    /// Name of the item on that page.
    pub item: String,
}

impl SampleConfig {
    /// Creates a gauge configuration reading `item` from the page at `navigation`.
    #[must_use]
    pub fn new(navigation: impl Into<String>, item: impl Into<String>) -> Self {
        let item = item.into();
        Self {
            entity_type: EntityType::Device,
            entity_name: String::new(),
            sample_type: SampleType::Invalid,
            sample_name: item.clone(),
            metric_type: MetricType::Gauge,
            value_multiplier: 1.0,
            navigation: navigation.into(),
            item,
        }
    }

    /// Sets the entity type and name.
    #[must_use]
    pub fn with_entity(mut self, entity_type: EntityType, entity_name: impl Into<String>) -> Self {
        self.entity_type = entity_type;
        self.entity_name = entity_name.into();
        self
    }

    /// Sets the sample type and name.
    #[must_use]
    pub fn with_sample(mut self, sample_type: SampleType, sample_name: impl Into<String>) -> Self {
        self.sample_type = sample_type;
        self.sample_name = sample_name.into();
        self
    }

    /// Sets the metric type.
    #[must_use]
    pub fn with_metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    /// Sets the value multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, value_multiplier: f64) -> Self {
        self.value_multiplier = value_multiplier;
        self
    }

    /// Replaces an unset multiplier with `1.0`.
    #[allow(clippy::float_cmp)]
    pub fn set_defaults(&mut self) {
        if self.value_multiplier == 0.0 {
            self.value_multiplier = 1.0;
        }
    }
}
