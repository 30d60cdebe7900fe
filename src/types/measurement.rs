// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Samples and measurements produced by a poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityType, MetricType, SampleType};
use crate::config::SampleConfig;

/// A single reading taken from the heat pump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sample {
    /// Kind of entity the sample belongs to.
    pub entity_type: EntityType,
    /// Name of the entity, e.g. the heat pump model.
    pub entity_name: String,
    /// Physical quantity being measured.
    pub sample_type: SampleType,
    /// Name of the sample, e.g. `Flow`.
    pub sample_name: String,
    /// How consecutive readings relate.
    pub metric_type: MetricType,
    /// The reading, after applying the configured multiplier.
    pub value: f64,
}

impl Sample {
    /// Creates a sample for `config` carrying `value`.
    #[must_use]
    pub fn from_config(config: &SampleConfig, value: f64) -> Self {
        Self {
            entity_type: config.entity_type,
            entity_name: config.entity_name.clone(),
            sample_type: config.sample_type,
            sample_name: config.sample_name.clone(),
            metric_type: config.metric_type,
            value,
        }
    }

    /// Returns the natural key used to match samples across polls.
    #[must_use]
    pub fn key(&self) -> SampleKey<'_> {
        SampleKey {
            entity_type: self.entity_type,
            entity_name: &self.entity_name,
            sample_type: self.sample_type,
            sample_name: &self.sample_name,
            metric_type: self.metric_type,
        }
    }
}

/// Identity of a sample across polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleKey<'a> {
    /// Kind of entity.
    pub entity_type: EntityType,
    /// Entity name.
    pub entity_name: &'a str,
    /// Sample type.
    pub sample_type: SampleType,
    /// Sample name.
    pub sample_name: &'a str,
    /// Metric type.
    pub metric_type: MetricType,
}

/// All samples read in one poll.
///
/// Field names serialize in `PascalCase` so that state files written by
/// earlier exporter versions can still be read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    /// Unique identifier of this measurement.
    pub id: String,
    /// Tag identifying the producer.
    pub source: String,
    /// Location of the heat pump.
    pub location: String,
    /// Samples in configuration order.
    pub samples: Vec<Sample>,
    /// When the poll started.
    pub measured_at_time: DateTime<Utc>,
}

impl Measurement {
    /// Creates an empty measurement with a fresh identifier.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        location: impl Into<String>,
        measured_at_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            location: location.into(),
            samples: Vec::new(),
            measured_at_time,
        }
    }
}
