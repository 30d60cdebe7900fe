// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification enums attached to every sample.
//!
//! The serialized names match the measurement contract shared with the
//! downstream warehouse loader, so configuration files and state files use
//! the same spelling (e.g. `METRIC_TYPE_COUNTER`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of entity a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    /// Unset entity type.
    #[default]
    #[serde(rename = "")]
    Invalid,
    /// An energy tariff.
    #[serde(rename = "ENTITY_TYPE_TARIFF")]
    Tariff,
    /// A heating zone.
    #[serde(rename = "ENTITY_TYPE_ZONE")]
    Zone,
    /// A physical device, such as the heat pump itself.
    #[serde(rename = "ENTITY_TYPE_DEVICE")]
    Device,
}

/// The physical quantity a sample measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleType {
    /// Unset sample type.
    #[default]
    #[serde(rename = "")]
    Invalid,
    /// Consumed electrical energy.
    #[serde(rename = "SAMPLE_TYPE_ELECTRICITY_CONSUMPTION")]
    ElectricityConsumption,
    /// Produced electrical energy.
    #[serde(rename = "SAMPLE_TYPE_ELECTRICITY_PRODUCTION")]
    ElectricityProduction,
    /// Consumed gas.
    #[serde(rename = "SAMPLE_TYPE_GAS_CONSUMPTION")]
    GasConsumption,
    /// Temperature.
    #[serde(rename = "SAMPLE_TYPE_TEMPERATURE")]
    Temperature,
    /// Pressure.
    #[serde(rename = "SAMPLE_TYPE_PRESSURE")]
    Pressure,
    /// Volumetric flow.
    #[serde(rename = "SAMPLE_TYPE_FLOW")]
    Flow,
    /// Relative humidity.
    #[serde(rename = "SAMPLE_TYPE_HUMIDITY")]
    Humidity,
    /// A duration, such as operating hours.
    #[serde(rename = "SAMPLE_TYPE_TIME")]
    Time,
}

/// How consecutive readings of a sample relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MetricType {
    /// Unset metric type.
    #[default]
    #[serde(rename = "")]
    Invalid,
    /// A monotonically increasing total, such as an energy meter.
    #[serde(rename = "METRIC_TYPE_COUNTER")]
    Counter,
    /// A value that can go up and down, such as a temperature.
    #[serde(rename = "METRIC_TYPE_GAUGE")]
    Gauge,
}

impl MetricType {
    /// Returns true for metrics expected never to decrease between polls.
    #[must_use]
    pub const fn is_counter(&self) -> bool {
        matches!(self, Self::Counter)
    }

    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "",
            Self::Counter => "METRIC_TYPE_COUNTER",
            Self::Gauge => "METRIC_TYPE_GAUGE",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
