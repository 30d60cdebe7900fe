// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data model for heat pump readings.
//!
//! # Types
//!
//! - [`Sample`] - One reading with its classification
//! - [`SampleKey`] - Natural key matching a sample across polls
//! - [`Measurement`] - All samples of one poll
//! - [`EntityType`], [`SampleType`], [`MetricType`] - Classification enums

mod measurement;
mod metric;

pub use measurement::{Measurement, Sample, SampleKey};
pub use metric::{EntityType, MetricType, SampleType};
