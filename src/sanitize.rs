// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Suppression of implausible counter jumps.
//!
//! The controller occasionally reports a spurious spike on its energy and
//! operating-hour counters. A counter that grew by more than
//! [`MAX_COUNTER_GROWTH`] since the previous poll keeps its previous value.

use crate::types::Sample;

/// Largest accepted ratio between a counter reading and its previous value.
pub const MAX_COUNTER_GROWTH: f64 = 1.1;

/// Replaces implausible counter readings with their previous values.
///
/// Each sample is matched against the first previous sample with the same
/// natural key. Gauges and unmatched samples pass through unchanged. The
/// ratio is taken as is, so a counter whose previous value was 0 keeps that
/// 0 once it reads anything positive. Output order equals input order.
///
/// # Examples
///
/// ```
/// use luxws::config::SampleConfig;
/// use luxws::sanitize::sanitize;
/// use luxws::types::{MetricType, Sample};
///
/// let config = SampleConfig::new("Info > Energy", "Heating")
///     .with_metric_type(MetricType::Counter);
///
/// let previous = vec![Sample::from_config(&config, 100.0)];
/// let current = vec![Sample::from_config(&config, 115.0)];
///
/// assert_eq!(sanitize(current, &previous)[0].value, 100.0);
/// ```
#[must_use]
pub fn sanitize(current: Vec<Sample>, previous: &[Sample]) -> Vec<Sample> {
    current
        .into_iter()
        .map(|mut sample| {
            let key = sample.key();
            let Some(last) = previous.iter().find(|last| last.key() == key) else {
                return sample;
            };

            if sample.metric_type.is_counter() && sample.value / last.value > MAX_COUNTER_GROWTH
            {
                tracing::warn!(
                    entity = %sample.entity_name,
                    sample = %sample.sample_name,
                    current = sample.value,
                    previous = last.value,
                    "Counter jumped implausibly, keeping previous value"
                );
                sample.value = last.value;
            }
            sample
        })
        .collect()
}
