//! Shared helpers for entidx benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use entidx_testkit::{stationed_sensor, Sensor};
use std::sync::Arc;

/// Builds `n` sensors with distinct, shuffle-resistant names.
///
/// Names are zero-padded so key order matches numeric order.
#[must_use]
pub fn sensor_population(n: usize) -> Vec<Arc<Sensor>> {
    (0..n)
        .map(|i| stationed_sensor(&format!("sensor-{i:06}"), "north", i as i64))
        .collect()
}
