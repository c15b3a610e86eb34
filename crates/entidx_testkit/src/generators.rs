//! Property-based test generators using proptest.
//!
//! Strategies produce random entities and key material while maintaining
//! the invariants the fixtures rely on (non-empty names, bounded key
//! alphabets so collisions actually happen).

use crate::fixtures::{Sensor, SensorId};
use proptest::prelude::*;
use std::sync::Arc;

/// Strategy for generating short index keys.
///
/// The alphabet is small on purpose: runs of adds should collide on keys
/// often enough to exercise retargeting.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e][0-9]{0,2}").expect("valid regex")
}

/// Strategy for generating an optional key, `None` about one time in five.
pub fn optional_key_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::weighted(0.8, key_strategy())
}

/// Strategy for generating station names.
pub fn station_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "north".to_string(),
        "south".to_string(),
        "east".to_string(),
        "west".to_string(),
    ])
}

/// Strategy for generating elevations.
pub fn elevation_strategy() -> impl Strategy<Value = i64> {
    -100i64..4000
}

/// Strategy for generating sensor ids.
pub fn sensor_id_strategy() -> impl Strategy<Value = SensorId> {
    prop::array::uniform16(any::<u8>()).prop_map(SensorId::from_bytes)
}

/// Strategy for generating a fully-keyed sensor.
pub fn sensor_strategy() -> impl Strategy<Value = Arc<Sensor>> {
    (
        sensor_id_strategy(),
        key_strategy(),
        station_strategy(),
        elevation_strategy(),
    )
        .prop_map(|(id, name, station, elevation)| {
            Arc::new(Sensor {
                id,
                name: Some(name),
                station: Some(station),
                elevation,
            })
        })
}

/// Strategy for generating a batch of sensors.
pub fn sensor_batch_strategy(max: usize) -> impl Strategy<Value = Vec<Arc<Sensor>>> {
    prop::collection::vec(sensor_strategy(), 0..max)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn keys_match_alphabet(key in key_strategy()) {
            prop_assert!(!key.is_empty());
            prop_assert!(key.len() <= 3);
        }

        #[test]
        fn sensors_are_fully_keyed(sensor in sensor_strategy()) {
            prop_assert!(sensor.name.is_some());
            prop_assert!(sensor.station.is_some());
        }
    }
}
