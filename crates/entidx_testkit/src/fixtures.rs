//! Test fixtures: a small sample entity model and ready-made indexes.
//!
//! The model is deliberately tiny: `Sensor` entities identified by a
//! [`SensorId`] and keyed by name, station, and elevation, plus
//! `Observation` entities keyed by sensor and timestamp for composite
//! indexing. Entities are handed out as `Arc`s; tests kill one by dropping
//! every `Arc` they hold.

use entidx_core::{CompositeIndex, IndexRegistry, IndexSpec, WeakSortedIndex};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the by-name sensor index.
pub const BY_NAME: &str = "by_name";
/// Name of the by-station-then-elevation sensor index.
pub const BY_STATION_ELEVATION: &str = "by_station_elevation";

/// Unique identifier for a sample entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorId(Uuid);

impl SensorId {
    /// Creates a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an id from raw bytes, for deterministic tests.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for SensorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorId({})", self.0)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sample indexed entity.
#[derive(Debug)]
pub struct Sensor {
    /// Stable identity.
    pub id: SensorId,
    /// Display name; optional so tests can exercise the missing-key fault.
    pub name: Option<String>,
    /// Station the sensor is mounted at.
    pub station: Option<String>,
    /// Elevation in meters.
    pub elevation: i64,
}

/// A sample entity for composite (sensor, timestamp) indexing.
#[derive(Debug)]
pub struct Observation {
    /// The sensor that produced this observation.
    pub sensor: SensorId,
    /// Timestamp in seconds.
    pub at: u64,
}

/// Creates a named sensor at station "north", elevation 0.
#[must_use]
pub fn sensor(name: &str) -> Arc<Sensor> {
    stationed_sensor(name, "north", 0)
}

/// Creates a sensor with every indexed field set.
#[must_use]
pub fn stationed_sensor(name: &str, station: &str, elevation: i64) -> Arc<Sensor> {
    Arc::new(Sensor {
        id: SensorId::new(),
        name: Some(name.to_string()),
        station: Some(station.to_string()),
        elevation,
    })
}

/// Creates a sensor with no name, for missing-key fault tests.
#[must_use]
pub fn nameless_sensor(station: &str) -> Arc<Sensor> {
    Arc::new(Sensor {
        id: SensorId::new(),
        name: None,
        station: Some(station.to_string()),
        elevation: 0,
    })
}

/// Creates an observation.
#[must_use]
pub fn observation(sensor: SensorId, at: u64) -> Arc<Observation> {
    Arc::new(Observation { sensor, at })
}

/// A registry over [`Sensor`] with the standard test indexes registered:
/// [`BY_NAME`] and [`BY_STATION_ELEVATION`].
#[must_use]
pub fn sensor_registry() -> IndexRegistry<Sensor> {
    let registry = IndexRegistry::with_defaults();
    registry
        .register(WeakSortedIndex::new(IndexSpec::new(BY_NAME), |s: &Sensor| {
            s.name.clone()
        }))
        .expect("fresh registry");
    registry
        .register(CompositeIndex::two_level(
            IndexSpec::new(BY_STATION_ELEVATION),
            |s: &Sensor| s.station.clone(),
            |s: &Sensor| Some(s.elevation),
        ))
        .expect("fresh registry");
    registry
}

/// A standalone by-name index over [`Sensor`].
#[must_use]
pub fn by_name_index() -> WeakSortedIndex<String, Sensor> {
    WeakSortedIndex::new(IndexSpec::new(BY_NAME), |s: &Sensor| s.name.clone())
}

/// A standalone by-sensor-then-time index over [`Observation`].
#[must_use]
pub fn observation_index(
) -> CompositeIndex<SensorId, WeakSortedIndex<u64, Observation>, Observation> {
    CompositeIndex::two_level(
        IndexSpec::new("by_sensor_time"),
        |o: &Observation| Some(o.sensor),
        |o: &Observation| Some(o.at),
    )
}

/// Initializes tracing for a test binary.
///
/// Respects `RUST_LOG`; safe to call from every test, only the first call
/// installs the subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
