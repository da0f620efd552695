//! Scenario construction, cache invalidation and atmosphere lookups against
//! a small MODTRAN-style table.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sensor_radiometry_core::core_types::{Kelvin, Meters, MetersPerSecond};
use sensor_radiometry_core::{
    AtmosphereError, AtmosphereProvider, AtmosphericProfile, Scenario, ScenarioConfig,
    TabulatedAtmosphere,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Haze codes 1 and 2, altitudes 2 m to 2 km, ground ranges 0 to 500 m.
/// Each profile is (transmission, path radiance) decaying with slant range.
fn modtran_table() -> TabulatedAtmosphere {
    let mut table = TabulatedAtmosphere::new();
    for ihaze in [1, 2] {
        let extinction = 1e-5 * f64::from(ihaze);
        for altitude in [2.0_f64, 1000.0, 2000.0] {
            for ground_range in [0.0, 100.0, 500.0] {
                let slant: f64 = (altitude * altitude + ground_range * ground_range).sqrt();
                let transmission = (-extinction * slant).exp();
                table
                    .insert(ihaze, altitude, ground_range, vec![transmission, 1.0 - transmission])
                    .unwrap();
            }
        }
    }
    table
}

/// Wraps a provider and counts lookups
struct Counted<P> {
    inner: P,
    calls: AtomicUsize,
}

impl<P> Counted<P> {
    fn new(inner: P) -> Arc<Self> {
        Arc::new(Counted {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<P: AtmosphereProvider> AtmosphereProvider for Counted<P> {
    fn lookup(
        &self,
        altitude: f64,
        ground_range: f64,
        ihaze: i32,
    ) -> Result<AtmosphericProfile, AtmosphereError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(altitude, ground_range, ihaze)
    }
}

#[test]
fn test_initialization_defaults() {
    let provider = Arc::new(modtran_table());
    for (name, ihaze, altitude, ground_range) in [("", 0, 0.0, 0.0), ("test", 1, 1.0, 1.0)] {
        let s = Scenario::new(
            name,
            ihaze,
            Meters::new(altitude),
            Meters::new(ground_range),
            provider.clone(),
        );
        assert_eq!(s.name(), name);
        assert_eq!(s.ihaze(), ihaze);
        assert_eq!(s.altitude(), altitude);
        assert_eq!(s.ground_range(), ground_range);
        assert_eq!(s.aircraft_speed(), 0.0);
        assert_eq!(s.target_reflectance(), 0.15);
        assert_eq!(s.target_temperature(), 295.0);
        assert_eq!(s.background_reflectance(), 0.07);
        assert_eq!(s.background_temperature(), 293.0);
        assert_eq!(s.ha_wind_speed(), 21.0);
        assert_eq!(s.cn2_at_1m(), 1.7e-14);
    }
}

#[test]
fn test_initialization_overrides() {
    let config = ScenarioConfig {
        aircraft_speed: MetersPerSecond::new(1.0),
        target_reflectance: 1.0,
        target_temperature: Kelvin::new(1.0),
        background_reflectance: 1.0,
        background_temperature: Kelvin::new(1.0),
        ha_wind_speed: MetersPerSecond::new(1.0),
        cn2_at_1m: 1.0,
        ..ScenarioConfig::new("test", 1, Meters::new(1.0), Meters::new(1.0))
    };
    let s = Scenario::from_config(config, Arc::new(modtran_table()));
    assert_eq!(s.aircraft_speed(), 1.0);
    assert_eq!(s.target_reflectance(), 1.0);
    assert_eq!(s.target_temperature(), 1.0);
    assert_eq!(s.background_reflectance(), 1.0);
    assert_eq!(s.background_temperature(), 1.0);
    assert_eq!(s.ha_wind_speed(), 1.0);
    assert_eq!(s.cn2_at_1m(), 1.0);

    let built = Scenario::new("test", 1, Meters::new(1.0), Meters::new(1.0), Arc::new(modtran_table()))
        .with_aircraft_speed(MetersPerSecond::new(1.0))
        .with_target_reflectance(1.0)
        .with_target_temperature(Kelvin::new(1.0))
        .with_background_reflectance(1.0)
        .with_background_temperature(Kelvin::new(1.0))
        .with_ha_wind_speed(MetersPerSecond::new(1.0))
        .with_cn2_at_1m(1.0);
    assert_eq!(built.config(), s.config());
}

#[test]
fn test_setters_update_value_and_clear_cache() {
    init_tracing();
    let mut s = Scenario::new("test", 1, Meters::new(1000.0), Meters::new(0.0), Arc::new(modtran_table()));

    s.atm().unwrap();
    s.set_ihaze(2);
    assert!(s.cached_atm().is_none());
    assert_eq!(s.ihaze(), 2);

    s.atm().unwrap();
    s.set_altitude(Meters::new(2000.0));
    assert!(s.cached_atm().is_none());
    assert_eq!(s.altitude(), 2000.0);

    s.atm().unwrap();
    s.set_ground_range(Meters::new(100.0));
    assert!(s.cached_atm().is_none());
    assert_eq!(s.ground_range(), 100.0);
}

#[test]
fn test_atm_out_of_range() {
    init_tracing();
    let table = modtran_table();
    // Unsupported haze codes, and an altitude below the lowest tabulated level
    for (ihaze, altitude, ground_range) in [(-1, 1000.0, 0.0), (0, 1000.0, 0.0), (1, 1.0, 1.0)] {
        let mut s = Scenario::new(
            "test",
            ihaze,
            Meters::new(altitude),
            Meters::new(ground_range),
            Arc::new(table.clone()),
        );
        let err = s.atm().unwrap_err();
        assert_eq!(
            err,
            AtmosphereError::OutOfRange {
                ihaze,
                altitude,
                ground_range
            }
        );
        assert!(s.cached_atm().is_none());
    }
}

#[test]
fn test_atm_matches_provider() {
    let table = Arc::new(modtran_table());
    for (ihaze, altitude, ground_range) in [
        (2, 1000.0, 0.0),
        (1, 1000.0, 0.0),
        (1, 1000.0, 5.0),
        (1, 2000.0, 0.0),
    ] {
        let expected = table.lookup(altitude, ground_range, ihaze).unwrap();
        let mut s = Scenario::new(
            "test",
            ihaze,
            Meters::new(altitude),
            Meters::new(ground_range),
            table.clone(),
        );
        assert!(s.cached_atm().is_none());
        let atm = s.atm().unwrap().clone();
        assert!(s.cached_atm().is_some());
        assert_eq!(atm, expected);
    }
}

#[test]
fn test_interpolated_ground_range_between_grid_points() {
    let table = modtran_table();
    let at_0 = table.lookup(1000.0, 0.0, 1).unwrap();
    let at_100 = table.lookup(1000.0, 100.0, 1).unwrap();
    let at_5 = table.lookup(1000.0, 5.0, 1).unwrap();
    let expected = at_0[0] + 0.05 * (at_100[0] - at_0[0]);
    assert!((at_5[0] - expected).abs() < 1e-12);
    assert!(at_5[0] <= at_0[0] && at_5[0] >= at_100[0]);
}

#[test]
fn test_failed_lookup_then_recovery() {
    let provider = Counted::new(modtran_table());
    let mut s = Scenario::new("test", 3, Meters::new(1000.0), Meters::new(0.0), provider.clone());

    assert!(s.atm().is_err());
    assert!(s.atm().is_err());
    // Failures are not cached
    assert_eq!(provider.calls(), 2);

    s.set_ihaze(1);
    assert!(s.atm().is_ok());
    assert!(s.atm().is_ok());
    assert_eq!(provider.calls(), 3);
}

/// Random walks of reads and writes: every write of a profile-defining field
/// drops the cache, and reads between writes hit the provider at most once.
#[test]
fn test_cache_invariant_random_walk() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let altitudes = [2.0, 1000.0, 1500.0, 2000.0];
    let ranges = [0.0, 50.0, 100.0, 500.0];

    for _ in 0..50 {
        let provider = Counted::new(modtran_table());
        let mut s = Scenario::new("walk", 1, Meters::new(1000.0), Meters::new(0.0), provider.clone());
        let mut expected_calls = 0;
        let mut cached = false;

        for _ in 0..40 {
            match rng.random_range(0..5) {
                0 => s.set_ihaze(rng.random_range(1..=2)),
                1 => s.set_altitude(Meters::new(altitudes[rng.random_range(0..altitudes.len())])),
                2 => s.set_ground_range(Meters::new(ranges[rng.random_range(0..ranges.len())])),
                _ => {
                    let profile = s.atm().unwrap().clone();
                    if !cached {
                        expected_calls += 1;
                    }
                    cached = true;
                    let fresh = provider
                        .inner
                        .lookup(*s.altitude(), *s.ground_range(), s.ihaze())
                        .unwrap();
                    assert_eq!(profile, fresh);
                    continue;
                }
            }
            cached = false;
            assert!(s.cached_atm().is_none());
        }
        assert_eq!(provider.calls(), expected_calls);
    }
}

#[test]
fn test_scenarios_share_one_table_across_threads() {
    let table = Arc::new(modtran_table());
    let handles: Vec<_> = [(1, 1000.0), (2, 2000.0), (1, 2.0)]
        .into_iter()
        .map(|(ihaze, altitude)| {
            let table = table.clone();
            std::thread::spawn(move || {
                let mut s = Scenario::new("worker", ihaze, Meters::new(altitude), Meters::new(100.0), table);
                s.atm().map(|atm| atm[0])
            })
        })
        .collect();

    for handle in handles {
        let transmission = handle.join().unwrap().unwrap();
        assert!(transmission > 0.0 && transmission <= 1.0);
    }
}
