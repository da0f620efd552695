//! Imaging scenario: scene, platform and atmosphere parameters
//!
//! A `Scenario` owns the environmental parameters of one collection geometry
//! and lazily derives its atmospheric profile from an [`AtmosphereProvider`].
//!
//! # Cache Invariant
//!
//! The cached profile always corresponds to the current `ihaze`, `altitude`
//! and `ground_range`. Writing any of those three fields drops the cache,
//! even when the written value equals the old one. The next call to
//! [`Scenario::atm`] repopulates it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::atmosphere::{AtmosphereError, AtmosphereProvider, AtmosphericProfile};
use crate::core_types::units::{Kelvin, Meters, MetersPerSecond};

/// Default values for the optional physical parameters
pub mod defaults {
    use crate::core_types::units::{Kelvin, MetersPerSecond};

    /// Platform ground speed (stationary)
    pub const AIRCRAFT_SPEED: MetersPerSecond = MetersPerSecond::new(0.0);
    /// Target reflectance across the bandpass
    pub const TARGET_REFLECTANCE: f64 = 0.15;
    /// Target surface temperature
    pub const TARGET_TEMPERATURE: Kelvin = Kelvin::new(295.0);
    /// Background reflectance across the bandpass
    pub const BACKGROUND_REFLECTANCE: f64 = 0.07;
    /// Background surface temperature
    pub const BACKGROUND_TEMPERATURE: Kelvin = Kelvin::new(293.0);
    /// High-altitude wind speed for the Hufnagel-Valley turbulence profile
    pub const HA_WIND_SPEED: MetersPerSecond = MetersPerSecond::new(21.0);
    /// Refractive index structure parameter at 1 m above ground (m^-2/3)
    pub const CN2_AT_1M: f64 = 1.7e-14;

    pub(super) fn aircraft_speed() -> MetersPerSecond {
        AIRCRAFT_SPEED
    }
    pub(super) fn target_reflectance() -> f64 {
        TARGET_REFLECTANCE
    }
    pub(super) fn target_temperature() -> Kelvin {
        TARGET_TEMPERATURE
    }
    pub(super) fn background_reflectance() -> f64 {
        BACKGROUND_REFLECTANCE
    }
    pub(super) fn background_temperature() -> Kelvin {
        BACKGROUND_TEMPERATURE
    }
    pub(super) fn ha_wind_speed() -> MetersPerSecond {
        HA_WIND_SPEED
    }
    pub(super) fn cn2_at_1m() -> f64 {
        CN2_AT_1M
    }
}

/// Serializable scenario parameters
///
/// Omitted optional fields take the documented physical defaults, so a
/// config only needs `name`, `ihaze`, `altitude` and `ground_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Free-text identifier
    pub name: String,
    /// Haze/visibility regime code of the atmosphere tables
    pub ihaze: i32,
    /// Sensor altitude above ground
    pub altitude: Meters,
    /// Ground distance from nadir to target
    pub ground_range: Meters,

    /// Platform ground speed
    #[serde(default = "defaults::aircraft_speed")]
    pub aircraft_speed: MetersPerSecond,
    /// Target reflectance (0-1)
    #[serde(default = "defaults::target_reflectance")]
    pub target_reflectance: f64,
    /// Target surface temperature
    #[serde(default = "defaults::target_temperature")]
    pub target_temperature: Kelvin,
    /// Background reflectance (0-1)
    #[serde(default = "defaults::background_reflectance")]
    pub background_reflectance: f64,
    /// Background surface temperature
    #[serde(default = "defaults::background_temperature")]
    pub background_temperature: Kelvin,
    /// High-altitude wind speed (Hufnagel-Valley)
    #[serde(default = "defaults::ha_wind_speed")]
    pub ha_wind_speed: MetersPerSecond,
    /// Turbulence structure parameter at 1 m (m^-2/3)
    #[serde(default = "defaults::cn2_at_1m")]
    pub cn2_at_1m: f64,
}

impl ScenarioConfig {
    /// Required parameters, every optional parameter at its default
    #[must_use]
    pub fn new(name: impl Into<String>, ihaze: i32, altitude: Meters, ground_range: Meters) -> Self {
        ScenarioConfig {
            name: name.into(),
            ihaze,
            altitude,
            ground_range,
            aircraft_speed: defaults::AIRCRAFT_SPEED,
            target_reflectance: defaults::TARGET_REFLECTANCE,
            target_temperature: defaults::TARGET_TEMPERATURE,
            background_reflectance: defaults::BACKGROUND_REFLECTANCE,
            background_temperature: defaults::BACKGROUND_TEMPERATURE,
            ha_wind_speed: defaults::HA_WIND_SPEED,
            cn2_at_1m: defaults::CN2_AT_1M,
        }
    }
}

/// Imaging scenario with a lazily cached atmospheric profile
///
/// Construction never validates the geometry; an unsupported haze code or an
/// altitude outside the tables only surfaces on the first [`Scenario::atm`]
/// call.
///
/// `atm` takes `&mut self` because it fills the cache. Share a scenario
/// across threads behind a `Mutex`; the provider itself is shared freely.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sensor_radiometry_core::atmosphere::TabulatedAtmosphere;
/// use sensor_radiometry_core::core_types::units::Meters;
/// use sensor_radiometry_core::Scenario;
///
/// let mut table = TabulatedAtmosphere::new();
/// table.insert(1, 1000.0, 0.0, vec![0.9, 0.1]).unwrap();
///
/// let mut scenario = Scenario::new("nadir", 1, Meters::new(1000.0), Meters::new(0.0), Arc::new(table));
/// assert!(scenario.cached_atm().is_none());
/// assert_eq!(scenario.atm().unwrap().as_slice(), &[0.9, 0.1]);
///
/// scenario.set_ground_range(Meters::new(0.0));
/// assert!(scenario.cached_atm().is_none());
/// ```
pub struct Scenario {
    name: String,
    ihaze: i32,
    altitude: Meters,
    ground_range: Meters,
    aircraft_speed: MetersPerSecond,
    target_reflectance: f64,
    target_temperature: Kelvin,
    background_reflectance: f64,
    background_temperature: Kelvin,
    ha_wind_speed: MetersPerSecond,
    cn2_at_1m: f64,

    provider: Arc<dyn AtmosphereProvider>,
    /// Profile for the current (ihaze, altitude, `ground_range`), if computed
    atm: Option<AtmosphericProfile>,
}

impl Scenario {
    /// Create a scenario with default physical parameters
    pub fn new(
        name: impl Into<String>,
        ihaze: i32,
        altitude: Meters,
        ground_range: Meters,
        provider: Arc<dyn AtmosphereProvider>,
    ) -> Self {
        Self::from_config(
            ScenarioConfig::new(name, ihaze, altitude, ground_range),
            provider,
        )
    }

    /// Create a scenario from a full parameter set
    pub fn from_config(config: ScenarioConfig, provider: Arc<dyn AtmosphereProvider>) -> Self {
        Scenario {
            name: config.name,
            ihaze: config.ihaze,
            altitude: config.altitude,
            ground_range: config.ground_range,
            aircraft_speed: config.aircraft_speed,
            target_reflectance: config.target_reflectance,
            target_temperature: config.target_temperature,
            background_reflectance: config.background_reflectance,
            background_temperature: config.background_temperature,
            ha_wind_speed: config.ha_wind_speed,
            cn2_at_1m: config.cn2_at_1m,
            provider,
            atm: None,
        }
    }

    /// Snapshot of the current parameters
    pub fn config(&self) -> ScenarioConfig {
        ScenarioConfig {
            name: self.name.clone(),
            ihaze: self.ihaze,
            altitude: self.altitude,
            ground_range: self.ground_range,
            aircraft_speed: self.aircraft_speed,
            target_reflectance: self.target_reflectance,
            target_temperature: self.target_temperature,
            background_reflectance: self.background_reflectance,
            background_temperature: self.background_temperature,
            ha_wind_speed: self.ha_wind_speed,
            cn2_at_1m: self.cn2_at_1m,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // ATMOSPHERE
    // ═══════════════════════════════════════════════════════════════════

    /// Atmospheric profile for the current haze index and geometry
    ///
    /// Returns the cached profile, or looks it up from the provider and caches
    /// it. A failed lookup leaves the cache empty.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`AtmosphereError::OutOfRange`] unchanged when
    /// no profile is tabulated for (`altitude`, `ground_range`, `ihaze`).
    pub fn atm(&mut self) -> Result<&AtmosphericProfile, AtmosphereError> {
        let profile = match self.atm.take() {
            Some(profile) => profile,
            None => self.lookup_atm()?,
        };
        let cached: &AtmosphericProfile = self.atm.insert(profile);
        Ok(cached)
    }

    /// Cached profile, without triggering a lookup
    pub fn cached_atm(&self) -> Option<&AtmosphericProfile> {
        self.atm.as_ref()
    }

    /// Drop the cached profile
    pub fn clear_atm(&mut self) {
        if self.atm.take().is_some() {
            debug!(scenario = %self.name, "Cleared cached atmosphere");
        }
    }

    fn lookup_atm(&self) -> Result<AtmosphericProfile, AtmosphereError> {
        let profile = self
            .provider
            .lookup(*self.altitude, *self.ground_range, self.ihaze)
            .inspect_err(|e| warn!(scenario = %self.name, "Atmosphere lookup failed: {e}"))?;
        debug!(
            scenario = %self.name,
            ihaze = self.ihaze,
            altitude = *self.altitude,
            ground_range = *self.ground_range,
            samples = profile.len(),
            "Cached atmosphere profile"
        );
        Ok(profile)
    }

    // ═══════════════════════════════════════════════════════════════════
    // PROFILE-DEFINING PARAMETERS (writes invalidate the cache)
    // ═══════════════════════════════════════════════════════════════════

    pub fn ihaze(&self) -> i32 {
        self.ihaze
    }

    /// Set the haze index and drop the cached profile
    pub fn set_ihaze(&mut self, ihaze: i32) {
        self.ihaze = ihaze;
        self.clear_atm();
    }

    pub fn altitude(&self) -> Meters {
        self.altitude
    }

    /// Set the sensor altitude and drop the cached profile
    pub fn set_altitude(&mut self, altitude: Meters) {
        self.altitude = altitude;
        self.clear_atm();
    }

    pub fn ground_range(&self) -> Meters {
        self.ground_range
    }

    /// Set the ground range and drop the cached profile
    pub fn set_ground_range(&mut self, ground_range: Meters) {
        self.ground_range = ground_range;
        self.clear_atm();
    }

    // ═══════════════════════════════════════════════════════════════════
    // SCENE PARAMETERS (no effect on the atmosphere)
    // ═══════════════════════════════════════════════════════════════════

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn aircraft_speed(&self) -> MetersPerSecond {
        self.aircraft_speed
    }

    pub fn set_aircraft_speed(&mut self, speed: MetersPerSecond) {
        self.aircraft_speed = speed;
    }

    pub fn with_aircraft_speed(mut self, speed: MetersPerSecond) -> Self {
        self.aircraft_speed = speed;
        self
    }

    pub fn target_reflectance(&self) -> f64 {
        self.target_reflectance
    }

    pub fn set_target_reflectance(&mut self, reflectance: f64) {
        self.target_reflectance = reflectance;
    }

    pub fn with_target_reflectance(mut self, reflectance: f64) -> Self {
        self.target_reflectance = reflectance;
        self
    }

    pub fn target_temperature(&self) -> Kelvin {
        self.target_temperature
    }

    pub fn set_target_temperature(&mut self, temperature: Kelvin) {
        self.target_temperature = temperature;
    }

    pub fn with_target_temperature(mut self, temperature: Kelvin) -> Self {
        self.target_temperature = temperature;
        self
    }

    pub fn background_reflectance(&self) -> f64 {
        self.background_reflectance
    }

    pub fn set_background_reflectance(&mut self, reflectance: f64) {
        self.background_reflectance = reflectance;
    }

    pub fn with_background_reflectance(mut self, reflectance: f64) -> Self {
        self.background_reflectance = reflectance;
        self
    }

    pub fn background_temperature(&self) -> Kelvin {
        self.background_temperature
    }

    pub fn set_background_temperature(&mut self, temperature: Kelvin) {
        self.background_temperature = temperature;
    }

    pub fn with_background_temperature(mut self, temperature: Kelvin) -> Self {
        self.background_temperature = temperature;
        self
    }

    pub fn ha_wind_speed(&self) -> MetersPerSecond {
        self.ha_wind_speed
    }

    pub fn set_ha_wind_speed(&mut self, speed: MetersPerSecond) {
        self.ha_wind_speed = speed;
    }

    pub fn with_ha_wind_speed(mut self, speed: MetersPerSecond) -> Self {
        self.ha_wind_speed = speed;
        self
    }

    pub fn cn2_at_1m(&self) -> f64 {
        self.cn2_at_1m
    }

    pub fn set_cn2_at_1m(&mut self, cn2: f64) {
        self.cn2_at_1m = cn2;
    }

    pub fn with_cn2_at_1m(mut self, cn2: f64) -> Self {
        self.cn2_at_1m = cn2;
        self
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("ihaze", &self.ihaze)
            .field("altitude", &self.altitude)
            .field("ground_range", &self.ground_range)
            .field("aircraft_speed", &self.aircraft_speed)
            .field("target_reflectance", &self.target_reflectance)
            .field("target_temperature", &self.target_temperature)
            .field("background_reflectance", &self.background_reflectance)
            .field("background_temperature", &self.background_temperature)
            .field("ha_wind_speed", &self.ha_wind_speed)
            .field("cn2_at_1m", &self.cn2_at_1m)
            .field("atm_cached", &self.atm.is_some())
            .finish_non_exhaustive()
    }
}
