//! Environmental systems for the Agrisim simulation.
//!
//! Two layers drive the shared [`EnvironmentState`]:
//!
//! - A daily weather condition drawn with season-weighted probabilities from
//!   a deterministic `(seed, day)` hash.
//! - A per-tick bounded random walk of temperature, humidity, wind and soil
//!   quality, biased by the day's weather and pulled gently toward the
//!   season's mean temperature.
//!
//! # Weather weights
//!
//! | Weather  | Spring | Summer | Autumn | Winter |
//! |----------|--------|--------|--------|--------|
//! | Sunny    | 30%    | 50%    | 25%    | 15%    |
//! | Cloudy   | 25%    | 20%    | 30%    | 40%    |
//! | Rain     | 25%    | 10%    | 20%    | 15%    |
//! | Storm    |  5%    | 10%    | 10%    | 15%    |
//! | (repeat) | 15%    | 10%    | 15%    | 15%    |
//!
//! The "repeat" weight keeps the previous day's weather, giving streaks.

use agrisim_types::{EnvironmentState, Season, Weather, WeatherOutlook};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Temperature range in degrees Celsius.
pub const TEMPERATURE_RANGE: (f64, f64) = (5.0, 40.0);
/// Relative humidity range in percent.
pub const HUMIDITY_RANGE: (f64, f64) = (20.0, 95.0);
/// Wind speed range in km/h.
pub const WIND_RANGE: (f64, f64) = (0.0, 25.0);
/// Soil quality range.
pub const SOIL_QUALITY_RANGE: (f64, f64) = (0.0, 1.0);

/// Largest change any field can see in one step.
pub const MAX_FIELD_STEP: f64 = 0.05;

// Random walk half-widths per step.
const TEMPERATURE_JITTER: f64 = 0.005;
const HUMIDITY_JITTER: f64 = 0.01;
const WIND_JITTER: f64 = 0.005;
const SOIL_QUALITY_JITTER: f64 = 0.0005;

/// Strength of the pull toward the seasonal mean temperature.
const SEASONAL_PULL: f64 = 0.0005;

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Seasonal weather weights for probability-based generation.
///
/// Each entry is `(weather, weight)`. `None` means "repeat previous weather".
#[derive(Debug, Clone)]
pub struct SeasonWeights {
    entries: Vec<(Option<Weather>, u32)>,
}

impl SeasonWeights {
    /// Return the weather weights for the given season.
    pub fn for_season(season: Season) -> Self {
        let entries = match season {
            Season::Spring => vec![
                (Some(Weather::Sunny), 30),
                (Some(Weather::Cloudy), 25),
                (Some(Weather::Rain), 25),
                (Some(Weather::Storm), 5),
                (None, 15),
            ],
            Season::Summer => vec![
                (Some(Weather::Sunny), 50),
                (Some(Weather::Cloudy), 20),
                (Some(Weather::Rain), 10),
                (Some(Weather::Storm), 10),
                (None, 10),
            ],
            Season::Autumn => vec![
                (Some(Weather::Sunny), 25),
                (Some(Weather::Cloudy), 30),
                (Some(Weather::Rain), 20),
                (Some(Weather::Storm), 10),
                (None, 15),
            ],
            Season::Winter => vec![
                (Some(Weather::Sunny), 15),
                (Some(Weather::Cloudy), 40),
                (Some(Weather::Rain), 15),
                (Some(Weather::Storm), 15),
                (None, 15),
            ],
        };
        Self { entries }
    }

    fn select(&self, random_value: u32) -> Option<Weather> {
        let mut cumulative: u32 = 0;
        for &(weather, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if random_value < cumulative {
                return weather;
            }
        }
        Some(Weather::Cloudy)
    }

    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, &(_, weight)| acc.saturating_add(weight))
    }
}

/// Deterministic daily weather generator.
///
/// The same `(seed, day)` pair always rolls the same value.
#[derive(Debug, Clone)]
pub struct WeatherSystem {
    seed: u64,
    previous_weather: Weather,
}

impl WeatherSystem {
    /// Create a weather system. The initial previous weather is sunny.
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            previous_weather: Weather::Sunny,
        }
    }

    /// Generate the weather for `day` in `season` and remember it for
    /// subsequent repeat rolls.
    pub fn generate(&mut self, day: u64, season: Season) -> Weather {
        let weather = self.peek(day, season);
        self.previous_weather = weather;
        weather
    }

    /// What [`generate`](Self::generate) would return, without updating state.
    pub fn peek(&self, day: u64, season: Season) -> Weather {
        let weights = SeasonWeights::for_season(season);
        let total = weights.total_weight();
        if total == 0 {
            return Weather::Cloudy;
        }
        let random = deterministic_random(self.seed, day);
        let remainder = random.checked_rem(u64::from(total)).unwrap_or(0);
        let roll = u32::try_from(remainder).unwrap_or(0);
        weights.select(roll).unwrap_or(self.previous_weather)
    }

    /// The most recently generated weather.
    pub const fn previous_weather(&self) -> Weather {
        self.previous_weather
    }
}

/// `xorshift64` over a mix of seed and day.
const fn deterministic_random(seed: u64, day: u64) -> u64 {
    let mut state = seed.wrapping_add(day.wrapping_mul(0x517c_c1b7_2722_0a95));
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

// ---------------------------------------------------------------------------
// Environment model
// ---------------------------------------------------------------------------

/// Per-step drift applied on top of the random walk for a weather condition.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WeatherBias {
    temperature: f64,
    humidity: f64,
    wind: f64,
    soil_quality: f64,
}

const fn weather_bias(weather: Weather) -> WeatherBias {
    match weather {
        Weather::Sunny => WeatherBias {
            temperature: 0.002,
            humidity: -0.003,
            wind: 0.0,
            soil_quality: -0.0001,
        },
        Weather::Cloudy => WeatherBias {
            temperature: 0.0,
            humidity: 0.0,
            wind: 0.0,
            soil_quality: 0.0,
        },
        Weather::Rain => WeatherBias {
            temperature: -0.002,
            humidity: 0.006,
            wind: 0.001,
            soil_quality: 0.0002,
        },
        Weather::Storm => WeatherBias {
            temperature: -0.001,
            humidity: 0.004,
            wind: 0.004,
            soil_quality: 0.0,
        },
    }
}

const fn seasonal_mean_temperature(season: Season) -> f64 {
    match season {
        Season::Spring => 18.0,
        Season::Summer => 26.0,
        Season::Autumn => 15.0,
        Season::Winter => 8.0,
    }
}

/// Owns the shared [`EnvironmentState`] and advances it once per tick.
///
/// The tick loop is the single writer. Crop updates read a
/// [`snapshot`](Self::snapshot) taken after the step.
#[derive(Debug, Clone)]
pub struct EnvironmentModel {
    state: EnvironmentState,
    weather: WeatherSystem,
    rng: SmallRng,
    current_day: Option<u64>,
}

impl EnvironmentModel {
    /// Start from the default environment (22 °C, 65 %, 5 km/h, summer).
    pub fn new(seed: u64) -> Self {
        Self {
            state: EnvironmentState::default(),
            weather: WeatherSystem::new(seed),
            rng: SmallRng::seed_from_u64(seed),
            current_day: None,
        }
    }

    /// Start from an explicit state, rejecting out-of-range fields.
    pub fn with_state(seed: u64, state: EnvironmentState) -> Result<Self, WorldError> {
        check_range("temperature", state.temperature, TEMPERATURE_RANGE)?;
        check_range("humidity", state.humidity, HUMIDITY_RANGE)?;
        check_range("wind_speed", state.wind_speed, WIND_RANGE)?;
        check_range("soil_quality", state.soil_quality, SOIL_QUALITY_RANGE)?;
        let mut model = Self::new(seed);
        model.state = state;
        Ok(model)
    }

    /// Current state.
    pub const fn state(&self) -> &EnvironmentState {
        &self.state
    }

    /// Copy of the current state for readers within a tick.
    pub const fn snapshot(&self) -> EnvironmentState {
        self.state
    }

    /// Advance one tick on simulated `day` in `season`.
    ///
    /// Rolls a new weather condition when the day changes, then applies one
    /// bounded random-walk step. Every field stays inside its range.
    pub fn step(&mut self, day: u64, season: Season) -> EnvironmentState {
        self.state.season = season;
        if self.current_day != Some(day) {
            let weather = self.weather.generate(day, season);
            if weather != self.state.weather {
                tracing::debug!(day, ?season, ?weather, "weather changed");
            }
            self.state.weather = weather;
            self.current_day = Some(day);
        }

        let bias = weather_bias(self.state.weather);
        let pull = (seasonal_mean_temperature(season) - self.state.temperature) * SEASONAL_PULL;

        let d_temp = self.rng.random_range(-TEMPERATURE_JITTER..=TEMPERATURE_JITTER)
            + bias.temperature
            + pull;
        let d_hum = self.rng.random_range(-HUMIDITY_JITTER..=HUMIDITY_JITTER) + bias.humidity;
        let d_wind = self.rng.random_range(-WIND_JITTER..=WIND_JITTER) + bias.wind;
        let d_soil =
            self.rng.random_range(-SOIL_QUALITY_JITTER..=SOIL_QUALITY_JITTER) + bias.soil_quality;

        self.state.temperature = walk(self.state.temperature, d_temp, TEMPERATURE_RANGE);
        self.state.humidity = walk(self.state.humidity, d_hum, HUMIDITY_RANGE);
        self.state.wind_speed = walk(self.state.wind_speed, d_wind, WIND_RANGE);
        self.state.soil_quality = walk(self.state.soil_quality, d_soil, SOIL_QUALITY_RANGE);

        self.state
    }
}

fn walk(value: f64, delta: f64, (min, max): (f64, f64)) -> f64 {
    let delta = delta.clamp(-MAX_FIELD_STEP, MAX_FIELD_STEP);
    (value + delta).clamp(min, max)
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), WorldError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(WorldError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

// ---------------------------------------------------------------------------
// Outlook
// ---------------------------------------------------------------------------

/// Deterministic weather-impact outlook for the given environment.
pub fn weather_outlook(state: &EnvironmentState) -> WeatherOutlook {
    let hot = state.temperature > 25.0;
    WeatherOutlook {
        growth_impact: if hot { "Accelerated" } else { "Normal" }.to_owned(),
        disease_risk: if state.humidity > 70.0 { "High" } else { "Low" }.to_owned(),
        water_needs: if hot { "Increased" } else { "Normal" }.to_owned(),
        recommendations:
            "Monitor plants closely for weather-related stress and adjust care accordingly"
                .to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn in_bounds(state: &EnvironmentState) -> bool {
        (TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&state.temperature)
            && (HUMIDITY_RANGE.0..=HUMIDITY_RANGE.1).contains(&state.humidity)
            && (WIND_RANGE.0..=WIND_RANGE.1).contains(&state.wind_speed)
            && (SOIL_QUALITY_RANGE.0..=SOIL_QUALITY_RANGE.1).contains(&state.soil_quality)
    }

    #[test]
    fn deterministic_random_is_reproducible() {
        assert_eq!(deterministic_random(42, 100), deterministic_random(42, 100));
        assert_ne!(deterministic_random(42, 100), deterministic_random(42, 101));
        assert_ne!(deterministic_random(0, 0), 0);
    }

    #[test]
    fn season_weights_total_is_100() {
        for season in [Season::Spring, Season::Summer, Season::Autumn, Season::Winter] {
            assert_eq!(SeasonWeights::for_season(season).total_weight(), 100);
        }
    }

    #[test]
    fn weather_system_is_reproducible() {
        let mut a = WeatherSystem::new(7);
        let mut b = WeatherSystem::new(7);
        for day in 0_u64..200 {
            assert_eq!(a.generate(day, Season::Autumn), b.generate(day, Season::Autumn));
        }
    }

    #[test]
    fn peek_does_not_change_state() {
        let system = WeatherSystem::new(42);
        let before = system.previous_weather();
        let _ = system.peek(50, Season::Winter);
        assert_eq!(system.previous_weather(), before);
    }

    #[test]
    fn summer_is_mostly_sunny() {
        let mut system = WeatherSystem::new(42);
        let sunny = (0_u64..5_000)
            .filter(|&day| system.generate(day, Season::Summer) == Weather::Sunny)
            .count();
        assert!(sunny > 2_000, "got {sunny}/5000");
    }

    #[test]
    fn walk_stays_in_bounds_over_many_steps() {
        let mut model = EnvironmentModel::new(3);
        for tick in 0_u64..100_000 {
            let season = Season::Spring.advanced_by(tick / 20_000);
            let state = model.step(tick / 1_000, season);
            assert!(in_bounds(&state), "out of bounds at tick {tick}: {state:?}");
        }
    }

    #[test]
    fn per_step_change_is_small() {
        let mut model = EnvironmentModel::new(11);
        let mut previous = model.snapshot();
        for tick in 0_u64..10_000 {
            let next = model.step(tick / 100, Season::Summer);
            assert!((next.temperature - previous.temperature).abs() <= MAX_FIELD_STEP);
            assert!((next.humidity - previous.humidity).abs() <= MAX_FIELD_STEP);
            assert!((next.wind_speed - previous.wind_speed).abs() <= MAX_FIELD_STEP);
            previous = next;
        }
    }

    #[test]
    fn same_seed_same_walk() {
        let mut a = EnvironmentModel::new(5);
        let mut b = EnvironmentModel::new(5);
        for tick in 0_u64..500 {
            assert_eq!(a.step(tick / 50, Season::Winter), b.step(tick / 50, Season::Winter));
        }
    }

    #[test]
    fn with_state_rejects_out_of_range() {
        let state = EnvironmentState {
            temperature: 55.0,
            ..EnvironmentState::default()
        };
        let err = EnvironmentModel::with_state(1, state).unwrap_err();
        assert!(matches!(err, WorldError::OutOfRange { field: "temperature", .. }));
        assert!(EnvironmentModel::with_state(1, EnvironmentState::default()).is_ok());
    }

    #[test]
    fn outlook_flags_heat_and_humidity() {
        let state = EnvironmentState {
            temperature: 30.0,
            humidity: 80.0,
            ..EnvironmentState::default()
        };
        let outlook = weather_outlook(&state);
        assert_eq!(outlook.growth_impact, "Accelerated");
        assert_eq!(outlook.disease_risk, "High");
        assert_eq!(outlook.water_needs, "Increased");

        let calm = weather_outlook(&EnvironmentState::default());
        assert_eq!(calm.growth_impact, "Normal");
        assert_eq!(calm.disease_risk, "Low");
    }
}
