//! Approximate sun lighting
//!
//! A mesh is lit by one scalar light level applied to the whole object and a
//! directional sun. Both are derived from the host world's time of day,
//! weather and light levels at the block containing the mesh origin.

use std::f64::consts::{PI, TAU};

use crate::foundation::math::{BlockPos, Vec3};
use crate::render::backend::WorldOracle;

/// Length of a day in ticks
pub const TICKS_PER_DAY: i64 = 24_000;

/// Lowest light level a mesh is ever drawn with
pub const MIN_LIGHT_LEVEL: f32 = 0.2;

/// Highest sky or block light level
pub const MAX_LIGHT: u8 = 15;

/// World state the light is derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingInputs {
    /// Time of day in ticks
    pub time_of_day: i64,
    /// Sky light level (0..=15)
    pub sky_light: u8,
    /// Block light level (0..=15)
    pub block_light: u8,
    /// Rain intensity (0..=1)
    pub rain: f32,
    /// Thunder intensity (0..=1)
    pub thunder: f32,
    /// Sun angle in radians
    pub sun_angle: f32,
}

impl LightingInputs {
    /// Sample a world at `pos`
    pub fn from_world(world: &dyn WorldOracle, pos: BlockPos) -> Self {
        Self {
            time_of_day: world.time_of_day(),
            sky_light: world.sky_light(pos),
            block_light: world.block_light(pos),
            rain: world.rain_intensity(),
            thunder: world.thunder_intensity(),
            sun_angle: world.sky_angle_radians(),
        }
    }
}

impl Default for LightingInputs {
    fn default() -> Self {
        Self {
            time_of_day: 0,
            sky_light: MAX_LIGHT,
            block_light: 0,
            rain: 0.0,
            thunder: 0.0,
            sun_angle: 0.0,
        }
    }
}

/// Light a mesh is drawn with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    /// Scalar light level in `[0.2, 1]`
    pub level: f32,
    /// Unit direction towards the sun, in world space
    pub sun_direction: Vec3,
}

impl LightState {
    /// Light used when there is no world to sample
    pub fn fallback() -> Self {
        Self {
            level: MIN_LIGHT_LEVEL,
            sun_direction: LightingEstimator::sun_direction(0),
        }
    }
}

/// Light level and sun direction estimation
pub struct LightingEstimator;

impl LightingEstimator {
    /// Light state for the given world inputs
    ///
    /// Levels above 15 are clamped, weather is clamped to `[0, 1]` and a
    /// non-finite angle or weather value counts as 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn estimate(inputs: &LightingInputs) -> LightState {
        let celestial = Self::celestial_light(
            inputs.sun_angle,
            sanitize_unit(inputs.rain),
            sanitize_unit(inputs.thunder),
        );
        let sky = f64::from(inputs.sky_light.min(MAX_LIGHT)) / f64::from(MAX_LIGHT);
        let block = f64::from(inputs.block_light.min(MAX_LIGHT)) / f64::from(MAX_LIGHT);

        let level = (celestial * sky).max(block).max(f64::from(MIN_LIGHT_LEVEL)).min(1.0);

        LightState {
            level: level as f32,
            sun_direction: Self::sun_direction(inputs.time_of_day),
        }
    }

    /// Light state of a world at `pos`
    pub fn estimate_world(world: &dyn WorldOracle, pos: BlockPos) -> LightState {
        Self::estimate(&LightingInputs::from_world(world, pos))
    }

    /// Unit direction towards the sun at `ticks`, turning once per day in the XY plane
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn sun_direction(ticks: i64) -> Vec3 {
        let phase = ticks.rem_euclid(TICKS_PER_DAY) as f64 / TICKS_PER_DAY as f64;
        let angle = TAU * phase;
        Vec3::new(angle.cos() as f32, angle.sin() as f32, 0.0)
    }

    /// Daylight factor in `[0, 1]` for a sun angle and weather
    pub fn celestial_light(sun_angle: f32, rain: f32, thunder: f32) -> f64 {
        let angle = if sun_angle.is_finite() {
            f64::from(sun_angle).rem_euclid(TAU)
        } else {
            0.0
        };
        let folded = if angle >= PI { TAU - angle } else { angle };

        let mut light = 1.0 - (folded.cos() * 2.0 + 0.2);
        light = 1.0 - light.clamp(0.0, 1.0);
        light *= 1.0 - f64::from(rain) * 5.0 / 16.0;
        light *= 1.0 - f64::from(thunder) * 5.0 / 16.0;
        light
    }
}

fn sanitize_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
