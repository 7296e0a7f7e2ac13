//! Fog Configuration
//!
//! Exponential distance fog applied by the compositor. Fog starts `start`
//! units away from the camera and thickens with `density`. Looking towards
//! the sun brightens the fog color by `sun_intensity`, concentrated by
//! `sun_dispersion` (smaller values give a tighter glow).

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSettings {
    pub enabled: bool,
    pub color: Vec3,
    pub density: f32,
    pub start: f32,
    /// World-space position the sun glow is centered on.
    pub sun_position: Vec3,
    pub sun_intensity: f32,
    pub sun_dispersion: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Vec3::splat(0.5),
            density: 0.15,
            start: 5.0,
            sun_position: Vec3::ONE,
            sun_intensity: 0.1,
            sun_dispersion: 0.2,
        }
    }
}
