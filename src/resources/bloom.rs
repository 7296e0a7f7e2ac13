//! Bloom Configuration
//!
//! Threshold-based bloom: pixels whose luminance (scene color plus emissive)
//! exceeds [`BloomSettings::threshold`] are extracted into a half-resolution
//! buffer, blurred with a separable 9-tap Gaussian and added back by the
//! compositor, scaled by [`BloomSettings::intensity`].

/// Bloom parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Luminance above which a pixel contributes to bloom.
    pub threshold: f32,
    /// Strength of the bloom contribution in the final image.
    pub intensity: f32,
    /// Tap spacing of the blur, in half-resolution texels.
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 1.0,
            intensity: 1.0,
            radius: 1.0,
        }
    }
}
