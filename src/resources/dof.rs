//! Depth of Field Configuration

/// Upper bound of [`DofSettings::iterations`].
pub const MAX_DOF_ITERATIONS: u32 = 8;

/// Depth-of-field parameters.
///
/// The blur footprint grows linearly from zero at the focus `depth` to
/// `radius` texels per tap at `range` units from it. Each iteration runs
/// the horizontal and vertical blur once more over the previous result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofSettings {
    pub enabled: bool,
    /// Number of blur rounds, `1..=MAX_DOF_ITERATIONS`.
    pub iterations: u32,
    /// Distance from the focus plane at which the blur is full.
    pub range: f32,
    pub radius: f32,
    /// Focus distance in view-space units.
    pub depth: f32,
}

impl Default for DofSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            iterations: 1,
            range: 5.0,
            radius: 1.0,
            depth: 6.76,
        }
    }
}
