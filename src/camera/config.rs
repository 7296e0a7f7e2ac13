//! Camera configuration.
//!
//! [`CameraConfig`] is an immutable value. Changes are expressed as a
//! [`CameraPatch`] (every field optional) and applied with
//! [`CameraConfig::apply`], which validates the patch and returns the new
//! configuration together with the fields whose value actually changed.
//!
//! Patches deserialize from JSON using the flat option names:
//!
//! ```json
//! { "viewport": [0, 0, 800, 600], "bloom": true, "bloomThreshold": 0.8 }
//! ```

use std::f32::consts::{FRAC_PI_4, PI};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::device::Viewport;
use crate::errors::{PrismError, Result};
use crate::resources::dof::MAX_DOF_ITERATIONS;
use crate::resources::{BloomSettings, DofSettings, FogSettings, SsaoSettings};

// ============================================================================
// CameraConfig
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: Viewport,
    /// Clear color of the geometry color pass.
    pub background_color: Vec4,
    /// Master switch of every effect stage.
    pub postprocess: bool,
    /// Normals and depth are rendered in a prepass; the color pass then
    /// keeps the prepass depth instead of clearing it.
    pub depth_prepass: bool,
    pub exposure: f32,
    pub ssao: SsaoSettings,
    pub dof: DofSettings,
    pub bloom: BloomSettings,
    pub fog: FogSettings,
    pub fxaa: bool,
    pub smaa: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: FRAC_PI_4,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            viewport: Viewport::sized(1, 1),
            background_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            postprocess: true,
            depth_prepass: true,
            exposure: 1.0,
            ssao: SsaoSettings::default(),
            dof: DofSettings::default(),
            bloom: BloomSettings::default(),
            fog: FogSettings::default(),
            fxaa: true,
            smaa: false,
        }
    }
}

/// Fields changed by one patch, in declaration order.
pub type ChangedFields = SmallVec<[ConfigField; 8]>;

impl CameraConfig {
    /// Default configuration for `viewport`, with the aspect derived from it.
    #[must_use]
    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            aspect: viewport.aspect(),
            ..Self::default()
        }
    }

    /// Validates `patch` and returns the patched configuration plus the
    /// fields whose value differs from `self`.
    ///
    /// A viewport change re-derives the aspect; when a patch carries both,
    /// the viewport wins. Nothing is returned on error.
    pub fn apply(&self, patch: &CameraPatch) -> Result<(Self, ChangedFields)> {
        patch.validate()?;

        let mut next = *self;
        put(&mut next.fov, patch.fov);
        put(&mut next.aspect, patch.aspect);
        put(&mut next.near, patch.near);
        put(&mut next.far, patch.far);
        put(&mut next.viewport, patch.viewport);
        put(&mut next.background_color, patch.background_color);
        put(&mut next.postprocess, patch.postprocess);
        put(&mut next.depth_prepass, patch.depth_prepass);
        put(&mut next.exposure, patch.exposure);

        put(&mut next.ssao.enabled, patch.ssao);
        put(&mut next.ssao.intensity, patch.ssao_intensity);
        put(&mut next.ssao.radius, patch.ssao_radius);
        put(&mut next.ssao.bias, patch.ssao_bias);
        put(&mut next.ssao.blur_radius, patch.ssao_blur_radius);
        put(&mut next.ssao.blur_sharpness, patch.ssao_blur_sharpness);

        put(&mut next.dof.enabled, patch.dof);
        put(&mut next.dof.iterations, patch.dof_iterations);
        put(&mut next.dof.range, patch.dof_range);
        put(&mut next.dof.radius, patch.dof_radius);
        put(&mut next.dof.depth, patch.dof_depth);

        put(&mut next.bloom.enabled, patch.bloom);
        put(&mut next.bloom.threshold, patch.bloom_threshold);
        put(&mut next.bloom.intensity, patch.bloom_intensity);
        put(&mut next.bloom.radius, patch.bloom_radius);

        put(&mut next.fxaa, patch.fxaa);
        put(&mut next.smaa, patch.smaa);

        put(&mut next.fog.enabled, patch.fog);
        put(&mut next.fog.color, patch.fog_color);
        put(&mut next.fog.density, patch.fog_density);
        put(&mut next.fog.start, patch.fog_start);
        put(&mut next.fog.sun_position, patch.sun_position);
        put(&mut next.fog.sun_intensity, patch.sun_intensity);
        put(&mut next.fog.sun_dispersion, patch.sun_dispersion);

        if next.viewport != self.viewport {
            next.aspect = next.viewport.aspect();
        }

        if next.near >= next.far {
            let field = if patch.far.is_some() {
                ConfigField::Far
            } else {
                ConfigField::Near
            };
            return Err(invalid(field, "near must be smaller than far"));
        }

        let changed = self.diff(&next);
        Ok((next, changed))
    }

    /// Fields whose value differs between `self` and `other`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn diff(&self, other: &Self) -> ChangedFields {
        let (a, b) = (self, other);
        [
            (ConfigField::Fov, a.fov != b.fov),
            (ConfigField::Aspect, a.aspect != b.aspect),
            (ConfigField::Near, a.near != b.near),
            (ConfigField::Far, a.far != b.far),
            (ConfigField::Viewport, a.viewport != b.viewport),
            (ConfigField::BackgroundColor, a.background_color != b.background_color),
            (ConfigField::Postprocess, a.postprocess != b.postprocess),
            (ConfigField::DepthPrepass, a.depth_prepass != b.depth_prepass),
            (ConfigField::Exposure, a.exposure != b.exposure),
            (ConfigField::Ssao, a.ssao.enabled != b.ssao.enabled),
            (ConfigField::SsaoIntensity, a.ssao.intensity != b.ssao.intensity),
            (ConfigField::SsaoRadius, a.ssao.radius != b.ssao.radius),
            (ConfigField::SsaoBias, a.ssao.bias != b.ssao.bias),
            (ConfigField::SsaoBlurRadius, a.ssao.blur_radius != b.ssao.blur_radius),
            (
                ConfigField::SsaoBlurSharpness,
                a.ssao.blur_sharpness != b.ssao.blur_sharpness,
            ),
            (ConfigField::Dof, a.dof.enabled != b.dof.enabled),
            (ConfigField::DofIterations, a.dof.iterations != b.dof.iterations),
            (ConfigField::DofRange, a.dof.range != b.dof.range),
            (ConfigField::DofRadius, a.dof.radius != b.dof.radius),
            (ConfigField::DofDepth, a.dof.depth != b.dof.depth),
            (ConfigField::Bloom, a.bloom.enabled != b.bloom.enabled),
            (ConfigField::BloomThreshold, a.bloom.threshold != b.bloom.threshold),
            (ConfigField::BloomIntensity, a.bloom.intensity != b.bloom.intensity),
            (ConfigField::BloomRadius, a.bloom.radius != b.bloom.radius),
            (ConfigField::Fxaa, a.fxaa != b.fxaa),
            (ConfigField::Smaa, a.smaa != b.smaa),
            (ConfigField::Fog, a.fog.enabled != b.fog.enabled),
            (ConfigField::FogColor, a.fog.color != b.fog.color),
            (ConfigField::FogDensity, a.fog.density != b.fog.density),
            (ConfigField::FogStart, a.fog.start != b.fog.start),
            (ConfigField::SunPosition, a.fog.sun_position != b.fog.sun_position),
            (ConfigField::SunIntensity, a.fog.sun_intensity != b.fog.sun_intensity),
            (
                ConfigField::SunDispersion,
                a.fog.sun_dispersion != b.fog.sun_dispersion,
            ),
        ]
        .into_iter()
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
    }

    /// Whether any of `fields` affects the projection matrix.
    #[must_use]
    pub fn affects_projection(fields: &[ConfigField]) -> bool {
        fields.iter().any(|f| {
            matches!(
                f,
                ConfigField::Fov
                    | ConfigField::Aspect
                    | ConfigField::Near
                    | ConfigField::Far
                    | ConfigField::Viewport
            )
        })
    }
}

#[inline]
fn put<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn invalid(field: ConfigField, reason: &str) -> PrismError {
    PrismError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

// ============================================================================
// ConfigField
// ============================================================================

/// Every configurable option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Fov,
    Aspect,
    Near,
    Far,
    Viewport,
    BackgroundColor,
    Postprocess,
    DepthPrepass,
    Exposure,
    Ssao,
    SsaoIntensity,
    SsaoRadius,
    SsaoBias,
    SsaoBlurRadius,
    SsaoBlurSharpness,
    Dof,
    DofIterations,
    DofRange,
    DofRadius,
    DofDepth,
    Bloom,
    BloomThreshold,
    BloomIntensity,
    BloomRadius,
    Fxaa,
    Smaa,
    Fog,
    FogColor,
    FogDensity,
    FogStart,
    SunPosition,
    SunIntensity,
    SunDispersion,
}

impl ConfigField {
    /// Option key as used in JSON patches and change notifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fov => "fov",
            Self::Aspect => "aspect",
            Self::Near => "near",
            Self::Far => "far",
            Self::Viewport => "viewport",
            Self::BackgroundColor => "backgroundColor",
            Self::Postprocess => "postprocess",
            Self::DepthPrepass => "depthPrepass",
            Self::Exposure => "exposure",
            Self::Ssao => "ssao",
            Self::SsaoIntensity => "ssaoIntensity",
            Self::SsaoRadius => "ssaoRadius",
            Self::SsaoBias => "ssaoBias",
            Self::SsaoBlurRadius => "ssaoBlurRadius",
            Self::SsaoBlurSharpness => "ssaoBlurSharpness",
            Self::Dof => "dof",
            Self::DofIterations => "dofIterations",
            Self::DofRange => "dofRange",
            Self::DofRadius => "dofRadius",
            Self::DofDepth => "dofDepth",
            Self::Bloom => "bloom",
            Self::BloomThreshold => "bloomThreshold",
            Self::BloomIntensity => "bloomIntensity",
            Self::BloomRadius => "bloomRadius",
            Self::Fxaa => "fxaa",
            Self::Smaa => "smaa",
            Self::Fog => "fog",
            Self::FogColor => "fogColor",
            Self::FogDensity => "fogDensity",
            Self::FogStart => "fogStart",
            Self::SunPosition => "sunPosition",
            Self::SunIntensity => "sunIntensity",
            Self::SunDispersion => "sunDispersion",
        }
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CameraPatch
// ============================================================================

/// A partial configuration. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CameraPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fov: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub far: Option<f32>,
    /// `[x, y, width, height]` or `{ "x": .., "y": .., ... }`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Vec4>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postprocess: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_prepass: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssao: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssao_intensity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssao_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssao_bias: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssao_blur_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssao_blur_sharpness: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dof: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dof_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dof_range: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dof_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dof_depth: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_intensity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_radius: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fxaa: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smaa: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fog: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fog_color: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fog_density: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fog_start: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_position: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_intensity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_dispersion: Option<f32>,
}

impl CameraPatch {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks every present value in isolation. Cross-field constraints
    /// (`near < far`) are checked by [`CameraConfig::apply`].
    pub fn validate(&self) -> Result<()> {
        if let Some(fov) = self.fov
            && !(fov.is_finite() && fov > 0.0 && fov < PI)
        {
            return Err(invalid(ConfigField::Fov, "must be in (0, pi)"));
        }
        positive(ConfigField::Aspect, self.aspect)?;
        positive(ConfigField::Near, self.near)?;
        positive(ConfigField::Far, self.far)?;
        if let Some(viewport) = self.viewport
            && (viewport.width == 0 || viewport.height == 0)
        {
            return Err(invalid(ConfigField::Viewport, "must not be empty"));
        }
        if let Some(iterations) = self.dof_iterations
            && !(1..=MAX_DOF_ITERATIONS).contains(&iterations)
        {
            return Err(PrismError::InvalidConfig {
                field: ConfigField::DofIterations,
                reason: format!("must be in 1..={MAX_DOF_ITERATIONS}"),
            });
        }
        if let Some(color) = self.background_color
            && !color.is_finite()
        {
            return Err(invalid(ConfigField::BackgroundColor, "must be finite"));
        }

        let non_negative_fields = [
            (ConfigField::Exposure, self.exposure),
            (ConfigField::SsaoIntensity, self.ssao_intensity),
            (ConfigField::SsaoRadius, self.ssao_radius),
            (ConfigField::SsaoBias, self.ssao_bias),
            (ConfigField::SsaoBlurRadius, self.ssao_blur_radius),
            (ConfigField::SsaoBlurSharpness, self.ssao_blur_sharpness),
            (ConfigField::DofRange, self.dof_range),
            (ConfigField::DofRadius, self.dof_radius),
            (ConfigField::DofDepth, self.dof_depth),
            (ConfigField::BloomThreshold, self.bloom_threshold),
            (ConfigField::BloomIntensity, self.bloom_intensity),
            (ConfigField::BloomRadius, self.bloom_radius),
            (ConfigField::FogDensity, self.fog_density),
            (ConfigField::FogStart, self.fog_start),
            (ConfigField::SunIntensity, self.sun_intensity),
            (ConfigField::SunDispersion, self.sun_dispersion),
        ];
        for (field, value) in non_negative_fields {
            non_negative(field, value)?;
        }

        for (field, value) in [
            (ConfigField::FogColor, self.fog_color),
            (ConfigField::SunPosition, self.sun_position),
        ] {
            if let Some(v) = value
                && !v.is_finite()
            {
                return Err(invalid(field, "must be finite"));
            }
        }
        Ok(())
    }

    /// True when the patch carries no value at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn positive(field: ConfigField, value: Option<f32>) -> Result<()> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(invalid(field, "must be a positive number")),
        _ => Ok(()),
    }
}

fn non_negative(field: ConfigField, value: Option<f32>) -> Result<()> {
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => {
            Err(invalid(field, "must be a non-negative number"))
        }
        _ => Ok(()),
    }
}
