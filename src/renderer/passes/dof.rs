//! Depth-of-field stage: a bilateral blur of the scene color whose
//! footprint grows with the distance to the focus plane.
//!
//! ```text
//! color    ──dof-blur-h──▶ DOF-blur
//! DOF-blur ──dof-blur-v──▶ color
//! ```

use super::blur::{BilateralBlur, BlurAxis};
use crate::renderer::FrameTargets;
use crate::renderer::graph::{PassDesc, Stage};

pub const DOF_BLUR_H: &str = "dof-blur-h";
pub const DOF_BLUR_V: &str = "dof-blur-v";

#[must_use]
pub fn passes(targets: &FrameTargets) -> Vec<PassDesc> {
    let blur = BilateralBlur::depth_of_field();
    vec![
        blur.pass(
            DOF_BLUR_H,
            Stage::DepthOfField,
            targets.color,
            targets.dof_blur,
            targets.depth,
            BlurAxis::Horizontal,
        ),
        blur.pass(
            DOF_BLUR_V,
            Stage::DepthOfField,
            targets.dof_blur,
            targets.color,
            targets.depth,
            BlurAxis::Vertical,
        ),
    ]
}
