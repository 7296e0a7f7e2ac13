//! Effect passes
//!
//! Each module builds the [`PassDesc`](crate::renderer::graph::PassDesc)
//! list of one stage from the frame's targets. The compositor is separate:
//! it always runs and draws into the display.

pub mod bloom;
pub mod blur;
pub mod compositor;
pub mod dof;
pub mod smaa;
pub mod ssao;

pub use compositor::{CompositeFlags, Compositor};

use crate::renderer::FrameTargets;
use crate::renderer::graph::PassDesc;

/// Every effect pass of the frame graph, grouped by stage.
#[must_use]
pub fn all(targets: &FrameTargets) -> Vec<PassDesc> {
    let mut passes = ssao::passes(targets);
    passes.extend(dof::passes(targets));
    passes.extend(bloom::passes(targets));
    passes.extend(smaa::passes(targets));
    passes
}
