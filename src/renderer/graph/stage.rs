//! Effect stages.
//!
//! Every pass belongs to exactly one stage. Stages run in the fixed order
//! of [`Stage::ORDER`]; a disabled stage contributes no passes to a frame.

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    AmbientOcclusion,
    DepthOfField,
    Bloom,
    Antialiasing,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::AmbientOcclusion,
        Stage::DepthOfField,
        Stage::Bloom,
        Stage::Antialiasing,
    ];

    #[must_use]
    pub const fn flag(self) -> StageSet {
        match self {
            Self::AmbientOcclusion => StageSet::AMBIENT_OCCLUSION,
            Self::DepthOfField => StageSet::DEPTH_OF_FIELD,
            Self::Bloom => StageSet::BLOOM,
            Self::Antialiasing => StageSet::ANTIALIASING,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AmbientOcclusion => "ambient-occlusion",
            Self::DepthOfField => "depth-of-field",
            Self::Bloom => "bloom",
            Self::Antialiasing => "antialiasing",
        }
    }
}

bitflags! {
    /// Set of stages enabled for a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StageSet: u8 {
        const AMBIENT_OCCLUSION = 1 << 0;
        const DEPTH_OF_FIELD    = 1 << 1;
        const BLOOM             = 1 << 2;
        const ANTIALIASING      = 1 << 3;
    }
}

impl StageSet {
    #[inline]
    #[must_use]
    pub fn has(self, stage: Stage) -> bool {
        self.contains(stage.flag())
    }
}
