//! Effect settings and precomputed data.
//!
//! - SsaoSettings / SampleTables: ambient occlusion parameters, kernel and noise
//! - DofSettings: depth of field
//! - BloomSettings: bloom
//! - FogSettings: distance fog with sun glow

pub mod bloom;
pub mod dof;
pub mod fog;
pub mod ssao;

pub use bloom::BloomSettings;
pub use dof::DofSettings;
pub use fog::FogSettings;
pub use ssao::{SampleTables, SsaoSettings};
