pub mod stage0_segment;
pub mod stage1_extract;
pub mod stage2_normalize;
pub mod stage3_render;
pub mod stage_metadata;

pub use stage0_segment::*;
pub use stage1_extract::*;
pub use stage2_normalize::*;
pub use stage3_render::*;
pub use stage_metadata::*;
