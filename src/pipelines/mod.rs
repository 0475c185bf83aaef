//! Render pipeline construction and the light uniform.
//!
//! - `basic` builds the single scene pipeline (Phong lighting, optional texture)
//! - `light` holds the point light set and its GPU resources

pub mod basic;
pub mod light;
