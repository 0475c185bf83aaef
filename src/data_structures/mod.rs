//! Scene data structures: meshes, textures, transforms and materials.
//!
//! - `model` contains the vertex layout, GPU meshes and the mesh draw helper
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-draw transformation data and its raw GPU form
//! - `material` holds tagged surface materials

pub mod instance;
pub mod material;
pub mod model;
pub mod texture;
