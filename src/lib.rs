//! retro-desk
//!
//! A small wgpu renderer for one hand-built scene: a replica desktop computer
//! with its CRT, floppy drive and ProFile drive, a keyboard, a mouse and their
//! cables, standing on a textured table. Every object is assembled from four
//! primitive meshes (plane, box, prism, cylinder), textured or coloured,
//! given a material and lit by a fixed set of point lights.
//!
//! High-level modules
//! - `app`: winit event loop, input routing and [`run`]
//! - `camera`: fly camera, projection modes, controller and camera uniform
//! - `config`: start-up settings ([`SceneConfig`])
//! - `context`: window, surface, device/queue and the GPU resources living with them
//! - `data_structures`: vertices and meshes, transforms, materials, GPU textures
//! - `pipelines`: the scene render pipeline and the point light uniform
//! - `resources`: asset loading, texture registry and primitive mesh generation
//! - `render`: draw call recording and issue
//! - `scene`: the desk scene itself ([`SceneManager`])
//!

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use app::run;
pub use config::SceneConfig;
pub use scene::SceneManager;
