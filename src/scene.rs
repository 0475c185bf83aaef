//! The desk scene: a replica desktop computer with keyboard, mouse and
//! cables on a table, composed entirely from primitive meshes.
//!
//! [`SceneManager::prepare_scene`] runs once and loads everything the scene
//! needs. [`SceneManager::render_scene`] runs every frame and records one
//! draw per primitive instance into the manager's [`DrawList`].

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use cgmath::Vector3;

use crate::{
    data_structures::{
        instance::Transform,
        material::{MaterialLibrary, ObjectMaterial},
    },
    pipelines::light::{PointLight, SceneLights},
    render::DrawList,
    resources::{
        mesh::{MeshLoader, Primitive},
        texture::{BoundTexture, TextureFactory, TextureRegistry, create_texture},
    },
};

/// Image files loaded by [`SceneManager::prepare_scene`], relative to the asset root, with their tags.
pub const SCENE_TEXTURES: [(&str, &str); 3] = [
    ("textures/computer_case_texture_2.jpg", "ComputerCase"),
    ("textures/crt_on_texture_1.jpg", "CRTScreen"),
    ("textures/table_texture_1.jpeg", "TableTexture"),
];

const BEIGE: [f32; 4] = [0.96, 0.91, 0.76, 1.0];
const CABLE_BLACK: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const KEY_GREY: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
const RUBBER_BLACK: [f32; 4] = [0.05, 0.05, 0.05, 1.0];

/// Tilt of the keyboard top, the keys and the mouse, rising away from the user.
const SLOPE_DEGREES: f32 = 7.0;
const KEY_SCALE: Vector3<f32> = Vector3::new(0.3, 0.1, 0.3);

fn v3(x: f32, y: f32, z: f32) -> Vector3<f32> {
    Vector3::new(x, y, z)
}

/// Owns the scene's textures, materials and lights and records its draw calls.
///
/// `T` is whatever the texture factory produces; the application uses
/// [`BoundTexture`].
#[derive(Debug)]
pub struct SceneManager<T = BoundTexture> {
    asset_dir: PathBuf,
    textures: TextureRegistry<T>,
    materials: MaterialLibrary,
    lights: SceneLights,
    draws: DrawList,
    reported_missing: HashSet<String>,
}

impl<T> SceneManager<T> {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            textures: TextureRegistry::new(),
            materials: MaterialLibrary::new(),
            lights: SceneLights::default(),
            draws: DrawList::new(),
            reported_missing: HashSet::new(),
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    pub fn textures(&self) -> &TextureRegistry<T> {
        &self.textures
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn lights(&self) -> &SceneLights {
        &self.lights
    }

    pub fn draws(&self) -> &DrawList {
        &self.draws
    }

    /// Load materials, lights, meshes and textures.
    ///
    /// A texture that fails to load is logged and skipped; the rest of the
    /// scene is still prepared. Returns the number of textures loaded.
    pub async fn prepare_scene<F, M>(&mut self, factory: &mut F, meshes: &mut M) -> usize
    where
        F: TextureFactory<Texture = T>,
        M: MeshLoader,
    {
        self.define_object_materials();
        self.setup_scene_lights();

        for primitive in Primitive::ALL {
            meshes.load_mesh(primitive);
        }

        let mut loaded = 0;
        for (file_name, tag) in SCENE_TEXTURES {
            if create_texture(&mut self.textures, factory, &self.asset_dir, file_name, tag)
                .await
                .is_ok()
            {
                loaded += 1;
            }
        }
        log::info!(
            "Scene prepared: {}/{} textures, {} materials, {} active lights",
            loaded,
            SCENE_TEXTURES.len(),
            self.materials.len(),
            self.lights.active_count()
        );
        loaded
    }

    /// Release every texture slot.
    pub fn destroy_textures(&mut self) {
        self.textures.clear();
        self.reported_missing.clear();
    }

    pub fn define_object_materials(&mut self) {
        self.materials.define(ObjectMaterial::new(
            "cement",
            v3(0.5, 0.5, 0.5),
            v3(0.4, 0.4, 0.4),
            0.5,
        ));
        self.materials.define(ObjectMaterial::new(
            "plastic",
            v3(1.0, 1.0, 1.0),
            v3(0.2, 0.2, 0.2),
            2.0,
        ));
    }

    pub fn setup_scene_lights(&mut self) {
        self.lights.use_lighting = true;

        // overhead white light
        self.lights.set_point_light(
            0,
            PointLight {
                position: v3(0.0, 9.5, 2.5),
                ambient: v3(0.15, 0.15, 0.15),
                diffuse: v3(0.6, 0.6, 0.6),
                specular: v3(0.5, 0.5, 0.5),
                constant: 1.0,
                linear: 0.045,
                quadratic: 0.0075,
                active: true,
            },
        );

        // blue glow in front of the CRT
        self.lights.set_point_light(
            1,
            PointLight {
                position: v3(-1.25, 3.5, 3.0),
                ambient: v3(0.05, 0.1, 0.2),
                diffuse: v3(0.2, 0.4, 0.8),
                specular: v3(0.1, 0.2, 0.4),
                constant: 1.0,
                linear: 0.22,
                quadratic: 0.2,
                active: true,
            },
        );
    }

    /// Record this frame's draw calls.
    ///
    /// Previously recorded calls are discarded first, so every frame yields
    /// the same number of draws.
    pub fn render_scene(&mut self) -> &DrawList {
        self.draws.begin_frame();

        self.set_transformations(Transform::placed(v3(20.0, 1.0, 10.0), v3(0.0, 0.0, 0.0)));
        self.set_shader_texture("TableTexture");
        self.set_shader_material("cement");
        self.draws.draw(Primitive::Plane);

        self.draw_main_body();
        self.draw_back_base();
        self.draw_feet();
        self.draw_floppy_drive();
        self.draw_crt_panel();
        self.draw_profile();
        self.draw_mouse();
        self.draw_mouse_cable();
        self.draw_keyboard();
        self.draw_keyboard_cable();

        &self.draws
    }

    pub fn set_transformations(&mut self, transform: Transform) {
        self.draws.set_transformations(&transform);
    }

    pub fn set_shader_color(&mut self, [red, green, blue, alpha]: [f32; 4]) {
        self.draws.set_shader_color(red, green, blue, alpha);
    }

    /// Texture the next draws with the texture registered under `tag`.
    ///
    /// An unknown tag turns texturing off and is reported once.
    pub fn set_shader_texture(&mut self, tag: &str) {
        match self.textures.find_slot(tag) {
            Some(slot) => self.draws.set_shader_texture(slot),
            None => {
                if self.reported_missing.insert(format!("texture:{tag}")) {
                    log::warn!("No texture registered under '{}', drawing untextured", tag);
                }
                self.draws.disable_texture();
            }
        }
    }

    pub fn set_texture_uv_scale(&mut self, u: f32, v: f32) {
        self.draws.set_texture_uv_scale(u, v);
    }

    /// Use the material defined under `tag`. An unknown tag keeps the current material.
    pub fn set_shader_material(&mut self, tag: &str) {
        match self.materials.find(tag) {
            Some(material) => self.draws.set_shader_material(material),
            None => {
                if self.reported_missing.insert(format!("material:{tag}")) {
                    log::warn!("No material defined under '{}', keeping the current one", tag);
                }
            }
        }
    }

    fn textured_plastic(&mut self, uv_scale: f32) {
        self.set_shader_texture("ComputerCase");
        self.set_shader_material("plastic");
        self.set_texture_uv_scale(uv_scale, uv_scale);
    }

    fn draw_main_body(&mut self) {
        self.set_transformations(Transform::placed(v3(7.0, 5.0, 5.0), v3(0.0, 3.5, 0.0)));
        self.textured_plastic(2.0);
        self.draws.draw(Primitive::Box);
    }

    fn draw_back_base(&mut self) {
        self.set_transformations(Transform::placed(v3(7.0, 2.5, 3.0), v3(0.0, 1.25, -1.0)));
        self.textured_plastic(2.0);
        self.draws.draw(Primitive::Box);
    }

    /// A box and a wedge under each front corner.
    fn draw_feet(&mut self) {
        for x in [-3.0, 3.0] {
            self.set_transformations(Transform::placed(v3(1.0, 1.0, 0.2), v3(x, 0.5, 0.6)));
            self.textured_plastic(2.0);
            self.draws.draw(Primitive::Box);

            self.set_transformations(Transform::new(
                v3(1.0, 1.0, 0.5),
                -90.0,
                90.0,
                0.0,
                v3(x, 0.25, 0.7),
            ));
            self.textured_plastic(2.0);
            self.draws.draw(Primitive::Prism);
        }
    }

    fn draw_floppy_drive(&mut self) {
        self.set_transformations(Transform::placed(v3(2.0, 2.5, 0.2), v3(2.0, 3.5, 2.6)));
        self.textured_plastic(2.0);
        self.draws.draw(Primitive::Box);

        for y in [4.4, 2.8] {
            self.set_transformations(Transform::placed(v3(1.5, 0.1, 0.05), v3(2.0, y, 2.7)));
            self.set_shader_color(CABLE_BLACK);
            self.draws.draw(Primitive::Box);
        }
    }

    fn draw_crt_panel(&mut self) {
        self.set_transformations(Transform::placed(v3(3.5, 2.8, 0.2), v3(-1.25, 3.5, 2.6)));
        self.set_shader_texture("CRTScreen");
        self.set_texture_uv_scale(1.0, 1.0);
        self.draws.draw(Primitive::Box);
    }

    /// The external hard drive on top of the case, on four rubber feet.
    fn draw_profile(&mut self) {
        self.set_transformations(Transform::placed(v3(6.5, 1.0, 4.0), v3(0.0, 6.7, 0.0)));
        self.textured_plastic(2.0);
        self.draws.draw(Primitive::Box);

        let foot_scale = v3(0.3, 0.2, 0.3);
        let (x_inset, z_inset) = (2.75, 1.5);
        for (x, z) in [
            (-x_inset, -z_inset),
            (x_inset, -z_inset),
            (-x_inset, z_inset),
            (x_inset, z_inset),
        ] {
            self.set_transformations(Transform::placed(foot_scale, v3(x, 6.10, z)));
            self.set_shader_color(RUBBER_BLACK);
            self.draws.draw(Primitive::Box);
        }
    }

    fn draw_mouse(&mut self) {
        self.set_transformations(Transform::placed(v3(1.5, 0.2, 2.5), v3(6.0, 0.1, 4.0)));
        self.set_shader_color(BEIGE);
        self.draws.draw(Primitive::Box);

        self.set_transformations(Transform::new(
            v3(1.5, 0.5, 2.5),
            SLOPE_DEGREES,
            0.0,
            0.0,
            v3(6.0, 0.1, 4.0),
        ));
        self.set_shader_color(BEIGE);
        self.draws.draw(Primitive::Box);

        self.set_transformations(Transform::new(
            v3(1.2, 0.05, 0.5),
            SLOPE_DEGREES,
            0.0,
            0.0,
            v3(6.0, 0.45, 3.3),
        ));
        self.set_shader_color(KEY_GREY);
        self.draws.draw(Primitive::Box);
    }

    fn draw_mouse_cable(&mut self) {
        self.set_shader_color(CABLE_BLACK);
        let segments = [
            (7.5, [90.0, 0.0, 0.25], v3(6.0, 0.0, -3.0)),
            (1.0, [90.0, 0.0, 0.25], v3(1.25, 0.0, -3.0)),
            (4.85, [0.0, 0.0, 90.0], v3(6.05, 0.0, -3.0)),
        ];
        for (length, [rx, ry, rz], position) in segments {
            self.set_transformations(Transform::new(v3(0.05, length, 0.05), rx, ry, rz, position));
            self.draws.draw(Primitive::Cylinder);
        }
    }

    fn draw_keyboard(&mut self) {
        self.set_transformations(Transform::placed(v3(5.0, 0.5, 2.0), v3(0.0, 0.1, 5.0)));
        self.set_shader_material("plastic");
        self.set_shader_color(BEIGE);
        self.draws.draw(Primitive::Box);

        self.set_transformations(Transform::new(
            v3(5.0, 0.4, 2.0),
            SLOPE_DEGREES,
            0.0,
            0.0,
            v3(0.0, 0.35, 5.0),
        ));
        self.set_shader_material("plastic");
        self.set_shader_color(BEIGE);
        self.draws.draw(Primitive::Box);

        for (x, y, z) in key_grid_positions() {
            self.draw_key(x, y, z, KEY_SCALE);
        }
        for (x, y, z, width) in bottom_row_keys() {
            self.draw_key(x, y, z, v3(width, 0.1, 0.3));
        }
    }

    fn draw_key(&mut self, x: f32, y: f32, z: f32, scale: Vector3<f32>) {
        self.set_transformations(Transform::new(scale, SLOPE_DEGREES, 0.0, 0.0, v3(x, y, z)));
        self.set_shader_material("plastic");
        self.set_shader_color(KEY_GREY);
        self.draws.draw(Primitive::Box);
    }

    fn draw_keyboard_cable(&mut self) {
        self.set_shader_color(CABLE_BLACK);

        self.set_transformations(Transform::new(v3(0.05, 0.5, 0.05), 90.0, 0.0, 0.0, v3(0.0, 0.1, 3.5)));
        self.draws.draw(Primitive::Cylinder);

        self.set_transformations(Transform::new(v3(0.05, 2.02, 0.05), 0.0, 0.0, 90.0, v3(2.0, 0.1, 3.5)));
        self.draws.draw(Primitive::Cylinder);

        self.set_transformations(Transform::new(v3(0.05, 3.0, 0.05), 90.0, 0.0, 0.0, v3(2.0, 0.1, 0.5)));
        self.draws.draw(Primitive::Cylinder);
    }
}

const KEY_ROWS: usize = 4;
const KEY_COLUMNS: usize = 14;
const KEY_SPACING: f32 = 0.35;
const KEY_GRID_FRONT_Z: f32 = 5.3;
const KEY_GRID_Y: f32 = 0.55;

/// Centres of the regular keys, row 0 nearest the user.
///
/// Rows further back sit higher to follow the sloped keyboard top.
fn key_grid_positions() -> Vec<(f32, f32, f32)> {
    let start_x = -((KEY_COLUMNS - 1) as f32 * KEY_SPACING) / 2.0;
    let row_lift = [-0.02, 0.02, 0.06, 0.1];

    let mut positions = Vec::with_capacity(KEY_ROWS * KEY_COLUMNS);
    for (row, lift) in row_lift.iter().enumerate() {
        for col in 0..KEY_COLUMNS {
            positions.push((
                start_x + col as f32 * KEY_SPACING,
                KEY_GRID_Y + lift,
                KEY_GRID_FRONT_Z - row as f32 * KEY_SPACING,
            ));
        }
    }
    positions
}

/// Centres and widths of the modifier and space bar row in front of the grid.
fn bottom_row_keys() -> Vec<(f32, f32, f32, f32)> {
    let widths = [0.3, 0.6, 1.8, 0.6, 0.3];
    let spacing = 0.05;
    let y = KEY_GRID_Y - 0.05;
    let z = KEY_GRID_FRONT_Z + KEY_SPACING * 1.2;

    let row_width: f32 = widths.iter().sum::<f32>() + spacing * (widths.len() - 1) as f32;
    let mut cursor = -row_width / 2.0;
    widths
        .iter()
        .map(|&width| {
            let key = (cursor + width / 2.0, y, z, width);
            cursor += width + spacing;
            key
        })
        .collect()
}
