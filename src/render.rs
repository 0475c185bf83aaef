//! Draw recording and issue.
//!
//! Scene code talks to the shader the way a fixed pipeline is usually driven:
//! it sets uniform values (transform, colour or texture, UV scale, material)
//! and then asks for a primitive to be drawn. [`DrawList`] keeps that shared
//! uniform state and snapshots it into a [`DrawCall`] for every draw.
//! [`SceneRenderer`] later uploads the snapshots and issues one indexed draw
//! per recorded call.
//!
//! # Key types
//!
//! - [`ShaderState`] is the uniform state shared between consecutive draws
//! - [`DrawCall`] is one primitive with the state it was drawn with
//! - [`DrawList`] is the recorder, cleared at the start of every frame
//! - [`SceneRenderer`] owns the pipeline and the per-draw instance buffer
//! - [`FrameResources`] bundles the meshes, textures and uniforms a pass binds

use cgmath::{Matrix3, Matrix4, SquareMatrix, Vector2, Vector4};

use crate::{
    data_structures::{
        instance::{InstanceRaw, Transform},
        material::ObjectMaterial,
        model::DrawMesh,
        texture::Texture,
    },
    pipelines::basic::mk_scene_pipeline,
    resources::{
        mesh::{Primitive, ShapeMeshes},
        texture::{BoundTexture, TextureRegistry, bind_texture, texture_layout},
    },
};

/// The uniform values the next draw will be rendered with.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderState {
    pub model: Matrix4<f32>,
    pub normal: Matrix3<f32>,
    pub object_color: Vector4<f32>,
    pub use_texture: bool,
    pub texture_slot: Option<usize>,
    pub uv_scale: Vector2<f32>,
    pub material: ObjectMaterial,
}

impl Default for ShaderState {
    fn default() -> Self {
        Self {
            model: Matrix4::identity(),
            normal: Matrix3::identity(),
            object_color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            use_texture: false,
            texture_slot: None,
            uv_scale: Vector2::new(1.0, 1.0),
            material: ObjectMaterial::default(),
        }
    }
}

/// Decode one sRGB-encoded channel to linear.
///
/// Flat colours are display values and the colour target is sRGB.
pub fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

impl ShaderState {
    /// Pack the state into the per-instance vertex data. The object colour is
    /// converted to linear; alpha is passed through.
    pub fn to_raw(&self) -> InstanceRaw {
        let color = self.object_color;
        InstanceRaw {
            model: self.model.into(),
            normal: self.normal.into(),
            color: [
                srgb_to_linear(color.x),
                srgb_to_linear(color.y),
                srgb_to_linear(color.z),
                color.w,
            ],
            surface: [
                self.uv_scale.x,
                self.uv_scale.y,
                if self.use_texture { 1.0 } else { 0.0 },
                self.material.shininess,
            ],
            diffuse: self.material.diffuse_color.into(),
            specular: self.material.specular_color.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub primitive: Primitive,
    pub state: ShaderState,
}

/// Records draw calls against a persistent uniform state.
///
/// Like GPU uniforms, the state survives between draws and between frames:
/// a draw that does not set a material reuses the last one. Only the list of
/// recorded calls is reset by [`DrawList::begin_frame`].
#[derive(Debug, Default)]
pub struct DrawList {
    state: ShaderState,
    calls: Vec<DrawCall>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.calls.clear();
    }

    pub fn set_transformations(&mut self, transform: &Transform) {
        self.state.model = transform.to_matrix();
        self.state.normal = transform.normal_matrix();
    }

    /// Draw with a flat colour. Turns texturing off.
    pub fn set_shader_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.use_texture = false;
        self.state.object_color = Vector4::new(red, green, blue, alpha);
    }

    /// Draw with the texture registered in `slot`.
    pub fn set_shader_texture(&mut self, slot: usize) {
        self.state.use_texture = true;
        self.state.texture_slot = Some(slot);
    }

    /// Stop sampling a texture without touching the current colour.
    pub fn disable_texture(&mut self) {
        self.state.use_texture = false;
        self.state.texture_slot = None;
    }

    pub fn set_texture_uv_scale(&mut self, u: f32, v: f32) {
        self.state.uv_scale = Vector2::new(u, v);
    }

    pub fn set_shader_material(&mut self, material: &ObjectMaterial) {
        self.state.material = material.clone();
    }

    pub fn draw(&mut self, primitive: Primitive) {
        self.calls.push(DrawCall {
            primitive,
            state: self.state.clone(),
        });
    }

    pub fn state(&self) -> &ShaderState {
        &self.state
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn instances(&self) -> Vec<InstanceRaw> {
        self.calls.iter().map(|call| call.state.to_raw()).collect()
    }
}

/// GPU side of drawing: the scene pipeline, a growable per-draw instance
/// buffer and the texture bound for untextured draws.
#[derive(Debug)]
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    fallback_texture: BoundTexture,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_count: usize,
}

impl SceneRenderer {
    const INITIAL_CAPACITY: usize = 128;

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let texture_layout = texture_layout(device);
        let pipeline = mk_scene_pipeline(
            device,
            color_format,
            &texture_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        );
        let white = Texture::create_solid([255, 255, 255, 255], "fallback white", device, queue);
        let fallback_texture = bind_texture(device, &texture_layout, white, "fallback white");
        let instance_buffer = mk_instance_buffer(device, Self::INITIAL_CAPACITY);

        Self {
            pipeline,
            texture_layout,
            fallback_texture,
            instance_buffer,
            instance_capacity: Self::INITIAL_CAPACITY,
            instance_count: 0,
        }
    }

    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Upload the per-draw data of `draws`, growing the instance buffer when needed.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, draws: &DrawList) {
        let instances = draws.instances();
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            log::debug!("Growing instance buffer to {} draws", self.instance_capacity);
            self.instance_buffer = mk_instance_buffer(device, self.instance_capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        self.instance_count = instances.len();
    }

    /// Issue one indexed draw per recorded call. Returns the number of draws issued.
    ///
    /// [`SceneRenderer::prepare`] must have been called with the same list.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        draws: &DrawList,
        frame: &FrameResources<'_>,
    ) -> usize {
        if draws.len() != self.instance_count {
            log::warn!(
                "Draw list has {} calls but {} were prepared, skipping frame",
                draws.len(),
                self.instance_count
            );
            return 0;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        let mut issued = 0;
        for (index, call) in draws.calls().iter().enumerate() {
            let Some(mesh) = frame.meshes.get(call.primitive) else {
                log::warn!("{} mesh is not loaded, skipping draw", call.primitive.name());
                continue;
            };
            let texture = call
                .state
                .texture_slot
                .filter(|_| call.state.use_texture)
                .and_then(|slot| frame.textures.get(slot))
                .unwrap_or(&self.fallback_texture);
            let index = index as u32;
            render_pass.draw_mesh_instanced(
                mesh,
                index..index + 1,
                &texture.bind_group,
                frame.camera_bind_group,
                frame.light_bind_group,
            );
            issued += 1;
        }
        issued
    }

    /// Record a render pass that clears `color_view` and `depth_view` and draws `draws` into them.
    pub fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear_colour: wgpu::Color,
        draws: &DrawList,
        frame: &FrameResources<'_>,
    ) -> usize {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_colour),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.draw(&mut render_pass, draws, frame)
    }
}

/// What a scene pass reads besides the draw list and the pipeline.
pub struct FrameResources<'a> {
    pub meshes: &'a ShapeMeshes,
    pub textures: &'a TextureRegistry<BoundTexture>,
    pub camera_bind_group: &'a wgpu::BindGroup,
    pub light_bind_group: &'a wgpu::BindGroup,
}

fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
