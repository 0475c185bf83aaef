use std::{io::Cursor, path::PathBuf};

use cgmath::Deg;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use retro_desk::{
    camera::{Camera, CameraController, CameraResources, Projection},
    data_structures::texture::Texture,
    pipelines::light::{LightResources, SceneLights},
    render::SceneRenderer,
    resources::mesh::ShapeMeshes,
    scene::SCENE_TEXTURES,
};

pub const WIDTH: u32 = 256;
pub const HEIGHT: u32 = 256;
pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A device without a window. `None` when the machine has no usable adapter.
pub async fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok()?;
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("headless test device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .ok()
}

/// The GPU pieces `Context` normally owns, minus window and surface.
pub struct Headless {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub renderer: SceneRenderer,
    pub meshes: ShapeMeshes,
}

impl Headless {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let projection = Projection::new(WIDTH, HEIGHT, Deg(45.0), 0.1, 100.0);
        let camera = CameraResources::new(
            &device,
            Camera::new((0.0, 9.0, 18.0), Deg(-90.0), Deg(-25.0)),
            CameraController::new(10.0, 0.4),
            &projection,
        );
        let light = LightResources::new(SceneLights::default(), &device);
        let renderer = SceneRenderer::new(
            &device,
            &queue,
            FORMAT,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        Self {
            device,
            queue,
            camera,
            projection,
            light,
            renderer,
            meshes: ShapeMeshes::new(),
        }
    }

    pub fn colour_target(&self) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    pub fn depth_target(&self) -> Texture {
        Texture::create_depth_texture(&self.device, [WIDTH, HEIGHT], "test depth")
    }

    /// Copy `texture` into a buffer and wait until it can be read.
    pub async fn read_back(
        &self,
        mut encoder: wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) -> image::RgbaImage {
        let u32_size = std::mem::size_of::<u32>() as u32;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (u32_size * WIDTH * HEIGHT) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("Test Output Buffer"),
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    // 256 px * 4 bytes already meets the 256 byte row alignment
                    bytes_per_row: Some(u32_size * WIDTH),
                    rows_per_image: Some(HEIGHT),
                },
            },
            extent(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        self.device.poll(wgpu::PollType::Wait).unwrap();
        rx.receive().await.unwrap().unwrap();

        let data = buffer_slice.get_mapped_range().to_vec();
        output_buffer.unmap();
        image::RgbaImage::from_raw(WIDTH, HEIGHT, data).unwrap()
    }
}

pub fn extent() -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: WIDTH,
        height: HEIGHT,
        depth_or_array_layers: 1,
    }
}

pub fn to_pixel(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}

/// A fresh asset directory holding a small JPEG for every scene texture.
pub fn scene_asset_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("textures")).unwrap();

    let img = RgbImage::from_fn(8, 8, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([220, 210, 180])
        } else {
            Rgb([120, 90, 60])
        }
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut bytes, ImageFormat::Jpeg)
        .unwrap();
    for (file, _) in SCENE_TEXTURES {
        std::fs::write(dir.join(file), bytes.get_ref()).unwrap();
    }
    dir
}
