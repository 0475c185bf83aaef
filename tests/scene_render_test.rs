#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
use common::test_utils::{Headless, headless_device, scene_asset_dir, to_pixel};
#[cfg(feature = "integration-tests")]
use retro_desk::{
    render::FrameResources,
    resources::{
        mesh::{GpuMeshLoader, Primitive},
        texture::{BoundTexture, GpuTextureFactory},
    },
    scene::SceneManager,
};

#[cfg(feature = "integration-tests")]
async fn prepared(gpu: &mut Headless, scene: &mut SceneManager<BoundTexture>) -> usize {
    let mut factory = GpuTextureFactory {
        device: &gpu.device,
        queue: &gpu.queue,
        layout: gpu.renderer.texture_layout(),
    };
    let mut meshes = GpuMeshLoader {
        device: &gpu.device,
        meshes: &mut gpu.meshes,
    };
    let loaded = scene.prepare_scene(&mut factory, &mut meshes).await;
    gpu.light.update(scene.lights().clone(), &gpu.queue);
    loaded
}

#[cfg(feature = "integration-tests")]
fn render_frame(
    gpu: &mut Headless,
    scene: &mut SceneManager<BoundTexture>,
    clear_colour: wgpu::Color,
) -> (wgpu::CommandEncoder, wgpu::Texture, usize) {
    let colour = gpu.colour_target();
    let depth = gpu.depth_target();

    scene.render_scene();
    gpu.renderer.prepare(&gpu.device, &gpu.queue, scene.draws());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Test Encoder"),
        });
    let frame = FrameResources {
        meshes: &gpu.meshes,
        textures: scene.textures(),
        camera_bind_group: &gpu.camera.bind_group,
        light_bind_group: &gpu.light.bind_group,
    };
    let issued = gpu.renderer.encode_pass(
        &mut encoder,
        &colour.create_view(&wgpu::TextureViewDescriptor::default()),
        &depth.view,
        clear_colour,
        scene.draws(),
        &frame,
    );
    (encoder, colour, issued)
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn renders_the_desk_over_the_clear_colour() {
    let Some((device, queue)) = headless_device().await else {
        eprintln!("no graphics adapter, skipping");
        return;
    };
    let mut gpu = Headless::new(device, queue);
    let mut scene = SceneManager::new(scene_asset_dir("retro-desk-render-test"));

    assert_eq!(prepared(&mut gpu, &mut scene).await, 3);
    assert!(Primitive::ALL.iter().all(|p| gpu.meshes.is_loaded(*p)));

    let clear = wgpu::Color {
        r: 1.0,
        g: 0.0,
        b: 1.0,
        a: 1.0,
    };
    let (encoder, colour, issued) = render_frame(&mut gpu, &mut scene, clear);
    assert_eq!(issued, 88);

    let img = gpu.read_back(encoder, &colour).await;
    let background = to_pixel(clear);
    let covered = img.pixels().filter(|p| **p != background).count();
    // the table alone fills the lower half of the view
    assert!(
        covered > img.pixels().len() / 4,
        "only {} of {} pixels were drawn",
        covered,
        img.pixels().len()
    );
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn missing_textures_still_draw_every_primitive() {
    let Some((device, queue)) = headless_device().await else {
        eprintln!("no graphics adapter, skipping");
        return;
    };
    let mut gpu = Headless::new(device, queue);
    let empty = std::env::temp_dir().join("retro-desk-render-test-no-assets");
    let mut scene = SceneManager::new(empty);

    assert_eq!(prepared(&mut gpu, &mut scene).await, 0);
    assert!(scene.textures().is_empty());

    for _ in 0..2 {
        let (encoder, _, issued) = render_frame(&mut gpu, &mut scene, wgpu::Color::BLACK);
        assert_eq!(issued, 88);
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
