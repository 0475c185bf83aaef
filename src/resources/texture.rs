//! Texture image loading and the tagged texture slot registry.
//!
//! A texture load goes through four steps: read the file, decode and validate
//! the image, upload it through a [`TextureFactory`], and register the result
//! under a tag in a [`TextureRegistry`]. Any failing step leaves the registry
//! exactly as it was.

use std::path::Path;

use image::DynamicImage;

use crate::{data_structures::texture::{create_default_sampler, Texture}, resources::load_binary};

/// Number of texture slots available to the scene.
pub const MAX_TEXTURE_SLOTS: usize = 16;

#[derive(thiserror::Error, Debug)]
pub enum TextureError {
    #[error("could not read image {file}: {reason}")]
    Io { file: String, reason: String },
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("not implemented to handle image with {0} channels")]
    UnsupportedChannels(u8),
    #[error("all {max} texture slots are in use", max = MAX_TEXTURE_SLOTS)]
    SlotsExhausted,
    #[error("texture tag '{0}' is already registered")]
    DuplicateTag(String),
    #[error("could not upload texture: {0}")]
    Upload(String),
}

/// A decoded image ready for upload, always stored as RGBA8.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub rgba: image::RgbaImage,
    /// Channel count of the source file (3 for RGB, 4 for RGBA).
    pub channels: u8,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}

/// Decode an image file's contents and check that it has a supported channel layout.
///
/// The primitive meshes put the UV origin at the bottom-left corner, so images
/// are normally flipped vertically on load.
pub fn decode_image(bytes: &[u8], flip_vertically: bool) -> Result<DecodedImage, TextureError> {
    let img = image::load_from_memory(bytes)?;
    let channels = img.color().channel_count();
    if channels != 3 && channels != 4 {
        return Err(TextureError::UnsupportedChannels(channels));
    }
    let img: DynamicImage = if flip_vertically { img.flipv() } else { img };

    Ok(DecodedImage {
        rgba: img.to_rgba8(),
        channels,
    })
}

/// Turns decoded images into whatever the registry stores.
///
/// On the GPU this uploads the pixels and builds a bind group; tests can use a
/// plain counter instead.
pub trait TextureFactory {
    type Texture;

    fn create(&mut self, image: &DecodedImage, label: &str) -> anyhow::Result<Self::Texture>;
}

/// A scene texture together with the bind group that exposes it to the shader.
#[derive(Debug)]
pub struct BoundTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

pub struct GpuTextureFactory<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub layout: &'a wgpu::BindGroupLayout,
}

impl TextureFactory for GpuTextureFactory<'_> {
    type Texture = BoundTexture;

    fn create(&mut self, image: &DecodedImage, label: &str) -> anyhow::Result<BoundTexture> {
        check_dimensions(image, self.device.limits().max_texture_dimension_2d)?;
        let texture = Texture::from_rgba(
            self.device,
            self.queue,
            image.rgba.as_raw(),
            [image.width(), image.height()],
            Some(label),
        );
        Ok(bind_texture(self.device, self.layout, texture, label))
    }
}

/// Fails when either side of `image` exceeds `max_dimension`.
pub fn check_dimensions(image: &DecodedImage, max_dimension: u32) -> anyhow::Result<()> {
    if image.width() > max_dimension || image.height() > max_dimension {
        anyhow::bail!(
            "image is {}x{}, the device allows at most {}x{}",
            image.width(),
            image.height(),
            max_dimension,
            max_dimension
        );
    }
    Ok(())
}

pub fn bind_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: Texture,
    label: &str,
) -> BoundTexture {
    let fallback_sampler;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback_sampler = create_default_sampler(device);
            &fallback_sampler
        }
    };
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some(label),
    });
    BoundTexture {
        texture,
        bind_group,
    }
}

pub fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Object texture_bind_group_layout"),
    })
}

#[derive(Debug)]
struct TextureSlot<T> {
    tag: String,
    texture: T,
}

/// Loaded textures addressed by tag. Slots are handed out in registration order.
#[derive(Debug)]
pub struct TextureRegistry<T> {
    slots: Vec<TextureSlot<T>>,
}

impl<T> Default for TextureRegistry<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> TextureRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `tag` could be registered right now.
    pub fn check_available(&self, tag: &str) -> Result<(), TextureError> {
        if self.find_slot(tag).is_some() {
            return Err(TextureError::DuplicateTag(tag.to_string()));
        }
        if self.slots.len() >= MAX_TEXTURE_SLOTS {
            return Err(TextureError::SlotsExhausted);
        }
        Ok(())
    }

    /// Store `texture` in the next free slot and return the slot index.
    pub fn register(&mut self, tag: &str, texture: T) -> Result<usize, TextureError> {
        self.check_available(tag)?;
        self.slots.push(TextureSlot {
            tag: tag.to_string(),
            texture,
        });
        Ok(self.slots.len() - 1)
    }

    pub fn find_slot(&self, tag: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.tag == tag)
    }

    pub fn find(&self, tag: &str) -> Option<&T> {
        self.slots
            .iter()
            .find(|slot| slot.tag == tag)
            .map(|slot| &slot.texture)
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot).map(|slot| &slot.texture)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.slots
            .iter()
            .map(|slot| (slot.tag.as_str(), &slot.texture))
    }

    /// Release every registered texture.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Decode, upload and register an image that is already in memory.
pub fn create_texture_from_bytes<F: TextureFactory>(
    registry: &mut TextureRegistry<F::Texture>,
    factory: &mut F,
    bytes: &[u8],
    tag: &str,
) -> Result<usize, TextureError> {
    registry.check_available(tag)?;
    let image = decode_image(bytes, true)?;
    let texture = factory
        .create(&image, tag)
        .map_err(|e| TextureError::Upload(e.to_string()))?;
    let slot = registry.register(tag, texture)?;
    log::info!(
        "Successfully loaded image '{}' into slot {}, width: {}, height: {}, channels: {}",
        tag,
        slot,
        image.width(),
        image.height(),
        image.channels
    );
    Ok(slot)
}

/// Load `file_name` from `asset_dir` and register it under `tag`.
///
/// Either exactly one slot is added, or the error is logged and the registry
/// is left untouched.
pub async fn create_texture<F: TextureFactory>(
    registry: &mut TextureRegistry<F::Texture>,
    factory: &mut F,
    asset_dir: &Path,
    file_name: &str,
    tag: &str,
) -> Result<usize, TextureError> {
    #[cfg(not(target_arch = "wasm32"))]
    if let Ok(cwd) = std::env::current_dir() {
        log::debug!("Runtime working directory: {}", cwd.display());
    }
    log::info!("Attempting to load image: {}", file_name);

    let result = match load_binary(asset_dir, file_name).await {
        Ok(bytes) => create_texture_from_bytes(registry, factory, &bytes, tag),
        Err(e) => Err(TextureError::Io {
            file: asset_dir.join(file_name).display().to_string(),
            reason: e.to_string(),
        }),
    };
    if let Err(e) = &result {
        log::error!("Could not load image {}: {}", file_name, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{GrayImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    /// Hands out increasing ids instead of GPU textures.
    #[derive(Default)]
    struct CountingFactory {
        created: u32,
    }

    impl TextureFactory for CountingFactory {
        type Texture = u32;

        fn create(&mut self, _: &DecodedImage, _: &str) -> anyhow::Result<u32> {
            self.created += 1;
            Ok(self.created)
        }
    }

    struct FailingFactory;

    impl TextureFactory for FailingFactory {
        type Texture = u32;

        fn create(&mut self, _: &DecodedImage, _: &str) -> anyhow::Result<u32> {
            anyhow::bail!("device lost")
        }
    }

    /// Enforces a device texture size limit, like the GPU factory does.
    struct LimitedFactory {
        max_dimension: u32,
        created: u32,
    }

    impl TextureFactory for LimitedFactory {
        type Texture = u32;

        fn create(&mut self, image: &DecodedImage, _: &str) -> anyhow::Result<u32> {
            check_dimensions(image, self.max_dimension)?;
            self.created += 1;
            Ok(self.created)
        }
    }

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn rgb_png() -> Vec<u8> {
        let mut img = RgbImage::new(2, 2);
        // top row red, bottom row blue
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        img.put_pixel(1, 1, Rgb([0, 0, 255]));
        png_bytes(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn decodes_rgb_and_flips_vertically() {
        let decoded = decode_image(&rgb_png(), true).unwrap();
        assert_eq!(decoded.channels, 3);
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
        assert_eq!(*decoded.rgba.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*decoded.rgba.get_pixel(0, 1), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn decodes_rgba() {
        let img = RgbaImage::from_pixel(3, 1, Rgba([10, 20, 30, 40]));
        let decoded = decode_image(&png_bytes(DynamicImage::ImageRgba8(img)), false).unwrap();
        assert_eq!(decoded.channels, 4);
        assert_eq!(*decoded.rgba.get_pixel(2, 0), Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn rejects_single_channel_images() {
        let img = GrayImage::new(4, 4);
        let result = decode_image(&png_bytes(DynamicImage::ImageLuma8(img)), true);
        assert!(matches!(result, Err(TextureError::UnsupportedChannels(1))));
    }

    #[test]
    fn rejects_garbage() {
        let result = decode_image(b"definitely not an image", true);
        assert!(matches!(result, Err(TextureError::Decode(_))));
    }

    #[test]
    fn successful_load_registers_one_slot() {
        let mut registry = TextureRegistry::new();
        let mut factory = CountingFactory::default();

        let first = create_texture_from_bytes(&mut registry, &mut factory, &rgb_png(), "ComputerCase");
        let second = create_texture_from_bytes(&mut registry, &mut factory, &rgb_png(), "CRTScreen");

        assert_eq!(first.unwrap(), 0);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find_slot("CRTScreen"), Some(1));
        assert_eq!(registry.find("ComputerCase"), Some(&1));
        assert_eq!(registry.find_slot("TableTexture"), None);
    }

    #[test]
    fn failed_decode_leaves_registry_unchanged() {
        let mut registry = TextureRegistry::new();
        let mut factory = CountingFactory::default();
        create_texture_from_bytes(&mut registry, &mut factory, &rgb_png(), "ComputerCase").unwrap();

        let gray = png_bytes(DynamicImage::ImageLuma8(GrayImage::new(1, 1)));
        let result = create_texture_from_bytes(&mut registry, &mut factory, &gray, "Gray");

        assert!(result.is_err());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_slot("Gray"), None);
        assert_eq!(factory.created, 1);
    }

    #[test]
    fn failed_upload_leaves_registry_unchanged() {
        let mut registry = TextureRegistry::new();
        let result = create_texture_from_bytes(&mut registry, &mut FailingFactory, &rgb_png(), "CRTScreen");

        assert!(matches!(result, Err(TextureError::Upload(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut registry = TextureRegistry::new();
        registry.register("TableTexture", 7).unwrap();

        let result = registry.register("TableTexture", 8);
        assert!(matches!(result, Err(TextureError::DuplicateTag(_))));
        assert_eq!(registry.get(0), Some(&7));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn slot_limit_is_enforced() {
        let mut registry = TextureRegistry::new();
        for i in 0..MAX_TEXTURE_SLOTS {
            assert_eq!(registry.register(&format!("tex{i}"), i).unwrap(), i);
        }

        let result = registry.register("one-too-many", 99);
        assert!(matches!(result, Err(TextureError::SlotsExhausted)));
        assert_eq!(registry.len(), MAX_TEXTURE_SLOTS);
        assert_eq!(registry.find_slot("one-too-many"), None);
    }

    #[test]
    fn clear_releases_every_slot() {
        let mut registry = TextureRegistry::new();
        registry.register("a", 1).unwrap();
        registry.register("b", 2).unwrap();
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.register("b", 3).unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_file_leaves_registry_unchanged() {
        let mut registry = TextureRegistry::new();
        let mut factory = CountingFactory::default();
        let dir = std::env::temp_dir().join("retro-desk-no-textures");

        let result = create_texture(
            &mut registry,
            &mut factory,
            &dir,
            "textures/computer_case_texture_2.jpg",
            "ComputerCase",
        )
        .await;

        assert!(matches!(result, Err(TextureError::Io { .. })));
        assert!(registry.is_empty());
        assert_eq!(factory.created, 0);
    }

    #[tokio::test]
    async fn loads_texture_from_asset_dir() {
        let dir = std::env::temp_dir().join("retro-desk-texture-assets");
        std::fs::create_dir_all(dir.join("textures")).unwrap();
        std::fs::write(dir.join("textures/case.png"), rgb_png()).unwrap();

        let mut registry = TextureRegistry::new();
        let mut factory = CountingFactory::default();
        let slot = create_texture(&mut registry, &mut factory, &dir, "textures/case.png", "ComputerCase")
            .await
            .unwrap();

        assert_eq!(slot, 0);
        assert_eq!(registry.iter().map(|(tag, _)| tag).collect::<Vec<_>>(), vec!["ComputerCase"]);
    }

    #[test]
    fn oversized_image_is_rejected_before_upload() {
        let mut registry = TextureRegistry::new();
        let mut factory = LimitedFactory {
            max_dimension: 4,
            created: 0,
        };
        let wide = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(8, 2)));

        let result = create_texture_from_bytes(&mut registry, &mut factory, &wide, "TableTexture");

        assert!(matches!(result, Err(TextureError::Upload(_))));
        assert_eq!(factory.created, 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn image_at_the_size_limit_is_accepted() {
        let mut registry = TextureRegistry::new();
        let mut factory = LimitedFactory {
            max_dimension: 4,
            created: 0,
        };
        let tall = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(4, 5)));
        let square = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));

        assert!(create_texture_from_bytes(&mut registry, &mut factory, &tall, "tall").is_err());
        assert_eq!(
            create_texture_from_bytes(&mut registry, &mut factory, &square, "square").unwrap(),
            0
        );
        assert_eq!(registry.find_slot("square"), Some(0));
    }
}
