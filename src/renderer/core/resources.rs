//! Resource Uploader
//!
//! Turns a [`FlattenedScene`] into GPU buffers, textures and samplers in one
//! all-or-nothing step. Every array becomes one buffer; arrays that are empty are
//! padded with a single zeroed element so that every binding stays valid.

use std::borrow::Cow;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::assets::{DecodedImage, ImageLoader};
use crate::errors::Result;
use crate::ingest::{CameraData, DEFAULT_SAMPLER, DrawCall, FlattenedScene, GpuLight, SamplerTexturePair};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::error_scope;
use crate::scene::SamplerDesc;

/// Camera buffer contents: one `projection * view` per camera. Cameras without an
/// aspect ratio of their own take `surface_aspect`.
#[must_use]
pub fn camera_matrices(cameras: &[CameraData], surface_aspect: f32) -> Vec<Mat4> {
    cameras
        .iter()
        .map(|camera| camera.view_projection_for(surface_aspect))
        .collect()
}

/// Returns `items`, or a single zeroed element when it is empty.
fn padded<T: bytemuck::Pod>(items: &[T]) -> Cow<'_, [T]> {
    if items.is_empty() {
        Cow::Owned(vec![T::zeroed()])
    } else {
        Cow::Borrowed(items)
    }
}

/// GPU texture plus its default view.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, image: &DecodedImage) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.bytes_per_row()),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

fn create_sampler(device: &wgpu::Device, label: &str, desc: &SamplerDesc) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: desc.address_mode_u.into(),
        address_mode_v: desc.address_mode_v.into(),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: desc.mag_filter.into(),
        min_filter: desc.min_filter.into(),
        mipmap_filter: desc.mipmap_filter.into(),
        ..Default::default()
    })
}

/// Everything the frame pipeline reads from the loaded scene.
///
/// Passes clone the handles they bind; this struct stays the owner of record.
pub struct GpuScene {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub camera_buffer: wgpu::Buffer,
    pub transform_buffer: wgpu::Buffer,
    pub instance_property_buffer: wgpu::Buffer,
    pub material_buffer: wgpu::Buffer,
    /// The sampler-texture pair table. No program reads it; the accumulator binds
    /// each pair's texture and sampler directly. Kept resident for readback.
    pub pair_buffer: wgpu::Buffer,
    /// One uniform buffer per light, same order as `lights`.
    pub light_buffers: Vec<wgpu::Buffer>,
    /// Storage array of every light.
    pub lights_buffer: wgpu::Buffer,
    /// One texture per texture URI.
    pub textures: Vec<GpuTexture>,
    /// 1×1 white texture bound when no pair exists.
    pub fallback_texture: GpuTexture,
    pub samplers: Vec<wgpu::Sampler>,
    pub default_sampler: wgpu::Sampler,
    pub draw_calls: Vec<DrawCall>,
    pub lights: Vec<GpuLight>,
    pub cameras: Vec<CameraData>,
    pub sampler_texture_pairs: Vec<SamplerTexturePair>,
}

impl GpuScene {
    /// Uploads `scene`. Images are decoded through `loader` before any GPU object
    /// is created; validation errors raised while creating objects abort the load.
    pub fn upload(ctx: &GpuContext, scene: &FlattenedScene, loader: &dyn ImageLoader) -> Result<Self> {
        let images = scene
            .texture_uris
            .iter()
            .map(|uri| loader.load(uri))
            .collect::<Result<Vec<_>>>()?;

        let gpu_scene = error_scope::capture_setup(&ctx.device, "scene upload", || {
            Ok(Self::create(ctx, scene, &images))
        })?;

        log::info!(
            "Uploaded scene: {} draw calls, {} lights, {} textures, {} samplers",
            gpu_scene.draw_calls.len(),
            gpu_scene.lights.len(),
            gpu_scene.textures.len(),
            gpu_scene.samplers.len()
        );
        Ok(gpu_scene)
    }

    fn create(ctx: &GpuContext, scene: &FlattenedScene, images: &[DecodedImage]) -> Self {
        let device = &ctx.device;
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;

        let buffer = |label: &str, contents: &[u8], usage: wgpu::BufferUsages| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        };

        let vertex_buffer = buffer(
            "Scene Vertices",
            bytemuck::cast_slice(&padded(&scene.vertices)),
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = buffer(
            "Scene Indices",
            bytemuck::cast_slice(&padded(&scene.indices)),
            wgpu::BufferUsages::INDEX,
        );
        let camera_buffer = buffer(
            "Scene Cameras",
            bytemuck::cast_slice(&padded(&camera_matrices(&scene.cameras, ctx.aspect_ratio()))),
            storage | wgpu::BufferUsages::COPY_SRC,
        );
        let transform_buffer = buffer(
            "Scene Transforms",
            bytemuck::cast_slice(&padded(&scene.transforms)),
            storage,
        );
        let instance_property_buffer = buffer(
            "Scene Instance Properties",
            bytemuck::cast_slice(&padded(&scene.instance_properties)),
            storage,
        );
        let material_buffer = buffer(
            "Scene Materials",
            bytemuck::cast_slice(&padded(&scene.materials)),
            storage,
        );
        let pair_buffer = buffer(
            "Scene Sampler-Texture Pairs",
            bytemuck::cast_slice(&padded(&scene.sampler_texture_pairs)),
            storage | wgpu::BufferUsages::COPY_SRC,
        );

        let light_buffers = scene
            .lights
            .iter()
            .enumerate()
            .map(|(index, light)| {
                buffer(
                    &format!("Light {index}"),
                    bytemuck::bytes_of(light),
                    wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                )
            })
            .collect();
        let lights_buffer = buffer(
            "Scene Lights",
            bytemuck::cast_slice(&padded(&scene.lights)),
            storage,
        );

        let textures = images
            .iter()
            .zip(&scene.texture_uris)
            .map(|(image, uri)| GpuTexture::from_image(device, &ctx.queue, uri, image))
            .collect();
        let fallback_texture = GpuTexture::from_image(
            device,
            &ctx.queue,
            "Fallback Texture",
            &DecodedImage::solid([255; 4]),
        );

        let samplers = scene
            .samplers
            .iter()
            .enumerate()
            .map(|(index, desc)| create_sampler(device, &format!("Sampler {index}"), desc))
            .collect();
        let default_sampler = create_sampler(device, "Default Sampler", &SamplerDesc::default());

        Self {
            vertex_buffer,
            index_buffer,
            camera_buffer,
            transform_buffer,
            instance_property_buffer,
            material_buffer,
            pair_buffer,
            light_buffers,
            lights_buffer,
            textures,
            fallback_texture,
            samplers,
            default_sampler,
            draw_calls: scene.draw_calls.clone(),
            lights: scene.lights.clone(),
            cameras: scene.cameras.clone(),
            sampler_texture_pairs: scene.sampler_texture_pairs.clone(),
        }
    }

    /// Rewrites the camera buffer for the surface of `ctx`. Only cameras without an
    /// aspect ratio of their own change.
    pub fn write_cameras(&self, ctx: &GpuContext) {
        if self.cameras.is_empty() {
            return;
        }
        let matrices = camera_matrices(&self.cameras, ctx.aspect_ratio());
        ctx.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&matrices));
    }

    #[inline]
    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Texture view and sampler a pair resolves to.
    ///
    /// [`DEFAULT_SAMPLER`] (or any out-of-range sampler) selects the default sampler.
    #[must_use]
    pub fn pair_resources(&self, pair: SamplerTexturePair) -> (&wgpu::TextureView, &wgpu::Sampler) {
        let view = self
            .textures
            .get(pair.texture_index as usize)
            .map_or(&self.fallback_texture.view, |texture| &texture.view);
        let sampler = if pair.sampler_index == DEFAULT_SAMPLER {
            &self.default_sampler
        } else {
            self.samplers
                .get(pair.sampler_index as usize)
                .unwrap_or(&self.default_sampler)
        };
        (view, sampler)
    }
}
