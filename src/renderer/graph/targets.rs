//! Helpers shared by the passes: screen-sized targets, compute pipelines and
//! dispatch sizing.

use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::core::uniforms::DispatchParams;
use crate::renderer::pipeline::shader_manager::WORKGROUP_SIZE;

use wgpu::util::DeviceExt;

/// Creates a texture the size of the surface.
pub(crate) fn screen_texture(
    ctx: &GpuContext,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> GpuTexture {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: ctx.width,
            height: ctx.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

/// Usage of a target written by a compute pass and read by later ones.
pub(crate) const STORAGE_TARGET: wgpu::TextureUsages =
    wgpu::TextureUsages::STORAGE_BINDING.union(wgpu::TextureUsages::TEXTURE_BINDING);

pub(crate) fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts: &[Some(bind_group_layout)],
        immediate_size: 0,
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&layout),
        module,
        entry_point: Some("cs_main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    })
}

/// Uniform buffer holding one [`DispatchParams`].
pub(crate) fn dispatch_params_buffer(device: &wgpu::Device, label: &str, params: DispatchParams) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&params),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

/// Workgroup counts covering a `width × height` image.
#[inline]
#[must_use]
pub fn workgroups(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE))
}

/// Records one compute pass with a single dispatch per bind group.
pub(crate) fn dispatch_each<'a>(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::ComputePipeline,
    bind_groups: impl IntoIterator<Item = &'a wgpu::BindGroup>,
    (width, height): (u32, u32),
) {
    let (x, y) = workgroups(width, height);
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some(label),
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    for bind_group in bind_groups {
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(x, y, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroups_cover_partial_tiles() {
        assert_eq!(workgroups(8, 8), (1, 1));
        assert_eq!(workgroups(9, 17), (2, 3));
        assert_eq!(workgroups(1920, 1080), (240, 135));
    }
}
