use rustc_hash::FxHashMap;

use crate::errors::{Result, UmbraError};
use crate::scene::{MaterialDesc, SceneDescription, TextureInfo};

use super::types::{DEFAULT_SAMPLER, GpuMaterial, SamplerTexturePair, TextureRef, TextureSlot};

/// Deduplicates (sampler, image) combinations in first-reference order.
#[derive(Debug, Default)]
pub(crate) struct PairInterner {
    pairs: Vec<SamplerTexturePair>,
    lookup: FxHashMap<SamplerTexturePair, u32>,
}

impl PairInterner {
    pub(crate) fn intern(&mut self, pair: SamplerTexturePair) -> u32 {
        *self.lookup.entry(pair).or_insert_with(|| {
            self.pairs.push(pair);
            (self.pairs.len() - 1) as u32
        })
    }

    pub(crate) fn into_pairs(self) -> Vec<SamplerTexturePair> {
        self.pairs
    }
}

/// Converts every material of `desc`, resolving texture slots into pair indices.
pub(crate) fn convert_materials(
    desc: &SceneDescription,
    interner: &mut PairInterner,
) -> Result<Vec<GpuMaterial>> {
    desc.materials
        .iter()
        .enumerate()
        .map(|(index, material)| convert_material(desc, index, material, interner))
        .collect()
}

fn convert_material(
    desc: &SceneDescription,
    material_index: usize,
    material: &MaterialDesc,
    interner: &mut PairInterner,
) -> Result<GpuMaterial> {
    let mut gpu = GpuMaterial {
        base_color_factor: material.base_color_factor,
        emissive_factor: material.emissive_factor,
        metallic: material.metallic_factor,
        roughness: material.roughness_factor,
        ..Default::default()
    };

    let slots = [
        (TextureSlot::BaseColor, material.base_color_texture),
        (TextureSlot::MetallicRoughness, material.metallic_roughness_texture),
        (TextureSlot::Normal, material.normal_texture),
        (TextureSlot::Occlusion, material.occlusion_texture),
        (TextureSlot::Emissive, material.emissive_texture),
    ];

    let mut flags = gpu.flags();
    for (slot, info) in slots {
        let Some(info) = info else {
            continue;
        };
        gpu.textures[slot as usize] = resolve_texture(desc, material_index, info, interner)?;
        flags |= slot.flag();
    }
    gpu.flags = flags.bits();

    Ok(gpu)
}

fn resolve_texture(
    desc: &SceneDescription,
    material_index: usize,
    info: TextureInfo,
    interner: &mut PairInterner,
) -> Result<TextureRef> {
    let texture = desc
        .textures
        .get(info.texture)
        .ok_or(UmbraError::IndexOutOfBounds {
            context: "material texture reference",
            index: info.texture,
        })?;

    if texture.image >= desc.images.len() {
        return Err(UmbraError::IndexOutOfBounds {
            context: "texture image",
            index: texture.image,
        });
    }

    let sampler_index = match texture.sampler {
        Some(sampler) if sampler >= desc.samplers.len() => {
            return Err(UmbraError::IndexOutOfBounds {
                context: "texture sampler",
                index: sampler,
            });
        }
        Some(sampler) => sampler as u32,
        None => DEFAULT_SAMPLER,
    };

    if info.tex_coord != 0 {
        log::warn!(
            "Material #{material_index} samples UV set {}; only set 0 is carried per vertex",
            info.tex_coord
        );
    }

    let index = interner.intern(SamplerTexturePair {
        sampler_index,
        texture_index: texture.image as u32,
    });

    Ok(TextureRef {
        index,
        uv_set: info.tex_coord,
    })
}
