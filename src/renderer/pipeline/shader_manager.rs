//! Shader Library
//!
//! Serves the WGSL programs of the frame pipeline. Sources are minijinja templates
//! looked up in an optional override directory first and then in the set embedded
//! into the binary. Compiled modules are cached by the xxh3-128 hash of their final
//! source.
//!
//! ## Template syntax
//!
//! | Construct  | Delimiters          | Example                          |
//! |------------|---------------------|----------------------------------|
//! | Block      | `{$ ... $}`         | `{$ include "common" $}`         |
//! | Variable   | `{{ ... }}`         | `@workgroup_size({{ workgroup_size }}, ...)` |
//! | Line stmt  | `$$`                | `$$ if max_shadow_maps > 0`      |
//!
//! Includes resolve against `chunks/`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Error, ErrorKind};
use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::{Result, UmbraError};

/// Side length of the 2D workgroups used by every compute program.
pub const WORKGROUP_SIZE: u32 = 8;

#[derive(RustEmbed)]
#[folder = "src/renderer/pipeline/shaders"]
struct ShaderAssets;

/// Values every template can reference.
#[derive(Debug, Clone, Serialize)]
pub struct ShaderDefines {
    pub workgroup_size: u32,
    pub max_shadow_maps: u32,
}

fn template_file_name(name: &str) -> Cow<'_, str> {
    if Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    }
}

fn load_source(override_dir: Option<&Path>, name: &str) -> std::result::Result<Option<String>, Error> {
    let filename = template_file_name(name);

    if let Some(dir) = override_dir {
        let path = dir.join(filename.as_ref());
        if path.exists() {
            return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                Error::new(
                    ErrorKind::TemplateNotFound,
                    format!("Failed to read {}: {e}", path.display()),
                )
            });
        }
    }

    if let Some(file) = ShaderAssets::get(&filename)
        && let Ok(source) = std::str::from_utf8(file.data.as_ref())
    {
        return Ok(Some(source.to_string()));
    }

    Ok(None)
}

/// Template environment plus compiled-module cache.
pub struct ShaderLibrary {
    env: Environment<'static>,
    defines: ShaderDefines,
    /// xxh3-128 of final WGSL → compiled module.
    module_cache: FxHashMap<u128, wgpu::ShaderModule>,
}

impl ShaderLibrary {
    pub fn new(override_dir: Option<PathBuf>, defines: ShaderDefines) -> Result<Self> {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .map_err(|e| UmbraError::ShaderTemplate {
                name: "<syntax>".to_string(),
                message: e.to_string(),
            })?;

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        env.set_loader(move |name| load_source(override_dir.as_deref(), name));
        env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());

        Ok(Self {
            env,
            defines,
            module_cache: FxHashMap::default(),
        })
    }

    #[inline]
    #[must_use]
    pub fn defines(&self) -> &ShaderDefines {
        &self.defines
    }

    /// Renders the template `name` to its final WGSL source.
    pub fn source(&self, name: &str) -> Result<String> {
        let template = self.env.get_template(name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                UmbraError::ShaderNotFound(name.to_string())
            } else {
                UmbraError::ShaderTemplate {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        template
            .render(&self.defines)
            .map_err(|e| UmbraError::ShaderTemplate {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Compiles the template `name` (or returns the cached module).
    pub fn module(&mut self, device: &wgpu::Device, name: &str) -> Result<wgpu::ShaderModule> {
        let source = self.source(name)?;
        let hash = xxh3_128(source.as_bytes());

        let module = self.module_cache.entry(hash).or_insert_with(|| {
            log::debug!("Compiling shader '{name}'");
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("Shader Module {name}")),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });

        Ok(module.clone())
    }

    /// Returns the number of cached shader modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.module_cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> ShaderLibrary {
        ShaderLibrary::new(
            None,
            ShaderDefines {
                workgroup_size: WORKGROUP_SIZE,
                max_shadow_maps: 4,
            },
        )
        .unwrap()
    }

    #[test]
    fn embedded_programs_render() {
        let shaders = library();
        for name in [
            "geometry",
            "id_resolve",
            "shadow",
            "texture_accumulator",
            "lighting",
            "shadow_composite",
            "composite",
            "present",
        ] {
            let source = shaders.source(name).unwrap();
            assert!(!source.contains("{$"), "{name} has unexpanded blocks");
            assert!(!source.contains("{{"), "{name} has unexpanded variables");
        }
    }

    #[test]
    fn defines_are_substituted() {
        let source = library().source("lighting").unwrap();
        assert!(source.contains("@workgroup_size(8, 8, 1)"));
    }

    #[test]
    fn unknown_program_is_not_found() {
        assert!(matches!(
            library().source("does_not_exist"),
            Err(UmbraError::ShaderNotFound(_))
        ));
    }
}
