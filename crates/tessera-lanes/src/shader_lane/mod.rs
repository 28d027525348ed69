// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The shader lane: material text in, optimized [`Material`] out.
//!
//! Compilation is a pure function of the text, the settings and the image
//! collaborators, all reached through an explicit [`CompilationContext`].
//! Interning and naming live in the shader agent.
//!
//! [`Material`]: tessera_core::material::Material

mod collapse;
mod compiler;
mod context;
mod defaults;
mod error;
mod keywords;
mod optimizer;
mod tokenizer;

#[cfg(test)]
pub(crate) mod testing;

pub use self::collapse::collapse_multitexture;
pub use self::compiler::{parse_material, parse_stage};
pub use self::context::{CompilationContext, SunLight};
pub use self::defaults::{install_default_content, install_image_stages};
pub use self::error::ShaderError;
pub use self::optimizer::{
    classify_fog_pass, collapse_to_vertex_lighting, finish_material, select_iterator,
};
pub use self::tokenizer::{atof, Tokenizer};

/// Compiles the definition at the tokenizer position and finishes it.
///
/// When the text is rejected the material receives default content and is
/// flagged as defaulted; it is finished either way. The error is returned
/// after it has been logged.
pub fn compile_material(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
) -> Result<(), ShaderError> {
    let parsed = parse_material(ctx, tokens);

    if let Err(err) = &parsed {
        if err.is_fatal() {
            log::error!("{}", err);
        } else {
            log::warn!("{}", err);
        }
        install_default_content(ctx);
        ctx.material.default_shader = true;
    } else if ctx.settings.print_shaders {
        log::info!("*SHADER* {}", ctx.material.name);
    }

    finish_material(ctx);
    parsed
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeAtlas, FakeImages};
    use super::*;
    use tessera_core::material::{sort_order, LightmapMode, StageIterator};
    use tessera_core::RenderSettings;

    #[test]
    fn test_rejected_text_is_finished_as_default() {
        let settings = RenderSettings::default();
        let mut images = FakeImages::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("bad", LightmapMode::None, &settings, &mut images, &mut atlas);
        let mut tokens = Tokenizer::new("{\n{\nmap missing\n}\n}");

        let result = compile_material(&mut ctx, &mut tokens);

        assert!(matches!(result, Err(ShaderError::ImageNotFound { .. })));
        let material = ctx.into_material();
        assert!(material.default_shader);
        assert!(!material.explicitly_defined);
        assert_eq!(material.num_unfogged_passes, 1);
        assert_eq!(material.iterator, StageIterator::Generic);
    }

    #[test]
    fn test_stageless_sky_sorts_as_fog() {
        let settings = RenderSettings::default();
        let mut images = FakeImages::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("env/sky", LightmapMode::None, &settings, &mut images, &mut atlas);
        let mut tokens = Tokenizer::new("{\nskyparms env/sky 512 -\n}");

        let result = compile_material(&mut ctx, &mut tokens);

        assert!(result.is_ok());
        let material = ctx.into_material();
        assert!(material.is_sky);
        assert!(!material.default_shader);
        assert_eq!(material.num_unfogged_passes, 0);
        assert_eq!(material.sort, sort_order::FOG);
        assert_eq!(material.iterator, StageIterator::Sky);
    }

    #[test]
    fn test_rejected_text_keeps_settings_derived_fields() {
        let settings = RenderSettings {
            multitexture_env: false,
            ..Default::default()
        };
        let mut images = FakeImages::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("bad", LightmapMode::None, &settings, &mut images, &mut atlas);
        let mut tokens = Tokenizer::new("{\n{\nmap missing\n}\n}");

        let result = compile_material(&mut ctx, &mut tokens);

        assert!(result.is_err());
        let material = ctx.into_material();
        assert!(material.default_shader);
        assert!(!material.multitexture_env);
    }
}
