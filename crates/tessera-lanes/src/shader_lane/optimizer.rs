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

//! Post-parse passes that turn a parsed material into its final form.
//!
//! [`finish_material`] runs every pass in order:
//!
//! 1. stage validation, default texture coordinates, fog colour adjustment
//!    and the implicit sort bucket,
//! 2. the vertex-lighting collapse, when enabled,
//! 3. the multitexture collapse into the atlas,
//! 4. pass counting, iterator selection and fog pass classification.

use super::collapse::collapse_multitexture;
use super::context::{shader_warn, CompilationContext};
use tessera_core::material::{
    sort_order, AlphaGen, ColorGen, ContentFlags, FogAdjust, FogPass, LightmapMode, Material,
    Stage, StageIterator, StateBits, TcGen, WaveFunc, MAX_SHADER_STAGES,
};

/// Runs the finish pass and every optimizer pass on `ctx.material`.
pub fn finish_material(ctx: &mut CompilationContext<'_>) {
    if ctx.material.is_sky {
        ctx.material.sort = sort_order::ENVIRONMENT;
    }
    if ctx.material.polygon_offset && ctx.material.sort == sort_order::BAD {
        ctx.material.sort = sort_order::DECAL;
    }

    let mut count = finish_stages(ctx);

    if ctx.material.sort == sort_order::BAD {
        ctx.material.sort = sort_order::OPAQUE;
    }

    let mut has_lightmap_stage = ctx.material.has_lightmap_stage();
    if count > 1 && ctx.settings.collapse_to_vertex_light() {
        collapse_to_vertex_lighting(&mut ctx.material);
        count = 1;
        has_lightmap_stage = false;
    }

    collapse_multitexture(ctx);

    if ctx.material.lightmap.is_numeric() && !has_lightmap_stage {
        log::debug!(
            "shader '{}' has lightmap but no lightmap stage",
            ctx.material.name
        );
        ctx.material.lightmap = LightmapMode::None;
    }

    ctx.material.num_unfogged_passes = count;
    if count == 0 {
        ctx.material.sort = sort_order::FOG;
    }

    ctx.material.iterator = select_iterator(&ctx.material);
    ctx.material.fog_pass = classify_fog_pass(&ctx.material);
}

/// Validates the active stages and returns how many remain.
fn finish_stages(ctx: &mut CompilationContext<'_>) -> usize {
    let mut index = 0;
    while index < MAX_SHADER_STAGES && ctx.material.stages[index].active {
        let stage = &ctx.material.stages[index];

        if stage.bundles[0].image().is_none() {
            shader_warn!(
                ctx,
                "shader '{}' has a stage with no image",
                ctx.material.name
            );
            ctx.material.stages[index].active = false;
            break;
        }

        if stage.is_detail && !ctx.settings.detail_textures {
            let stages = &mut ctx.material.stages;
            stages[index..].rotate_left(1);
            stages[MAX_SHADER_STAGES - 1] = Stage::default();
            continue;
        }

        let stage0_blended = ctx.material.stages[0].state_bits.is_blended();
        let stage = &mut ctx.material.stages[index];

        if stage.bundles[0].tc_gen == TcGen::Bad {
            stage.bundles[0].tc_gen = if stage.bundles[0].is_lightmap {
                TcGen::Lightmap
            } else {
                TcGen::Texture
            };
        }

        if stage.state_bits.is_blended() && stage0_blended {
            stage.fog_adjust = fog_adjust(stage.state_bits);
            if ctx.material.sort == sort_order::BAD {
                // An alpha-tested grate keeps its depth writes.
                ctx.material.sort = if stage.state_bits.contains(StateBits::DEPTHMASK_TRUE) {
                    sort_order::SEE_THROUGH
                } else {
                    sort_order::BLEND0
                };
            }
        }

        index += 1;
    }
    index
}

fn fog_adjust(state: StateBits) -> FogAdjust {
    let pair = (state.src_blend(), state.dst_blend());
    if pair == (StateBits::SRCBLEND_ONE, StateBits::DSTBLEND_ONE)
        || pair == (StateBits::SRCBLEND_ZERO, StateBits::DSTBLEND_ONE_MINUS_SRC_COLOR)
    {
        FogAdjust::ModulateRgb
    } else if pair == (StateBits::SRCBLEND_SRC_ALPHA, StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA) {
        FogAdjust::ModulateAlpha
    } else if pair == (StateBits::SRCBLEND_ONE, StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA) {
        FogAdjust::ModulateRgba
    } else {
        FogAdjust::None
    }
}

fn vertex_light_rank(stage: &Stage) -> i32 {
    let bundle = &stage.bundles[0];
    let mut rank = 0;
    if bundle.is_lightmap {
        rank -= 100;
    }
    if bundle.tc_gen != TcGen::Texture {
        rank -= 5;
    }
    if !bundle.tex_mods.is_empty() {
        rank -= 5;
    }
    if !matches!(stage.rgb_gen, ColorGen::Identity | ColorGen::IdentityLighting) {
        rank -= 3;
    }
    rank
}

/// Reduces a multi-stage material to one pass lit by vertex colours.
pub fn collapse_to_vertex_lighting(material: &mut Material) {
    if material.sort == sort_order::OPAQUE {
        let mut best = 0;
        let mut best_rank = i32::MIN;
        for (index, stage) in material.stages.iter().enumerate() {
            if !stage.active {
                break;
            }
            let rank = vertex_light_rank(stage);
            if rank > best_rank {
                best_rank = rank;
                best = index;
            }
        }

        let bundle = material.stages[best].bundles[0].clone();
        let lightmap = material.lightmap;
        let stage = &mut material.stages[0];
        stage.bundles[0] = bundle;
        stage.state_bits = stage
            .state_bits
            .difference(StateBits::SRCBLEND_BITS | StateBits::DSTBLEND_BITS)
            | StateBits::DEPTHMASK_TRUE;
        stage.src_blend = StateBits::NONE;
        stage.dst_blend = StateBits::NONE;
        stage.rgb_gen = if lightmap == LightmapMode::None {
            ColorGen::LightingDiffuse
        } else {
            ColorGen::ExactVertex
        };
        stage.alpha_gen = AlphaGen::Skip;
    } else {
        // Never keep a lightmap as the only pass.
        if material.stages[0].bundles[0].is_lightmap {
            material.stages[0] = material.stages[1].clone();
        }

        let (first, second) = (&material.stages[0], &material.stages[1]);
        let cross_fade = first.rgb_gen == ColorGen::OneMinusEntity
            || second.rgb_gen == ColorGen::OneMinusEntity
            || (first.has_rgb_wave(WaveFunc::Sawtooth)
                && second.has_rgb_wave(WaveFunc::InverseSawtooth))
            || (first.has_rgb_wave(WaveFunc::InverseSawtooth)
                && second.has_rgb_wave(WaveFunc::Sawtooth));
        if cross_fade {
            material.stages[0].rgb_gen = ColorGen::IdentityLighting;
        }
    }

    for stage in material.stages.iter_mut().skip(1) {
        if !stage.active {
            break;
        }
        *stage = Stage::default();
    }
}

/// Picks the batching routine for a finished material.
pub fn select_iterator(material: &Material) -> StageIterator {
    if material.is_sky {
        return StageIterator::Sky;
    }
    if material.num_unfogged_passes != 1 {
        return StageIterator::Generic;
    }

    let stage = &material.stages[0];
    let plain = !material.polygon_offset && material.deforms.is_empty();

    if plain
        && stage.rgb_gen == ColorGen::LightingDiffuse
        && stage.alpha_gen == AlphaGen::Identity
        && stage.bundles[0].tc_gen == TcGen::Texture
        && !material.multitexture_env
    {
        return StageIterator::VertexLitTexture;
    }

    if plain
        && stage.rgb_gen == ColorGen::Identity
        && stage.alpha_gen == AlphaGen::Identity
        && stage.bundles[0].tc_gen == TcGen::Texture
        && stage.bundles[1].tc_gen == TcGen::Lightmap
        && material.multitexture_env
    {
        return StageIterator::LightmappedMultitexture;
    }

    StageIterator::Generic
}

/// How fog is drawn over surfaces of this material.
pub fn classify_fog_pass(material: &Material) -> FogPass {
    if material.sort <= sort_order::OPAQUE {
        FogPass::Equal
    } else if material.content_flags.contains(ContentFlags::FOG) {
        FogPass::LessEqual
    } else {
        FogPass::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_lane::compiler::parse_material;
    use crate::shader_lane::testing::{FakeAtlas, FakeImages};
    use crate::shader_lane::tokenizer::Tokenizer;
    use tessera_core::material::Waveform;
    use tessera_core::renderer::ImageHandle;
    use tessera_core::RenderSettings;

    fn build(text: &str, lightmap: LightmapMode, settings: &RenderSettings) -> Material {
        let mut images = FakeImages::with_images(&["a", "b", "c"]);
        images.lightmaps = 4;
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("m", lightmap, settings, &mut images, &mut atlas);
        parse_material(&mut ctx, &mut Tokenizer::new(text)).unwrap();
        finish_material(&mut ctx);
        ctx.into_material()
    }

    fn lit_stage(image: u32) -> Stage {
        let mut stage = Stage {
            active: true,
            ..Default::default()
        };
        stage.bundles[0].set_image(ImageHandle(image));
        stage
    }

    #[test]
    fn test_opaque_lightmapped_material() {
        let material = build(
            "{\n{\nmap a\nblendFunc GL_ONE GL_ZERO\n}\n{\nmap $lightmap\nblendFunc filter\n}\n}",
            LightmapMode::Index(0),
            &RenderSettings::default(),
        );

        let stage = &material.stages[0];
        assert!(stage.state_bits.contains(StateBits::DEPTHMASK_TRUE));
        assert!(!stage.state_bits.is_blended());
        assert_eq!(material.sort, sort_order::OPAQUE);
        assert_eq!(material.num_unfogged_passes, 2);
        assert_eq!(material.stages[1].bundles[0].tc_gen, TcGen::Lightmap);
        assert_eq!(material.iterator, StageIterator::Generic);
        assert_eq!(material.fog_pass, FogPass::Equal);
        assert_eq!(material.lightmap, LightmapMode::Index(0));
    }

    #[test]
    fn test_blended_material_sorts_as_blend() {
        let material = build(
            "{\n{\nmap a\nblendFunc add\n}\n{\nmap b\nblendFunc blend\n}\n}",
            LightmapMode::None,
            &RenderSettings::default(),
        );
        assert_eq!(material.sort, sort_order::BLEND0);
        assert_eq!(material.stages[0].fog_adjust, FogAdjust::ModulateRgb);
        assert_eq!(material.stages[1].fog_adjust, FogAdjust::ModulateAlpha);
        assert_eq!(material.fog_pass, FogPass::None);
    }

    #[test]
    fn test_sky_and_decal_sorts() {
        let sky = build(
            "{\nskyparms - 0 -\n{\nmap a\n}\n}",
            LightmapMode::None,
            &RenderSettings::default(),
        );
        assert_eq!(sky.sort, sort_order::ENVIRONMENT);
        assert_eq!(sky.iterator, StageIterator::Sky);

        let bare_sky = build("{\nskyparms - 0 -\n}", LightmapMode::None, &RenderSettings::default());
        assert_eq!(bare_sky.sort, sort_order::FOG);
        assert_eq!(bare_sky.iterator, StageIterator::Sky);
        assert_eq!(bare_sky.num_unfogged_passes, 0);

        let decal = build(
            "{\npolygonOffset\n{\nmap a\nblendFunc blend\n}\n}",
            LightmapMode::None,
            &RenderSettings::default(),
        );
        assert_eq!(decal.sort, sort_order::DECAL);
    }

    #[test]
    fn test_fog_volume_has_no_passes() {
        let fog = build(
            "{\nsurfaceparm fog\nfogparms ( 1 1 1 ) 200\n}",
            LightmapMode::None,
            &RenderSettings::default(),
        );
        assert_eq!(fog.sort, sort_order::FOG);
        assert_eq!(fog.fog_pass, FogPass::LessEqual);
    }

    #[test]
    fn test_detail_stage_dropped_when_disabled() {
        let settings = RenderSettings {
            detail_textures: false,
            ..Default::default()
        };
        let material = build(
            "{\n{\nmap a\n}\n{\nmap b\ndetail\n}\n{\nmap c\n}\n}",
            LightmapMode::None,
            &settings,
        );
        assert_eq!(material.num_unfogged_passes, 2);
        assert_eq!(material.stages[1].bundles[0].image_name, "c");
        assert!(!material.stages[2].active);
    }

    #[test]
    fn test_missing_lightmap_stage_downgrades_mode() {
        let material = build("{\n{\nmap a\n}\n}", LightmapMode::Index(2), &RenderSettings::default());
        assert_eq!(material.lightmap, LightmapMode::None);
    }

    #[test]
    fn test_vertex_light_collapse_keeps_best_texture() {
        let settings = RenderSettings {
            vertex_light: true,
            ..Default::default()
        };
        let material = build(
            "{\n{\nmap $lightmap\n}\n{\nmap a\nblendFunc filter\n}\n}",
            LightmapMode::Index(0),
            &settings,
        );

        assert_eq!(material.num_unfogged_passes, 1);
        assert_eq!(material.active_stage_count(), 1);
        let stage = &material.stages[0];
        assert_eq!(stage.bundles[0].image_name, "a");
        assert_eq!(stage.rgb_gen, ColorGen::ExactVertex);
        assert_eq!(stage.alpha_gen, AlphaGen::Skip);
        assert!(!stage.state_bits.is_blended());
        assert_eq!(material.lightmap, LightmapMode::None);
    }

    #[test]
    fn test_vertex_light_collapse_neutralises_cross_fade() {
        let mut material = Material::new("fade", LightmapMode::None);
        material.sort = sort_order::BLEND0;
        let wave = |func| Waveform {
            func,
            ..Default::default()
        };
        material.stages[0] = lit_stage(1);
        material.stages[0].rgb_gen = ColorGen::Waveform(wave(WaveFunc::InverseSawtooth));
        material.stages[1] = lit_stage(2);
        material.stages[1].rgb_gen = ColorGen::Waveform(wave(WaveFunc::Sawtooth));

        collapse_to_vertex_lighting(&mut material);

        assert_eq!(material.stages[0].rgb_gen, ColorGen::IdentityLighting);
        assert_eq!(material.active_stage_count(), 1);
    }

    #[test]
    fn test_fast_path_selection() {
        let mut material = Material::new("fast", LightmapMode::None);
        material.stages[0] = lit_stage(1);
        material.stages[0].rgb_gen = ColorGen::LightingDiffuse;
        material.stages[0].bundles[0].tc_gen = TcGen::Texture;
        material.num_unfogged_passes = 1;
        assert_eq!(select_iterator(&material), StageIterator::VertexLitTexture);

        material.deforms.push(tessera_core::material::Deform::Autosprite);
        assert_eq!(select_iterator(&material), StageIterator::Generic);
        material.deforms.clear();

        material.multitexture_env = true;
        material.stages[0].rgb_gen = ColorGen::Identity;
        material.stages[0].bundles[1].tc_gen = TcGen::Lightmap;
        assert_eq!(select_iterator(&material), StageIterator::LightmappedMultitexture);

        material.polygon_offset = true;
        assert_eq!(select_iterator(&material), StageIterator::Generic);
    }
}
