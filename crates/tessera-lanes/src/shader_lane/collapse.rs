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

//! Multitexture collapse into the shared texture atlas.
//!
//! The textured stages of a material are flattened into one RGBA image that
//! is registered in the atlas under the material name. Raster and ray
//! tracing paths that cannot run the stage pipeline sample that image
//! through the rectangle stored in [`Material::atlas`].
//!
//! [`Material::atlas`]: tessera_core::material::Material::atlas

use super::context::CompilationContext;
use image::{imageops, imageops::FilterType, RgbaImage};
use tessera_core::{
    material::{AtlasRect, Stage, StateBits, TcGen},
    math::next_power_of_two,
};

/// Builds the combined image of the material and records its atlas region.
pub fn collapse_multitexture(ctx: &mut CompilationContext<'_>) {
    let stages: Vec<&Stage> = ctx
        .material
        .stages
        .iter()
        .take_while(|stage| stage.active)
        .collect();

    let reflective = stages
        .iter()
        .any(|stage| stage.bundles[0].tc_gen == TcGen::EnvironmentMapped);
    let lit: Vec<&Stage> = stages
        .iter()
        .copied()
        .filter(|stage| stage.is_lit_texture())
        .collect();

    let combined = if lit.len() == 1 || ctx.material.is_sky {
        lit.iter()
            .filter_map(|stage| stage_image(ctx, stage))
            .last()
    } else {
        accumulate(ctx, &lit)
    };

    if reflective {
        ctx.material.has_reflection = true;
    }

    let Some(combined) = combined else {
        return;
    };
    let name = ctx.material.name.clone();
    ctx.atlas
        .register_atlas_region(&name, combined.width(), combined.height(), combined.as_raw());

    if let Some(region) = ctx.atlas.find_atlas_region(&name) {
        ctx.material.atlas = AtlasRect {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        };
    }
}

/// Sums the additive stages into the first lit stage that has pixels.
fn accumulate(ctx: &CompilationContext<'_>, lit: &[&Stage]) -> Option<RgbaImage> {
    let mut remaining = lit.iter();
    let mut accumulator = remaining.by_ref().find_map(|stage| stage_image(ctx, stage))?;

    for stage in remaining {
        if stage.state_bits.dst_blend() != StateBits::DSTBLEND_ONE {
            continue;
        }
        let Some(mut layer) = stage_image(ctx, stage) else {
            continue;
        };
        if layer.dimensions() != accumulator.dimensions() {
            log::debug!(
                "resampling '{}' to {}x{} while collapsing '{}'",
                stage.bundles[0].image_name,
                accumulator.width(),
                accumulator.height(),
                ctx.material.name
            );
            layer = imageops::resize(
                &layer,
                accumulator.width(),
                accumulator.height(),
                FilterType::Triangle,
            );
        }
        for (dst, src) in accumulator.iter_mut().zip(layer.iter()) {
            *dst = dst.saturating_add(*src);
        }
    }
    Some(accumulator)
}

/// The power-of-two CPU image of a stage, alpha adjusted for additive blending.
fn stage_image(ctx: &CompilationContext<'_>, stage: &Stage) -> Option<RgbaImage> {
    let source = ctx.images.image_pixels(stage.bundles[0].image()?)?;
    if !source.is_valid() {
        return None;
    }
    let image = RgbaImage::from_raw(source.width, source.height, source.pixels)?;

    let width = next_power_of_two(image.width());
    let height = next_power_of_two(image.height());
    let mut image = if (width, height) == image.dimensions() {
        image
    } else {
        imageops::resize(&image, width, height, FilterType::Triangle)
    };

    let additive = stage.state_bits.src_blend() == StateBits::SRCBLEND_ONE
        && stage.state_bits.dst_blend() == StateBits::DSTBLEND_ONE;
    if additive {
        for pixel in image.pixels_mut() {
            let [r, g, b, _] = pixel.0;
            pixel.0[3] = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
        }
    }
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_lane::testing::{FakeAtlas, FakeImages};
    use tessera_core::material::LightmapMode;
    use tessera_core::RenderSettings;

    fn textured_stage(images: &FakeImages, name: &str, state: StateBits) -> Stage {
        let mut stage = Stage {
            active: true,
            state_bits: state,
            ..Default::default()
        };
        stage.bundles[0].image_name = name.to_string();
        stage.bundles[0].tc_gen = TcGen::Texture;
        if let Some(handle) = images.handle(name) {
            stage.bundles[0].set_image(handle);
        }
        stage
    }

    #[test]
    fn test_single_additive_stage_gets_mean_alpha() {
        let mut images = FakeImages::default();
        images.add_pixels("glow", 3, 2, [30, 60, 90, 255]);
        let stage = textured_stage(
            &images,
            "glow",
            StateBits::SRCBLEND_ONE | StateBits::DSTBLEND_ONE,
        );
        let settings = RenderSettings::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("m", LightmapMode::None, &settings, &mut images, &mut atlas);
        ctx.material.stages[0] = stage;

        collapse_multitexture(&mut ctx);

        assert_eq!(
            ctx.material.atlas,
            AtlasRect {
                x: 0,
                y: 0,
                width: 4,
                height: 2
            }
        );
        let region = &atlas.regions["m"];
        assert_eq!(region.pixels.len(), 4 * 2 * 4);
        assert!(region.pixels.chunks(4).all(|p| p[3] == 60));
    }

    #[test]
    fn test_additive_layers_saturate() {
        let mut images = FakeImages::default();
        images.add_pixels("base", 2, 2, [200, 10, 0, 255]);
        images.add_pixels("add", 4, 4, [100, 10, 0, 0]);
        images.add_pixels("filter", 2, 2, [1, 1, 1, 1]);
        let base = textured_stage(&images, "base", StateBits::DEFAULT);
        let add = textured_stage(&images, "add", StateBits::SRCBLEND_ONE | StateBits::DSTBLEND_ONE);
        let filter = textured_stage(
            &images,
            "filter",
            StateBits::SRCBLEND_DST_COLOR | StateBits::DSTBLEND_ZERO,
        );
        let settings = RenderSettings::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("m", LightmapMode::None, &settings, &mut images, &mut atlas);
        ctx.material.stages[0] = base;
        ctx.material.stages[1] = add;
        ctx.material.stages[2] = filter;

        collapse_multitexture(&mut ctx);

        assert_eq!(ctx.material.atlas.width, 2);
        let region = &atlas.regions["m"];
        assert_eq!(&region.pixels[..4], &[255, 20, 0, 255]);
    }

    #[test]
    fn test_sky_takes_the_last_lit_stage() {
        let mut images = FakeImages::default();
        images.add_pixels("clouds", 2, 2, [200, 10, 0, 255]);
        images.add_pixels("stars", 2, 2, [5, 6, 7, 255]);
        let clouds = textured_stage(&images, "clouds", StateBits::DEFAULT);
        let stars = textured_stage(&images, "stars", StateBits::DEFAULT);
        let settings = RenderSettings::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("m", LightmapMode::None, &settings, &mut images, &mut atlas);
        ctx.material.is_sky = true;
        ctx.material.stages[0] = clouds;
        ctx.material.stages[1] = stars;

        collapse_multitexture(&mut ctx);

        let region = &atlas.regions["m"];
        assert!(region.pixels.chunks(4).all(|p| p == [5, 6, 7, 255]));
    }

    #[test]
    fn test_nothing_registered_without_pixels() {
        let mut images = FakeImages::with_images(&["plain"]);
        let mut stage = textured_stage(&images, "plain", StateBits::DEFAULT);
        stage.bundles[0].tc_gen = TcGen::Texture;
        let mut env = Stage {
            active: true,
            ..Default::default()
        };
        env.bundles[0].tc_gen = TcGen::EnvironmentMapped;
        let settings = RenderSettings::default();
        let mut atlas = FakeAtlas::default();
        let mut ctx = CompilationContext::new("m", LightmapMode::None, &settings, &mut images, &mut atlas);
        ctx.material.stages[0] = stage;
        ctx.material.stages[1] = env;

        collapse_multitexture(&mut ctx);

        assert!(ctx.material.has_reflection);
        assert!(!ctx.material.atlas.is_set());
        assert!(atlas.regions.is_empty());
    }
}
