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

//! Stage layouts synthesized for materials without a text definition.

use super::context::CompilationContext;
use tessera_core::{
    material::{AlphaGen, ColorGen, LightmapMode, Material, Stage, StateBits},
    renderer::{ImageHandle, ImageProvider},
};

fn image_stage(image: ImageHandle, image_name: &str, rgb_gen: ColorGen, state: StateBits) -> Stage {
    let mut stage = Stage {
        active: true,
        rgb_gen,
        state_bits: state,
        src_blend: state.src_blend(),
        dst_blend: state.dst_blend(),
        ..Default::default()
    };
    stage.bundles[0].set_image(image);
    stage.bundles[0].image_name = image_name.to_string();
    stage
}

/// Fills `material` with the stages that draw `image` under its lightmap mode.
///
/// Numeric lightmap modes must already be validated against the loaded
/// lightmap count.
pub fn install_image_stages(
    material: &mut Material,
    image: ImageHandle,
    image_name: &str,
    images: &dyn ImageProvider,
) {
    let modulate = StateBits::SRCBLEND_DST_COLOR | StateBits::DSTBLEND_ZERO;

    match material.lightmap {
        LightmapMode::None => {
            material.stages[0] =
                image_stage(image, image_name, ColorGen::LightingDiffuse, StateBits::DEFAULT);
        }
        LightmapMode::ByVertex => {
            let mut stage = image_stage(image, image_name, ColorGen::ExactVertex, StateBits::DEFAULT);
            stage.alpha_gen = AlphaGen::Skip;
            material.stages[0] = stage;
        }
        LightmapMode::TwoD => {
            // User interface art: vertex colours, alpha blended, no depth test.
            let mut stage = image_stage(
                image,
                image_name,
                ColorGen::Vertex,
                StateBits::DEPTHTEST_DISABLE
                    | StateBits::SRCBLEND_SRC_ALPHA
                    | StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA,
            );
            stage.alpha_gen = AlphaGen::Vertex;
            material.stages[0] = stage;
        }
        LightmapMode::WhiteImage => {
            material.stages[0] = image_stage(
                images.white_image(),
                "",
                ColorGen::IdentityLighting,
                StateBits::DEFAULT,
            );
            material.stages[1] = image_stage(image, image_name, ColorGen::Identity, modulate);
        }
        LightmapMode::Index(page) => {
            let lightmap = images.lightmap(page).unwrap_or_else(|| images.white_image());
            let mut stage = image_stage(lightmap, "", ColorGen::Identity, StateBits::DEFAULT);
            stage.bundles[0].is_lightmap = true;
            material.stages[0] = stage;
            material.stages[1] = image_stage(image, image_name, ColorGen::Identity, modulate);
        }
    }
}

/// Replaces whatever a failed parse left behind with the `<default>` look.
pub fn install_default_content(ctx: &mut CompilationContext<'_>) {
    ctx.reset_material();
    ctx.material.stages[0] = image_stage(
        ctx.images.default_image(),
        "",
        ColorGen::IdentityLighting,
        StateBits::DEFAULT,
    );
}
