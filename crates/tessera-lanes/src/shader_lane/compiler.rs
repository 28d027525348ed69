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

//! Parser for material definition blocks.
//!
//! The grammar is line oriented: every line inside a block starts with a
//! keyword, and nested `{ ... }` blocks describe stages. Keywords with bad
//! or missing arguments are reported and skipped; only the conditions listed
//! in [`ShaderError`] reject the whole material.

use super::context::{shader_warn, CompilationContext, SunLight};
use super::error::ShaderError;
use super::keywords;
use super::tokenizer::{atof, Tokenizer};
use tessera_core::{
    material::{
        sort_order, surface::find_info_parm, AlphaGen, ColorGen, ContentFlags, CullType,
        Deform, LightmapMode, Stage, StateBits, TcGen, TexMod, TextureBundle, Waveform,
        MAX_IMAGE_ANIMATIONS, MAX_SHADER_DEFORMS, MAX_SHADER_STAGES, SKY_BOX_SUFFIXES,
    },
    math::{degrees_to_radians, Vec3},
    renderer::ImageHandle,
};

/// Parses one material block into `ctx.material`.
///
/// `tokens` must be positioned just after the material name, before the
/// opening brace.
pub fn parse_material(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
) -> Result<(), ShaderError> {
    let token = tokens.next_token(true);
    if !token.starts_with('{') {
        return Err(ShaderError::MissingOpenBrace {
            material: ctx.material.name.clone(),
            found: token.to_string(),
        });
    }

    let mut stage_count = 0;
    loop {
        let token = tokens.next_token(true);
        if token.is_empty() {
            return Err(ShaderError::UnterminatedMaterial {
                material: ctx.material.name.clone(),
            });
        }

        if token.starts_with('}') {
            break;
        } else if token.starts_with('{') {
            if stage_count >= MAX_SHADER_STAGES {
                return Err(ShaderError::TooManyStages {
                    material: ctx.material.name.clone(),
                });
            }
            let mut stage = parse_stage(ctx, tokens)?;
            stage.active = true;
            ctx.material.stages[stage_count] = stage;
            stage_count += 1;
        } else if has_prefix(token, "qer") {
            tokens.skip_rest_of_line();
        } else if token.eq_ignore_ascii_case("q3map_sun") {
            parse_sun(ctx, tokens);
        } else if token.eq_ignore_ascii_case("deformVertexes") {
            parse_deform(ctx, tokens);
        } else if token.eq_ignore_ascii_case("tesssize") {
            tokens.skip_rest_of_line();
        } else if token.eq_ignore_ascii_case("clampTime") {
            let value = tokens.next_token(false);
            if !value.is_empty() {
                ctx.material.clamp_time = atof(value);
            }
        } else if has_prefix(token, "q3map") {
            tokens.skip_rest_of_line();
        } else if token.eq_ignore_ascii_case("surfaceParm") {
            let name = tokens.next_token(false);
            if let Some(parm) = find_info_parm(name) {
                ctx.material.surface_flags |= parm.surface_flags;
                ctx.material.content_flags |= parm.contents;
            }
        } else if token.eq_ignore_ascii_case("nomipmaps") {
            ctx.material.no_mip_maps = true;
            ctx.material.no_pic_mip = true;
        } else if token.eq_ignore_ascii_case("nopicmip") {
            ctx.material.no_pic_mip = true;
        } else if token.eq_ignore_ascii_case("polygonOffset") {
            ctx.material.polygon_offset = true;
        } else if token.eq_ignore_ascii_case("entityMergable") {
            ctx.material.entity_mergable = true;
        } else if token.eq_ignore_ascii_case("fogParms") {
            let mut color = [0.0; 3];
            if !parse_vector(ctx, tokens, &mut color) {
                return Err(ShaderError::MalformedFogParms {
                    material: ctx.material.name.clone(),
                });
            }
            ctx.material.fog_parms.color = Vec3::from_array(color);

            let depth = tokens.next_token(false);
            if depth.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parm for 'fogParms' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            ctx.material.fog_parms.depth_for_opaque = atof(depth);
            // Older files carry gradient directions after the depth.
            tokens.skip_rest_of_line();
        } else if token.eq_ignore_ascii_case("portal") || token.eq_ignore_ascii_case("reflect") {
            ctx.material.has_reflection = true;
        } else if token.eq_ignore_ascii_case("skyparms") {
            parse_sky_parms(ctx, tokens);
        } else if token.eq_ignore_ascii_case("light") {
            tokens.next_token(false);
        } else if token.eq_ignore_ascii_case("cull") {
            parse_cull(ctx, tokens);
        } else if token.eq_ignore_ascii_case("sort") {
            parse_sort(ctx, tokens);
        } else {
            return Err(ShaderError::UnknownMaterialKeyword {
                material: ctx.material.name.clone(),
                keyword: token.to_string(),
            });
        }
    }

    if stage_count == 0
        && !ctx.material.is_sky
        && !ctx.material.content_flags.contains(ContentFlags::FOG)
    {
        return Err(ShaderError::NoStages {
            material: ctx.material.name.clone(),
        });
    }

    ctx.material.explicitly_defined = true;
    Ok(())
}

/// Parses a stage block, the opening brace already consumed.
pub fn parse_stage(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
) -> Result<Stage, ShaderError> {
    let mut stage = Stage {
        active: true,
        ..Default::default()
    };
    let mut depth_mask = StateBits::DEPTHMASK_TRUE;
    let mut depth_mask_explicit = false;
    let mut blend_src = StateBits::NONE;
    let mut blend_dst = StateBits::NONE;
    let mut alpha_test = StateBits::NONE;
    let mut depth_func = StateBits::NONE;
    let mut explicit_alpha_identity = false;

    loop {
        let token = tokens.next_token(true);
        if token.is_empty() {
            return Err(ShaderError::UnterminatedStage {
                material: ctx.material.name.clone(),
            });
        }
        if token.starts_with('}') {
            break;
        }

        if token.eq_ignore_ascii_case("map") {
            let name = tokens.next_token(false);
            if name.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parameter for 'map' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            if name.eq_ignore_ascii_case("$whiteimage") {
                stage.bundles[0].set_image(ctx.images.white_image());
            } else if name.eq_ignore_ascii_case("$lightmap") {
                let image = match ctx.material.lightmap {
                    LightmapMode::Index(page) => ctx.images.lightmap(page),
                    _ => None,
                }
                .unwrap_or_else(|| ctx.images.white_image());
                stage.bundles[0].is_lightmap = true;
                stage.bundles[0].set_image(image);
                ctx.material.is_lit_surface = true;
            } else {
                load_stage_image(ctx, &mut stage.bundles[0], name)?;
            }
        } else if token.eq_ignore_ascii_case("clampmap") {
            let name = tokens.next_token(false);
            if name.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parameter for 'clampmap' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            load_stage_image(ctx, &mut stage.bundles[0], name)?;
        } else if token.eq_ignore_ascii_case("animMap") {
            let speed = tokens.next_token(false);
            if speed.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parameter for 'animMap' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            let bundle = &mut stage.bundles[0];
            bundle.image_animation_speed = atof(speed);
            bundle.images.clear();
            loop {
                let frame = tokens.next_token(false);
                if frame.is_empty() {
                    break;
                }
                if bundle.images.len() >= MAX_IMAGE_ANIMATIONS {
                    continue;
                }
                let mipmaps = !ctx.material.no_mip_maps;
                let picmip = !ctx.material.no_pic_mip;
                match ctx.images.find_or_load_image(frame, mipmaps, picmip) {
                    Some(image) => {
                        bundle.push_frame(image);
                    }
                    None => {
                        return Err(ShaderError::ImageNotFound {
                            material: ctx.material.name.clone(),
                            image: frame.to_string(),
                        })
                    }
                }
            }
        } else if token.eq_ignore_ascii_case("videoMap") {
            let name = tokens.next_token(false);
            if name.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parameter for 'videoMap' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            if let Some(image) = ctx.images.play_cinematic(name) {
                stage.bundles[0].is_video_map = true;
                stage.bundles[0].set_image(image);
            }
        } else if token.eq_ignore_ascii_case("alphaFunc") {
            let name = tokens.next_token(false);
            if name.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parameter for 'alphaFunc' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            alpha_test = keywords::alpha_func(name).unwrap_or_else(|| {
                shader_warn!(
                    ctx,
                    "invalid alphaFunc name '{}' in shader '{}'",
                    name,
                    ctx.material.name
                );
                StateBits::NONE
            });
        } else if token.eq_ignore_ascii_case("depthfunc") {
            let name = tokens.next_token(false);
            if name.is_empty() {
                shader_warn!(
                    ctx,
                    "missing parameter for 'depthfunc' keyword in shader '{}'",
                    ctx.material.name
                );
                continue;
            }
            if name.eq_ignore_ascii_case("lequal") {
                depth_func = StateBits::NONE;
            } else if name.eq_ignore_ascii_case("equal") {
                depth_func = StateBits::DEPTHFUNC_EQUAL;
            } else {
                shader_warn!(
                    ctx,
                    "unknown depthfunc '{}' in shader '{}'",
                    name,
                    ctx.material.name
                );
            }
        } else if token.eq_ignore_ascii_case("detail") {
            stage.is_detail = true;
        } else if token.eq_ignore_ascii_case("blendfunc") {
            let first = tokens.next_token(false);
            if first.is_empty() {
                shader_warn!(ctx, "missing parm for blendFunc in shader '{}'", ctx.material.name);
                continue;
            }
            if first.eq_ignore_ascii_case("add") {
                blend_src = StateBits::SRCBLEND_ONE;
                blend_dst = StateBits::DSTBLEND_ONE;
            } else if first.eq_ignore_ascii_case("filter") {
                blend_src = StateBits::SRCBLEND_DST_COLOR;
                blend_dst = StateBits::DSTBLEND_ZERO;
            } else if first.eq_ignore_ascii_case("blend") {
                blend_src = StateBits::SRCBLEND_SRC_ALPHA;
                blend_dst = StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA;
            } else {
                blend_src = keywords::src_blend(first).unwrap_or_else(|| {
                    shader_warn!(
                        ctx,
                        "unknown blend mode '{}' in shader '{}', substituting GL_ONE",
                        first,
                        ctx.material.name
                    );
                    StateBits::SRCBLEND_ONE
                });
                let second = tokens.next_token(false);
                if second.is_empty() {
                    shader_warn!(ctx, "missing parm for blendFunc in shader '{}'", ctx.material.name);
                    continue;
                }
                blend_dst = keywords::dst_blend(second).unwrap_or_else(|| {
                    shader_warn!(
                        ctx,
                        "unknown blend mode '{}' in shader '{}', substituting GL_ONE",
                        second,
                        ctx.material.name
                    );
                    StateBits::DSTBLEND_ONE
                });
            }
            // Blended stages stop writing depth unless asked to.
            if !depth_mask_explicit {
                depth_mask = StateBits::NONE;
            }
        } else if token.eq_ignore_ascii_case("rgbGen") {
            parse_rgb_gen(ctx, tokens, &mut stage);
        } else if token.eq_ignore_ascii_case("alphaGen") {
            if parse_alpha_gen(ctx, tokens, &mut stage) {
                explicit_alpha_identity = stage.alpha_gen == AlphaGen::Identity;
            }
        } else if token.eq_ignore_ascii_case("texgen") || token.eq_ignore_ascii_case("tcGen") {
            parse_tc_gen(ctx, tokens, &mut stage.bundles[0]);
        } else if token.eq_ignore_ascii_case("tcMod") {
            let line = tokens.rest_of_line_tokens();
            parse_tex_mod(ctx, &line, &mut stage.bundles[0])?;
        } else if token.eq_ignore_ascii_case("depthwrite") {
            depth_mask = StateBits::DEPTHMASK_TRUE;
            depth_mask_explicit = true;
        } else {
            return Err(ShaderError::UnknownStageKeyword {
                material: ctx.material.name.clone(),
                keyword: token.to_string(),
            });
        }
    }

    if stage.rgb_gen == ColorGen::Bad {
        stage.rgb_gen = if blend_src == StateBits::NONE
            || blend_src == StateBits::SRCBLEND_ONE
            || blend_src == StateBits::SRCBLEND_SRC_ALPHA
        {
            ColorGen::IdentityLighting
        } else {
            ColorGen::Identity
        };
    }

    // GL_ONE GL_ZERO is plain opaque drawing.
    if blend_src == StateBits::SRCBLEND_ONE && blend_dst == StateBits::DSTBLEND_ZERO {
        blend_src = StateBits::NONE;
        blend_dst = StateBits::NONE;
        depth_mask = StateBits::DEPTHMASK_TRUE;
    }

    if explicit_alpha_identity
        && matches!(stage.rgb_gen, ColorGen::Identity | ColorGen::LightingDiffuse)
    {
        stage.alpha_gen = AlphaGen::Skip;
    }

    stage.state_bits = depth_mask | blend_src | blend_dst | alpha_test | depth_func;
    stage.src_blend = blend_src;
    stage.dst_blend = blend_dst;
    Ok(stage)
}

fn has_prefix(token: &str, prefix: &str) -> bool {
    token
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn load_stage_image(
    ctx: &mut CompilationContext<'_>,
    bundle: &mut TextureBundle,
    name: &str,
) -> Result<(), ShaderError> {
    bundle.image_name = name.to_string();
    let mipmaps = !ctx.material.no_mip_maps;
    let picmip = !ctx.material.no_pic_mip;
    match ctx.images.find_or_load_image(name, mipmaps, picmip) {
        Some(image) => {
            bundle.set_image(image);
            Ok(())
        }
        None => Err(ShaderError::ImageNotFound {
            material: ctx.material.name.clone(),
            image: name.to_string(),
        }),
    }
}

/// Parses `( a b c )` into `out`.
///
/// Returns `false` on a missing parenthesis or element; elements parsed
/// before the failure are kept.
pub fn parse_vector(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
    out: &mut [f32],
) -> bool {
    if tokens.next_token(false) != "(" {
        shader_warn!(ctx, "missing parenthesis in shader '{}'", ctx.material.name);
        return false;
    }
    for value in out.iter_mut() {
        let token = tokens.next_token(false);
        if token.is_empty() {
            shader_warn!(ctx, "missing vector element in shader '{}'", ctx.material.name);
            return false;
        }
        *value = atof(token);
    }
    if tokens.next_token(false) != ")" {
        shader_warn!(ctx, "missing parenthesis in shader '{}'", ctx.material.name);
        return false;
    }
    true
}

/// Parses `<func> <base> <amplitude> <phase> <frequency>`.
///
/// A missing parameter is reported and leaves the remaining fields at zero.
pub fn parse_waveform(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>) -> Waveform {
    let mut wave = Waveform::default();

    let func = tokens.next_token(false);
    if func.is_empty() {
        shader_warn!(ctx, "missing waveform parm in shader '{}'", ctx.material.name);
        return wave;
    }
    wave.func = keywords::wave_func(func).unwrap_or_else(|| {
        shader_warn!(
            ctx,
            "invalid genfunc name '{}' in shader '{}'",
            func,
            ctx.material.name
        );
        Default::default()
    });

    for field in [
        &mut wave.base,
        &mut wave.amplitude,
        &mut wave.phase,
        &mut wave.frequency,
    ] {
        let token = tokens.next_token(false);
        if token.is_empty() {
            shader_warn!(ctx, "missing waveform parm in shader '{}'", ctx.material.name);
            break;
        }
        *field = atof(token);
    }
    wave
}

/// Reads `N` numbers from the current line, warning on the first
/// missing one.
fn parse_floats<const N: usize>(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
    what: &str,
) -> Option<[f32; N]> {
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        let token = tokens.next_token(false);
        if token.is_empty() {
            shader_warn!(ctx, "missing {} parms in shader '{}'", what, ctx.material.name);
            return None;
        }
        *value = atof(token);
    }
    Some(values)
}

fn parse_rgb_gen(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>, stage: &mut Stage) {
    let mode = tokens.next_token(false);
    if mode.is_empty() {
        shader_warn!(ctx, "missing parameters for rgbGen in shader '{}'", ctx.material.name);
        return;
    }

    stage.rgb_gen = match mode.to_ascii_lowercase().as_str() {
        "wave" => ColorGen::Waveform(parse_waveform(ctx, tokens)),
        "const" => {
            let mut color = [0.0; 3];
            parse_vector(ctx, tokens, &mut color);
            ColorGen::Const(color.map(|c| (255.0 * c) as u8))
        }
        "identity" => ColorGen::Identity,
        "identitylighting" => ColorGen::IdentityLighting,
        "entity" => ColorGen::Entity,
        "oneminusentity" => ColorGen::OneMinusEntity,
        "vertex" => {
            if stage.alpha_gen == AlphaGen::Identity {
                stage.alpha_gen = AlphaGen::Vertex;
            }
            ColorGen::Vertex
        }
        "exactvertex" => ColorGen::ExactVertex,
        "lightingdiffuse" => ColorGen::LightingDiffuse,
        "oneminusvertex" => ColorGen::OneMinusVertex,
        _ => {
            shader_warn!(
                ctx,
                "unknown rgbGen parameter '{}' in shader '{}'",
                mode,
                ctx.material.name
            );
            return;
        }
    };
}

/// Returns `true` when the alpha generator was set.
fn parse_alpha_gen(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
    stage: &mut Stage,
) -> bool {
    let mode = tokens.next_token(false);
    if mode.is_empty() {
        shader_warn!(ctx, "missing parameters for alphaGen in shader '{}'", ctx.material.name);
        return false;
    }

    stage.alpha_gen = match mode.to_ascii_lowercase().as_str() {
        "wave" => AlphaGen::Waveform(parse_waveform(ctx, tokens)),
        "const" => AlphaGen::Const((255.0 * atof(tokens.next_token(false))) as u8),
        "identity" => AlphaGen::Identity,
        "entity" => AlphaGen::Entity,
        "oneminusentity" => AlphaGen::OneMinusEntity,
        "vertex" => AlphaGen::Vertex,
        "lightingspecular" => AlphaGen::LightingSpecular,
        "oneminusvertex" => AlphaGen::OneMinusVertex,
        "portal" => {
            let range = tokens.next_token(false);
            if range.is_empty() {
                ctx.material.portal_range = 256.0;
                shader_warn!(
                    ctx,
                    "missing range parameter for alphaGen portal in shader '{}', defaulting to 256",
                    ctx.material.name
                );
            } else {
                ctx.material.portal_range = atof(range);
            }
            AlphaGen::Portal
        }
        _ => {
            shader_warn!(
                ctx,
                "unknown alphaGen parameter '{}' in shader '{}'",
                mode,
                ctx.material.name
            );
            return false;
        }
    };
    true
}

fn parse_tc_gen(
    ctx: &mut CompilationContext<'_>,
    tokens: &mut Tokenizer<'_>,
    bundle: &mut TextureBundle,
) {
    let mode = tokens.next_token(false);
    if mode.is_empty() {
        shader_warn!(ctx, "missing texgen parm in shader '{}'", ctx.material.name);
        return;
    }

    match mode.to_ascii_lowercase().as_str() {
        "environment" => bundle.tc_gen = TcGen::EnvironmentMapped,
        "lightmap" => bundle.tc_gen = TcGen::Lightmap,
        "texture" | "base" => bundle.tc_gen = TcGen::Texture,
        "vector" => {
            let mut s = [0.0; 3];
            let mut t = [0.0; 3];
            parse_vector(ctx, tokens, &mut s);
            parse_vector(ctx, tokens, &mut t);
            bundle.tc_gen = TcGen::Vector {
                s: Vec3::from_array(s),
                t: Vec3::from_array(t),
            };
        }
        _ => shader_warn!(ctx, "unknown texgen parm in shader '{}'", ctx.material.name),
    }
}

/// Parses one texture coordinate modifier from a collected line.
///
/// The slot is consumed even when the parameters turn out to be bad; in
/// that case it stays [`TexMod::None`].
pub fn parse_tex_mod(
    ctx: &mut CompilationContext<'_>,
    line: &str,
    bundle: &mut TextureBundle,
) -> Result<(), ShaderError> {
    let Some(slot) = bundle.next_tex_mod_slot() else {
        return Err(ShaderError::TooManyTexMods {
            material: ctx.material.name.clone(),
        });
    };
    let mut tokens = Tokenizer::new(line);
    let kind = tokens.next_token(false);

    let parsed = match kind.to_ascii_lowercase().as_str() {
        "turb" => parse_floats::<4>(ctx, &mut tokens, "tcMod turb").map(
            |[base, amplitude, phase, frequency]| {
                TexMod::Turbulent(Waveform {
                    base,
                    amplitude,
                    phase,
                    frequency,
                    ..Default::default()
                })
            },
        ),
        "scale" => parse_floats::<2>(ctx, &mut tokens, "scale").map(TexMod::Scale),
        "scroll" => parse_floats::<2>(ctx, &mut tokens, "scale scroll").map(TexMod::Scroll),
        "stretch" => {
            if tokens.clone().next_token(false).is_empty() {
                shader_warn!(ctx, "missing stretch parms in shader '{}'", ctx.material.name);
                None
            } else {
                Some(TexMod::Stretch(parse_waveform(ctx, &mut tokens)))
            }
        }
        "transform" => parse_floats::<6>(ctx, &mut tokens, "transform").map(
            |[m00, m01, m10, m11, t0, t1]| TexMod::Transform {
                matrix: [[m00, m01], [m10, m11]],
                translate: [t0, t1],
            },
        ),
        "rotate" => parse_floats::<1>(ctx, &mut tokens, "tcMod rotate")
            .map(|[degrees_per_second]| TexMod::Rotate(degrees_per_second)),
        "entitytranslate" => Some(TexMod::EntityTranslate),
        _ => {
            shader_warn!(ctx, "unknown tcMod '{}' in shader '{}'", kind, ctx.material.name);
            None
        }
    };

    if let Some(tex_mod) = parsed {
        *slot = tex_mod;
    }
    Ok(())
}

/// Parses the arguments of `deformVertexes`.
pub fn parse_deform(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>) {
    let kind = tokens.next_token(false);
    if kind.is_empty() {
        shader_warn!(ctx, "missing deform parm in shader '{}'", ctx.material.name);
        return;
    }
    if ctx.material.deforms.len() >= MAX_SHADER_DEFORMS {
        shader_warn!(ctx, "MAX_SHADER_DEFORMS in '{}'", ctx.material.name);
        return;
    }

    // The slot is taken before the arguments are validated.
    ctx.material.deforms.push(Deform::None);

    let lower = kind.to_ascii_lowercase();
    let deform = match lower.as_str() {
        "projectionshadow" => Some(Deform::ProjectionShadow),
        "autosprite" => Some(Deform::Autosprite),
        "autosprite2" => Some(Deform::Autosprite2),
        _ if lower.starts_with("text") => {
            let digit = lower.as_bytes().get(4).map_or(0, |&c| c.wrapping_sub(b'0'));
            Some(Deform::Text(if digit <= 7 { digit } else { 0 }))
        }
        "bulge" => parse_floats::<3>(ctx, tokens, "deformVertexes bulge")
            .map(|[width, height, speed]| Deform::Bulge { width, height, speed }),
        "wave" => {
            let divisor = tokens.next_token(false);
            if divisor.is_empty() {
                shader_warn!(ctx, "missing deformVertexes parm in shader '{}'", ctx.material.name);
                None
            } else {
                let divisor = atof(divisor);
                let spread = if divisor != 0.0 {
                    1.0 / divisor
                } else {
                    shader_warn!(
                        ctx,
                        "illegal div value of 0 in deformVertexes command for shader '{}'",
                        ctx.material.name
                    );
                    100.0
                };
                let wave = parse_waveform(ctx, tokens);
                Some(Deform::Wave { spread, wave })
            }
        }
        "normal" => parse_floats::<2>(ctx, tokens, "deformVertexes")
            .map(|[amplitude, frequency]| Deform::Normals { amplitude, frequency }),
        "move" => parse_floats::<3>(ctx, tokens, "deformVertexes").map(|vector| {
            let wave = parse_waveform(ctx, tokens);
            Deform::Move {
                vector: Vec3::from_array(vector),
                wave,
            }
        }),
        _ => {
            shader_warn!(
                ctx,
                "unknown deformVertexes subtype '{}' found in shader '{}'",
                kind,
                ctx.material.name
            );
            None
        }
    };

    if let (Some(deform), Some(last)) = (deform, ctx.material.deforms.last_mut()) {
        *last = deform;
    }
}

/// Parses `skyparms <outer|-> <cloudheight> <inner|->`.
pub fn parse_sky_parms(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>) {
    let outer = tokens.next_token(false);
    if outer.is_empty() {
        shader_warn!(ctx, "'skyParms' missing parameter in shader '{}'", ctx.material.name);
        return;
    }
    if outer != "-" {
        ctx.material.sky.outer_box = load_sky_box(ctx, outer);
    }

    let cloud_height = tokens.next_token(false);
    if cloud_height.is_empty() {
        shader_warn!(ctx, "'skyParms' missing parameter in shader '{}'", ctx.material.name);
        return;
    }
    ctx.material.sky.cloud_height = atof(cloud_height);
    if ctx.material.sky.cloud_height == 0.0 {
        ctx.material.sky.cloud_height = 512.0;
    }

    let inner = tokens.next_token(false);
    if inner.is_empty() {
        shader_warn!(ctx, "'skyParms' missing parameter in shader '{}'", ctx.material.name);
        return;
    }
    if inner != "-" {
        ctx.material.sky.inner_box = load_sky_box(ctx, inner);
    }

    ctx.material.is_sky = true;
}

fn load_sky_box(ctx: &mut CompilationContext<'_>, base: &str) -> [Option<ImageHandle>; 6] {
    SKY_BOX_SUFFIXES.map(|suffix| {
        let path = format!("{}_{}.tga", base, suffix);
        Some(
            ctx.images
                .find_or_load_image(&path, true, true)
                .unwrap_or_else(|| ctx.images.default_image()),
        )
    })
}

fn parse_sort(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>) {
    let bucket = tokens.next_token(false);
    if bucket.is_empty() {
        shader_warn!(ctx, "missing sort parameter in shader '{}'", ctx.material.name);
        return;
    }
    ctx.material.sort = sort_order::from_name(bucket).unwrap_or_else(|| atof(bucket));
}

fn parse_cull(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>) {
    let face = tokens.next_token(false);
    if face.is_empty() {
        shader_warn!(ctx, "missing cull parms in shader '{}'", ctx.material.name);
        return;
    }
    match face.to_ascii_lowercase().as_str() {
        "none" | "twosided" | "disable" => ctx.material.cull = CullType::TwoSided,
        "back" | "backside" | "backsided" => ctx.material.cull = CullType::BackSided,
        _ => shader_warn!(
            ctx,
            "invalid cull parm '{}' in shader '{}'",
            face,
            ctx.material.name
        ),
    }
}

fn parse_sun(ctx: &mut CompilationContext<'_>, tokens: &mut Tokenizer<'_>) {
    let mut next = || atof(tokens.next_token(false));
    let color = Vec3::new(next(), next(), next());
    let intensity = next();
    let azimuth = degrees_to_radians(next());
    let elevation = degrees_to_radians(next());

    ctx.sun = Some(SunLight {
        color: color.normalize() * intensity,
        direction: Vec3::new(
            azimuth.cos() * elevation.cos(),
            azimuth.sin() * elevation.cos(),
            elevation.sin(),
        ),
    });
}
