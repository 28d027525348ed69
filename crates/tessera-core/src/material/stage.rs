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

//! One texture-blend pass of a material and its generators.

use super::state::StateBits;
use crate::math::Vec3;
use crate::renderer::ImageHandle;

/// Maximum number of animation frames per texture bundle.
pub const MAX_IMAGE_ANIMATIONS: usize = 8;
/// Maximum number of texture-coordinate modifiers per bundle.
pub const TR_MAX_TEXMODS: usize = 4;
/// Number of texture bundles per stage (base + lightmap).
pub const NUM_TEXTURE_BUNDLES: usize = 2;

/// Periodic function driving a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveFunc {
    /// Sine wave.
    #[default]
    Sin,
    /// Square wave.
    Square,
    /// Triangle wave.
    Triangle,
    /// Rising sawtooth.
    Sawtooth,
    /// Falling sawtooth.
    InverseSawtooth,
    /// Pseudo-random noise.
    Noise,
}

/// A parameterised periodic signal: `base + amplitude * func((time + phase) * frequency)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Waveform {
    /// The function shape.
    pub func: WaveFunc,
    /// Constant offset.
    pub base: f32,
    /// Scale applied to the function output.
    pub amplitude: f32,
    /// Phase offset, in cycles.
    pub phase: f32,
    /// Cycles per second.
    pub frequency: f32,
}

/// Texture-coordinate generator of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TcGen {
    /// Not specified yet; resolved when the material is finished.
    #[default]
    Bad,
    /// Use the surface's base texture coordinates.
    Texture,
    /// Use the surface's lightmap coordinates.
    Lightmap,
    /// Reflection-vector environment mapping.
    EnvironmentMapped,
    /// Planar projection onto two explicit axes.
    Vector {
        /// Axis producing `s`.
        s: Vec3,
        /// Axis producing `t`.
        t: Vec3,
    },
}

/// A texture-coordinate modifier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TexMod {
    /// A slot consumed by a modifier whose parameters could not be read.
    #[default]
    None,
    /// Sinusoidal turbulence; only base, amplitude, phase and frequency are used.
    Turbulent(Waveform),
    /// Constant scale of `s` and `t`.
    Scale([f32; 2]),
    /// Constant scroll speed of `s` and `t`, in units per second.
    Scroll([f32; 2]),
    /// Scale around the texture centre driven by a waveform.
    Stretch(Waveform),
    /// Affine transform.
    Transform {
        /// 2x2 matrix, row major.
        matrix: [[f32; 2]; 2],
        /// Translation.
        translate: [f32; 2],
    },
    /// Rotation around the texture centre, in degrees per second.
    Rotate(f32),
    /// Scroll driven by the entity's shader texture coordinates.
    EntityTranslate,
}

/// Colour generator of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ColorGen {
    /// Not specified; resolved when the stage finishes parsing.
    #[default]
    Bad,
    /// Full white.
    Identity,
    /// White scaled by the global overbright factor.
    IdentityLighting,
    /// The entity's shader colour.
    Entity,
    /// One minus the entity's shader colour.
    OneMinusEntity,
    /// Per-vertex colour, overbright scaled.
    Vertex,
    /// Per-vertex colour without overbright scaling.
    ExactVertex,
    /// Dynamic diffuse lighting.
    LightingDiffuse,
    /// One minus per-vertex colour.
    OneMinusVertex,
    /// A waveform applied to all channels.
    Waveform(Waveform),
    /// A constant colour, already scaled to bytes.
    Const([u8; 3]),
}

/// Alpha generator of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaGen {
    /// Opaque alpha.
    #[default]
    Identity,
    /// Alpha does not matter and is not computed.
    Skip,
    /// The entity's shader alpha.
    Entity,
    /// One minus the entity's shader alpha.
    OneMinusEntity,
    /// Per-vertex alpha.
    Vertex,
    /// One minus per-vertex alpha.
    OneMinusVertex,
    /// Specular highlight term.
    LightingSpecular,
    /// A waveform.
    Waveform(Waveform),
    /// A constant alpha, already scaled to a byte.
    Const(u8),
    /// Fades with distance to the viewer; the range lives on the material.
    Portal,
}

/// How the stage colours are attenuated by fog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogAdjust {
    /// Cannot be adjusted for fog.
    #[default]
    None,
    /// Modulate the RGB channels.
    ModulateRgb,
    /// Modulate only alpha.
    ModulateAlpha,
    /// Modulate all channels (premultiplied alpha).
    ModulateRgba,
}

/// Image references and coordinate generation for one texture unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureBundle {
    /// Animation frames; the first entry is the image used when not animated.
    pub images: Vec<ImageHandle>,
    /// Name of the image as written in the material, empty for generated images.
    pub image_name: String,
    /// Frames per second of an `animMap`.
    pub image_animation_speed: f32,
    /// Coordinate generator.
    pub tc_gen: TcGen,
    /// Coordinate modifiers, bounded by [`TR_MAX_TEXMODS`].
    pub tex_mods: Vec<TexMod>,
    /// Whether the bundle samples the surface lightmap.
    pub is_lightmap: bool,
    /// Whether the bundle streams a cinematic.
    pub is_video_map: bool,
}

impl TextureBundle {
    /// The image bound when the bundle is not animated.
    pub fn image(&self) -> Option<ImageHandle> {
        self.images.first().copied()
    }

    /// Replaces the primary image.
    pub fn set_image(&mut self, image: ImageHandle) {
        match self.images.first_mut() {
            Some(first) => *first = image,
            None => self.images.push(image),
        }
    }

    /// Appends an animation frame, ignoring frames beyond [`MAX_IMAGE_ANIMATIONS`].
    ///
    /// Returns `false` if the frame was ignored.
    pub fn push_frame(&mut self, image: ImageHandle) -> bool {
        if self.images.len() >= MAX_IMAGE_ANIMATIONS {
            return false;
        }
        self.images.push(image);
        true
    }

    /// Reserves the next modifier slot.
    ///
    /// Returns `None` when the bundle already holds [`TR_MAX_TEXMODS`] modifiers.
    pub fn next_tex_mod_slot(&mut self) -> Option<&mut TexMod> {
        if self.tex_mods.len() >= TR_MAX_TEXMODS {
            return None;
        }
        self.tex_mods.push(TexMod::None);
        self.tex_mods.last_mut()
    }

    /// Picks the animation frame for a shader clock value in seconds.
    pub fn frame_at(&self, shader_time: f32) -> Option<ImageHandle> {
        if self.images.len() <= 1 {
            return self.image();
        }
        let index = (shader_time * self.image_animation_speed).floor();
        let index = if index.is_finite() && index > 0.0 {
            index as usize
        } else {
            0
        };
        self.images.get(index % self.images.len()).copied()
    }
}

/// One texture-blend pass within a material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stage {
    /// Inactive stages are logically absent but keep their slot.
    pub active: bool,
    /// Base texture bundle and the optional second (lightmap) bundle.
    pub bundles: [TextureBundle; NUM_TEXTURE_BUNDLES],
    /// Colour generator.
    pub rgb_gen: ColorGen,
    /// Alpha generator.
    pub alpha_gen: AlphaGen,
    /// Packed blend / depth / alpha-test state.
    pub state_bits: StateBits,
    /// Source blend factor, duplicated from `state_bits`.
    pub src_blend: StateBits,
    /// Destination blend factor, duplicated from `state_bits`.
    pub dst_blend: StateBits,
    /// Fog colour adjustment mode.
    pub fog_adjust: FogAdjust,
    /// Dropped when detail textures are disabled.
    pub is_detail: bool,
}

impl Stage {
    /// Whether bundle 0 references a named image sampled with base coordinates.
    pub fn is_lit_texture(&self) -> bool {
        self.active
            && !self.bundles[0].image_name.is_empty()
            && matches!(self.bundles[0].tc_gen, TcGen::Texture | TcGen::Bad)
    }

    /// Whether the colour generator is a waveform of the given shape.
    pub fn has_rgb_wave(&self, func: WaveFunc) -> bool {
        matches!(self.rgb_gen, ColorGen::Waveform(wave) if wave.func == func)
    }
}
