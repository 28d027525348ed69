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

//! Vertex deformation operators.

use super::stage::Waveform;
use crate::math::Vec3;

/// Maximum number of deforms a material may declare.
pub const MAX_SHADER_DEFORMS: usize = 3;

/// A vertex-space procedural modifier applied before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Deform {
    /// A deform whose parameters were missing; it still occupies its slot.
    #[default]
    None,
    /// Displaces vertexes along their normals with a travelling wave.
    Wave {
        /// Inverse of the spatial period.
        spread: f32,
        /// The driving waveform.
        wave: Waveform,
    },
    /// Perturbs vertex normals.
    Normals {
        /// Perturbation amplitude.
        amplitude: f32,
        /// Perturbation frequency.
        frequency: f32,
    },
    /// Bulges vertexes along the texture `s` axis.
    Bulge {
        /// Bulge width.
        width: f32,
        /// Bulge height.
        height: f32,
        /// Bulge speed.
        speed: f32,
    },
    /// Translates the whole surface along a vector.
    Move {
        /// Direction of motion.
        vector: Vec3,
        /// Scale over time.
        wave: Waveform,
    },
    /// Flattens geometry into a projected shadow.
    ProjectionShadow,
    /// Rebuilds quads to face the viewer.
    Autosprite,
    /// Rebuilds quads to face the viewer around their long axis.
    Autosprite2,
    /// Billboarded text, indexed 0..=7.
    Text(u8),
}

