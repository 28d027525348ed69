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

//! Gameplay-visible content and surface flags.
//!
//! The renderer only stores these; collision and game code interpret them.
//! The single exception is [`ContentFlags::FOG`], which lets a material with
//! no stages through the compiler.

use serde::{Deserialize, Serialize};

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $value:expr;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name {
            bits: u32,
        }

        impl $name {
            /// No flags.
            pub const NONE: Self = Self { bits: 0 };
            $($(#[$fmeta])* pub const $flag: Self = Self { bits: $value };)*

            /// Creates flags from raw bits.
            pub const fn from_bits(bits: u32) -> Self {
                Self { bits }
            }

            /// Returns the raw bits.
            pub const fn bits(&self) -> u32 {
                self.bits
            }

            /// Checks whether every bit of `other` is set.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Checks whether no flags are set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self::Output {
                Self { bits: self.bits | rhs.bits }
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.bits |= rhs.bits;
            }
        }
    };
}

flag_set! {
    /// Volume contents of a brush using the material.
    ContentFlags {
        /// Solid geometry.
        SOLID = 1;
        /// Lava volume.
        LAVA = 8;
        /// Slime volume.
        SLIME = 16;
        /// Water volume.
        WATER = 32;
        /// Fog volume.
        FOG = 64;
        /// Area portal.
        AREAPORTAL = 0x8000;
        /// Blocks players only.
        PLAYERCLIP = 0x10000;
        /// Blocks monsters only.
        MONSTERCLIP = 0x20000;
        /// Teleporter marker.
        TELEPORTER = 0x40000;
        /// Jump pad marker.
        JUMPPAD = 0x80000;
        /// Bot cluster portal.
        CLUSTERPORTAL = 0x100000;
        /// Bots should not enter.
        DONOTENTER = 0x200000;
        /// Origin brush of a rotating entity.
        ORIGIN = 0x1000000;
        /// Never drop items here.
        NODROP = 0x8000_0000;
        /// Forced structural.
        STRUCTURAL = 0x1000_0000;
        /// Does not consume contained surfaces.
        TRANSLUCENT = 0x2000_0000;
        /// Detail brush, excluded from the structural tree.
        DETAIL = 0x0800_0000;
    }
}

flag_set! {
    /// Per-surface flags of a material.
    SurfaceFlags {
        /// No damage when falling on it.
        NODAMAGE = 0x1;
        /// Low friction.
        SLICK = 0x2;
        /// Sky portal.
        SKY = 0x4;
        /// Climbable.
        LADDER = 0x8;
        /// No impact effects.
        NOIMPACT = 0x10;
        /// No marks, still explodes.
        NOMARKS = 0x20;
        /// Flesh footstep sounds.
        FLESH = 0x40;
        /// Never drawn.
        NODRAW = 0x80;
        /// Primary splitter hint.
        HINT = 0x100;
        /// Compiler-only skip surface.
        SKIP = 0x200;
        /// No lightmap generated.
        NOLIGHTMAP = 0x400;
        /// Lighting sampled at vertexes.
        POINTLIGHT = 0x800;
        /// Metal footstep sounds.
        METALSTEPS = 0x1000;
        /// No footstep sounds.
        NOSTEPS = 0x2000;
        /// Does not block movement.
        NONSOLID = 0x4000;
        /// Filters light passing through.
        LIGHTFILTER = 0x8000;
        /// Per-pixel light test.
        ALPHASHADOW = 0x10000;
        /// Never receives dynamic lights.
        NODLIGHT = 0x20000;
        /// Leaves a dust trail.
        DUST = 0x40000;
    }
}

/// One row of the `surfaceParm` name table.
#[derive(Debug, Clone, Copy)]
pub struct InfoParm {
    /// Keyword as written in material text.
    pub name: &'static str,
    /// Whether the parm clears the solid flag for the map compiler.
    pub clear_solid: bool,
    /// Surface flags it sets.
    pub surface_flags: SurfaceFlags,
    /// Content flags it sets.
    pub contents: ContentFlags,
}

const fn parm(
    name: &'static str,
    clear_solid: bool,
    surface_flags: SurfaceFlags,
    contents: ContentFlags,
) -> InfoParm {
    InfoParm {
        name,
        clear_solid,
        surface_flags,
        contents,
    }
}

/// The `surfaceParm` name table.
pub const INFO_PARMS: &[InfoParm] = &[
    parm("water", true, SurfaceFlags::NONE, ContentFlags::WATER),
    parm("slime", true, SurfaceFlags::NONE, ContentFlags::SLIME),
    parm("lava", true, SurfaceFlags::NONE, ContentFlags::LAVA),
    parm("playerclip", true, SurfaceFlags::NONE, ContentFlags::PLAYERCLIP),
    parm("monsterclip", true, SurfaceFlags::NONE, ContentFlags::MONSTERCLIP),
    parm("nodrop", true, SurfaceFlags::NONE, ContentFlags::NODROP),
    parm("nonsolid", true, SurfaceFlags::NONSOLID, ContentFlags::NONE),
    parm("origin", true, SurfaceFlags::NONE, ContentFlags::ORIGIN),
    parm("trans", false, SurfaceFlags::NONE, ContentFlags::TRANSLUCENT),
    parm("detail", false, SurfaceFlags::NONE, ContentFlags::DETAIL),
    parm("structural", false, SurfaceFlags::NONE, ContentFlags::STRUCTURAL),
    parm("areaportal", true, SurfaceFlags::NONE, ContentFlags::AREAPORTAL),
    parm("clusterportal", true, SurfaceFlags::NONE, ContentFlags::CLUSTERPORTAL),
    parm("donotenter", true, SurfaceFlags::NONE, ContentFlags::DONOTENTER),
    parm("fog", true, SurfaceFlags::NONE, ContentFlags::FOG),
    parm("sky", false, SurfaceFlags::SKY, ContentFlags::NONE),
    parm("lightfilter", false, SurfaceFlags::LIGHTFILTER, ContentFlags::NONE),
    parm("alphashadow", false, SurfaceFlags::ALPHASHADOW, ContentFlags::NONE),
    parm("hint", false, SurfaceFlags::HINT, ContentFlags::NONE),
    parm("slick", false, SurfaceFlags::SLICK, ContentFlags::NONE),
    parm("noimpact", false, SurfaceFlags::NOIMPACT, ContentFlags::NONE),
    parm("nomarks", false, SurfaceFlags::NOMARKS, ContentFlags::NONE),
    parm("ladder", false, SurfaceFlags::LADDER, ContentFlags::NONE),
    parm("nodamage", false, SurfaceFlags::NODAMAGE, ContentFlags::NONE),
    parm("metalsteps", false, SurfaceFlags::METALSTEPS, ContentFlags::NONE),
    parm("flesh", false, SurfaceFlags::FLESH, ContentFlags::NONE),
    parm("nosteps", false, SurfaceFlags::NOSTEPS, ContentFlags::NONE),
    parm("nodraw", false, SurfaceFlags::NODRAW, ContentFlags::NONE),
    parm("pointlight", false, SurfaceFlags::POINTLIGHT, ContentFlags::NONE),
    parm("nolightmap", false, SurfaceFlags::NOLIGHTMAP, ContentFlags::NONE),
    parm("nodlight", false, SurfaceFlags::NODLIGHT, ContentFlags::NONE),
    parm("dust", false, SurfaceFlags::DUST, ContentFlags::NONE),
];

/// Looks up a `surfaceParm` keyword, ignoring case.
pub fn find_info_parm(name: &str) -> Option<&'static InfoParm> {
    INFO_PARMS
        .iter()
        .find(|parm| parm.name.eq_ignore_ascii_case(name))
}
