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

//! Name tables of the material language. Lookups ignore case.

use tessera_core::material::{StateBits, WaveFunc};

const SRC_BLEND_NAMES: [(&str, StateBits); 9] = [
    ("GL_ONE", StateBits::SRCBLEND_ONE),
    ("GL_ZERO", StateBits::SRCBLEND_ZERO),
    ("GL_DST_COLOR", StateBits::SRCBLEND_DST_COLOR),
    ("GL_ONE_MINUS_DST_COLOR", StateBits::SRCBLEND_ONE_MINUS_DST_COLOR),
    ("GL_SRC_ALPHA", StateBits::SRCBLEND_SRC_ALPHA),
    ("GL_ONE_MINUS_SRC_ALPHA", StateBits::SRCBLEND_ONE_MINUS_SRC_ALPHA),
    ("GL_DST_ALPHA", StateBits::SRCBLEND_DST_ALPHA),
    ("GL_ONE_MINUS_DST_ALPHA", StateBits::SRCBLEND_ONE_MINUS_DST_ALPHA),
    ("GL_SRC_ALPHA_SATURATE", StateBits::SRCBLEND_ALPHA_SATURATE),
];

const DST_BLEND_NAMES: [(&str, StateBits); 8] = [
    ("GL_ONE", StateBits::DSTBLEND_ONE),
    ("GL_ZERO", StateBits::DSTBLEND_ZERO),
    ("GL_SRC_ALPHA", StateBits::DSTBLEND_SRC_ALPHA),
    ("GL_ONE_MINUS_SRC_ALPHA", StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA),
    ("GL_DST_ALPHA", StateBits::DSTBLEND_DST_ALPHA),
    ("GL_ONE_MINUS_DST_ALPHA", StateBits::DSTBLEND_ONE_MINUS_DST_ALPHA),
    ("GL_SRC_COLOR", StateBits::DSTBLEND_SRC_COLOR),
    ("GL_ONE_MINUS_SRC_COLOR", StateBits::DSTBLEND_ONE_MINUS_SRC_COLOR),
];

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
        .map(|&(_, value)| value)
}

/// Source blend factor by OpenGL name.
pub fn src_blend(name: &str) -> Option<StateBits> {
    lookup(&SRC_BLEND_NAMES, name)
}

/// Destination blend factor by OpenGL name.
pub fn dst_blend(name: &str) -> Option<StateBits> {
    lookup(&DST_BLEND_NAMES, name)
}

/// Alpha-test mode for `alphaFunc`.
pub fn alpha_func(name: &str) -> Option<StateBits> {
    lookup(
        &[
            ("GT0", StateBits::ATEST_GT_0),
            ("LT128", StateBits::ATEST_LT_80),
            ("GE128", StateBits::ATEST_GE_80),
        ],
        name,
    )
}

/// Waveform shape by name.
pub fn wave_func(name: &str) -> Option<WaveFunc> {
    lookup(
        &[
            ("sin", WaveFunc::Sin),
            ("square", WaveFunc::Square),
            ("triangle", WaveFunc::Triangle),
            ("sawtooth", WaveFunc::Sawtooth),
            ("inversesawtooth", WaveFunc::InverseSawtooth),
            ("noise", WaveFunc::Noise),
        ],
        name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_names_ignore_case() {
        assert_eq!(src_blend("gl_dst_color"), Some(StateBits::SRCBLEND_DST_COLOR));
        assert_eq!(dst_blend("GL_ONE_MINUS_SRC_COLOR"), Some(StateBits::DSTBLEND_ONE_MINUS_SRC_COLOR));
    }

    #[test]
    fn test_factors_are_side_specific() {
        assert!(src_blend("GL_SRC_COLOR").is_none());
        assert!(dst_blend("GL_SRC_ALPHA_SATURATE").is_none());
    }

    #[test]
    fn test_alpha_and_wave_names() {
        assert_eq!(alpha_func("ge128"), Some(StateBits::ATEST_GE_80));
        assert_eq!(alpha_func("GT1"), None);
        assert_eq!(wave_func("InverseSawtooth"), Some(WaveFunc::InverseSawtooth));
        assert_eq!(wave_func("cos"), None);
    }
}
