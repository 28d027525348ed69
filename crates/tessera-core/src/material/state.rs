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

//! Packed blend / depth / alpha-test state of a stage.

use serde::{Deserialize, Serialize};

/// Packed fixed-function state bits for one stage.
///
/// The source factor lives in the low nibble, the destination factor in the
/// next nibble, followed by depth and alpha-test flags. The value is computed
/// once when a stage finishes parsing and is diffed by the back end with XOR
/// to decide which pieces of graphics state must be re-issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StateBits {
    bits: u32,
}

impl StateBits {
    /// No state at all (blend disabled, no depth write).
    pub const NONE: Self = Self::from_bits(0);

    /// `GL_ZERO` source factor.
    pub const SRCBLEND_ZERO: Self = Self::from_bits(0x0000_0001);
    /// `GL_ONE` source factor.
    pub const SRCBLEND_ONE: Self = Self::from_bits(0x0000_0002);
    /// `GL_DST_COLOR` source factor.
    pub const SRCBLEND_DST_COLOR: Self = Self::from_bits(0x0000_0003);
    /// `GL_ONE_MINUS_DST_COLOR` source factor.
    pub const SRCBLEND_ONE_MINUS_DST_COLOR: Self = Self::from_bits(0x0000_0004);
    /// `GL_SRC_ALPHA` source factor.
    pub const SRCBLEND_SRC_ALPHA: Self = Self::from_bits(0x0000_0005);
    /// `GL_ONE_MINUS_SRC_ALPHA` source factor.
    pub const SRCBLEND_ONE_MINUS_SRC_ALPHA: Self = Self::from_bits(0x0000_0006);
    /// `GL_DST_ALPHA` source factor.
    pub const SRCBLEND_DST_ALPHA: Self = Self::from_bits(0x0000_0007);
    /// `GL_ONE_MINUS_DST_ALPHA` source factor.
    pub const SRCBLEND_ONE_MINUS_DST_ALPHA: Self = Self::from_bits(0x0000_0008);
    /// `GL_SRC_ALPHA_SATURATE` source factor.
    pub const SRCBLEND_ALPHA_SATURATE: Self = Self::from_bits(0x0000_0009);
    /// Mask covering every source factor.
    pub const SRCBLEND_BITS: Self = Self::from_bits(0x0000_000f);

    /// `GL_ZERO` destination factor.
    pub const DSTBLEND_ZERO: Self = Self::from_bits(0x0000_0010);
    /// `GL_ONE` destination factor.
    pub const DSTBLEND_ONE: Self = Self::from_bits(0x0000_0020);
    /// `GL_SRC_COLOR` destination factor.
    pub const DSTBLEND_SRC_COLOR: Self = Self::from_bits(0x0000_0030);
    /// `GL_ONE_MINUS_SRC_COLOR` destination factor.
    pub const DSTBLEND_ONE_MINUS_SRC_COLOR: Self = Self::from_bits(0x0000_0040);
    /// `GL_SRC_ALPHA` destination factor.
    pub const DSTBLEND_SRC_ALPHA: Self = Self::from_bits(0x0000_0050);
    /// `GL_ONE_MINUS_SRC_ALPHA` destination factor.
    pub const DSTBLEND_ONE_MINUS_SRC_ALPHA: Self = Self::from_bits(0x0000_0060);
    /// `GL_DST_ALPHA` destination factor.
    pub const DSTBLEND_DST_ALPHA: Self = Self::from_bits(0x0000_0070);
    /// `GL_ONE_MINUS_DST_ALPHA` destination factor.
    pub const DSTBLEND_ONE_MINUS_DST_ALPHA: Self = Self::from_bits(0x0000_0080);
    /// Mask covering every destination factor.
    pub const DSTBLEND_BITS: Self = Self::from_bits(0x0000_00f0);

    /// Depth writes enabled.
    pub const DEPTHMASK_TRUE: Self = Self::from_bits(0x0000_0100);
    /// Depth testing disabled.
    pub const DEPTHTEST_DISABLE: Self = Self::from_bits(0x0001_0000);
    /// Depth compare `EQUAL` instead of `LEQUAL`.
    pub const DEPTHFUNC_EQUAL: Self = Self::from_bits(0x0002_0000);

    /// Alpha test `> 0`.
    pub const ATEST_GT_0: Self = Self::from_bits(0x1000_0000);
    /// Alpha test `< 0.5`.
    pub const ATEST_LT_80: Self = Self::from_bits(0x2000_0000);
    /// Alpha test `>= 0.5`.
    pub const ATEST_GE_80: Self = Self::from_bits(0x4000_0000);
    /// Mask covering every alpha-test mode.
    pub const ATEST_BITS: Self = Self::from_bits(0x7000_0000);

    /// Opaque, depth-writing default state.
    pub const DEFAULT: Self = Self::DEPTHMASK_TRUE;

    /// Creates state from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of bits.
    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.bits | other.bits)
    }

    /// Keeps only the bits present in `mask`.
    pub const fn intersection(self, mask: Self) -> Self {
        Self::from_bits(self.bits & mask.bits)
    }

    /// Clears the bits present in `mask`.
    pub const fn difference(self, mask: Self) -> Self {
        Self::from_bits(self.bits & !mask.bits)
    }

    /// Returns the bits that differ between two states.
    pub const fn symmetric_difference(self, other: Self) -> Self {
        Self::from_bits(self.bits ^ other.bits)
    }

    /// Checks whether every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks whether any bit of `other` is set.
    pub const fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    /// Checks whether no bits are set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// The source blend factor field.
    pub const fn src_blend(&self) -> Self {
        self.intersection(Self::SRCBLEND_BITS)
    }

    /// The destination blend factor field.
    pub const fn dst_blend(&self) -> Self {
        self.intersection(Self::DSTBLEND_BITS)
    }

    /// Whether either blend factor is set.
    pub const fn is_blended(&self) -> bool {
        self.intersects(Self::SRCBLEND_BITS.union(Self::DSTBLEND_BITS))
    }
}

impl std::ops::BitOr for StateBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for StateBits {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_fields_are_independent() {
        let state =
            StateBits::SRCBLEND_SRC_ALPHA | StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA | StateBits::DEFAULT;
        assert_eq!(state.src_blend(), StateBits::SRCBLEND_SRC_ALPHA);
        assert_eq!(state.dst_blend(), StateBits::DSTBLEND_ONE_MINUS_SRC_ALPHA);
        assert!(state.contains(StateBits::DEPTHMASK_TRUE));
        assert!(state.is_blended());
    }

    #[test]
    fn test_difference_clears_blend() {
        let state = StateBits::SRCBLEND_ONE | StateBits::DSTBLEND_ONE;
        let cleared = state.difference(StateBits::SRCBLEND_BITS | StateBits::DSTBLEND_BITS);
        assert!(cleared.is_empty());
        assert!(!cleared.is_blended());
    }

    #[test]
    fn test_symmetric_difference_reports_changes() {
        let a = StateBits::DEFAULT;
        let b = StateBits::DEFAULT | StateBits::DEPTHFUNC_EQUAL;
        assert_eq!(a.symmetric_difference(b), StateBits::DEPTHFUNC_EQUAL);
        assert!(a.symmetric_difference(a).is_empty());
    }
}
