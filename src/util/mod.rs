// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

mod pixel;
mod slice2d;

pub use pixel::*;
pub use slice2d::*;

/// Number of bits needed to represent `v`, 0 for 0.
#[inline(always)]
pub const fn bit_length(v: u32) -> u32 {
  u32::BITS - v.leading_zeros()
}

/// Base-2 logarithm of a power-of-two block dimension.
#[inline(always)]
pub fn log2_size(size: usize) -> usize {
  debug_assert!(size.is_power_of_two());
  size.trailing_zeros() as usize
}
