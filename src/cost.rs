// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Fixed-point cost arithmetic shared by the TU processor and the split/cbf
//! estimator.

use crate::cabac::CABAC_FRAC_BITS_Q;

/// Fractional precision of the lambdas in [`CuRdoParams`].
///
/// [`CuRdoParams`]: crate::context::CuRdoParams
pub const LAMBDA_Q_SHIFT: usize = 8;

/// Shift that turns Q12 bits times a Q8 lambda into a cost.
pub const FRAC_BITS_LAMBDA_Q_SHIFT: usize = LAMBDA_Q_SHIFT + CABAC_FRAC_BITS_Q;

/// Rate costs saturate here so sums over a CU cannot overflow.
pub const RATE_COST_CLIP: i64 = (1 << 30) - 1;

/// Fractional precision of the chroma cost weight.
pub const CHROMA_COST_WEIGHT_Q_SHIFT: usize = 16;

/// Chroma weight of exactly one.
pub const CHROMA_COST_WEIGHT_ONE: u32 = 1 << CHROMA_COST_WEIGHT_Q_SHIFT;

/// Cost of a hypothesis that may not be chosen.
pub const MAX_COST: i64 = i64::MAX;

/// `min((bits * lambda) >> shift, 2^30 - 1)`, truncating.
#[inline(always)]
pub fn rate_cost(bits: u32, lambda: u32, shift: usize) -> i64 {
  let product = bits as u64 * lambda as u64;
  ((product >> shift) as i64).min(RATE_COST_CLIP)
}

/// Rate cost of a whole-bit count from the transform oracle.
#[inline(always)]
pub fn residual_rate_cost(bits: u32, lambda: u32) -> i64 {
  rate_cost(bits, lambda, LAMBDA_Q_SHIFT)
}

/// Rate cost of a Q12 fractional bit count from the CABAC estimator.
#[inline(always)]
pub fn frac_bits_rate_cost(frac_bits: u32, lambda: u32) -> i64 {
  rate_cost(frac_bits, lambda, FRAC_BITS_LAMBDA_Q_SHIFT)
}

/// Scales a chroma cost by a Q16 weight, rounding to nearest.
#[inline(always)]
pub fn weigh_chroma_cost(cost: i64, weight: u32) -> i64 {
  let round = 1i64 << (CHROMA_COST_WEIGHT_Q_SHIFT - 1);
  (cost * weight as i64 + round) >> CHROMA_COST_WEIGHT_Q_SHIFT
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn rate_cost_truncates() {
    // 3 bits at lambda 1.5 is 4.5, truncated to 4
    assert_eq!(residual_rate_cost(3, 384), 4);
    // 1.5 Q12 bits at lambda 2.0
    assert_eq!(frac_bits_rate_cost(6144, 512), 3);
  }

  #[test]
  fn rate_cost_saturates() {
    assert_eq!(residual_rate_cost(u32::MAX, u32::MAX), RATE_COST_CLIP);
  }

  #[test]
  fn unit_chroma_weight_is_identity() {
    for cost in [0, 1, 17, 123_456_789] {
      assert_eq!(weigh_chroma_cost(cost, CHROMA_COST_WEIGHT_ONE), cost);
    }
    assert_eq!(weigh_chroma_cost(100, CHROMA_COST_WEIGHT_ONE / 2), 50);
    assert_eq!(weigh_chroma_cost(3, CHROMA_COST_WEIGHT_ONE / 2), 2);
  }
}
