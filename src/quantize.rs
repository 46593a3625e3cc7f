// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Quantiser rounding offsets.
//!
//! With rate-aware rounding the dead zone of each coefficient position
//! follows the CABAC cost of coding it: a level costing many more bits than
//! a zero gets a wider dead zone. For a decision between levels `k` and
//! `k + 1` with rates `R_k` and `R_(k+1)`:
//!
//! ```text
//! deadzone = ((R_(k+1) - R_k) * 2^(-8/3) * lambda_modifier + 1) / 2
//! rounding = 1 - deadzone
//! ```
//!
//! evaluated in fixed point with truncating shifts. The CABAC states of the
//! 4x4 sub-blocks of a TU are assumed independent.

use crate::cabac::*;
use crate::config::{QuantRoundingLevel, TuRdoConfig};
use crate::context::CuRdoParams;
use crate::oracle::Rounding;
use crate::tree::{MAX_TU_SIZE, MIN_TU_SIZE};
use crate::util::log2_size;

/// Fractional precision of the rounding offsets.
pub const QUANT_ROUND_FACTOR_Q: usize = 15;

/// Fractional precision of the lambda modifiers.
pub const LAMBDA_MODIFIER_Q: usize = 8;

/// 2^(-8/3) in Q15.
const TWO_POW_MINUS_8_3_Q15: i64 = 5161;

/// Rounding offsets never exceed one half.
const MAX_ROUNDING_Q15: i32 = 1 << (QUANT_ROUND_FACTOR_Q - 1);

/// Sign bit, bypass coded, in Q12.
const SIGN_BITS_Q12: u32 = 1 << CABAC_FRAC_BITS_Q;

/// Significance context increments of a 4x4 TU, raster order.
const CTX_IDX_MAP_4X4: [usize; 16] =
  [0, 1, 4, 5, 2, 3, 4, 5, 6, 6, 8, 8, 7, 7, 8, 8];

const TRANS_SIZES: usize = 4;

fn sig_ctx(x: usize, y: usize, trans_size: usize, luma: bool) -> usize {
  let base = SIG_COEFF_FLAG + if luma { 0 } else { SIG_COEFF_FLAG_CHROMA };
  if trans_size == 4 {
    return base + CTX_IDX_MAP_4X4[(y << 2) + x];
  }
  if x + y == 0 {
    return base;
  }
  let (xp, yp) = (x & 3, y & 3);
  // neighbouring sub-blocks assumed uncoded
  let pattern = match xp + yp {
    0 => 2,
    1 | 2 => 1,
    _ => 0,
  };
  let first_sub_block = x < 4 && y < 4;
  let inc = match (luma, trans_size) {
    (true, 8) => 9,
    (true, _) => 21,
    (false, 8) => 9,
    (false, _) => 12,
  };
  let non_first = if luma && !first_sub_block { 3 } else { 0 };
  base + pattern + inc + non_first
}

fn greater1_ctx(x: usize, y: usize, luma: bool) -> (usize, usize) {
  let first_sub_block = x < 4 && y < 4;
  let ctx_set = if luma && !first_sub_block { 2 } else { 0 };
  let (gt1, gt2) = if luma {
    (GREATER1_FLAG, GREATER2_FLAG)
  } else {
    (
      GREATER1_FLAG + GREATER1_FLAG_CHROMA,
      GREATER2_FLAG + GREATER2_FLAG_CHROMA,
    )
  };
  // no greater1 flag seen yet in the sub-block
  (gt1 + ctx_set * 4 + 1, gt2 + ctx_set)
}

/// Rounding offset for a level decision whose upper level costs
/// `delta_q12` more bits than the lower one.
pub fn rounding_from_rate_delta(delta_q12: i32, lambda_mod_q8: u32) -> i32 {
  let d = (delta_q12 as i64 * TWO_POW_MINUS_8_3_Q15) >> 15;
  let d = (d * lambda_mod_q8 as i64) >> LAMBDA_MODIFIER_Q;
  // Q12 -> Q15, then (d + 1) / 2
  let deadzone = ((d << 3) + (1 << QUANT_ROUND_FACTOR_Q)) >> 1;
  ((1i64 << QUANT_ROUND_FACTOR_Q) - deadzone).clamp(0, MAX_ROUNDING_Q15 as i64)
    as i32
}

/// Per-position rounding offsets of one transform size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundingFactors {
  size: usize,
  zero_one: Vec<i32>,
  one_two: Vec<i32>,
}

impl RoundingFactors {
  pub fn new(size: usize) -> Self {
    let n = size * size;
    RoundingFactors { size, zero_one: vec![0; n], one_two: vec![0; n] }
  }

  pub const fn size(&self) -> usize {
    self.size
  }

  /// Offsets for the 0/1 and 1/2 level decisions at (`x`, `y`).
  pub fn at(&self, x: usize, y: usize) -> (i32, i32) {
    let i = y * self.size + x;
    (self.zero_one[i], self.one_two[i])
  }

  pub fn as_rounding(&self) -> Rounding<'_> {
    Rounding::PerPosition {
      size: self.size,
      zero_one_q15: &self.zero_one,
      one_two_q15: &self.one_two,
    }
  }

  /// Recomputes the offsets from the rates implied by `cabac`.
  pub fn generate(
    &mut self, cabac: &CabacContexts, size: usize, luma: bool,
    lambda_mod_q8: u32,
  ) {
    if self.size != size {
      *self = RoundingFactors::new(size);
    }
    for y in 0..size {
      for x in 0..size {
        let sig = sig_ctx(x, y, size, luma);
        let (gt1, gt2) = greater1_ctx(x, y, luma);
        let r0 = cabac.bin_cost(sig, false);
        let r1 = cabac.bin_cost(sig, true)
          + cabac.bin_cost(gt1, false)
          + SIGN_BITS_Q12;
        let r2 = cabac.bin_cost(sig, true)
          + cabac.bin_cost(gt1, true)
          + cabac.bin_cost(gt2, false)
          + SIGN_BITS_Q12;
        let i = y * size + x;
        self.zero_one[i] =
          rounding_from_rate_delta(r1 as i32 - r0 as i32, lambda_mod_q8);
        self.one_two[i] =
          rounding_from_rate_delta(r2 as i32 - r1 as i32, lambda_mod_q8);
      }
    }
  }
}

/// Lambda modifier of a CU in Q8.
///
/// Non-reference B pictures in deeper temporal layers scale the modifier
/// by `clip((qp - 12) / 6, 2, 4)`; a constant modifier, when configured,
/// overrides it.
pub fn lambda_modifier_q8(config: &TuRdoConfig, params: &CuRdoParams) -> u32 {
  let mut modifier = params.lambda_modifier_q8;
  if params.slice_type == SliceType::B && params.temporal_layer > 0 {
    let qp = params.qp as i32;
    let scale_q8 = (((qp - 12) << LAMBDA_MODIFIER_Q) / 6)
      .clamp(2 << LAMBDA_MODIFIER_Q, 4 << LAMBDA_MODIFIER_Q);
    modifier = (modifier * scale_q8 as u32) >> LAMBDA_MODIFIER_Q;
  }
  if config.const_lambda_modifier {
    modifier = match params.slice_type {
      SliceType::I => config.i_pic_lambda_modifier_q8,
      _ => config.const_lambda_modifier_q8,
    };
  }
  modifier
}

/// Supplies the rounding offsets of each TU evaluation of a CU.
#[derive(Clone, Debug)]
pub struct QuantRounding {
  level: QuantRoundingLevel,
  fixed_q15: i32,
  lambda_mod_q8: u32,
  /// `[luma, chroma][log2(size) - 2]`, from the CABAC state at CU start.
  cu_level: [Vec<RoundingFactors>; 2],
  tu_level: RoundingFactors,
}

impl Default for QuantRounding {
  fn default() -> Self {
    Self::new()
  }
}

impl QuantRounding {
  pub fn new() -> Self {
    let per_size = || {
      (0..TRANS_SIZES)
        .map(|i| RoundingFactors::new(MIN_TU_SIZE << i))
        .collect()
    };
    QuantRounding {
      level: QuantRoundingLevel::Fixed,
      fixed_q15: 0,
      lambda_mod_q8: 1 << LAMBDA_MODIFIER_Q,
      cu_level: [per_size(), per_size()],
      tu_level: RoundingFactors::new(MAX_TU_SIZE),
    }
  }

  /// Prepares the offsets of a new CU.
  pub fn start_cu(
    &mut self, config: &TuRdoConfig, params: &CuRdoParams,
    cabac: &CabacContexts,
  ) {
    self.level = config.quant_rounding;
    self.fixed_q15 = if params.pred_mode.is_intra() {
      config.intra_rounding_q15
    } else {
      config.inter_rounding_q15
    };
    self.lambda_mod_q8 = lambda_modifier_q8(config, params);
    if self.level == QuantRoundingLevel::Fixed {
      return;
    }
    let planes = [true, false].into_iter().zip(self.cu_level.iter_mut());
    for (luma, tables) in planes {
      for factors in tables.iter_mut() {
        let size = factors.size();
        factors.generate(cabac, size, luma, self.lambda_mod_q8);
      }
    }
  }

  /// Offsets for a TU of `trans_size` evaluated against `cabac`.
  /// `at_cu_origin` TUs always use the CU-level offsets.
  pub fn factors(
    &mut self, trans_size: usize, luma: bool, at_cu_origin: bool,
    cabac: &CabacContexts,
  ) -> Rounding<'_> {
    match self.level {
      QuantRoundingLevel::Fixed => Rounding::Uniform {
        zero_one_q15: self.fixed_q15,
        one_two_q15: self.fixed_q15,
      },
      QuantRoundingLevel::TuLevel if !at_cu_origin => {
        self.tu_level.generate(cabac, trans_size, luma, self.lambda_mod_q8);
        self.tu_level.as_rounding()
      }
      _ => {
        let tables = &self.cu_level[!luma as usize];
        tables[log2_size(trans_size) - 2].as_rounding()
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::context::PredMode;

  #[test]
  fn free_level_rounds_to_nearest() {
    // no extra rate for the larger level: plain rounding
    assert_eq!(rounding_from_rate_delta(0, 256), MAX_ROUNDING_Q15);
  }

  #[test]
  fn expensive_levels_widen_deadzone() {
    let two_bits = rounding_from_rate_delta(2 << 12, 256);
    let six_bits = rounding_from_rate_delta(6 << 12, 256);
    assert!(two_bits < MAX_ROUNDING_Q15);
    assert!(six_bits < two_bits);
    assert!(six_bits >= 0);
    // 2 bits at unit modifier: 1 - (2 * 0.1575 + 1) / 2 ~= 0.3425
    assert_eq!(two_bits, 11224);
  }

  #[test]
  fn rounding_never_negative() {
    assert_eq!(rounding_from_rate_delta(64 << 12, 1024), 0);
  }

  #[test]
  fn sig_contexts_stay_in_range() {
    for &size in &[4, 8, 16, 32] {
      for luma in [true, false] {
        for y in 0..size {
          for x in 0..size {
            let ctx = sig_ctx(x, y, size, luma);
            let (lo, hi) = if luma {
              (SIG_COEFF_FLAG, SIG_COEFF_FLAG + SIG_COEFF_FLAG_CHROMA)
            } else {
              (SIG_COEFF_FLAG + SIG_COEFF_FLAG_CHROMA, GREATER1_FLAG)
            };
            assert!((lo..hi).contains(&ctx), "{} {} {} {}", x, y, size, luma);
          }
        }
      }
    }
  }

  #[test]
  fn b_slice_temporal_layer_scales_modifier() {
    let config = TuRdoConfig::default();
    let mut params = CuRdoParams::new(16, 37, 1 << 12);
    params.slice_type = SliceType::B;
    params.temporal_layer = 2;
    params.lambda_modifier_q8 = 256;
    // (37 - 12) / 6 = 4.17, clipped to 4
    assert_eq!(lambda_modifier_q8(&config, &params), 1024);
    params.qp = 20;
    // (20 - 12) / 6 = 1.33, clipped to 2
    assert_eq!(lambda_modifier_q8(&config, &params), 512);
    params.temporal_layer = 0;
    assert_eq!(lambda_modifier_q8(&config, &params), 256);
  }

  #[test]
  fn const_modifier_overrides() {
    let config =
      TuRdoConfig { const_lambda_modifier: true, ..TuRdoConfig::default() };
    let mut params = CuRdoParams::new(16, 30, 1 << 12);
    params.lambda_modifier_q8 = 999;
    assert_eq!(
      lambda_modifier_q8(&config, &params),
      config.i_pic_lambda_modifier_q8
    );
    params.slice_type = SliceType::P;
    assert_eq!(
      lambda_modifier_q8(&config, &params),
      config.const_lambda_modifier_q8
    );
  }

  #[test]
  fn tu_level_falls_back_to_cu_tables_at_origin() {
    let config = TuRdoConfig::default()
      .with_quant_rounding(QuantRoundingLevel::TuLevel);
    let params =
      CuRdoParams::new(32, 32, 1 << 12).with_pred_mode(PredMode::Inter);
    let start = CabacContexts::new(SliceType::P, 32, false);
    let mut rounding = QuantRounding::new();
    rounding.start_cu(&config, &params, &start);

    // walk the contexts away from the CU-start state
    let mut later = start;
    for _ in 0..20 {
      later.encode_bin(SIG_COEFF_FLAG + 1, true);
    }

    let at_origin = match rounding.factors(4, true, true, &later) {
      Rounding::PerPosition { zero_one_q15, .. } => zero_one_q15.to_vec(),
      Rounding::Uniform { .. } => unreachable!(),
    };
    let mut expected = RoundingFactors::new(4);
    expected.generate(&start, 4, true, 256);
    assert_eq!(at_origin, expected.zero_one);

    let elsewhere = match rounding.factors(4, true, false, &later) {
      Rounding::PerPosition { zero_one_q15, .. } => zero_one_q15.to_vec(),
      Rounding::Uniform { .. } => unreachable!(),
    };
    assert_ne!(elsewhere, expected.zero_one);
  }

  #[test]
  fn fixed_level_is_uniform() {
    let config = TuRdoConfig::default();
    let params = CuRdoParams::new(8, 30, 1 << 12);
    let mut rounding = QuantRounding::new();
    rounding.start_cu(&config, &params, &CabacContexts::default());
    assert_eq!(
      rounding.factors(8, false, false, &CabacContexts::default()),
      Rounding::Uniform {
        zero_one_q15: config.intra_rounding_q15,
        one_two_q15: config.intra_rounding_q15,
      }
    );
  }
}
