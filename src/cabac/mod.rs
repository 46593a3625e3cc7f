// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! CABAC adaptive context state, as far as rate estimation needs it.
//!
//! Only the bin cost and state transition are modelled; no arithmetic
//! coding range is tracked. The table is a plain `Copy` value so that a
//! speculative evaluation can run on its own copy and the winner can be
//! written back with a single assignment.

pub mod tables;

use std::fmt;

use crate::serialize::{Deserialize, Serialize};
use tables::*;

/// Fractional precision of the bit costs in [`BIN_TO_BITS_Q12`].
pub const CABAC_FRAC_BITS_Q: usize = 12;

pub const SPLIT_TRANSFORM_FLAG: usize = 0;
pub const CBF_LUMA: usize = SPLIT_TRANSFORM_FLAG + 3;
pub const CBF_CBCR: usize = CBF_LUMA + 2;
pub const SIG_COEFF_FLAG: usize = CBF_CBCR + 5;
/// Offset of the chroma contexts within `SIG_COEFF_FLAG`.
pub const SIG_COEFF_FLAG_CHROMA: usize = 27;
pub const GREATER1_FLAG: usize = SIG_COEFF_FLAG + 42;
/// Offset of the chroma contexts within `GREATER1_FLAG`.
pub const GREATER1_FLAG_CHROMA: usize = 16;
pub const GREATER2_FLAG: usize = GREATER1_FLAG + 24;
/// Offset of the chroma contexts within `GREATER2_FLAG`.
pub const GREATER2_FLAG_CHROMA: usize = 4;
pub const CABAC_CTXT_END: usize = GREATER2_FLAG + 6;

/// Slice type, used to select the context init table.
#[derive(
  Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum SliceType {
  #[default]
  I,
  P,
  B,
}

impl SliceType {
  /// Context init type, swapping the P and B tables when `cabac_init_flag`
  /// is set.
  pub const fn init_type(self, cabac_init_flag: bool) -> usize {
    match (self, cabac_init_flag) {
      (SliceType::I, _) => 0,
      (SliceType::P, false) | (SliceType::B, true) => 1,
      (SliceType::P, true) | (SliceType::B, false) => 2,
    }
  }
}

/// One state byte per context: `(pStateIdx << 1) | valMps`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CabacContexts {
  states: [u8; CABAC_CTXT_END],
}

impl fmt::Debug for CabacContexts {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CabacContexts")
      .field("split_transform_flag", &&self.states[..CBF_LUMA])
      .field("cbf_luma", &&self.states[CBF_LUMA..CBF_CBCR])
      .field("cbf_cbcr", &&self.states[CBF_CBCR..SIG_COEFF_FLAG])
      .finish_non_exhaustive()
  }
}

impl Default for CabacContexts {
  fn default() -> Self {
    Self::new(SliceType::I, 32, false)
  }
}

impl CabacContexts {
  /// Contexts initialised for the given slice type and slice QP.
  pub fn new(slice_type: SliceType, qp: i32, cabac_init_flag: bool) -> Self {
    let init = &INIT_VALUES[slice_type.init_type(cabac_init_flag)];
    let qp = qp.clamp(0, 51);
    let mut states = [0u8; CABAC_CTXT_END];
    for (state, &init_value) in states.iter_mut().zip(init.iter()) {
      *state = init_state(init_value, qp);
    }
    CabacContexts { states }
  }

  #[inline(always)]
  pub fn state(&self, ctx: usize) -> u8 {
    self.states[ctx]
  }

  /// Q12 cost of coding `bin` in context `ctx`, without adapting.
  #[inline(always)]
  pub fn bin_cost(&self, ctx: usize, bin: bool) -> u32 {
    BIN_TO_BITS_Q12[(self.states[ctx] ^ bin as u8) as usize] as u32
  }

  /// Q12 cost of coding `bin` in context `ctx`, adapting the context the
  /// way the entropy coder would.
  #[inline(always)]
  pub fn encode_bin(&mut self, ctx: usize, bin: bool) -> u32 {
    let state = self.states[ctx];
    self.states[ctx] = NEXT_STATE[((state as usize) << 1) | bin as usize];
    BIN_TO_BITS_Q12[(state ^ bin as u8) as usize] as u32
  }

  pub const fn checkpoint(&self) -> CabacContexts {
    *self
  }

  pub fn rollback(&mut self, checkpoint: &CabacContexts) {
    *self = *checkpoint;
  }
}

fn init_state(init_value: u8, qp: i32) -> u8 {
  let slope = ((init_value >> 4) as i32) * 5 - 45;
  let offset = (((init_value & 15) as i32) << 3) - 16;
  let pre = (((slope * qp) >> 4) + offset).clamp(1, 126);
  if pre <= 63 {
    ((63 - pre) << 1) as u8
  } else {
    (((pre - 64) << 1) | 1) as u8
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn init_value_154_is_equiprobable() {
    // 154 is the "no knowledge" init value at every QP
    for qp in [0, 22, 37, 51] {
      let state = init_state(154, qp);
      assert_eq!(state >> 1, 0, "qp {}", qp);
    }
  }

  #[test]
  fn init_clamps_qp() {
    let low = CabacContexts::new(SliceType::I, -12, false);
    let zero = CabacContexts::new(SliceType::I, 0, false);
    assert_eq!(low, zero);
  }

  #[test]
  fn debug_lists_tree_syntax_contexts() {
    let text = format!("{:?}", CabacContexts::default());
    assert!(text.starts_with("CabacContexts { split_transform_flag: ["));
    assert!(text.contains("cbf_luma: ["));
    assert!(text.ends_with(", .. }"));
  }

  #[test]
  fn mps_cheaper_than_lps() {
    let ctx = CabacContexts::new(SliceType::B, 30, false);
    for c in 0..CABAC_CTXT_END {
      let mps = ctx.state(c) & 1 == 1;
      assert!(ctx.bin_cost(c, mps) <= ctx.bin_cost(c, !mps));
    }
  }

  #[test]
  fn repeated_bins_get_cheaper() {
    let mut ctx = CabacContexts::new(SliceType::I, 32, false);
    let first = ctx.encode_bin(CBF_LUMA, true);
    let mut last = first;
    for _ in 0..16 {
      last = ctx.encode_bin(CBF_LUMA, true);
    }
    assert!(last < first);
  }

  #[test]
  fn lps_at_state_zero_flips_mps() {
    let mut ctx = CabacContexts::new(SliceType::I, 32, false);
    // walk the context to the equiprobable state
    ctx.states[CBF_LUMA] = 0;
    ctx.encode_bin(CBF_LUMA, true);
    assert_eq!(ctx.state(CBF_LUMA), 1);
  }

  #[test]
  fn rollback_restores_snapshot() {
    let mut ctx = CabacContexts::default();
    let cp = ctx.checkpoint();
    ctx.encode_bin(SPLIT_TRANSFORM_FLAG, true);
    ctx.encode_bin(CBF_CBCR + 2, false);
    assert_ne!(ctx, cp);
    ctx.rollback(&cp);
    assert_eq!(ctx, cp);
  }
}
