// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use thiserror::Error;

use crate::serialize::{Deserialize, Serialize};
use crate::tree::{MAX_CU_SIZE, MAX_TU_SIZE, MIN_CU_SIZE, MIN_TU_SIZE};
use crate::util::log2_size;

/// Enumeration of possible invalid configuration errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum InvalidConfig {
  /// The bit depth is invalid.
  #[error("invalid bit depth {0} (expected 8, 10 or 12)")]
  InvalidBitDepth(usize),
  /// The minimum or maximum TU size is invalid.
  #[error("invalid TU size range {min}..={max} (expected 4 to 32)")]
  InvalidTuSizeRange {
    /// The configured minimum.
    min: usize,
    /// The configured maximum.
    max: usize,
  },
  /// A fixed quant rounding factor is invalid.
  #[error("invalid rounding factor {0} (expected >= 0, <= 16384 in Q15)")]
  InvalidRoundingFactor(i32),
  /// A lambda modifier is invalid.
  #[error("invalid lambda modifier {0} (expected > 0, <= 1024 in Q8)")]
  InvalidLambdaModifier(u32),
  /// The sample type cannot hold the configured bit depth.
  #[error("bit depth {bit_depth} does not fit in {max}-bit samples")]
  BitDepthExceedsPixel {
    /// The configured bit depth.
    bit_depth: usize,
    /// Bits available in the sample type.
    max: usize,
  },
  /// The CU size is not a power of 2 in 8..=64 or is below the minimum TU
  /// size.
  #[error("invalid CU size {cu_size} (minimum TU size {min_tu_size})")]
  InvalidCuSize {
    /// The CU size of the request.
    cu_size: usize,
    /// The configured minimum TU size.
    min_tu_size: usize,
  },
}

/// Chroma subsampling format.
#[derive(
  Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum ChromaSampling {
  /// Both vertically and horizontally subsampled.
  #[default]
  Cs420,
  /// Horizontally subsampled.
  Cs422,
  /// Monochrome.
  Cs400,
}

impl ChromaSampling {
  pub const fn has_chroma(self) -> bool {
    !matches!(self, ChromaSampling::Cs400)
  }

  pub const fn is_422(self) -> bool {
    matches!(self, ChromaSampling::Cs422)
  }

  /// Number of chroma subTUs per plane of a chroma-carrying node.
  pub const fn subtus(self) -> usize {
    match self {
      ChromaSampling::Cs422 => 2,
      ChromaSampling::Cs420 => 1,
      ChromaSampling::Cs400 => 0,
    }
  }

  /// Height in rows of the interleaved chroma plane of a CU of `cu_size`.
  pub const fn chroma_height(self, cu_size: usize) -> usize {
    match self {
      ChromaSampling::Cs422 => cu_size,
      ChromaSampling::Cs420 => cu_size / 2,
      ChromaSampling::Cs400 => 0,
    }
  }
}

/// Exploration order of the quadtree search.
#[derive(
  Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum SelectorKind {
  /// Evaluate a node as a leaf first and only descend when it codes
  /// residual.
  #[default]
  TopDown,
  /// Evaluate all children first, then the node as a leaf.
  BottomUp,
}

/// How the quantiser rounding offsets are derived.
#[derive(
  Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum QuantRoundingLevel {
  /// Constant offsets from the configuration.
  #[default]
  Fixed,
  /// Per-position offsets computed once per CU from the CABAC state at the
  /// start of the CU.
  CuLevel,
  /// Per-position offsets recomputed for every TU from the CABAC state it
  /// is evaluated against.
  TuLevel,
}

/// Settings shared by every CU an [`TuRdoContext`] evaluates.
///
/// [`TuRdoContext`]: crate::context::TuRdoContext
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuRdoConfig {
  /// Sample bit depth.
  pub bit_depth: usize,
  /// Chroma subsampling.
  pub chroma_sampling: ChromaSampling,
  /// Quadtree exploration order.
  pub selector: SelectorKind,
  /// Stop evaluating siblings once the split is already costlier than the
  /// leaf (top-down only).
  pub prune_children: bool,
  /// Measure distortion on reconstructed samples rather than in the
  /// transform domain.
  pub compute_spatial_ssd: bool,
  /// Derivation of the quantiser rounding offsets.
  pub quant_rounding: QuantRoundingLevel,
  /// Rounding offset for intra CUs with [`QuantRoundingLevel::Fixed`], Q15.
  pub intra_rounding_q15: i32,
  /// Rounding offset for inter CUs with [`QuantRoundingLevel::Fixed`], Q15.
  pub inter_rounding_q15: i32,
  /// Apply [`CuRdoParams::chroma_cost_weight`] to chroma costs.
  ///
  /// [`CuRdoParams::chroma_cost_weight`]: crate::context::CuRdoParams
  pub weigh_chroma_cost: bool,
  /// Use fixed lambda modifiers instead of the per-CU value.
  pub const_lambda_modifier: bool,
  /// Lambda modifier of I slices when `const_lambda_modifier` is set, Q8.
  pub i_pic_lambda_modifier_q8: u32,
  /// Lambda modifier of P/B slices when `const_lambda_modifier` is set, Q8.
  pub const_lambda_modifier_q8: u32,
  /// Smallest TU size the syntax may signal.
  pub min_tu_size: usize,
  /// Largest TU size the syntax may signal.
  pub max_tu_size: usize,
}

impl Default for TuRdoConfig {
  fn default() -> Self {
    TuRdoConfig {
      bit_depth: 8,
      chroma_sampling: ChromaSampling::Cs420,
      selector: SelectorKind::TopDown,
      prune_children: true,
      compute_spatial_ssd: true,
      quant_rounding: QuantRoundingLevel::Fixed,
      intra_rounding_q15: (1 << 15) / 3,
      inter_rounding_q15: (1 << 15) / 6,
      weigh_chroma_cost: false,
      const_lambda_modifier: false,
      i_pic_lambda_modifier_q8: 256,
      const_lambda_modifier_q8: 218,
      min_tu_size: MIN_TU_SIZE,
      max_tu_size: MAX_TU_SIZE,
    }
  }
}

impl TuRdoConfig {
  pub fn with_bit_depth(mut self, bit_depth: usize) -> Self {
    self.bit_depth = bit_depth;
    self
  }

  pub fn with_chroma_sampling(
    mut self, chroma_sampling: ChromaSampling,
  ) -> Self {
    self.chroma_sampling = chroma_sampling;
    self
  }

  pub fn with_selector(mut self, selector: SelectorKind) -> Self {
    self.selector = selector;
    self
  }

  pub fn with_prune_children(mut self, prune_children: bool) -> Self {
    self.prune_children = prune_children;
    self
  }

  pub fn with_spatial_ssd(mut self, compute_spatial_ssd: bool) -> Self {
    self.compute_spatial_ssd = compute_spatial_ssd;
    self
  }

  pub fn with_quant_rounding(mut self, level: QuantRoundingLevel) -> Self {
    self.quant_rounding = level;
    self
  }

  pub fn with_chroma_cost_weighting(mut self, enabled: bool) -> Self {
    self.weigh_chroma_cost = enabled;
    self
  }

  pub fn with_tu_sizes(
    mut self, min_tu_size: usize, max_tu_size: usize,
  ) -> Self {
    self.min_tu_size = min_tu_size;
    self.max_tu_size = max_tu_size;
    self
  }

  /// Validates the configuration.
  ///
  /// # Errors
  ///
  /// Returns the first setting found out of range.
  pub fn validate(&self) -> Result<(), InvalidConfig> {
    use InvalidConfig::*;

    if ![8, 10, 12].contains(&self.bit_depth) {
      return Err(InvalidBitDepth(self.bit_depth));
    }
    let (min, max) = (self.min_tu_size, self.max_tu_size);
    let pow2_in_range = |s: usize| {
      s.is_power_of_two() && (MIN_TU_SIZE..=MAX_TU_SIZE).contains(&s)
    };
    if !pow2_in_range(min) || !pow2_in_range(max) || min > max {
      return Err(InvalidTuSizeRange { min, max });
    }
    for r in [self.intra_rounding_q15, self.inter_rounding_q15] {
      if !(0..=1 << 14).contains(&r) {
        return Err(InvalidRoundingFactor(r));
      }
    }
    for m in [self.i_pic_lambda_modifier_q8, self.const_lambda_modifier_q8] {
      if m == 0 || m > 1024 {
        return Err(InvalidLambdaModifier(m));
      }
    }
    Ok(())
  }

  /// Valid transform-tree depth range for a CU of `cu_size`, derived from
  /// the configured TU size bounds.
  ///
  /// # Errors
  ///
  /// Returns `InvalidCuSize` if `cu_size` is not a CU size or is smaller
  /// than the minimum TU size.
  pub fn depth_range(
    &self, cu_size: usize,
  ) -> Result<(u8, u8), InvalidConfig> {
    if !cu_size.is_power_of_two()
      || !(MIN_CU_SIZE..=MAX_CU_SIZE).contains(&cu_size)
      || cu_size < self.min_tu_size
    {
      return Err(InvalidConfig::InvalidCuSize {
        cu_size,
        min_tu_size: self.min_tu_size,
      });
    }
    let log2_cu = log2_size(cu_size);
    let min_depth = log2_cu.saturating_sub(log2_size(self.max_tu_size));
    let max_depth = log2_cu - log2_size(self.min_tu_size);
    Ok((min_depth as u8, max_depth as u8))
  }
}
