// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Per-CU parameters and the per-worker search context.

use crate::bits::SplitCbfParams;
use crate::cabac::SliceType;
use crate::config::{InvalidConfig, TuRdoConfig};
use crate::cost::CHROMA_COST_WEIGHT_ONE;
use crate::flatten::{flatten, CuTuResult};
use crate::oracle::{SsdDomain, TransformOracle};
use crate::processor::*;
use crate::quantize::{QuantRounding, LAMBDA_MODIFIER_Q};
use crate::selector::{self, TuSearch};
use crate::serialize::{Deserialize, Serialize};
use crate::split_array::map_split_array;
use crate::tree::{NodeId, TuTree, MAX_TU_DEPTH};
use crate::util::Pixel;

/// Prediction mode of a CU.
#[derive(
  Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum PredMode {
  #[default]
  Intra,
  Inter,
  /// Inter without residual syntax.
  Skip,
}

impl PredMode {
  pub const fn is_intra(self) -> bool {
    matches!(self, PredMode::Intra)
  }
}

/// What the encoder loop knows about the CU being searched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuRdoParams {
  pub cu_size: usize,
  /// Frame position of the CU in luma samples.
  pub cu_x: usize,
  pub cu_y: usize,
  /// Transform depth range, derived from the configured TU sizes when
  /// `None`.
  pub depth_range: Option<(u8, u8)>,
  pub qp: i8,
  /// Luma lambda, Q8.
  pub lambda: u32,
  /// Chroma lambda, Q8.
  pub chroma_lambda: u32,
  /// Q16 weight of chroma costs, used with
  /// [`TuRdoConfig::weigh_chroma_cost`].
  pub chroma_cost_weight: u32,
  pub pred_mode: PredMode,
  /// Intra CU predicted as four NxN blocks.
  pub intra_nxn: bool,
  pub slice_type: SliceType,
  pub temporal_layer: u8,
  /// Q8.
  pub lambda_modifier_q8: u32,
}

impl CuRdoParams {
  /// An intra CU at the frame origin with equal luma and chroma lambdas.
  pub fn new(cu_size: usize, qp: i8, lambda: u32) -> Self {
    CuRdoParams {
      cu_size,
      cu_x: 0,
      cu_y: 0,
      depth_range: None,
      qp,
      lambda,
      chroma_lambda: lambda,
      chroma_cost_weight: CHROMA_COST_WEIGHT_ONE,
      pred_mode: PredMode::Intra,
      intra_nxn: false,
      slice_type: SliceType::I,
      temporal_layer: 0,
      lambda_modifier_q8: 1 << LAMBDA_MODIFIER_Q,
    }
  }

  pub fn with_position(mut self, cu_x: usize, cu_y: usize) -> Self {
    self.cu_x = cu_x;
    self.cu_y = cu_y;
    self
  }

  pub fn with_depth_range(mut self, min_depth: u8, max_depth: u8) -> Self {
    self.depth_range = Some((min_depth, max_depth));
    self
  }

  pub fn with_pred_mode(mut self, pred_mode: PredMode) -> Self {
    self.pred_mode = pred_mode;
    self
  }

  pub fn with_intra_nxn(mut self, intra_nxn: bool) -> Self {
    self.intra_nxn = intra_nxn;
    self
  }

  pub fn with_chroma_lambda(mut self, lambda: u32, weight: u32) -> Self {
    self.chroma_lambda = lambda;
    self.chroma_cost_weight = weight;
    self
  }

  pub fn with_slice(
    mut self, slice_type: SliceType, temporal_layer: u8,
  ) -> Self {
    self.slice_type = slice_type;
    self.temporal_layer = temporal_layer;
    self
  }
}

/// Search state owned by one encoder worker and reused for every CU it
/// processes.
#[derive(Clone, Debug)]
pub struct TuRdoContext<T: Pixel> {
  config: TuRdoConfig,
  tree: TuTree,
  scratch: Vec<TuScratch<T>>,
  rounding: QuantRounding,
}

impl<T: Pixel> TuRdoContext<T> {
  /// # Errors
  ///
  /// Returns `InvalidConfig` if the configuration is invalid or `T` cannot
  /// hold its bit depth.
  pub fn new(config: TuRdoConfig) -> Result<Self, InvalidConfig> {
    config.validate()?;
    if config.bit_depth > T::max_bit_depth() {
      return Err(InvalidConfig::BitDepthExceedsPixel {
        bit_depth: config.bit_depth,
        max: T::max_bit_depth(),
      });
    }
    Ok(TuRdoContext {
      config,
      tree: TuTree::new(),
      scratch: (0..=MAX_TU_DEPTH).map(|_| TuScratch::new()).collect(),
      rounding: QuantRounding::new(),
    })
  }

  pub const fn config(&self) -> &TuRdoConfig {
    &self.config
  }

  /// The tree committed by the last search.
  pub const fn tree(&self) -> &TuTree {
    &self.tree
  }

  /// Lays out the tree for `params`. A requested depth range is narrowed
  /// to the configured TU sizes, and NxN intra CUs always split at the
  /// root.
  fn prepare(&mut self, params: &CuRdoParams) -> Result<(), InvalidConfig> {
    let (lo, hi) = self.config.depth_range(params.cu_size)?;
    let (min_depth, max_depth) = params.depth_range.unwrap_or((lo, hi));
    let min_depth = min_depth.max(lo).max(params.intra_nxn as u8).min(hi);
    let max_depth = max_depth.min(hi).max(min_depth);
    if params.depth_range.is_some_and(|r| r != (min_depth, max_depth)) {
      log::trace!(
        "{}x{} CU depth range narrowed to {}..={}",
        params.cu_size,
        params.cu_size,
        min_depth,
        max_depth
      );
    }
    self.tree.init(
      params.cu_size,
      min_depth,
      max_depth,
      self.config.chroma_sampling,
    );
    Ok(())
  }

  fn run<O: TransformOracle<T>>(
    &mut self, params: &CuRdoParams, src: &TuSources<'_, T>,
    dst: &mut TuTargets<'_, T>, oracle: &mut O,
    walk: impl FnOnce(&mut TuSearch<'_, '_, T, O>) -> i64,
  ) -> CuTuResult {
    let config = &self.config;
    let cu_size = params.cu_size;
    assert_eq!(src.src_luma.width(), cu_size);
    assert_eq!(dst.planes.recon_luma.width(), cu_size);
    assert_eq!(dst.nbr.cols(), cu_size >> 2);

    self.rounding.start_cu(config, params, dst.cabac);
    let ecd_start = dst.ecd.tell();
    let subtus = config.chroma_sampling.subtus();
    let process = TuProcessParams {
      qp: params.qp as i32,
      lambda: params.lambda,
      chroma_lambda: params.chroma_lambda,
      chroma_weight: config
        .weigh_chroma_cost
        .then_some(params.chroma_cost_weight),
      pred_mode: params.pred_mode,
      bit_depth: config.bit_depth,
      ssd: if config.compute_spatial_ssd {
        SsdDomain::Spatial
      } else {
        SsdDomain::Frequency
      },
      subtus,
    };
    let syntax = SplitCbfParams {
      min_tu_size: config.min_tu_size,
      max_tu_size: config.max_tu_size,
      intra: params.pred_mode.is_intra(),
      intra_nxn: params.intra_nxn,
    };
    let mut search = TuSearch {
      tree: &mut self.tree,
      scratch: &mut self.scratch,
      rounding: &mut self.rounding,
      src,
      dst: &mut *dst,
      oracle,
      params: process,
      syntax,
      qp: params.qp,
      skip: params.pred_mode == PredMode::Skip,
      prune: config.prune_children,
    };
    let cost = walk(&mut search);

    let result = flatten(&self.tree, params.cu_x, params.cu_y, params.qp);
    debug_assert_eq!(result.total_cost, cost);
    debug_assert_eq!(result.ecd_bytes, dst.ecd.tell() - ecd_start);
    debug_assert_eq!(
      result.ecd_bytes,
      self.tree[NodeId::ROOT].subtree_ecd_bytes
    );
    log::debug!(
      "CU {}x{} at ({}, {}): {} TUs, cost {}, {} bytes",
      cu_size,
      cu_size,
      params.cu_x,
      params.cu_y,
      result.tu_count(),
      result.total_cost,
      result.ecd_bytes
    );
    result
  }

  /// Searches the transform tree of one CU and commits the winner to
  /// `dst`.
  ///
  /// # Errors
  ///
  /// Returns `InvalidCuSize` if the CU size cannot be coded with the
  /// configured TU sizes.
  ///
  /// # Panics
  ///
  /// - If the planes of `src` or `dst` do not match the CU size.
  #[profiling::function]
  pub fn select<O: TransformOracle<T>>(
    &mut self, params: &CuRdoParams, src: &TuSources<'_, T>,
    dst: &mut TuTargets<'_, T>, oracle: &mut O,
  ) -> Result<CuTuResult, InvalidConfig> {
    self.prepare(params)?;
    let kind = self.config.selector;
    Ok(self.run(params, src, dst, oracle, |search| {
      selector::select(search, kind)
    }))
  }

  /// Codes one CU with the tree shape given by a split mask instead of
  /// searching.
  ///
  /// # Errors
  ///
  /// Returns `InvalidCuSize` if the CU size cannot be coded with the
  /// configured TU sizes.
  ///
  /// # Panics
  ///
  /// - If the planes of `src` or `dst` do not match the CU size.
  /// - If the mask does not describe a tree within the depth range.
  pub fn select_with_split_array<O: TransformOracle<T>>(
    &mut self, params: &CuRdoParams, split: &[i32; 4],
    src: &TuSources<'_, T>, dst: &mut TuTargets<'_, T>, oracle: &mut O,
  ) -> Result<CuTuResult, InvalidConfig> {
    self.prepare(params)?;
    map_split_array(&mut self.tree, split);
    Ok(self.run(params, src, dst, oracle, |search| {
      selector::evaluate_fixed(search, NodeId::ROOT)
    }))
  }
}
