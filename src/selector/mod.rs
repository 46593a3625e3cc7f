// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The quadtree search.
//!
//! Both exploration orders share the same discipline: anything a node
//! writes while it is only a hypothesis goes to the scratch planes of its
//! depth and to a private copy of the CABAC contexts, while its entropy
//! bytes go to the live stream at a remembered cursor. Children always
//! write to the live state. Once a node is decided, the loser's bytes are
//! dropped and the winner's are moved to where the node started.

mod bottom_up;
mod top_down;

pub use bottom_up::select_bottom_up;
pub use top_down::select_top_down;

use crate::bits::*;
use crate::cabac::CabacContexts;
use crate::commit::commit_parent;
use crate::config::SelectorKind;
use crate::cost::frac_bits_rate_cost;
use crate::oracle::TransformOracle;
use crate::processor::*;
use crate::quantize::QuantRounding;
use crate::tree::{NodeId, TuTree};
use crate::util::Pixel;

/// Everything one CU search reads and writes.
pub struct TuSearch<'s, 'a, T: Pixel, O: TransformOracle<T>> {
  pub tree: &'s mut TuTree,
  /// One scratch set per tree depth.
  pub scratch: &'s mut [TuScratch<T>],
  pub rounding: &'s mut QuantRounding,
  pub src: &'s TuSources<'s, T>,
  pub dst: &'s mut TuTargets<'a, T>,
  pub oracle: &'s mut O,
  pub params: TuProcessParams,
  pub syntax: SplitCbfParams,
  pub qp: i8,
  /// Skipped CUs code no transform tree syntax.
  pub skip: bool,
  /// Stop evaluating children once they cannot beat the parent.
  pub prune: bool,
}

impl<T: Pixel, O: TransformOracle<T>> TuSearch<'_, '_, T, O> {
  /// Rate cost of the node's syntax in its `flag` form, coded into
  /// `cabac`.
  fn signal_cost(
    &self, id: NodeId, cabac: &mut CabacContexts, flag: TransformFlag,
  ) -> i64 {
    if self.skip {
      return 0;
    }
    let bits = split_and_cbf_bits(self.tree, id, cabac, &self.syntax, flag);
    frac_bits_rate_cost(bits, self.params.lambda)
  }

  /// As [`Self::signal_cost`], against the live contexts.
  fn signal_cost_live(&mut self, id: NodeId, flag: TransformFlag) -> i64 {
    let mut cabac = *self.dst.cabac;
    let cost = self.signal_cost(id, &mut cabac, flag);
    *self.dst.cabac = cabac;
    cost
  }

  /// Evaluates the node straight into the live planes.
  fn evaluate_live(&mut self, id: NodeId) {
    let TuSearch { tree, rounding, src, dst, oracle, params, .. } = self;
    process_tu(
      &mut tree[id],
      src,
      dst.planes.reborrow(),
      dst.ecd,
      rounding,
      dst.cabac,
      params,
      &mut **oracle,
    );
  }

  /// Evaluates the node into the scratch planes of its depth, coding its
  /// residual against `cabac`. Entropy bytes still go to the live stream.
  fn evaluate_scratch(&mut self, id: NodeId, cabac: &CabacContexts) {
    let TuSearch { tree, scratch, rounding, src, dst, oracle, params, .. } =
      self;
    let node = &mut tree[id];
    process_tu(
      node,
      src,
      scratch[node.depth as usize].planes(),
      dst.ecd,
      rounding,
      cabac,
      params,
      &mut **oracle,
    );
  }

  /// Commits a node previously evaluated with [`Self::evaluate_scratch`].
  fn commit(&mut self, id: NodeId, cabac: &CabacContexts) {
    let subtus = self.params.subtus;
    let depth = self.tree[id].depth as usize;
    commit_parent(
      &mut self.tree[id],
      &self.scratch[depth],
      self.dst,
      cabac,
      self.qp,
      subtus,
    );
  }

  /// Codes the node as a leaf in place. Used where no alternative exists.
  fn force_leaf(&mut self, id: NodeId) -> i64 {
    assert!(self.tree[id].is_valid, "unsplittable node outside depth range");
    let start = self.dst.ecd.tell();
    self.evaluate_live(id);
    let signal = self.signal_cost_live(id, TransformFlag::Leaf);
    let subtus = self.params.subtus;
    let bytes = self.dst.ecd.tell() - start;
    let node = &mut self.tree[id];
    let (x, y) = node.pos();
    self.dst.nbr.stamp(x, y, node.size(), self.qp, node.luma.cbf);
    node.signal_cost = signal;
    node.subtree_ecd_bytes = bytes;
    log::trace!(
      "leaf {}x{} at ({}, {}): cost {}",
      node.size(),
      node.size(),
      x,
      y,
      node.leaf_cost(subtus) + signal
    );
    node.leaf_cost(subtus) + signal
  }
}

/// Codes the tree shape already in `search.tree`, such as one produced by
/// [`map_split_array`], evaluating every leaf in place. Returns its cost.
///
/// [`map_split_array`]: crate::split_array::map_split_array
#[profiling::function]
pub fn evaluate_fixed<T: Pixel, O: TransformOracle<T>>(
  search: &mut TuSearch<'_, '_, T, O>, id: NodeId,
) -> i64 {
  let Some(children) = search.tree[id].children else {
    return search.force_leaf(id);
  };
  let start = search.dst.ecd.tell();
  let signal = search.signal_cost_live(id, TransformFlag::Split);
  let mut cost = signal;
  for child in children {
    cost += evaluate_fixed(search, child);
  }
  let node = &mut search.tree[id];
  node.signal_cost = signal;
  node.subtree_ecd_bytes = search.dst.ecd.tell() - start;
  cost
}

/// Runs the search of `kind` from the root and returns the cost of the
/// committed tree.
pub fn select<T: Pixel, O: TransformOracle<T>>(
  search: &mut TuSearch<'_, '_, T, O>, kind: SelectorKind,
) -> i64 {
  match kind {
    SelectorKind::TopDown => select_top_down(search, NodeId::ROOT),
    SelectorKind::BottomUp => select_bottom_up(search, NodeId::ROOT),
  }
}
