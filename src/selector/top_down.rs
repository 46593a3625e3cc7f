// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use super::TuSearch;
use crate::bits::TransformFlag;
use crate::cost::MAX_COST;
use crate::oracle::TransformOracle;
use crate::tree::NodeId;
use crate::util::Pixel;

/// Decides the node by evaluating it as a leaf first and only descending
/// when the leaf codes residual or cannot be coded at all. Returns the
/// cost of what was committed.
///
/// Ties go to the leaf. With pruning, the remaining children are skipped
/// as soon as the split can no longer win; whatever the evaluated children
/// committed is then overwritten by the leaf.
#[profiling::function]
pub fn select_top_down<T: Pixel, O: TransformOracle<T>>(
  s: &mut TuSearch<'_, '_, T, O>, id: NodeId,
) -> i64 {
  let Some(children) = s.tree[id].children else {
    return s.force_leaf(id);
  };
  let subtus = s.params.subtus;
  let is_valid = s.tree[id].is_valid;
  let start = s.dst.ecd.checkpoint();

  let mut leaf_cabac = *s.dst.cabac;
  let parent_cost = if is_valid {
    s.evaluate_scratch(id, &leaf_cabac);
    let signal = s.signal_cost(id, &mut leaf_cabac, TransformFlag::Leaf);
    let node = &mut s.tree[id];
    node.signal_cost = signal;
    node.leaf_cost(subtus) + signal
  } else {
    MAX_COST
  };
  let children_start = s.dst.ecd.checkpoint();
  let parent_bytes = children_start.offset() - start.offset();

  let node = &s.tree[id];
  let (x, y) = node.pos();
  let size = node.size();

  if is_valid && !node.any_cbf(subtus) {
    s.commit(id, &leaf_cabac);
    s.tree[id].subtree_ecd_bytes = parent_bytes;
    log::trace!(
      "{}x{} at ({}, {}): uncoded leaf, cost {}",
      size,
      size,
      x,
      y,
      parent_cost
    );
    return parent_cost;
  }

  let split_signal = s.signal_cost_live(id, TransformFlag::Split);
  let mut child_cost = split_signal;
  let mut child_bytes = 0;
  let mut evaluated = 0;
  for child in children {
    if s.prune && child_cost >= parent_cost {
      break;
    }
    child_cost = child_cost.saturating_add(select_top_down(s, child));
    child_bytes += s.tree[child].subtree_ecd_bytes;
    evaluated += 1;
  }

  if child_cost < parent_cost {
    debug_assert_eq!(evaluated, 4);
    s.dst.ecd.relocate(children_start, start, child_bytes);
    let node = &mut s.tree[id];
    node.is_valid = false;
    node.signal_cost = split_signal;
    node.subtree_ecd_bytes = child_bytes;
    log::trace!(
      "{}x{} at ({}, {}): split, cost {} < {}",
      size,
      size,
      x,
      y,
      child_cost,
      parent_cost
    );
    child_cost
  } else {
    s.dst.ecd.rollback(children_start);
    s.commit(id, &leaf_cabac);
    s.tree[id].subtree_ecd_bytes = parent_bytes;
    log::trace!(
      "{}x{} at ({}, {}): leaf, cost {} <= {} ({} of 4 children)",
      size,
      size,
      x,
      y,
      parent_cost,
      child_cost,
      evaluated
    );
    parent_cost
  }
}
