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
use crate::oracle::TransformOracle;
use crate::tree::NodeId;
use crate::util::Pixel;

/// Decides the node by committing its four children first and then
/// evaluating the node itself as a leaf against the contexts it would have
/// been coded with. Returns the cost of what was committed.
///
/// The leaf's bytes are written after the children's and moved down if it
/// wins. Ties go to the leaf.
#[profiling::function]
pub fn select_bottom_up<T: Pixel, O: TransformOracle<T>>(
  s: &mut TuSearch<'_, '_, T, O>, id: NodeId,
) -> i64 {
  let Some(children) = s.tree[id].children else {
    return s.force_leaf(id);
  };
  let subtus = s.params.subtus;
  let start = s.dst.ecd.checkpoint();
  let mut leaf_cabac = *s.dst.cabac;

  let split_signal = s.signal_cost_live(id, TransformFlag::Split);
  let mut child_cost = split_signal;
  for child in children {
    child_cost = child_cost.saturating_add(select_bottom_up(s, child));
  }
  let child_bytes = s.dst.ecd.tell() - start.offset();

  if !s.tree[id].is_valid {
    let node = &mut s.tree[id];
    node.signal_cost = split_signal;
    node.subtree_ecd_bytes = child_bytes;
    return child_cost;
  }

  let leaf_start = s.dst.ecd.checkpoint();
  s.evaluate_scratch(id, &leaf_cabac);
  let signal = s.signal_cost(id, &mut leaf_cabac, TransformFlag::Leaf);
  let parent_cost = s.tree[id].leaf_cost(subtus) + signal;
  let parent_bytes = s.dst.ecd.tell() - leaf_start.offset();

  let (x, y) = s.tree[id].pos();
  let size = s.tree[id].size();
  if parent_cost <= child_cost {
    s.commit(id, &leaf_cabac);
    s.dst.ecd.relocate(leaf_start, start, parent_bytes);
    let node = &mut s.tree[id];
    node.signal_cost = signal;
    node.subtree_ecd_bytes = parent_bytes;
    log::trace!(
      "{}x{} at ({}, {}): leaf, cost {} <= {}",
      size,
      size,
      x,
      y,
      parent_cost,
      child_cost
    );
    parent_cost
  } else {
    s.dst.ecd.rollback(leaf_start);
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
  }
}
