// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Conversion between a committed tree and the split masks produced by
//! fast mode-decision paths.
//!
//! A mask holds one bit per splittable node of a 32x32 (or smaller) tree:
//!
//! ```text
//! CU 8:  bit 0           the 8x8
//! CU 16: bit 0           the 16x16
//!        bit 1 + q       8x8 in quadrant q
//! CU 32: bit 0           the 32x32
//!        bit b = 1 + 5q  16x16 in quadrant q
//!        bit b + 1 + r   8x8 in quadrant r of that 16x16
//! ```
//!
//! A 64x64 CU is always split; element `q` of the mask array describes its
//! 32x32 quadrant `q` with the CU 32 layout. Other CU sizes use element 0.
//! 4x4 TUs never split.

use crate::tree::{NodeId, TuTree, MAX_CU_SIZE, MIN_TU_SIZE};

/// Bit of the child in quadrant `q` of a node of side `size` at `bit`.
const fn child_bit(size: usize, bit: usize, q: usize) -> usize {
  match size {
    32 => bit + 1 + 5 * q,
    _ => bit + 1 + q,
  }
}

/// Shapes `tree`, freshly initialised, after `split`.
///
/// Split nodes become invalid; unsplit nodes lose their children.
///
/// # Panics
///
/// - If the mask splits a node that has no children, or leaves a node
///   outside the depth range unsplit.
pub fn map_split_array(tree: &mut TuTree, split: &[i32; 4]) {
  if tree.cu_size() == MAX_CU_SIZE {
    let root = &mut tree[NodeId::ROOT];
    let Some(children) = root.children else {
      panic!("64x64 CU without 32x32 children");
    };
    root.is_valid = false;
    for (&child, &word) in children.iter().zip(split.iter()) {
      map_node(tree, child, word, 0);
    }
  } else {
    map_node(tree, NodeId::ROOT, split[0], 0);
  }
}

fn map_node(tree: &mut TuTree, id: NodeId, word: i32, bit: usize) {
  let node = &mut tree[id];
  let size = node.size();
  let split = size > MIN_TU_SIZE && (word >> bit) & 1 != 0;
  if !split {
    assert!(node.is_valid, "{}x{} TU outside depth range", size, size);
    node.children = None;
    return;
  }
  let Some(children) = node.children else {
    panic!("split of a {}x{} node without children", size, size);
  };
  node.is_valid = false;
  if size == 8 {
    // 4x4 children are leaves
    for child in children {
      map_node(tree, child, 0, 0);
    }
    return;
  }
  for (q, child) in children.into_iter().enumerate() {
    map_node(tree, child, word, child_bit(size, bit, q));
  }
}

/// The mask describing the committed shape of `tree`.
pub fn split_array_from_tree(tree: &TuTree) -> [i32; 4] {
  let mut split = [0; 4];
  match tree[NodeId::ROOT].children {
    Some(children) if tree.cu_size() == MAX_CU_SIZE => {
      for (word, child) in split.iter_mut().zip(children) {
        collect(tree, child, word, 0);
      }
    }
    _ => collect(tree, NodeId::ROOT, &mut split[0], 0),
  }
  split
}

fn collect(tree: &TuTree, id: NodeId, word: &mut i32, bit: usize) {
  let node = &tree[id];
  let Some(children) = node.children else {
    return;
  };
  *word |= 1 << bit;
  if node.size() == 8 {
    return;
  }
  for (q, child) in children.into_iter().enumerate() {
    collect(tree, child, word, child_bit(node.size(), bit, q));
  }
}
