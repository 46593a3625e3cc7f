// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! CABAC estimation of the transform-tree syntax: `split_transform_flag`,
//! `cbf_cb`/`cbf_cr` and `cbf_luma`.

use crate::cabac::*;
use crate::plane::ChromaPlane;
use crate::tree::{NodeId, TuTree};
use crate::util::log2_size;

/// Which form of the node the syntax is coded for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransformFlag {
  Leaf,
  Split,
}

/// Syntax constraints of the CU being searched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SplitCbfParams {
  pub min_tu_size: usize,
  pub max_tu_size: usize,
  pub intra: bool,
  /// Intra CU with four NxN prediction blocks; its root is always split.
  pub intra_nxn: bool,
}

/// Whether `split_transform_flag` is coded for the node, rather than
/// inferred.
pub fn split_flag_coded(
  tree: &TuTree, id: NodeId, p: &SplitCbfParams,
) -> bool {
  let node = &tree[id];
  let size = node.size();
  size <= p.max_tu_size
    && size > p.min_tu_size
    && node.depth < tree.max_depth()
    && !(p.intra_nxn && node.depth == 0)
}

/// Whether the chroma cbf of `plane` is coded at the node. A parent that
/// has not been evaluated counts as coded.
fn chroma_cbf_coded(tree: &TuTree, id: NodeId, plane: ChromaPlane) -> bool {
  let node = &tree[id];
  if tree.subtus() == 0 || node.size() <= 4 {
    return false;
  }
  match tree.parent(id) {
    None => true,
    Some(parent) => {
      let parent = &tree[parent];
      !parent.evaluated || parent.chroma_cbf(plane, tree.subtus())
    }
  }
}

/// Codes the split and cbf syntax of the node in its `flag` form into
/// `cabac`, returning the cost in Q12 bits.
///
/// A split codes the node's own chroma cbfs, as evaluated so far. A node
/// not yet evaluated codes them as set.
pub fn split_and_cbf_bits(
  tree: &TuTree, id: NodeId, cabac: &mut CabacContexts, p: &SplitCbfParams,
  flag: TransformFlag,
) -> u32 {
  let node = &tree[id];
  let size = node.size();
  let depth = node.depth as usize;
  let subtus = tree.subtus();
  let mut bits = 0;

  if split_flag_coded(tree, id, p) {
    let ctx = SPLIT_TRANSFORM_FLAG + 5 - log2_size(size);
    bits += cabac.encode_bin(ctx, flag == TransformFlag::Split);
  }

  for plane in ChromaPlane::ALL {
    if !chroma_cbf_coded(tree, id, plane) {
      continue;
    }
    let ctx = CBF_CBCR + depth;
    let cbf = |i: usize| !node.evaluated || node.chroma[plane.index()][i].cbf;
    match flag {
      TransformFlag::Leaf => {
        for i in 0..subtus {
          bits += cabac.encode_bin(ctx, cbf(i));
        }
      }
      TransformFlag::Split if subtus == 2 && size == 8 => {
        bits += cabac.encode_bin(ctx, cbf(0));
        bits += cabac.encode_bin(ctx, cbf(1));
      }
      TransformFlag::Split => {
        bits += cabac.encode_bin(ctx, (0..subtus).any(cbf));
      }
    }
  }

  if flag == TransformFlag::Leaf && (p.intra || depth != 0) {
    let ctx = CBF_LUMA + (depth == 0) as usize;
    bits += cabac.encode_bin(ctx, node.luma.cbf);
  }

  bits
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::config::ChromaSampling;

  fn params(intra_nxn: bool) -> SplitCbfParams {
    SplitCbfParams { min_tu_size: 4, max_tu_size: 32, intra: true, intra_nxn }
  }

  #[test]
  fn split_flag_presence() {
    let mut tree = TuTree::new();
    tree.init(64, 1, 4, ChromaSampling::Cs420);
    let p = params(false);
    // 64x64 exceeds the largest TU: split inferred
    assert!(!split_flag_coded(&tree, NodeId::ROOT, &p));
    assert!(split_flag_coded(&tree, TuTree::node_id(64, 1, 32, 0), &p));
    assert!(split_flag_coded(&tree, TuTree::node_id(64, 3, 8, 8), &p));
    // 4x4 cannot split
    assert!(!split_flag_coded(&tree, TuTree::node_id(64, 4, 4, 4), &p));

    tree.init(8, 0, 1, ChromaSampling::Cs420);
    assert!(split_flag_coded(&tree, NodeId::ROOT, &p));
    assert!(!split_flag_coded(&tree, NodeId::ROOT, &params(true)));

    // the last allowed depth never signals a split
    tree.init(32, 0, 1, ChromaSampling::Cs420);
    assert!(!split_flag_coded(&tree, TuTree::node_id(32, 1, 16, 16), &p));
  }

  #[test]
  fn inter_root_has_no_luma_cbf() {
    let mut tree = TuTree::new();
    tree.init(16, 0, 0, ChromaSampling::Cs400);
    let p = SplitCbfParams { intra: false, ..params(false) };
    let mut cabac = CabacContexts::default();
    let bits = split_and_cbf_bits(
      &tree,
      NodeId::ROOT,
      &mut cabac,
      &p,
      TransformFlag::Leaf,
    );
    assert_eq!(bits, 0);
    assert_eq!(cabac, CabacContexts::default());
  }

  #[test]
  fn leaf_bits_adapt_contexts() {
    let mut tree = TuTree::new();
    tree.init(16, 0, 1, ChromaSampling::Cs420);
    tree[NodeId::ROOT].evaluated = true;
    let start = CabacContexts::default();
    let mut cabac = start;
    let bits = split_and_cbf_bits(
      &tree,
      NodeId::ROOT,
      &mut cabac,
      &params(false),
      TransformFlag::Leaf,
    );
    // split flag, Cb, Cr, then luma cbf, all zero
    let mut replay = start;
    let expected = replay.encode_bin(SPLIT_TRANSFORM_FLAG + 1, false)
      + replay.encode_bin(CBF_CBCR, false)
      + replay.encode_bin(CBF_CBCR, false)
      + replay.encode_bin(CBF_LUMA + 1, false);
    assert_eq!(bits, expected);
    assert_eq!(cabac, replay);
  }

  #[test]
  fn chroma_cbf_follows_parent() {
    let mut tree = TuTree::new();
    tree.init(32, 0, 2, ChromaSampling::Cs420);
    let child = TuTree::node_id(32, 1, 16, 0);
    let p = params(false);

    // parent never evaluated: chroma coded
    let mut with_chroma = CabacContexts::default();
    let coded = split_and_cbf_bits(
      &tree,
      child,
      &mut with_chroma,
      &p,
      TransformFlag::Leaf,
    );

    // parent evaluated without chroma residual: chroma inferred
    tree[NodeId::ROOT].evaluated = true;
    let mut without = CabacContexts::default();
    let inferred =
      split_and_cbf_bits(&tree, child, &mut without, &p, TransformFlag::Leaf);
    assert!(coded > inferred);
    assert_eq!(
      without.state(CBF_CBCR + 1),
      CabacContexts::default().state(CBF_CBCR + 1)
    );

    tree[NodeId::ROOT].chroma[ChromaPlane::Cr.index()][0].cbf = true;
    let mut cr_only = CabacContexts::default();
    let one_plane =
      split_and_cbf_bits(&tree, child, &mut cr_only, &p, TransformFlag::Leaf);
    assert!(one_plane > inferred && one_plane < coded);
  }

  #[test]
  fn split_422_8x8_codes_both_subtus() {
    let mut tree = TuTree::new();
    tree.init(8, 0, 1, ChromaSampling::Cs422);
    let p = params(false);
    let mut cabac = CabacContexts::default();
    split_and_cbf_bits(
      &tree,
      NodeId::ROOT,
      &mut cabac,
      &p,
      TransformFlag::Split,
    );
    // one split flag, then two bins per plane
    let mut expected = CabacContexts::default();
    expected.encode_bin(SPLIT_TRANSFORM_FLAG + 2, true);
    for _ in 0..4 {
      expected.encode_bin(CBF_CBCR, true);
    }
    assert_eq!(cabac, expected);
  }
}
