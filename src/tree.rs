// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The transform quadtree of one CU.
//!
//! Nodes live in a fixed arena laid out depth by depth. A node at depth `d`
//! whose parent has raster index `r` in the `2^(d-1)`-wide grid of depth
//! `d - 1` sits at `DEPTH_START[d] + 4 * r + quadrant`, so parents and
//! children are found with index arithmetic alone.

use std::ops::{Index, IndexMut};

use arrayvec::ArrayVec;

use crate::config::ChromaSampling;
use crate::plane::ChromaPlane;

pub const MIN_TU_SIZE: usize = 4;
pub const MAX_TU_SIZE: usize = 32;
pub const MAX_CU_SIZE: usize = 64;
pub const MIN_CU_SIZE: usize = 8;
pub const MAX_TU_DEPTH: usize = 4;

/// 1 + 4 + 16 + 64 + 256
pub const MAX_TU_NODES: usize = 341;

/// Upper bound on the leaves of a CU, all of them 4x4 in a 64x64 CU.
pub const MAX_TUS_IN_CU: usize = (MAX_CU_SIZE / MIN_TU_SIZE).pow(2);

const DEPTH_START: [usize; MAX_TU_DEPTH + 1] = [0, 1, 5, 21, 85];

/// Stable index of a node in a [`TuTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u16);

impl NodeId {
  pub const ROOT: NodeId = NodeId(0);

  #[inline(always)]
  pub const fn index(self) -> usize {
    self.0 as usize
  }
}

/// Quadrant of a node within its parent, in coding order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuadPos {
  #[default]
  TopLeft = 0,
  TopRight = 1,
  BottomLeft = 2,
  BottomRight = 3,
}

impl QuadPos {
  pub const ALL: [QuadPos; 4] = [
    QuadPos::TopLeft,
    QuadPos::TopRight,
    QuadPos::BottomLeft,
    QuadPos::BottomRight,
  ];

  /// Offset of this quadrant from its parent's origin, for quadrants of
  /// side `size`.
  #[inline(always)]
  pub const fn offset(self, size: usize) -> (usize, usize) {
    let q = self as usize;
    ((q & 1) * size, (q >> 1) * size)
  }
}

/// Results of one plane of one node evaluated as a leaf.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TuNodeData {
  pub ssd: i64,
  pub cost: i64,
  /// Cost if the coefficients were forced to zero.
  pub not_coded_cost: i64,
  /// Residual bits reported by the transform oracle.
  pub bits: u32,
  pub sad: u32,
  pub cbf: bool,
  /// `Some(id)` when a spatial reconstruction was produced, `None` when only
  /// coefficients are available.
  pub recon_buf: Option<u8>,
  pub ecd_bytes: usize,
  pub zero_col: u32,
  pub zero_row: u32,
  pub size: usize,
  /// Position in samples of this plane, CU-relative.
  pub pos_x: usize,
  pub pos_y: usize,
}

impl TuNodeData {
  fn placed(size: usize, pos_x: usize, pos_y: usize) -> Self {
    TuNodeData { size, pos_x, pos_y, ..Default::default() }
  }

  /// Drops the results of a previous evaluation, keeping the geometry.
  pub fn clear_results(&mut self) {
    *self = TuNodeData::placed(self.size, self.pos_x, self.pos_y);
  }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TuTreeNode {
  pub luma: TuNodeData,
  /// Indexed by `[plane][subtu]`; subTU 1 is only used for 4:2:2.
  pub chroma: [[TuNodeData; 2]; 2],
  pub depth: u8,
  pub quad: QuadPos,
  /// Set when the node may be coded as a leaf. After the search it marks
  /// a committed leaf; a committed split is invalid.
  pub is_valid: bool,
  pub children: Option<[NodeId; 4]>,
  /// Set once the node has been evaluated as a leaf for this CU.
  pub evaluated: bool,
  /// Rate cost of the split and cbf syntax of the node in its committed
  /// form: the leaf flags for a leaf, the split flags for a split.
  pub signal_cost: i64,
  /// Entropy bytes of the committed subtree rooted here.
  pub subtree_ecd_bytes: usize,
}

impl TuTreeNode {
  #[inline(always)]
  pub const fn size(&self) -> usize {
    self.luma.size
  }

  #[inline(always)]
  pub const fn pos(&self) -> (usize, usize) {
    (self.luma.pos_x, self.luma.pos_y)
  }

  #[inline(always)]
  pub const fn is_leaf(&self) -> bool {
    self.children.is_none()
  }

  /// Whether chroma of this node is coded with the node itself: always
  /// above 4x4, and only by the top-left quadrant of a split 8x8.
  pub const fn carries_chroma(&self) -> bool {
    let (x, y) = self.pos();
    self.size() > 4 || (self.size() == 4 && x % 8 == 0 && y % 8 == 0)
  }

  /// Chroma results the node codes: none unless it carries chroma.
  fn coded_chroma(
    &self, subtus: usize,
  ) -> impl Iterator<Item = &TuNodeData> + '_ {
    let subtus = if self.carries_chroma() { subtus } else { 0 };
    self.chroma.iter().flat_map(move |plane| plane[..subtus].iter())
  }

  /// Cbf of `plane` over its subTUs.
  pub fn chroma_cbf(&self, plane: ChromaPlane, subtus: usize) -> bool {
    self.carries_chroma()
      && self.chroma[plane.index()][..subtus].iter().any(|d| d.cbf)
  }

  pub fn any_cbf(&self, subtus: usize) -> bool {
    self.luma.cbf || self.coded_chroma(subtus).any(|d| d.cbf)
  }

  /// Cost of the node as a leaf over all planes.
  pub fn leaf_cost(&self, subtus: usize) -> i64 {
    self.luma.cost + self.coded_chroma(subtus).map(|d| d.cost).sum::<i64>()
  }

  /// Entropy bytes of the node as a leaf over all planes.
  pub fn leaf_ecd_bytes(&self, subtus: usize) -> usize {
    self.luma.ecd_bytes
      + self.coded_chroma(subtus).map(|d| d.ecd_bytes).sum::<usize>()
  }

  /// Forgets any previous evaluation so the node can be evaluated again.
  pub fn clear_results(&mut self) {
    self.luma.clear_results();
    for d in self.chroma.iter_mut().flatten() {
      d.clear_results();
    }
    self.evaluated = false;
    self.signal_cost = 0;
    self.subtree_ecd_bytes = 0;
  }
}

/// Arena holding the transform quadtree of one CU.
#[derive(Clone, Debug)]
pub struct TuTree {
  nodes: Vec<TuTreeNode>,
  cu_size: usize,
  min_depth: u8,
  max_depth: u8,
  chroma: ChromaSampling,
}

impl Default for TuTree {
  fn default() -> Self {
    Self::new()
  }
}

impl Index<NodeId> for TuTree {
  type Output = TuTreeNode;
  #[inline(always)]
  fn index(&self, id: NodeId) -> &TuTreeNode {
    &self.nodes[id.index()]
  }
}

impl IndexMut<NodeId> for TuTree {
  #[inline(always)]
  fn index_mut(&mut self, id: NodeId) -> &mut TuTreeNode {
    &mut self.nodes[id.index()]
  }
}

impl TuTree {
  pub fn new() -> Self {
    TuTree {
      nodes: vec![TuTreeNode::default(); MAX_TU_NODES],
      cu_size: 0,
      min_depth: 0,
      max_depth: 0,
      chroma: ChromaSampling::Cs400,
    }
  }

  pub const fn cu_size(&self) -> usize {
    self.cu_size
  }

  pub const fn min_depth(&self) -> u8 {
    self.min_depth
  }

  pub const fn max_depth(&self) -> u8 {
    self.max_depth
  }

  pub const fn chroma_sampling(&self) -> ChromaSampling {
    self.chroma
  }

  /// Chroma subTUs per plane, 0 without chroma.
  pub const fn subtus(&self) -> usize {
    self.chroma.subtus()
  }

  /// Lays out the tree of a CU of `cu_size`, marking nodes of depth
  /// `min_depth..=max_depth` valid and wiring children wherever the depth
  /// and size allow a further split.
  ///
  /// The result depends only on the arguments, never on what the arena
  /// held before.
  ///
  /// # Panics
  ///
  /// - If `cu_size` is not 8, 16, 32 or 64.
  /// - If the depth range is empty or reaches below 4x4.
  pub fn init(
    &mut self, cu_size: usize, min_depth: u8, max_depth: u8,
    chroma: ChromaSampling,
  ) {
    assert!(matches!(cu_size, 8 | 16 | 32 | 64), "bad CU size {}", cu_size);
    assert!(min_depth <= max_depth);
    assert!(max_depth as usize <= MAX_TU_DEPTH);
    assert!(cu_size >> max_depth >= MIN_TU_SIZE);

    self.cu_size = cu_size;
    self.min_depth = min_depth;
    self.max_depth = max_depth;
    self.chroma = chroma;
    self.init_node(NodeId::ROOT, 0, 0, 0, QuadPos::TopLeft);
  }

  fn init_node(
    &mut self, id: NodeId, depth: u8, x: usize, y: usize, quad: QuadPos,
  ) {
    let size = self.cu_size >> depth;
    let is_420 = !self.chroma.is_422();
    let subtus = self.subtus();
    let is_valid = (self.min_depth..=self.max_depth).contains(&depth);
    let children = (depth < self.max_depth && size > MIN_TU_SIZE).then(|| {
      QuadPos::ALL.map(|q| {
        let (dx, dy) = q.offset(size >> 1);
        Self::node_id(self.cu_size, depth + 1, x + dx, y + dy)
      })
    });

    let node = &mut self[id];
    *node = TuTreeNode {
      luma: TuNodeData::placed(size, x, y),
      depth,
      quad,
      is_valid,
      children,
      ..Default::default()
    };
    for plane in node.chroma.iter_mut() {
      for (i, data) in plane[..subtus].iter_mut().enumerate() {
        let (csize, step) = if size > 4 {
          (size >> 1, size >> 1)
        } else if quad == QuadPos::TopLeft {
          (size, size)
        } else {
          (size >> 1, size)
        };
        let cy = if is_420 { y >> 1 } else { y + i * step };
        *data = TuNodeData::placed(csize, x >> 1, cy);
      }
    }

    if let Some(children) = children {
      for (q, child) in QuadPos::ALL.into_iter().zip(children) {
        let (dx, dy) = q.offset(size >> 1);
        self.init_node(child, depth + 1, x + dx, y + dy, q);
      }
    }
  }

  /// Arena index of the node at `depth` whose top-left luma sample is
  /// (`x`, `y`).
  pub fn node_id(cu_size: usize, depth: u8, x: usize, y: usize) -> NodeId {
    if depth == 0 {
      return NodeId::ROOT;
    }
    let d = depth as usize;
    let size = cu_size >> d;
    let grid = 1 << (d - 1);
    let parent_raster = x / (2 * size) + grid * (y / (2 * size));
    let quad = (x / size) % 2 + 2 * ((y / size) % 2);
    NodeId((DEPTH_START[d] + 4 * parent_raster + quad) as u16)
  }

  /// The node this one was split from, `None` for the root.
  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    let node = &self[id];
    if node.depth == 0 {
      return None;
    }
    let parent_size = node.size() << 1;
    let (x, y) = node.pos();
    let (px, py) = (x - x % parent_size, y - y % parent_size);
    Some(Self::node_id(self.cu_size, node.depth - 1, px, py))
  }

  /// Committed leaves in coding order (TL, TR, BL, BR, depth first).
  pub fn leaves(&self) -> ArrayVec<NodeId, MAX_TUS_IN_CU> {
    let mut leaves = ArrayVec::new();
    self.collect_leaves(NodeId::ROOT, &mut leaves);
    leaves
  }

  fn collect_leaves(
    &self, id: NodeId, leaves: &mut ArrayVec<NodeId, MAX_TUS_IN_CU>,
  ) {
    match self[id].children {
      None => leaves.push(id),
      Some(children) => {
        for child in children {
          self.collect_leaves(child, leaves);
        }
      }
    }
  }

  /// Luma area covered by the committed leaves.
  pub fn coverage(&self) -> usize {
    self.leaves().iter().map(|&id| self[id].size().pow(2)).sum()
  }

  /// Whether every reachable node is either a valid leaf or an invalid
  /// node with four children.
  pub fn is_committed(&self) -> bool {
    self.is_committed_from(NodeId::ROOT)
  }

  fn is_committed_from(&self, id: NodeId) -> bool {
    let node = &self[id];
    match node.children {
      None => node.is_valid,
      Some(children) => {
        !node.is_valid && children.iter().all(|&c| self.is_committed_from(c))
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use interpolate_name::interpolate_test;

  fn reachable(tree: &TuTree) -> Vec<NodeId> {
    let mut out = vec![];
    let mut stack = vec![NodeId::ROOT];
    while let Some(id) = stack.pop() {
      out.push(id);
      if let Some(children) = tree[id].children {
        stack.extend(children);
      }
    }
    out
  }

  fn check_init(cu_size: usize) {
    let max_depth_limit = (cu_size / MIN_TU_SIZE).trailing_zeros() as u8;
    for min_depth in 0..=max_depth_limit {
      for max_depth in min_depth..=max_depth_limit {
        let mut tree = TuTree::new();
        tree.init(cu_size, min_depth, max_depth, ChromaSampling::Cs420);
        let nodes = reachable(&tree);
        let expected: usize =
          (0..=max_depth as u32).map(|d| 4usize.pow(d)).sum();
        assert_eq!(nodes.len(), expected);
        for id in nodes {
          let node = &tree[id];
          let depth = node.depth;
          assert_eq!(node.size(), cu_size >> depth);
          assert_eq!(node.is_valid, (min_depth..=max_depth).contains(&depth));
          let splittable = depth < max_depth && node.size() > MIN_TU_SIZE;
          assert_eq!(node.children.is_some(), splittable);
          if let Some(children) = node.children {
            for (q, &c) in QuadPos::ALL.iter().zip(children.iter()) {
              let (dx, dy) = q.offset(node.size() / 2);
              let (x, y) = node.pos();
              assert_eq!(tree[c].pos(), (x + dx, y + dy));
              assert_eq!(tree[c].quad, *q);
              assert_eq!(tree.parent(c), Some(id));
            }
          }
        }
      }
    }
  }

  #[interpolate_test(cu_8, 8)]
  #[interpolate_test(cu_16, 16)]
  #[interpolate_test(cu_32, 32)]
  #[interpolate_test(cu_64, 64)]
  fn init_marks_depth_range(cu_size: usize) {
    check_init(cu_size);
  }

  #[test]
  fn full_depth_uses_whole_arena() {
    let mut tree = TuTree::new();
    tree.init(64, 0, 4, ChromaSampling::Cs420);
    let mut ids: Vec<usize> =
      reachable(&tree).into_iter().map(NodeId::index).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..MAX_TU_NODES).collect::<Vec<_>>());
  }

  #[test]
  fn reinit_is_idempotent() {
    let mut fresh = TuTree::new();
    fresh.init(32, 0, 2, ChromaSampling::Cs422);

    let mut reused = TuTree::new();
    reused.init(64, 1, 4, ChromaSampling::Cs420);
    // scribble over the arena the way a search would
    for id in reachable(&reused) {
      reused[id].is_valid = !reused[id].is_valid;
      reused[id].children = None;
      reused[id].luma.cost = 1234;
      reused[id].luma.cbf = true;
    }
    reused.init(32, 0, 2, ChromaSampling::Cs422);

    for id in reachable(&fresh) {
      assert_eq!(reused[id], fresh[id]);
    }
  }

  #[test]
  fn chroma_geometry_420() {
    let mut tree = TuTree::new();
    tree.init(16, 0, 2, ChromaSampling::Cs420);
    let root = &tree[NodeId::ROOT];
    assert_eq!(root.chroma[0][0].size, 8);
    let n8 = TuTree::node_id(16, 1, 8, 8);
    let cb = &tree[n8].chroma[ChromaPlane::Cb.index()][0];
    assert_eq!((cb.size, cb.pos_x, cb.pos_y), (4, 4, 4));
    // the 4x4 quadrants of the 8x8 at (8, 8)
    let tl = TuTree::node_id(16, 2, 8, 8);
    let br = TuTree::node_id(16, 2, 12, 12);
    assert_eq!(tree[tl].chroma[0][0].size, 4);
    assert!(tree[tl].carries_chroma());
    assert_eq!(tree[br].chroma[0][0].size, 2);
    assert!(!tree[br].carries_chroma());
  }

  #[test]
  fn chroma_geometry_422() {
    let mut tree = TuTree::new();
    tree.init(16, 0, 2, ChromaSampling::Cs422);
    let n8 = TuTree::node_id(16, 1, 0, 8);
    let cr = &tree[n8].chroma[ChromaPlane::Cr.index()];
    assert_eq!((cr[0].size, cr[0].pos_x, cr[0].pos_y), (4, 0, 8));
    assert_eq!((cr[1].size, cr[1].pos_x, cr[1].pos_y), (4, 0, 12));
    let tl = TuTree::node_id(16, 2, 0, 8);
    let cb = &tree[tl].chroma[ChromaPlane::Cb.index()];
    assert_eq!((cb[0].size, cb[0].pos_y), (4, 8));
    assert_eq!((cb[1].size, cb[1].pos_y), (4, 12));
  }

  #[test]
  fn parent_lookup_matches_wiring() {
    let mut tree = TuTree::new();
    tree.init(64, 0, 4, ChromaSampling::Cs400);
    assert_eq!(tree.parent(NodeId::ROOT), None);
    for id in reachable(&tree) {
      if let Some(children) = tree[id].children {
        for c in children {
          assert_eq!(tree.parent(c), Some(id));
        }
      }
    }
  }

  #[test]
  fn fresh_tree_is_single_leaf_when_unsplittable() {
    let mut tree = TuTree::new();
    tree.init(8, 0, 0, ChromaSampling::Cs420);
    assert!(tree.is_committed());
    assert_eq!(tree.coverage(), 64);
  }
}
