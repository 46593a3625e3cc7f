// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Linearisation of a committed tree for the bitstream writer.

use crate::plane::ChromaPlane;
use crate::tree::{NodeId, TuNodeData, TuTree};
use crate::util::log2_size;

/// Entropy bytes and reconstruction of one chroma TU.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChromaTuInfo {
  pub cbf: bool,
  pub ecd_offset: usize,
  pub ecd_bytes: usize,
  pub zero_col: u32,
  pub zero_row: u32,
  pub recon_buf: Option<u8>,
}

/// One committed leaf.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TuInfo {
  pub node: Option<NodeId>,
  /// Position in 4x4 units, frame-relative.
  pub pos_x4: usize,
  pub pos_y4: usize,
  pub log2_size: u8,
  pub first_tu_in_cu: bool,
  pub qp: i8,
  pub y_cbf: bool,
  /// Offset of the luma bytes in the entropy stream of the CU.
  pub luma_ecd_offset: usize,
  pub luma_ecd_bytes: usize,
  pub luma_zero_col: u32,
  pub luma_zero_row: u32,
  pub luma_recon_buf: Option<u8>,
  /// Indexed by `[plane][subtu]`.
  pub chroma: [[ChromaTuInfo; 2]; 2],
  /// Whether the leaf carries the chroma prediction of its area. Only the
  /// top-left 4x4 of a split 8x8 does.
  pub chroma_intra_mode_valid: bool,
}

impl TuInfo {
  pub fn cb_cbf(&self, subtu: usize) -> bool {
    self.chroma[ChromaPlane::Cb.index()][subtu].cbf
  }

  pub fn cr_cbf(&self, subtu: usize) -> bool {
    self.chroma[ChromaPlane::Cr.index()][subtu].cbf
  }
}

/// The committed TUs of a CU and its totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CuTuResult {
  /// Leaves in coding order.
  pub tus: Vec<TuInfo>,
  /// Cost of the leaves and of the split syntax of the split nodes.
  pub total_cost: i64,
  /// Cost with every coefficient dropped.
  pub not_coded_cost: i64,
  pub ecd_bytes: usize,
  pub luma_bits: u32,
  pub chroma_bits: u32,
  /// Luma SAD of the residual.
  pub sad: u32,
  pub is_cu_coded: bool,
}

impl CuTuResult {
  pub fn tu_count(&self) -> usize {
    self.tus.len()
  }

  /// Residual bits over all planes.
  pub fn bits(&self) -> u32 {
    self.luma_bits + self.chroma_bits
  }
}

/// Walks the committed tree of a CU at (`cu_x`, `cu_y`) in coding order.
///
/// Entropy-byte offsets are relative to where the CU started writing and
/// follow the order the bytes were produced in: per leaf, luma, every Cb
/// subTU, then every Cr subTU.
pub fn flatten(tree: &TuTree, cu_x: usize, cu_y: usize, qp: i8) -> CuTuResult {
  let subtus = tree.subtus();
  let leaves = tree.leaves();
  let mut result =
    CuTuResult { tus: Vec::with_capacity(leaves.len()), ..Default::default() };
  let mut offset = 0;

  let mut take = |data: &TuNodeData| {
    let at = offset;
    offset += data.ecd_bytes;
    at
  };

  for &id in leaves.iter() {
    let node = &tree[id];
    let (x, y) = node.pos();
    let mut tu = TuInfo {
      node: Some(id),
      pos_x4: (cu_x + x) >> 2,
      pos_y4: (cu_y + y) >> 2,
      log2_size: log2_size(node.size()) as u8,
      first_tu_in_cu: x == 0 && y == 0,
      qp,
      y_cbf: node.luma.cbf,
      luma_ecd_offset: take(&node.luma),
      luma_ecd_bytes: node.luma.ecd_bytes,
      luma_zero_col: node.luma.zero_col,
      luma_zero_row: node.luma.zero_row,
      luma_recon_buf: node.luma.recon_buf,
      chroma_intra_mode_valid: node.carries_chroma(),
      ..Default::default()
    };
    result.total_cost += node.leaf_cost(subtus) + node.signal_cost;
    result.not_coded_cost += node.luma.not_coded_cost;
    result.luma_bits += node.luma.bits;
    result.sad += node.luma.sad;

    if subtus > 0 && node.carries_chroma() {
      for plane in ChromaPlane::ALL {
        for (info, data) in tu.chroma[plane.index()]
          .iter_mut()
          .zip(node.chroma[plane.index()][..subtus].iter())
        {
          *info = ChromaTuInfo {
            cbf: data.cbf,
            ecd_offset: take(data),
            ecd_bytes: data.ecd_bytes,
            zero_col: data.zero_col,
            zero_row: data.zero_row,
            recon_buf: data.recon_buf,
          };
          result.not_coded_cost += data.not_coded_cost;
          result.chroma_bits += data.bits;
        }
      }
    }

    result.is_cu_coded |= node.any_cbf(subtus);
    result.tus.push(tu);
  }

  result.total_cost += split_signal_cost(tree, NodeId::ROOT);
  result.ecd_bytes = offset;
  result
}

fn split_signal_cost(tree: &TuTree, id: NodeId) -> i64 {
  match tree[id].children {
    None => 0,
    Some(children) => {
      tree[id].signal_cost
        + children.iter().map(|&c| split_signal_cost(tree, c)).sum::<i64>()
    }
  }
}
