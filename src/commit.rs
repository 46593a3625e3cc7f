// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Promotion of a speculative leaf to the caller-visible state.

use crate::cabac::CabacContexts;
use crate::plane::{chroma_interleave_copy_2d, copy_2d, ChromaPlane};
use crate::processor::{TuScratch, TuTargets};
use crate::tree::TuTreeNode;
use crate::util::Pixel;

/// Commits `node`, evaluated into `scratch`, over whatever its subtree left
/// in `dst`.
///
/// Copies the reconstruction when one was produced and the coefficients
/// otherwise, restores the CABAC contexts to `cabac` (the state after the
/// node's leaf syntax), stamps the neighbour metadata of the node's
/// footprint and turns the node into a leaf. The node's entropy bytes are
/// the selector's to place.
pub fn commit_parent<T: Pixel>(
  node: &mut TuTreeNode, scratch: &TuScratch<T>, dst: &mut TuTargets<'_, T>,
  cabac: &CabacContexts, qp: i8, subtus: usize,
) {
  let size = node.size();
  let (x, y) = node.pos();
  let planes = &mut dst.planes;

  if node.luma.recon_buf.is_some() {
    copy_2d(
      &mut planes.recon_luma.subregion_mut(x, y, size, size),
      &scratch.recon_luma.region(x, y, size, size),
    );
  } else if node.luma.cbf {
    copy_2d(
      &mut planes.coeffs_luma.subregion_mut(x, y, size, size),
      &scratch.coeffs_luma.region(x, y, size, size),
    );
  }

  if subtus > 0 && node.carries_chroma() {
    for plane in ChromaPlane::ALL {
      for data in &node.chroma[plane.index()][..subtus] {
        let (cs, cx, cy) = (data.size, data.pos_x, data.pos_y);
        if data.recon_buf.is_some() {
          chroma_interleave_copy_2d(
            &mut planes.recon_chroma.subregion_mut(2 * cx, cy, 2 * cs, cs),
            &scratch.recon_chroma.region(2 * cx, cy, 2 * cs, cs),
            plane,
          );
        } else if data.cbf {
          let coeff_x = 2 * cx + plane.index() * cs;
          copy_2d(
            &mut planes.coeffs_chroma.subregion_mut(coeff_x, cy, cs, cs),
            &scratch.coeffs_chroma.region(coeff_x, cy, cs, cs),
          );
        }
      }
    }
  }

  dst.cabac.rollback(cabac);
  dst.nbr.stamp(x, y, size, qp, node.luma.cbf);
  node.children = None;
  node.is_valid = true;
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::cabac::SliceType;
  use crate::config::ChromaSampling;
  use crate::nbr::Nbr4x4;
  use crate::processor::TuTargetBuffers;
  use crate::tree::{NodeId, TuTree};

  #[test]
  fn recon_wins_over_coefficients() {
    let mut tree = TuTree::new();
    tree.init(16, 0, 1, ChromaSampling::Cs420);
    let id = TuTree::node_id(16, 1, 8, 0);
    let node = &mut tree[id];
    node.luma.recon_buf = Some(0);
    node.luma.cbf = true;
    node.chroma[ChromaPlane::Cr.index()][0].cbf = true;

    let mut scratch = TuScratch::<u8>::new();
    scratch.recon_luma.fill(200);
    scratch.recon_chroma.fill(50);
    scratch.coeffs_luma.fill(7);
    scratch.coeffs_chroma.fill(9);

    let mut out = TuTargetBuffers::<u8>::new(
      16,
      ChromaSampling::Cs420,
      CabacContexts::default(),
    );
    let restored = CabacContexts::new(SliceType::B, 22, false);
    let mut targets = out.targets();
    commit_parent(&mut tree[id], &scratch, &mut targets, &restored, 27, 1);

    for y in 0..16 {
      for x in 0..16 {
        let inside = x >= 8 && y < 8;
        assert_eq!(out.recon_luma.p(x, y), if inside { 200 } else { 0 });
        assert_eq!(out.coeffs_luma.p(x, y), 0);
      }
    }
    // chroma of the node: Cr coefficients only, at columns 12..16
    for y in 0..8 {
      for x in 0..16 {
        let expected = if x >= 12 && y < 4 { 9 } else { 0 };
        assert_eq!(out.coeffs_chroma.p(x, y), expected, "({}, {})", x, y);
      }
    }
    assert_eq!(out.cabac, restored);
    assert_eq!(out.nbr.at(2, 0), Nbr4x4 { qp: 27, y_cbf: true });
    assert_eq!(out.nbr.at(0, 0), Nbr4x4::default());
    assert!(tree[id].is_leaf());
    assert!(tree[NodeId::ROOT].children.is_some());
  }
}
