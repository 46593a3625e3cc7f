// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Evaluation of one quadtree node as a leaf.

use crate::cabac::CabacContexts;
use crate::config::ChromaSampling;
use crate::context::PredMode;
use crate::cost::{residual_rate_cost, weigh_chroma_cost};
use crate::ecd::EcdBuffer;
use crate::nbr::NbrBuffer;
use crate::oracle::*;
use crate::plane::{ChromaPlane, Plane2D};
use crate::quantize::QuantRounding;
use crate::tree::{TuNodeData, TuTreeNode, MAX_CU_SIZE, MAX_TU_SIZE};
use crate::util::{Pixel, Slice2D, Slice2DMut};

/// Source and prediction samples of a CU.
///
/// All regions are CU-local. Chroma is interleaved (CbCr pairs), so the
/// chroma regions are `cu_size` samples wide and
/// [`ChromaSampling::chroma_height`] rows tall.
#[derive(Copy, Clone, Debug)]
pub struct TuSources<'a, T: Pixel> {
  pub src_luma: Slice2D<'a, T>,
  pub pred_luma: Slice2D<'a, T>,
  pub src_chroma: Slice2D<'a, T>,
  pub pred_chroma: Slice2D<'a, T>,
}

impl<'a, T: Pixel> TuSources<'a, T> {
  pub fn new(
    src_luma: Slice2D<'a, T>, pred_luma: Slice2D<'a, T>,
    src_chroma: Slice2D<'a, T>, pred_chroma: Slice2D<'a, T>,
  ) -> Self {
    TuSources { src_luma, pred_luma, src_chroma, pred_chroma }
  }

  /// Sources of a monochrome CU.
  pub fn luma_only(
    src_luma: Slice2D<'a, T>, pred_luma: Slice2D<'a, T>,
  ) -> Self {
    let empty = Slice2D::new(&[], 0, 0, 0);
    TuSources { src_luma, pred_luma, src_chroma: empty, pred_chroma: empty }
  }
}

/// Sample and coefficient planes a leaf is written to.
///
/// Chroma coefficients of a chroma TU of side `cs` at (`cx`, `cy`) sit at
/// column `2 * cx` for Cb and `2 * cx + cs` for Cr.
#[derive(Debug)]
pub struct TuPlanes<'a, T: Pixel> {
  pub recon_luma: Slice2DMut<'a, T>,
  pub recon_chroma: Slice2DMut<'a, T>,
  pub coeffs_luma: Slice2DMut<'a, i16>,
  pub coeffs_chroma: Slice2DMut<'a, i16>,
}

impl<T: Pixel> TuPlanes<'_, T> {
  pub fn reborrow(&mut self) -> TuPlanes<'_, T> {
    fn full<'b, U>(s: &'b mut Slice2DMut<'_, U>) -> Slice2DMut<'b, U> {
      let (w, h) = (s.width(), s.height());
      s.subregion_mut(0, 0, w, h)
    }
    TuPlanes {
      recon_luma: full(&mut self.recon_luma),
      recon_chroma: full(&mut self.recon_chroma),
      coeffs_luma: full(&mut self.coeffs_luma),
      coeffs_chroma: full(&mut self.coeffs_chroma),
    }
  }
}

/// The caller-visible state a CU search commits to.
#[derive(Debug)]
pub struct TuTargets<'a, T: Pixel> {
  pub planes: TuPlanes<'a, T>,
  pub nbr: &'a mut NbrBuffer,
  pub ecd: &'a mut EcdBuffer,
  pub cabac: &'a mut CabacContexts,
}

/// Owned storage for a [`TuTargets`], sized for one CU.
#[derive(Clone, Debug)]
pub struct TuTargetBuffers<T: Pixel> {
  pub recon_luma: Plane2D<T>,
  pub recon_chroma: Plane2D<T>,
  pub coeffs_luma: Plane2D<i16>,
  pub coeffs_chroma: Plane2D<i16>,
  pub nbr: NbrBuffer,
  pub ecd: EcdBuffer,
  pub cabac: CabacContexts,
}

impl<T: Pixel> TuTargetBuffers<T> {
  pub fn new(
    cu_size: usize, chroma: ChromaSampling, cabac: CabacContexts,
  ) -> Self {
    let (cw, ch) = match chroma.has_chroma() {
      true => (cu_size, chroma.chroma_height(cu_size)),
      false => (0, 0),
    };
    TuTargetBuffers {
      recon_luma: Plane2D::new(cu_size, cu_size),
      recon_chroma: Plane2D::new(cw, ch),
      coeffs_luma: Plane2D::new(cu_size, cu_size),
      coeffs_chroma: Plane2D::new(cw, ch),
      nbr: NbrBuffer::new(cu_size, cu_size),
      ecd: EcdBuffer::with_capacity(cu_size * cu_size),
      cabac,
    }
  }

  pub fn targets(&mut self) -> TuTargets<'_, T> {
    TuTargets {
      planes: TuPlanes {
        recon_luma: full_mut(&mut self.recon_luma),
        recon_chroma: full_mut(&mut self.recon_chroma),
        coeffs_luma: full_mut(&mut self.coeffs_luma),
        coeffs_chroma: full_mut(&mut self.coeffs_chroma),
      },
      nbr: &mut self.nbr,
      ecd: &mut self.ecd,
      cabac: &mut self.cabac,
    }
  }
}

fn full_mut<U: Copy + Default>(p: &mut Plane2D<U>) -> Slice2DMut<'_, U> {
  let (w, h) = (p.width(), p.height());
  p.region_mut(0, 0, w, h)
}

/// Planes a speculative leaf is evaluated into. Sized for the largest CU
/// so that CU-local coordinates can be used unchanged.
#[derive(Clone, Debug)]
pub struct TuScratch<T: Pixel> {
  pub recon_luma: Plane2D<T>,
  pub recon_chroma: Plane2D<T>,
  pub coeffs_luma: Plane2D<i16>,
  pub coeffs_chroma: Plane2D<i16>,
}

impl<T: Pixel> Default for TuScratch<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Pixel> TuScratch<T> {
  pub fn new() -> Self {
    // 4:2:2 chroma is as tall as luma
    TuScratch {
      recon_luma: Plane2D::new(MAX_CU_SIZE, MAX_CU_SIZE),
      recon_chroma: Plane2D::new(MAX_CU_SIZE, MAX_CU_SIZE),
      coeffs_luma: Plane2D::new(MAX_CU_SIZE, MAX_CU_SIZE),
      coeffs_chroma: Plane2D::new(MAX_CU_SIZE, MAX_CU_SIZE),
    }
  }

  pub fn planes(&mut self) -> TuPlanes<'_, T> {
    TuPlanes {
      recon_luma: full_mut(&mut self.recon_luma),
      recon_chroma: full_mut(&mut self.recon_chroma),
      coeffs_luma: full_mut(&mut self.coeffs_luma),
      coeffs_chroma: full_mut(&mut self.coeffs_chroma),
    }
  }
}

/// Per-CU settings of a leaf evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TuProcessParams {
  pub qp: i32,
  pub lambda: u32,
  pub chroma_lambda: u32,
  /// Q16 weight applied to chroma costs, if enabled.
  pub chroma_weight: Option<u32>,
  pub pred_mode: PredMode,
  pub bit_depth: usize,
  pub ssd: SsdDomain,
  /// Chroma subTUs per plane, 0 for monochrome.
  pub subtus: usize,
}

fn store_result(
  data: &mut TuNodeData, res: &TqResult, ecd_bytes: usize, lambda: u32,
  weight: Option<u32>,
) {
  let mut cost = res.ssd + residual_rate_cost(res.bits, lambda);
  let mut not_coded_cost = res.not_coded_ssd;
  if let Some(w) = weight {
    cost = weigh_chroma_cost(cost, w);
    not_coded_cost = weigh_chroma_cost(not_coded_cost, w);
  }
  data.ssd = res.ssd;
  data.cost = cost;
  data.not_coded_cost = not_coded_cost;
  data.bits = res.bits;
  data.sad = res.sad;
  data.cbf = res.cbf;
  data.recon_buf = res.recon_written.then_some(0);
  data.ecd_bytes = ecd_bytes;
  data.zero_col = res.zero_col;
  data.zero_row = res.zero_row;
}

/// Evaluates `node` as a leaf: luma, then every Cb subTU, then every Cr
/// subTU when the node carries chroma.
///
/// Coefficients and reconstruction go to `planes` and entropy bytes are
/// appended to `ecd`. `cabac` is the context state the node would be coded
/// with; it drives TU-level quantiser rounding and is not modified.
///
/// # Panics
///
/// - If the node is larger than the largest transform.
#[profiling::function]
pub fn process_tu<T: Pixel, O: TransformOracle<T>>(
  node: &mut TuTreeNode, src: &TuSources<'_, T>, mut planes: TuPlanes<'_, T>,
  ecd: &mut EcdBuffer, rounding: &mut QuantRounding, cabac: &CabacContexts,
  params: &TuProcessParams, oracle: &mut O,
) {
  let size = node.size();
  assert!(size <= MAX_TU_SIZE, "{}x{} TU", size, size);
  node.clear_results();
  node.evaluated = true;

  let (x, y) = node.pos();
  let at_cu_origin = x == 0 && y == 0;
  let start = ecd.tell();
  let req = TqRequest {
    plane: TqPlane::Luma,
    size,
    src: src.src_luma.subregion(x, y, size, size),
    pred: src.pred_luma.subregion(x, y, size, size),
    qp: params.qp,
    bit_depth: params.bit_depth,
    pred_mode: params.pred_mode,
    ssd: params.ssd,
    rounding: rounding.factors(size, true, at_cu_origin, cabac),
  };
  let out = TqOutput {
    coeffs: planes.coeffs_luma.subregion_mut(x, y, size, size),
    recon: planes.recon_luma.subregion_mut(x, y, size, size),
    ecd: &mut *ecd,
  };
  let res = oracle.transform_quantize(&req, out);
  store_result(&mut node.luma, &res, ecd.tell() - start, params.lambda, None);

  if params.subtus == 0 || !node.carries_chroma() {
    return;
  }

  for plane in ChromaPlane::ALL {
    for subtu in 0..params.subtus {
      let data = &mut node.chroma[plane.index()][subtu];
      let (cs, cx, cy) = (data.size, data.pos_x, data.pos_y);
      let start = ecd.tell();
      let req = TqRequest {
        plane: TqPlane::Chroma(plane),
        size: cs,
        src: src.src_chroma.subregion(2 * cx, cy, 2 * cs, cs),
        pred: src.pred_chroma.subregion(2 * cx, cy, 2 * cs, cs),
        qp: params.qp,
        bit_depth: params.bit_depth,
        pred_mode: params.pred_mode,
        ssd: params.ssd,
        rounding: rounding.factors(cs, false, at_cu_origin, cabac),
      };
      let coeff_x = 2 * cx + plane.index() * cs;
      let out = TqOutput {
        coeffs: planes.coeffs_chroma.subregion_mut(coeff_x, cy, cs, cs),
        recon: planes.recon_chroma.subregion_mut(2 * cx, cy, 2 * cs, cs),
        ecd: &mut *ecd,
      };
      let res = oracle.transform_quantize(&req, out);
      store_result(
        data,
        &res,
        ecd.tell() - start,
        params.chroma_lambda,
        params.chroma_weight,
      );
    }
  }
}
