// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The transform/quantise/distortion kernels, seen from the TU search.
//!
//! The search never looks inside a TU: it hands the oracle the source and
//! prediction of one block and gets back the coded coefficients, an
//! optional reconstruction, the entropy bytes and the numbers it needs for
//! the cost.

pub mod reference;

use crate::context::PredMode;
use crate::ecd::EcdBuffer;
use crate::plane::ChromaPlane;
use crate::util::{Pixel, Slice2D, Slice2DMut};

/// Component a block belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TqPlane {
  Luma,
  Chroma(ChromaPlane),
}

/// Domain in which distortion is measured.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SsdDomain {
  /// On reconstructed samples; the reconstruction is written out.
  Spatial,
  /// On dequantised coefficients; no reconstruction is produced.
  Frequency,
}

/// Quantiser rounding offsets in Q15, for the decision between levels 0
/// and 1 and between levels 1 and 2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rounding<'a> {
  Uniform { zero_one_q15: i32, one_two_q15: i32 },
  /// One offset per coefficient position, raster order.
  PerPosition { size: usize, zero_one_q15: &'a [i32], one_two_q15: &'a [i32] },
}

impl Rounding<'_> {
  #[inline(always)]
  pub fn at(&self, x: usize, y: usize) -> (i32, i32) {
    match *self {
      Rounding::Uniform { zero_one_q15, one_two_q15 } => {
        (zero_one_q15, one_two_q15)
      }
      Rounding::PerPosition { size, zero_one_q15, one_two_q15 } => {
        let i = y * size + x;
        (zero_one_q15[i], one_two_q15[i])
      }
    }
  }
}

/// One block to transform and quantise.
///
/// Chroma `src` and `pred` are interleaved regions `2 * size` samples wide;
/// the oracle reads the component selected by `plane`.
#[derive(Debug)]
pub struct TqRequest<'a, T: Pixel> {
  pub plane: TqPlane,
  pub size: usize,
  pub src: Slice2D<'a, T>,
  pub pred: Slice2D<'a, T>,
  pub qp: i32,
  pub bit_depth: usize,
  pub pred_mode: PredMode,
  pub ssd: SsdDomain,
  pub rounding: Rounding<'a>,
}

/// Where the oracle writes a block.
///
/// `coeffs` is `size`x`size`; `recon` matches the request's `src` region,
/// interleaved for chroma, and must only be written for the requested
/// component. Entropy bytes are appended to `ecd`.
#[derive(Debug)]
pub struct TqOutput<'a, T: Pixel> {
  pub coeffs: Slice2DMut<'a, i16>,
  pub recon: Slice2DMut<'a, T>,
  pub ecd: &'a mut EcdBuffer,
}

/// What the search needs to know about a coded block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TqResult {
  pub cbf: bool,
  pub ssd: i64,
  /// Residual bits, whole bits.
  pub bits: u32,
  pub sad: u32,
  /// Distortion if all coefficients were dropped.
  pub not_coded_ssd: i64,
  /// Bit `i` set when column `i` holds no nonzero level.
  pub zero_col: u32,
  /// Bit `i` set when row `i` holds no nonzero level.
  pub zero_row: u32,
  /// The spatial reconstruction was written to `recon`.
  pub recon_written: bool,
}

/// Forward transform, quantisation, entropy-byte generation and distortion
/// measurement of one block.
pub trait TransformOracle<T: Pixel> {
  fn transform_quantize(
    &mut self, req: &TqRequest<'_, T>, out: TqOutput<'_, T>,
  ) -> TqResult;
}

impl<T: Pixel, O: TransformOracle<T> + ?Sized> TransformOracle<T> for &mut O {
  fn transform_quantize(
    &mut self, req: &TqRequest<'_, T>, out: TqOutput<'_, T>,
  ) -> TqResult {
    (**self).transform_quantize(req, out)
  }
}
