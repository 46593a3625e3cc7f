// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! A deterministic integer oracle.
//!
//! Uses an unnormalised Walsh-Hadamard transform and a scalar quantiser on
//! the HEVC level-scale grid. It is exact enough that a block whose
//! coefficients fall on the quantiser grid reconstructs losslessly, which
//! makes search outcomes easy to predict in tests.
//!
//! Entropy bytes are the nonzero levels in raster order, four bytes each:
//! the position as `u16` then the level as `i16`, both little endian.

use super::*;
use crate::util::{bit_length, clip_pixel, log2_size, Pixel};

/// Quantiser step at QP 4..9 in Q6; it doubles every 6 QP.
const LEVEL_SCALE: [i64; 6] = [40, 45, 51, 57, 64, 72];

const MAX_LEVEL: i64 = i16::MAX as i64;

#[derive(Clone, Debug, Default)]
pub struct ReferenceOracle {
  residual: Vec<i64>,
  coeffs: Vec<i64>,
  levels: Vec<i32>,
  dequant: Vec<i64>,
}

impl ReferenceOracle {
  pub fn new() -> Self {
    Self::default()
  }
}

/// In-place 2D Walsh-Hadamard transform in natural order. Applying it
/// twice scales by `n * n`.
fn wht_2d(block: &mut [i64], n: usize) {
  for row in block.chunks_exact_mut(n) {
    wht_1d(row, 1, n);
  }
  for x in 0..n {
    wht_1d(&mut block[x..], n, n);
  }
}

fn wht_1d(v: &mut [i64], stride: usize, n: usize) {
  let mut h = 1;
  while h < n {
    for i in (0..n).step_by(2 * h) {
      for j in i..i + h {
        let (a, b) = (v[j * stride], v[(j + h) * stride]);
        v[j * stride] = a + b;
        v[(j + h) * stride] = a - b;
      }
    }
    h *= 2;
  }
}

/// Quantiser step of an `n`-point unnormalised transform, Q6.
fn step_q6(qp: i32, n: usize) -> i64 {
  let qp = qp.clamp(0, 51) as usize;
  (LEVEL_SCALE[qp % 6] << (qp / 6)) * n as i64
}

fn quantize(abs: i64, step: i64, rounding: (i32, i32)) -> i64 {
  let scaled = abs << 6;
  let r = i64::from(if scaled < step { rounding.0 } else { rounding.1 });
  ((scaled + ((r * step) >> 15)) / step).min(MAX_LEVEL)
}

impl<T: Pixel> TransformOracle<T> for ReferenceOracle {
  fn transform_quantize(
    &mut self, req: &TqRequest<'_, T>, mut out: TqOutput<'_, T>,
  ) -> TqResult {
    let n = req.size;
    let log2n = log2_size(n);
    let (stride_x, offset_x) = match req.plane {
      TqPlane::Luma => (1, 0),
      TqPlane::Chroma(p) => (2, p.interleave_offset()),
    };

    self.residual.clear();
    for y in 0..n {
      let (src, pred) = (&req.src[y], &req.pred[y]);
      self.residual.extend((0..n).map(|x| {
        let i = x * stride_x + offset_x;
        let s: i32 = src[i].into();
        let p: i32 = pred[i].into();
        (s - p) as i64
      }));
    }
    let sad: i64 = self.residual.iter().map(|r| r.abs()).sum();
    let not_coded_ssd: i64 = self.residual.iter().map(|r| r * r).sum();

    self.coeffs.clear();
    self.coeffs.extend_from_slice(&self.residual);
    wht_2d(&mut self.coeffs, n);

    let step = step_q6(req.qp, n);
    self.levels.clear();
    self.dequant.clear();
    for (i, &c) in self.coeffs.iter().enumerate() {
      let level = quantize(c.abs(), step, req.rounding.at(i % n, i / n));
      let signed = if c < 0 { -level } else { level };
      self.levels.push(signed as i32);
      self.dequant.push((signed * step) >> 6);
    }

    let mut zero_col = if n == 32 { u32::MAX } else { (1u32 << n) - 1 };
    let mut zero_row = zero_col;
    let mut last = None;
    for (i, &level) in self.levels.iter().enumerate() {
      if level != 0 {
        zero_col &= !(1 << (i % n));
        zero_row &= !(1 << (i / n));
        last = Some(i);
        out.ecd.extend_from_slice(&(i as u16).to_le_bytes());
        out.ecd.extend_from_slice(&(level as i16).to_le_bytes());
      }
    }
    let cbf = last.is_some();

    let bits = match last {
      None => 0,
      Some(last) => {
        let coded: u32 = self.levels[..=last]
          .iter()
          .map(|&l| match l.unsigned_abs() {
            0 => 1,
            a => 1 + 2 * bit_length(a),
          })
          .sum();
        coded + 2 * log2n as u32
      }
    };

    for (y, row) in out.coeffs.rows_iter_mut().enumerate() {
      for (x, c) in row.iter_mut().enumerate() {
        let d = self.dequant[y * n + x];
        *c = d.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
      }
    }

    let ssd = match req.ssd {
      SsdDomain::Frequency => {
        let err: i64 = self
          .coeffs
          .iter()
          .zip(self.dequant.iter())
          .map(|(c, d)| (c - d) * (c - d))
          .sum();
        err >> (2 * log2n)
      }
      SsdDomain::Spatial => {
        // reuse the coefficient buffer for the inverse transform
        self.coeffs.copy_from_slice(&self.dequant);
        wht_2d(&mut self.coeffs, n);
        let shift = 2 * log2n;
        let round = 1i64 << (shift - 1);
        let mut ssd = 0i64;
        for y in 0..n {
          let (src, pred) = (&req.src[y], &req.pred[y]);
          let recon = &mut out.recon[y];
          for x in 0..n {
            let i = x * stride_x + offset_x;
            let p: i32 = pred[i].into();
            let s: i32 = src[i].into();
            let r = ((self.coeffs[y * n + x] + round) >> shift) as i32;
            let v: T = clip_pixel(p + r, req.bit_depth);
            recon[i] = v;
            let v: i32 = v.into();
            ssd += ((s - v) as i64).pow(2);
          }
        }
        ssd
      }
    };

    TqResult {
      cbf,
      ssd,
      bits,
      sad: sad.min(u32::MAX as i64) as u32,
      not_coded_ssd,
      zero_col,
      zero_row,
      recon_written: req.ssd == SsdDomain::Spatial,
    }
  }
}
