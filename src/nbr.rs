// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Per-4x4 neighbour metadata consumed by later CUs' prediction and
//! deblocking decisions.

use itertools::iproduct;

/// Metadata of one 4x4 luma unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Nbr4x4 {
  pub qp: i8,
  pub y_cbf: bool,
}

/// CU-local grid of [`Nbr4x4`], addressed in 4x4 units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NbrBuffer {
  data: Vec<Nbr4x4>,
  cols: usize,
  rows: usize,
}

impl NbrBuffer {
  /// A buffer covering `width`x`height` luma samples.
  pub fn new(width: usize, height: usize) -> Self {
    let (cols, rows) = (width.div_ceil(4), height.div_ceil(4));
    NbrBuffer { data: vec![Nbr4x4::default(); cols * rows], cols, rows }
  }

  pub const fn cols(&self) -> usize {
    self.cols
  }

  pub const fn rows(&self) -> usize {
    self.rows
  }

  #[inline(always)]
  pub fn at(&self, x4: usize, y4: usize) -> Nbr4x4 {
    self.data[y4 * self.cols + x4]
  }

  /// Writes `qp` and `y_cbf` into every 4x4 unit of the square luma block
  /// of side `size` at (`x`, `y`).
  ///
  /// # Panics
  ///
  /// - If the block extends past the buffer.
  pub fn stamp(
    &mut self, x: usize, y: usize, size: usize, qp: i8, y_cbf: bool,
  ) {
    let (x4, y4, n4) = (x >> 2, y >> 2, (size >> 2).max(1));
    assert!(x4 + n4 <= self.cols && y4 + n4 <= self.rows);
    for (j, i) in iproduct!(y4..y4 + n4, x4..x4 + n4) {
      self.data[j * self.cols + i] = Nbr4x4 { qp, y_cbf };
    }
  }

  pub fn fill(&mut self, v: Nbr4x4) {
    self.data.fill(v);
  }
}
