// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! CU-local sample and coefficient planes, and the block copies used when a
//! speculative hypothesis is committed.

use std::fmt::{Debug, Formatter};

use crate::util::{Slice2D, Slice2DMut};

/// Chroma component. Chroma planes are stored interleaved (CbCrCbCr...),
/// so a chroma block of width `w` spans `2 * w` samples of a row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChromaPlane {
  Cb = 0,
  Cr = 1,
}

impl ChromaPlane {
  pub const ALL: [ChromaPlane; 2] = [ChromaPlane::Cb, ChromaPlane::Cr];

  #[inline(always)]
  pub const fn index(self) -> usize {
    self as usize
  }

  /// Offset of this component within an interleaved sample pair.
  #[inline(always)]
  pub const fn interleave_offset(self) -> usize {
    self as usize
  }
}

/// An owned, strided 2D buffer.
///
/// Used for samples (`u8`/`u16`) as well as for transform coefficients
/// (`i16`). Coordinates are CU-relative.
#[derive(Clone, PartialEq, Eq)]
pub struct Plane2D<T> {
  data: Vec<T>,
  width: usize,
  height: usize,
  stride: usize,
}

impl<T> Debug for Plane2D<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "Plane2D {{ size: {}({})x{} }}",
      self.width, self.stride, self.height
    )
  }
}

impl<T: Copy + Default> Plane2D<T> {
  pub fn new(width: usize, height: usize) -> Self {
    let data = vec![T::default(); width * height];
    Plane2D { data, width, height, stride: width }
  }

  /// # Panics
  ///
  /// - If `data` does not hold a whole number of rows of `stride` samples.
  pub fn wrap(data: Vec<T>, stride: usize) -> Self {
    assert!(stride > 0 && data.len() % stride == 0);
    let height = data.len() / stride;
    Plane2D { data, width: stride, height, stride }
  }

  pub fn from_fn(
    width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T,
  ) -> Self {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
      data.extend((0..width).map(|x| f(x, y)));
    }
    Plane2D { data, width, height, stride: width }
  }

  #[inline(always)]
  pub const fn width(&self) -> usize {
    self.width
  }

  #[inline(always)]
  pub const fn height(&self) -> usize {
    self.height
  }

  #[inline(always)]
  pub const fn stride(&self) -> usize {
    self.stride
  }

  #[inline(always)]
  pub fn p(&self, x: usize, y: usize) -> T {
    self.data[y * self.stride + x]
  }

  pub fn fill(&mut self, v: T) {
    self.data.fill(v);
  }

  /// # Panics
  ///
  /// - If the region does not fit inside the plane.
  pub fn region(
    &self, x: usize, y: usize, w: usize, h: usize,
  ) -> Slice2D<'_, T> {
    assert!(x + w <= self.width && y + h <= self.height);
    Slice2D::new(&self.data[y * self.stride + x..], w, h, self.stride)
  }

  /// # Panics
  ///
  /// - If the region does not fit inside the plane.
  pub fn region_mut(
    &mut self, x: usize, y: usize, w: usize, h: usize,
  ) -> Slice2DMut<'_, T> {
    assert!(x + w <= self.width && y + h <= self.height);
    let start = y * self.stride + x;
    Slice2DMut::new(&mut self.data[start..], w, h, self.stride)
  }

  /// The whole plane as a view.
  pub fn as_region(&self) -> Slice2D<'_, T> {
    self.region(0, 0, self.width, self.height)
  }

  pub fn rows_iter(&self) -> impl Iterator<Item = &[T]> + '_ {
    self.as_region().rows_iter()
  }
}

/// Stride-aware 2D block copy.
///
/// # Panics
///
/// - If the two regions differ in size.
pub fn copy_2d<T: Copy>(dst: &mut Slice2DMut<'_, T>, src: &Slice2D<'_, T>) {
  assert_eq!(dst.width(), src.width());
  assert_eq!(dst.height(), src.height());
  for (d, s) in dst.rows_iter_mut().zip(src.rows_iter()) {
    d.copy_from_slice(s);
  }
}

/// Copies one chroma component between two interleaved regions, leaving
/// the other component of `dst` untouched.
///
/// # Panics
///
/// - If the two regions differ in size, or have an odd width.
pub fn chroma_interleave_copy_2d<T: Copy>(
  dst: &mut Slice2DMut<'_, T>, src: &Slice2D<'_, T>, plane: ChromaPlane,
) {
  assert_eq!(dst.width(), src.width());
  assert_eq!(dst.height(), src.height());
  assert!(dst.width() % 2 == 0);
  let off = plane.interleave_offset();
  for (d, s) in dst.rows_iter_mut().zip(src.rows_iter()) {
    for (d, s) in d.chunks_exact_mut(2).zip(s.chunks_exact(2)) {
      d[off] = s[off];
    }
  }
}
