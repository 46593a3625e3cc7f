// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Read-only strided view of a rectangular region.
///
/// `data` starts at the top-left sample of the region and extends at least
/// `(height - 1) * stride + width` elements.
#[derive(Copy, Clone)]
pub struct Slice2D<'a, T> {
  data: &'a [T],
  width: usize,
  height: usize,
  stride: usize,
}

/// Mutable strided view of a rectangular region.
pub struct Slice2DMut<'a, T> {
  data: &'a mut [T],
  width: usize,
  height: usize,
  stride: usize,
}

#[inline(always)]
const fn span(width: usize, height: usize, stride: usize) -> usize {
  if height == 0 {
    0
  } else {
    (height - 1) * stride + width
  }
}

impl<'a, T> Slice2D<'a, T> {
  #[inline(always)]
  pub fn new(
    data: &'a [T], width: usize, height: usize, stride: usize,
  ) -> Self {
    assert!(width <= stride);
    assert!(data.len() >= span(width, height, stride));
    Self { data, width, height, stride }
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

  /// Sub-region at (`x`, `y`) of size `w`x`h`, relative to this view.
  pub fn subregion(&self, x: usize, y: usize, w: usize, h: usize) -> Self {
    assert!(x + w <= self.width && y + h <= self.height);
    let start = y * self.stride + x;
    Slice2D::new(&self.data[start..], w, h, self.stride)
  }

  pub fn rows_iter(&self) -> impl Iterator<Item = &'a [T]> + 'a {
    let (width, stride) = (self.width, self.stride);
    let data: &'a [T] = self.data;
    (0..self.height).map(move |y| &data[y * stride..y * stride + width])
  }
}

impl<T> Index<usize> for Slice2D<'_, T> {
  type Output = [T];
  #[inline(always)]
  fn index(&self, index: usize) -> &Self::Output {
    assert!(index < self.height);
    let start = index * self.stride;
    &self.data[start..start + self.width]
  }
}

impl<T> fmt::Debug for Slice2D<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Slice2D {{ size: {}({})x{} }}",
      self.width, self.stride, self.height
    )
  }
}

impl<'a, T> Slice2DMut<'a, T> {
  #[inline(always)]
  pub fn new(
    data: &'a mut [T], width: usize, height: usize, stride: usize,
  ) -> Self {
    assert!(width <= stride);
    assert!(data.len() >= span(width, height, stride));
    Self { data, width, height, stride }
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

  pub fn as_const(&self) -> Slice2D<'_, T> {
    Slice2D {
      data: &self.data[..],
      width: self.width,
      height: self.height,
      stride: self.stride,
    }
  }

  /// Reborrows a sub-region at (`x`, `y`) of size `w`x`h`.
  pub fn subregion_mut(
    &mut self, x: usize, y: usize, w: usize, h: usize,
  ) -> Slice2DMut<'_, T> {
    assert!(x + w <= self.width && y + h <= self.height);
    let start = y * self.stride + x;
    Slice2DMut::new(&mut self.data[start..], w, h, self.stride)
  }

  pub fn rows_iter_mut(
    &mut self,
  ) -> impl Iterator<Item = &mut [T]> + '_ {
    let (width, height) = (self.width, self.height);
    self
      .data
      .chunks_mut(self.stride)
      .take(height)
      .map(move |row| &mut row[..width])
  }
}

impl<T> Index<usize> for Slice2DMut<'_, T> {
  type Output = [T];
  #[inline(always)]
  fn index(&self, index: usize) -> &Self::Output {
    assert!(index < self.height);
    let start = index * self.stride;
    &self.data[start..start + self.width]
  }
}

impl<T> IndexMut<usize> for Slice2DMut<'_, T> {
  #[inline(always)]
  fn index_mut(&mut self, index: usize) -> &mut Self::Output {
    assert!(index < self.height);
    let start = index * self.stride;
    &mut self.data[start..start + self.width]
  }
}

impl<T> fmt::Debug for Slice2DMut<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Slice2DMut {{ size: {}({})x{} }}",
      self.width, self.stride, self.height
    )
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn rows_respect_stride() {
    let data: Vec<u8> = (0..24).collect();
    let s = Slice2D::new(&data, 3, 4, 6);
    let rows: Vec<&[u8]> = s.rows_iter().collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], &[6, 7, 8]);
    assert_eq!(&s[3], &[18, 19, 20]);
  }

  #[test]
  fn subregion_offsets() {
    let data: Vec<u8> = (0..64).collect();
    let s = Slice2D::new(&data, 8, 8, 8);
    let sub = s.subregion(2, 3, 2, 2);
    assert_eq!(&sub[0], &[26, 27]);
    assert_eq!(&sub[1], &[34, 35]);
  }

  #[test]
  fn mutable_rows_short_last_row() {
    // the last row is only `width` long, not a full stride
    let mut data = vec![0u16; 2 * 5 + 3];
    let mut s = Slice2DMut::new(&mut data, 3, 3, 5);
    for (y, row) in s.rows_iter_mut().enumerate() {
      row.fill(y as u16 + 1);
    }
    assert_eq!(&data[..3], &[1, 1, 1]);
    assert_eq!(&data[3..5], &[0, 0]);
    assert_eq!(&data[10..13], &[3, 3, 3]);
  }
}
