// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use num_traits::{AsPrimitive, PrimInt};
use std::fmt::{Debug, Display};

/// Trait for casting between primitive types.
pub trait CastFromPrimitive<T>: Copy + 'static {
  /// Casts the given value into `Self`.
  fn cast_from(v: T) -> Self;
}

/// Types that can be used as pixel types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PixelType {
  /// 8 bits per pixel, stored in a `u8`.
  U8,
  /// 10 or 12 bits per pixel, stored in a `u16`.
  U16,
}

/// A type that can be used as a sample type for source, prediction and
/// reconstruction planes.
pub trait Pixel:
  PrimInt
  + Default
  + Into<u32>
  + Into<i32>
  + AsPrimitive<i32>
  + AsPrimitive<usize>
  + CastFromPrimitive<i32>
  + CastFromPrimitive<u32>
  + Debug
  + Display
  + Send
  + Sync
  + 'static
{
  /// Returns a [`PixelType`] variant corresponding to this type.
  fn type_enum() -> PixelType;

  /// Largest bit depth this type can hold.
  fn max_bit_depth() -> usize {
    match Self::type_enum() {
      PixelType::U8 => 8,
      PixelType::U16 => 16,
    }
  }
}

impl Pixel for u8 {
  #[inline(always)]
  fn type_enum() -> PixelType {
    PixelType::U8
  }
}

impl Pixel for u16 {
  #[inline(always)]
  fn type_enum() -> PixelType {
    PixelType::U16
  }
}

macro_rules! impl_cast_from_primitive_to_pixel {
  ( $T:ty ) => {
    impl CastFromPrimitive<i32> for $T {
      #[inline(always)]
      fn cast_from(v: i32) -> Self {
        v as Self
      }
    }
    impl CastFromPrimitive<u32> for $T {
      #[inline(always)]
      fn cast_from(v: u32) -> Self {
        v as Self
      }
    }
  };
}

impl_cast_from_primitive_to_pixel!(u8);
impl_cast_from_primitive_to_pixel!(u16);

/// Clamps `v` to the sample range of `bit_depth` and converts it.
#[inline(always)]
pub fn clip_pixel<T: Pixel>(v: i32, bit_depth: usize) -> T {
  T::cast_from(v.clamp(0, (1 << bit_depth) - 1))
}
