// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The entropy-coded-data (ECD) byte stream shared by all TUs of a CU.
//!
//! Every TU evaluation appends its bytes at the cursor. Speculative work is
//! undone by rolling the cursor back, and a winning hypothesis whose bytes
//! were written further along is moved down to where it belongs.

/// A position in an [`EcdBuffer`], taken with [`EcdBuffer::checkpoint`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EcdCheckpoint(usize);

impl EcdCheckpoint {
  pub const fn offset(self) -> usize {
    self.0
  }
}

#[derive(Clone, Debug, Default)]
pub struct EcdBuffer {
  storage: Vec<u8>,
}

impl EcdBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    EcdBuffer { storage: Vec::with_capacity(capacity) }
  }

  /// Bytes written so far.
  #[inline(always)]
  pub fn tell(&self) -> usize {
    self.storage.len()
  }

  pub fn checkpoint(&self) -> EcdCheckpoint {
    EcdCheckpoint(self.storage.len())
  }

  /// Drops everything written after `checkpoint`.
  pub fn rollback(&mut self, checkpoint: EcdCheckpoint) {
    debug_assert!(checkpoint.0 <= self.storage.len());
    self.storage.truncate(checkpoint.0);
  }

  /// Moves the `len` bytes written at `from` down to `to` and drops
  /// everything after them, leaving the cursor at `to + len`.
  ///
  /// # Panics
  ///
  /// - If `to` lies after `from`, or `from + len` exceeds the written data.
  pub fn relocate(
    &mut self, from: EcdCheckpoint, to: EcdCheckpoint, len: usize,
  ) {
    assert!(to <= from);
    assert!(from.0 + len <= self.storage.len());
    if from != to {
      self.storage.copy_within(from.0..from.0 + len, to.0);
    }
    self.storage.truncate(to.0 + len);
  }

  #[inline(always)]
  pub fn push(&mut self, byte: u8) {
    self.storage.push(byte);
  }

  pub fn extend_from_slice(&mut self, bytes: &[u8]) {
    self.storage.extend_from_slice(bytes);
  }

  pub fn clear(&mut self) {
    self.storage.clear();
  }

  pub fn as_slice(&self) -> &[u8] {
    &self.storage
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn rollback_discards_tail() {
    let mut ecd = EcdBuffer::new();
    ecd.extend_from_slice(&[1, 2, 3]);
    let cp = ecd.checkpoint();
    ecd.extend_from_slice(&[4, 5]);
    ecd.rollback(cp);
    assert_eq!(ecd.as_slice(), &[1, 2, 3]);
  }

  #[test]
  fn relocate_moves_and_truncates() {
    let mut ecd = EcdBuffer::new();
    ecd.push(9);
    let t1 = ecd.checkpoint();
    ecd.extend_from_slice(&[7, 7, 7]);
    let t2 = ecd.checkpoint();
    ecd.extend_from_slice(&[1, 2]);
    ecd.relocate(t2, t1, 2);
    assert_eq!(ecd.as_slice(), &[9, 1, 2]);
    assert_eq!(ecd.tell(), t1.offset() + 2);
  }

  #[test]
  fn relocate_in_place_only_truncates() {
    let mut ecd = EcdBuffer::new();
    let t1 = ecd.checkpoint();
    ecd.extend_from_slice(&[5, 6, 7, 8]);
    ecd.relocate(t1, t1, 2);
    assert_eq!(ecd.as_slice(), &[5, 6]);
  }
}
