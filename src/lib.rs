// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Rate-distortion optimised transform-unit quadtree selection for HEVC
//! encoders.
//!
//! For every coding unit the encoder loop hands over the source and
//! prediction samples, and this crate decides how the residual is carved
//! into transform units. Each quadtree node is either coded as a leaf or
//! split into four children, whichever has the lower Lagrangian cost
//! `ssd + lambda * bits`. Speculative leaf evaluations run against scratch
//! planes and a copy of the CABAC context table; only the winner is
//! committed to the caller's buffers.
//!
//! The transform, quantisation and distortion kernels are supplied by the
//! caller through [`TransformOracle`]. A deterministic
//! [`ReferenceOracle`] is provided for tests and benchmarks.
//!
//! [`TransformOracle`]: oracle::TransformOracle
//! [`ReferenceOracle`]: oracle::reference::ReferenceOracle

#![deny(bare_trait_objects)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]
#![warn(clippy::expl_impl_clone_on_copy)]
#![warn(clippy::linkedlist)]
#![warn(clippy::map_flatten)]
#![warn(clippy::mem_forget)]
#![warn(clippy::mut_mut)]
#![warn(clippy::mutex_integer)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_continue)]
#![warn(clippy::path_buf_push_overwrite)]
#![warn(clippy::range_plus_one)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod serialize {
  cfg_if::cfg_if! {
    if #[cfg(feature="serialize")] {
      pub use serde::*;
    } else {
      pub use noop_proc_macro::{Deserialize, Serialize};
    }
  }
}

pub mod util;

pub mod bits;
pub mod cabac;
pub mod commit;
pub mod config;
pub mod context;
pub mod cost;
pub mod ecd;
pub mod flatten;
pub mod nbr;
pub mod oracle;
pub mod plane;
pub mod processor;
pub mod quantize;
pub mod selector;
pub mod split_array;
pub mod tree;

#[cfg(feature = "threading")]
pub mod batch;

/// Commonly used types and traits.
pub mod prelude {
  #[cfg(feature = "threading")]
  pub use crate::batch::{select_batch, CuJob};
  pub use crate::cabac::{CabacContexts, SliceType};
  pub use crate::config::{
    ChromaSampling, InvalidConfig, QuantRoundingLevel, SelectorKind,
    TuRdoConfig,
  };
  pub use crate::context::{CuRdoParams, PredMode, TuRdoContext};
  pub use crate::ecd::EcdBuffer;
  pub use crate::flatten::{CuTuResult, TuInfo};
  pub use crate::nbr::{Nbr4x4, NbrBuffer};
  pub use crate::oracle::reference::ReferenceOracle;
  pub use crate::oracle::{TqRequest, TqResult, TransformOracle};
  pub use crate::plane::Plane2D;
  pub use crate::processor::{TuSources, TuTargetBuffers, TuTargets};
  pub use crate::tree::{NodeId, TuTree};
  pub use crate::util::Pixel;
}
