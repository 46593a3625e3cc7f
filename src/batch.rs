// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Parallel evaluation of independent CUs.

use rayon::prelude::*;

use crate::config::{InvalidConfig, TuRdoConfig};
use crate::context::{CuRdoParams, TuRdoContext};
use crate::flatten::CuTuResult;
use crate::oracle::TransformOracle;
use crate::processor::{TuSources, TuTargetBuffers};
use crate::util::Pixel;

/// A CU whose transform tree can be searched on its own: its inputs and
/// the buffers its result is committed to.
#[derive(Debug)]
pub struct CuJob<'a, T: Pixel> {
  pub params: CuRdoParams,
  pub src: TuSources<'a, T>,
  pub out: TuTargetBuffers<T>,
}

/// Searches every job on the rayon pool. Each worker owns one
/// [`TuRdoContext`] and one oracle from `new_oracle`.
///
/// # Errors
///
/// Returns `InvalidConfig` if a context cannot be built from `config` or a
/// job's CU size cannot be coded with it.
#[profiling::function]
pub fn select_batch<T, O, F>(
  config: TuRdoConfig, jobs: &mut [CuJob<'_, T>], new_oracle: F,
) -> Result<Vec<CuTuResult>, InvalidConfig>
where
  T: Pixel,
  O: TransformOracle<T>,
  F: Fn() -> O + Sync + Send,
{
  let proto = TuRdoContext::<T>::new(config)?;
  log::debug!("searching {} CUs", jobs.len());
  jobs
    .par_iter_mut()
    .map_init(
      || (proto.clone(), new_oracle()),
      |(ctx, oracle), job| {
        let mut dst = job.out.targets();
        ctx.select(&job.params, &job.src, &mut dst, oracle)
      },
    )
    .collect()
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::cabac::CabacContexts;
  use crate::config::ChromaSampling;
  use crate::oracle::reference::ReferenceOracle;
  use crate::plane::Plane2D;
  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaChaRng;

  fn new_job(
    (src, pred): &(Plane2D<u8>, Plane2D<u8>),
  ) -> CuJob<'_, u8> {
    CuJob {
      params: CuRdoParams::new(16, 27, 40 << 8),
      src: TuSources::luma_only(
        src.region(0, 0, 16, 16),
        pred.region(0, 0, 16, 16),
      ),
      out: TuTargetBuffers::new(
        16,
        ChromaSampling::Cs400,
        CabacContexts::default(),
      ),
    }
  }

  #[test]
  fn batch_matches_sequential() {
    let config =
      TuRdoConfig::default().with_chroma_sampling(ChromaSampling::Cs400);
    let mut ra = ChaChaRng::from_seed([0; 32]);
    let planes: Vec<(Plane2D<u8>, Plane2D<u8>)> = (0..8)
      .map(|_| {
        let src = Plane2D::from_fn(16, 16, |_, _| ra.gen_range(96..160));
        let pred = Plane2D::from_fn(16, 16, |_, _| 128);
        (src, pred)
      })
      .collect();

    let mut jobs: Vec<_> = planes.iter().map(new_job).collect();
    let batch =
      select_batch(config, &mut jobs, ReferenceOracle::new).unwrap();

    let mut ctx = TuRdoContext::<u8>::new(config).unwrap();
    for ((job, result), input) in jobs.iter().zip(&batch).zip(&planes) {
      let mut fresh = new_job(input);
      let mut dst = fresh.out.targets();
      let mut oracle = ReferenceOracle::new();
      let expected =
        ctx.select(&fresh.params, &fresh.src, &mut dst, &mut oracle).unwrap();
      assert_eq!(result, &expected);
      assert_eq!(job.out.ecd.as_slice(), fresh.out.ecd.as_slice());
      assert_eq!(job.out.recon_luma, fresh.out.recon_luma);
    }
  }
}
