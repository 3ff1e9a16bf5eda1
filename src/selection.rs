use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::defaults::{MAX_TIMESTEP, TIMESTEP_STRIDE};

/// A selection of [`Frame`](super::Frame)s by their timestep.
///
/// A timestep `t` is selected iff `0 <= t <= max_timestep` and `t` is a multiple of `stride`.
/// Frames that are not selected are skipped by the scanner without being parsed.
///
/// # Note
///
/// The selection says nothing about the order in which timesteps appear in a dump. Frames are
/// selected one by one as they are encountered, and a repeated timestep is selected each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// The spacing between selected timesteps.
    ///
    /// A stride of one selects every timestep up to `max_timestep`.
    #[serde(default = "default_stride")]
    pub stride: NonZeroU64,
    /// Inclusive upper bound on the selected timesteps.
    #[serde(default = "default_max_timestep")]
    pub max_timestep: u64,
}

fn default_stride() -> NonZeroU64 {
    TIMESTEP_STRIDE
}

fn default_max_timestep() -> u64 {
    MAX_TIMESTEP
}

impl SamplingPolicy {
    pub fn new(stride: NonZeroU64, max_timestep: u64) -> Self {
        Self {
            stride,
            max_timestep,
        }
    }

    /// Determine whether the frame at `timestep` is selected by this [`SamplingPolicy`].
    ///
    /// Negative timesteps are never selected.
    pub fn is_selected(&self, timestep: i64) -> bool {
        match u64::try_from(timestep) {
            Ok(t) => t <= self.max_timestep && t % self.stride == 0,
            Err(_) => false,
        }
    }

    /// Returns the number of timesteps this [`SamplingPolicy`] can select at most.
    pub fn capacity(&self) -> u64 {
        self.max_timestep / self.stride.get() + 1
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::new(TIMESTEP_STRIDE, MAX_TIMESTEP)
    }
}
