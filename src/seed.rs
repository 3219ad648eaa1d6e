//! Seed derivation for the process-wide random engine.
//!
//! The base seed is the wall-clock time in seconds. Setting `JOB_ID` offsets
//! it by `JOB_ID * 4852234 * U`, where `U` is drawn from the engine before it
//! is reseeded, so parallel jobs started in the same second diverge.

use crate::random::RandomEngine;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable holding the job identifier.
pub const JOB_ID_VAR: &str = "JOB_ID";

/// Scale applied to the job identifier before the uniform draw.
pub const JOB_ID_SCALE: f64 = 4_852_234.0;

/// Source of wall-clock seconds.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now_seconds(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
            })
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_seconds(&self) -> i64 {
        self.0
    }
}

/// Interprets a job identifier; anything that is not an integer counts as 0.
#[must_use]
pub fn parse_job_id(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

/// Computes the seed without applying it.
///
/// When `job_id` is present one uniform draw is consumed from `engine`,
/// even if the identifier evaluates to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn derive_seed(clock: &impl Clock, job_id: Option<&str>, engine: &mut RandomEngine) -> i32 {
    let base = clock.now_seconds() as i32;
    let Some(raw) = job_id else {
        return base;
    };

    let job = parse_job_id(raw);
    let draw = engine.flat();
    (f64::from(base) + job as f64 * JOB_ID_SCALE * draw) as i32
}

/// Derives the seed, reports it on stdout and applies it to `engine`.
pub fn seed_engine(clock: &impl Clock, job_id: Option<&str>, engine: &mut RandomEngine) -> i32 {
    let seed = derive_seed(clock, job_id, engine);
    println!("Seed:{seed}");
    engine.set_seed(seed);
    log::debug!("Random engine seeded with {seed} (job id {job_id:?})");
    seed
}
