use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minute-resolution stamp forming the readable part of a run name.
const STAMP_MINUTE: &str = "%Y_%m_%d_%H%M";
/// Second-resolution stamp fed into the hash suffix.
const STAMP_SECOND: &str = "%Y_%m_%d_%H%M%S";
/// Hex characters kept from the digest.
const HASH_SUFFIX_LEN: usize = 6;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Name for a fresh run, from the local clock.
pub fn next_run_name() -> String {
    run_name_at(&Local::now())
}

/// Name for a run started at `now`: `run_<minute>_<hash6>`.
///
/// The minute prefix keeps names lexicographically time-ordered. The suffix
/// hashes the second-resolution stamp together with the process id and a
/// process-wide counter, so two calls in the same second still differ.
pub fn run_name_at<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let seed = format!(
        "{}:{}:{}",
        now.format(STAMP_SECOND),
        std::process::id(),
        RUN_COUNTER.fetch_add(1, Ordering::Relaxed),
    );
    let digest = blake3::hash(seed.as_bytes()).to_hex();
    format!(
        "run_{}_{}",
        now.format(STAMP_MINUTE),
        &digest.as_str()[..HASH_SUFFIX_LEN]
    )
}
