//! Injectable time source.
//!
//! Token expiry is evaluated lazily against this clock at verification time,
//! never swept proactively; tests substitute a manual clock to make expiry
//! deterministic.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
