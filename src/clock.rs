use chrono::{DateTime, Utc};

/// Time source for due-reminder scanning. The scheduler never reads ambient
/// time directly so tests can drive it with a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
