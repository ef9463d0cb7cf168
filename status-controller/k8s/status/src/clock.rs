use crate::k8s::Time;
use chrono::{DateTime, Utc};
use std::{fmt, rc::Rc};

/// Supplies condition transition times.
#[derive(Clone)]
pub struct Clock(Rc<dyn Fn() -> DateTime<Utc>>);

impl Clock {
    pub fn system() -> Self {
        Self(Rc::new(Utc::now))
    }

    pub fn from_fn(now: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        Self(Rc::new(now))
    }

    pub fn now(&self) -> Time {
        Time((self.0)())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}
