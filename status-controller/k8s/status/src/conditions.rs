//! Idempotent maintenance of a de-duplicated condition list.

use crate::{clock::Clock, k8s::Condition};
use std::{fmt, str::FromStr};

/// The tri-state status of a condition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid condition status {0:?}")]
pub struct InvalidConditionStatus(String);

/// What an upsert did to the condition list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Replaced,
    Added,
}

/// Upserts and resets the conditions of one status-bearing entity.
///
/// The list holds at most one condition per type. A condition's transition
/// time moves only when its status, reason, or message change.
#[derive(Debug)]
pub struct ConditionLedger<'c> {
    conditions: &'c mut Vec<Condition>,
}

// === impl ConditionStatus ===

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(status: bool) -> Self {
        if status {
            Self::True
        } else {
            Self::False
        }
    }
}

impl FromStr for ConditionStatus {
    type Err = InvalidConditionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "True" => Ok(Self::True),
            "False" => Ok(Self::False),
            "Unknown" => Ok(Self::Unknown),
            s => Err(InvalidConditionStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl ConditionLedger ===

impl<'c> ConditionLedger<'c> {
    pub fn new(conditions: &'c mut Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn upsert(
        &mut self,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        observed_generation: Option<i64>,
        clock: &Clock,
    ) -> Transition {
        let status = status.as_str();
        let existing = self.conditions.iter().position(|c| c.type_ == type_);
        if let Some(idx) = existing {
            let current = &self.conditions[idx];
            if current.status == status && current.reason == reason && current.message == message
            {
                return Transition::Unchanged;
            }
        }

        let condition = Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
            observed_generation,
            last_transition_time: clock.now(),
        };
        match existing {
            Some(idx) => {
                self.conditions[idx] = condition;
                Transition::Replaced
            }
            None => {
                self.conditions.push(condition);
                Transition::Added
            }
        }
    }

    pub fn reset(&mut self) {
        self.conditions.clear();
    }

    pub fn has_true(&self, type_: &str) -> bool {
        has_true(self.conditions.as_slice(), type_)
    }
}

/// Returns true if the list holds a condition of the given type whose status
/// is `True`.
pub fn has_true(conditions: &[Condition], type_: &str) -> bool {
    conditions
        .iter()
        .any(|c| c.type_ == type_ && c.status == ConditionStatus::True.as_str())
}

/// Compares two condition lists, ignoring transition times.
///
/// Order matters: the ledger preserves insertion order, so a reordered list
/// is a real status change.
pub fn eq_time_insensitive(left: &[Condition], right: &[Condition]) -> bool {
    left.len() == right.len()
        && left.iter().zip(right.iter()).all(|(l, r)| {
            l.type_ == r.type_
                && l.status == r.status
                && l.reason == r.reason
                && l.message == r.message
                && l.observed_generation == r.observed_generation
        })
}
