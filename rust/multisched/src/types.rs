//! Newtype wrappers, shared enums and the engine error type.
//!
//! Task handles and identifiers are newtypes so a table index can never be
//! confused with a tick count. Plain quantities (ticks, priorities) are type
//! aliases, which keeps the arithmetic in the engine readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Simulated time, in ticks.
pub type Tick = u32;

/// Task priority. Lower values are more urgent; only High tasks use it.
pub type Priority = u32;

/// Handle into the simulator's task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskIdx(pub usize);

/// Task identifier as it appears in the workload file (e.g. `A0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

/// Service class of a task, and also the level the dispatcher favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceClass {
    /// Priority-ordered, preemptive among itself.
    High,
    /// Shortest remaining time first.
    Medium,
    /// First come, first served. Runs only when High and Medium are empty.
    Low,
}

impl ServiceClass {
    pub const ALL: [ServiceClass; 3] = [ServiceClass::High, ServiceClass::Medium, ServiceClass::Low];

    /// Single-letter code used in workload files and reports.
    pub fn code(self) -> char {
        match self {
            ServiceClass::High => 'H',
            ServiceClass::Medium => 'M',
            ServiceClass::Low => 'L',
        }
    }
}

impl fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ServiceClass {
    type Err = SchedError;

    /// Parse a class code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("H") {
            Ok(ServiceClass::High)
        } else if s.eq_ignore_ascii_case("M") {
            Ok(ServiceClass::Medium)
        } else if s.eq_ignore_ascii_case("L") {
            Ok(ServiceClass::Low)
        } else {
            Err(SchedError::UnknownServiceClass(s.to_string()))
        }
    }
}

/// Invariant violations surfaced by the scheduling engine.
///
/// None of these are recoverable: the dispatcher guards every dequeue and the
/// loader only produces valid classes, so any of them reaching the caller
/// means the run is unsound and must be abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// Dequeue attempted on an empty level queue.
    QueueEmpty(ServiceClass),
    /// A class code outside {H, M, L}.
    UnknownServiceClass(String),
    /// A handle that does not address the task table.
    TaskNotFound(TaskIdx),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::QueueEmpty(class) => write!(f, "dequeue from empty {class} queue"),
            SchedError::UnknownServiceClass(code) => {
                write!(f, "unknown service class {code:?}")
            }
            SchedError::TaskNotFound(idx) => write!(f, "no task at index {}", idx.0),
        }
    }
}

impl std::error::Error for SchedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parse_case_insensitive() {
        assert_eq!("H".parse::<ServiceClass>(), Ok(ServiceClass::High));
        assert_eq!("m".parse::<ServiceClass>(), Ok(ServiceClass::Medium));
        assert_eq!("l".parse::<ServiceClass>(), Ok(ServiceClass::Low));
        assert_eq!(
            "X".parse::<ServiceClass>(),
            Err(SchedError::UnknownServiceClass("X".into()))
        );
        assert!("HH".parse::<ServiceClass>().is_err());
    }

    #[test]
    fn test_class_code_roundtrip() {
        for class in ServiceClass::ALL {
            assert_eq!(class.code().to_string().parse::<ServiceClass>(), Ok(class));
        }
    }
}
