//! Parser for task workload files.
//!
//! Converts a plain-text workload into the validated [`TaskDef`] list the
//! engine consumes. One task per line:
//!
//! ```text
//! # id class arrival service priority
//! A0 H 0 5 1
//! B1 m 2 3 4
//! ```
//!
//! # Rules
//!
//! - Lines starting with `#` and blank lines are skipped.
//! - `id` is an uppercase ASCII letter followed by a digit; ids are unique.
//! - `class` is `H`, `M` or `L`, in any case.
//! - `arrival` is 0..=30, `service` 1..=30 and `priority` 1..=10, each at
//!   most two decimal digits.
//!
//! A bad line never aborts the load: it is skipped with a warning and kept
//! as a [`Rejection`] so callers can report it.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::task::TaskDef;
use crate::types::{Priority, ServiceClass, Tick};

pub const MAX_ARRIVAL: Tick = 30;
pub const MIN_SERVICE: Tick = 1;
pub const MAX_SERVICE: Tick = 30;
pub const MIN_PRIORITY: Priority = 1;
pub const MAX_PRIORITY: Priority = 10;

const ID_LEN: usize = 2;
const NUM_LEN: usize = 2;

/// Why a line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A required field is missing, or there are trailing fields.
    InvalidFormat,
    InvalidId(String),
    DuplicateId(String),
    InvalidClass(String),
    InvalidArrival(String),
    InvalidService(String),
    EmptyPriority,
    InvalidPriority(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidFormat => write!(f, "invalid format"),
            RejectReason::InvalidId(s) => write!(f, "invalid id '{s}'"),
            RejectReason::DuplicateId(s) => write!(f, "duplicate id '{s}'"),
            RejectReason::InvalidClass(s) => write!(f, "invalid class '{s}'"),
            RejectReason::InvalidArrival(s) => write!(f, "invalid arrive_time '{s}'"),
            RejectReason::InvalidService(s) => write!(f, "invalid service_time '{s}'"),
            RejectReason::EmptyPriority => write!(f, "empty priority"),
            RejectReason::InvalidPriority(s) => write!(f, "invalid priority '{s}'"),
        }
    }
}

/// A skipped input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// 1-based line number.
    pub line: usize,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in line {}, ignored", self.reason, self.line)
    }
}

/// Errors from loading a workload file.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The file holds no valid task.
    NoTasks { path: PathBuf },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to load input file '{}': {source}", path.display())
            }
            LoadError::NoTasks { path } => {
                write!(f, "no valid task in input file '{}'", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::NoTasks { .. } => None,
        }
    }
}

/// A parsed workload: accepted tasks in file order plus skipped lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workload {
    pub tasks: Vec<TaskDef>,
    pub rejections: Vec<Rejection>,
}

impl Workload {
    /// Parse workload text. Never fails; bad lines become rejections.
    pub fn parse(input: &str) -> Self {
        let mut workload = Workload::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (i, raw) in input.lines().enumerate() {
            let line_nr = i + 1;
            let line = raw.trim_end_matches('\r');
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            match parse_line(line, &seen) {
                Ok(def) => {
                    seen.insert(def.id.0.clone());
                    workload.tasks.push(def);
                }
                Err(reason) => {
                    let rejection = Rejection {
                        line: line_nr,
                        reason,
                    };
                    warn!("{rejection}");
                    workload.rejections.push(rejection);
                }
            }
        }

        workload
    }

    /// Read and parse a workload file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let input = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let workload = Self::parse(&input);
        if workload.tasks.is_empty() {
            return Err(LoadError::NoTasks {
                path: path.to_path_buf(),
            });
        }
        Ok(workload)
    }
}

fn parse_line(line: &str, seen: &HashSet<String>) -> Result<TaskDef, RejectReason> {
    let mut fields = line.split_whitespace();

    let id = fields.next().ok_or(RejectReason::InvalidFormat)?;
    if !is_valid_id(id) {
        return Err(RejectReason::InvalidId(id.to_string()));
    }
    if seen.contains(id) {
        return Err(RejectReason::DuplicateId(id.to_string()));
    }

    let class_str = fields.next().ok_or(RejectReason::InvalidFormat)?;
    let class: ServiceClass = class_str
        .parse()
        .map_err(|_| RejectReason::InvalidClass(class_str.to_string()))?;

    let arrival_str = fields.next().ok_or(RejectReason::InvalidFormat)?;
    let arrival = parse_bounded(arrival_str, 0, MAX_ARRIVAL)
        .ok_or_else(|| RejectReason::InvalidArrival(arrival_str.to_string()))?;

    let service_str = fields.next().ok_or(RejectReason::InvalidFormat)?;
    let service = parse_bounded(service_str, MIN_SERVICE, MAX_SERVICE)
        .ok_or_else(|| RejectReason::InvalidService(service_str.to_string()))?;

    let priority_str = fields.next().ok_or(RejectReason::EmptyPriority)?;
    let priority = parse_bounded(priority_str, MIN_PRIORITY, MAX_PRIORITY)
        .ok_or_else(|| RejectReason::InvalidPriority(priority_str.to_string()))?;

    if fields.next().is_some() {
        return Err(RejectReason::InvalidFormat);
    }

    Ok(TaskDef::new(id, class, arrival, service, priority))
}

fn is_valid_id(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == ID_LEN && b[0].is_ascii_uppercase() && b[1].is_ascii_digit()
}

/// Parse a short decimal field within `min..=max`.
fn parse_bounded(s: &str, min: u32, max: u32) -> Option<u32> {
    if s.is_empty() || s.len() > NUM_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let val: u32 = s.parse().ok()?;
    (min..=max).contains(&val).then_some(val)
}
