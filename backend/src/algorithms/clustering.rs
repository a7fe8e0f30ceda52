//! Interval clustering for collision detection.
//!
//! Items are grouped by `(resource dimension, resource id, day)`. Inside a
//! group the intervals are sorted by `(start, end, id)` and swept once: the
//! open cluster grows while the next start lies strictly before the running
//! cluster end, and closes on the first gap. Clusters with a single member are
//! dropped, so every emitted cluster is a maximal set of transitively
//! overlapping intervals. Intervals are half-open, so `[09:00, 09:45)` and
//! `[09:45, 10:30)` do not collide.
//!
//! Both the generator (dated occurrences) and the draft validator (weekday
//! patterns) run through [`detect_collisions`]; the [`Timed`] trait abstracts
//! over their item types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resource dimension an interval is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Teacher,
    Class,
    Room,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Teacher, ResourceKind::Class, ResourceKind::Room];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Teacher => "teacher",
            ResourceKind::Class => "class",
            ResourceKind::Room => "room",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic severity. `Error` outranks `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// Severity assigned to clusters of each resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    pub teacher: Severity,
    pub class: Severity,
    pub room: Severity,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            teacher: Severity::Error,
            class: Severity::Error,
            room: Severity::Warning,
        }
    }
}

impl SeverityPolicy {
    pub fn severity_for(&self, kind: ResourceKind) -> Severity {
        match kind {
            ResourceKind::Teacher => self.teacher,
            ResourceKind::Class => self.class,
            ResourceKind::Room => self.room,
        }
    }
}

/// Anything with an identity, a day, a half-open time span and resource
/// references.
pub trait Timed {
    type Id: Clone + Ord;
    type Day: Clone + Ord;
    type Instant: Copy + Ord;

    fn item_id(&self) -> Self::Id;
    fn day(&self) -> Self::Day;
    fn start(&self) -> Self::Instant;
    fn end(&self) -> Self::Instant;
    /// Resource id in the given dimension, `None` when the item does not use one.
    fn resource(&self, kind: ResourceKind) -> Option<i64>;
}

/// A maximal group of mutually overlapping intervals on one resource and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster<D, I> {
    pub kind: ResourceKind,
    pub resource_id: i64,
    pub day: D,
    pub members: Vec<I>,
    pub severity: Severity,
}

impl<D, I> Cluster<D, I> {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Sweep one group of `(start, end, id)` intervals into clusters of two or
/// more transitively overlapping members.
pub fn cluster_intervals<T, I>(mut intervals: Vec<(T, T, I)>) -> Vec<Vec<I>>
where
    T: Copy + Ord,
    I: Ord,
{
    intervals.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)).then_with(|| a.2.cmp(&b.2)));

    let mut clusters = Vec::new();
    let mut current: Vec<I> = Vec::new();
    let mut running_end: Option<T> = None;

    for (start, end, id) in intervals {
        match running_end {
            Some(open_end) if start < open_end => {
                current.push(id);
                if end > open_end {
                    running_end = Some(end);
                }
            }
            _ => {
                if current.len() > 1 {
                    clusters.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current.push(id);
                running_end = Some(end);
            }
        }
    }
    if current.len() > 1 {
        clusters.push(current);
    }
    clusters
}

/// Group `items` by resource and day and return every collision cluster.
///
/// Items whose span is empty or inverted are skipped; callers report
/// non-positive durations as their own diagnostic. Output is ordered by
/// `(dimension, resource id, day)` and, inside a group, by start time.
pub fn detect_collisions<T: Timed>(
    items: &[T],
    policy: &SeverityPolicy,
) -> Vec<Cluster<T::Day, T::Id>> {
    type Group<T> = Vec<(<T as Timed>::Instant, <T as Timed>::Instant, <T as Timed>::Id)>;
    let mut groups: BTreeMap<(ResourceKind, i64, T::Day), Group<T>> = BTreeMap::new();

    for item in items {
        if item.end() <= item.start() {
            continue;
        }
        for kind in ResourceKind::ALL {
            if let Some(resource_id) = item.resource(kind) {
                groups
                    .entry((kind, resource_id, item.day()))
                    .or_default()
                    .push((item.start(), item.end(), item.item_id()));
            }
        }
    }

    let mut clusters = Vec::new();
    for ((kind, resource_id, day), intervals) in groups {
        if intervals.len() < 2 {
            continue;
        }
        let severity = policy.severity_for(kind);
        for members in cluster_intervals(intervals) {
            clusters.push(Cluster {
                kind,
                resource_id,
                day: day.clone(),
                members,
                severity,
            });
        }
    }
    clusters
}
