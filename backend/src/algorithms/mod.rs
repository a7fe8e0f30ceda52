//! Pure scheduling algorithms.
//!
//! - [`clustering`]: interval clustering used for collision detection by both
//!   the generator and the draft validator.

pub mod clustering;

pub use clustering::{
    cluster_intervals, detect_collisions, Cluster, ResourceKind, Severity, SeverityPolicy, Timed,
};
