//! Pure seat allocation logic for SeatPlan.
//!
//! This crate seats mentor groups of students in one classroom. It is
//! independent of any UI, database or runtime: functions take plain data and
//! return results, so everything is unit-testable and a run is a
//! deterministic function of its inputs.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`allocator`] | Group ordering, stage relaxation, floor overflow, errors |
//! | [`config`] | Allocator tunables (stages, thresholds, floor capacity) and validation |
//! | [`course`] | Courses, seat families and per-course headcounts |
//! | [`layout`] | Serializable room description and the built-in 24-seat classroom |
//! | [`result`] | Seat map, floor summary and per-group errors |
//! | [`search`] | Contiguous clockwise run search for one group in one stage |
//! | [`topology`] | Validated seat ring with adjacency and skip pair lookups |
//! | [`validate`] | Invariant checks over finished results |

pub mod allocator;
pub mod config;
pub mod course;
pub mod layout;
pub mod result;
pub mod search;
pub mod topology;
pub mod validate;

pub use allocator::{allocate, Allocator, Group};
pub use config::AllocatorConfig;
pub use course::{Course, CourseCounts, SeatFamily};
pub use result::AllocationResult;
pub use topology::Topology;
