//! Invariant checks for allocation results.
//!
//! Pure functions that take a topology, the roster and a result and return
//! validation errors. The allocator upholds all of these by construction;
//! the checks exist for the harness, for tests and for results that were
//! edited by hand after allocation.

use std::collections::{HashMap, HashSet};

use crate::allocator::Group;
use crate::course::{Course, CourseCounts};
use crate::layout::SeatId;
use crate::result::AllocationResult;
use crate::topology::Topology;

/// A result validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

fn error(category: &'static str, message: String) -> ValidationError {
    ValidationError {
        category,
        severity: Severity::Error,
        message,
    }
}

/// Check that no seat is assigned twice.
pub fn check_unique_seats(result: &AllocationResult) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    result
        .assignments
        .iter()
        .filter(|a| !seen.insert(a.seat_id))
        .map(|a| error("seats", format!("Seat {} is assigned more than once", a.seat_id)))
        .collect()
}

/// Check every assignment is on a known seat of the right family, and that
/// floor seats only hold robot students.
pub fn check_seat_families(topology: &Topology, result: &AllocationResult) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for a in &result.assignments {
        let Some(family) = topology.family(a.seat_id) else {
            errors.push(error("seats", format!("Seat {} does not exist", a.seat_id)));
            continue;
        };
        if !family.accepts(a.course) {
            errors.push(error(
                "family",
                format!(
                    "Seat {} ({:?}) holds a {} student of group {}",
                    a.seat_id, family, a.course, a.group_id
                ),
            ));
        }
        if topology.is_overflow(a.seat_id) && a.course != Course::Robot {
            errors.push(error(
                "overflow",
                format!("Floor seat {} holds a {} student", a.seat_id, a.course),
            ));
        }
    }
    errors
}

/// Check that every group's seated + floor + unplaced headcount matches what
/// it asked for, course by course.
pub fn check_conservation(
    topology: &Topology,
    groups: &[Group],
    result: &AllocationResult,
) -> Vec<ValidationError> {
    let mut accounted: HashMap<&str, CourseCounts> = HashMap::new();
    for a in &result.assignments {
        if !topology.is_overflow(a.seat_id) {
            accounted.entry(a.group_id.as_str()).or_default().increase(a.course, 1);
        }
    }
    if let Some(overflow) = &result.overflow {
        for c in &overflow.contributors {
            accounted
                .entry(c.group_id.as_str())
                .or_default()
                .increase(Course::Robot, c.count);
        }
    }
    for e in &result.errors {
        let entry = accounted.entry(e.group_id.as_str()).or_default();
        *entry = *entry + e.unassigned;
    }

    let mut errors = Vec::new();
    let known: HashSet<&str> = groups.iter().map(|g| g.id.as_str()).collect();
    for g in groups {
        let got = accounted.get(g.id.as_str()).copied().unwrap_or_default();
        if got != g.counts {
            errors.push(error(
                "conservation",
                format!(
                    "Group {} asked for {} but {} is accounted for",
                    g.id, g.counts, got
                ),
            ));
        }
    }
    let mut unknown: Vec<&str> = accounted.keys().copied().filter(|id| !known.contains(id)).collect();
    unknown.sort_unstable();
    for id in unknown {
        errors.push(error("conservation", format!("Result mentions unknown group {id}")));
    }
    errors
}

/// Check the floor summary agrees with itself and with the seat map.
pub fn check_overflow_summary(topology: &Topology, result: &AllocationResult) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let floor_seats: Vec<SeatId> = result
        .assignments
        .iter()
        .filter(|a| topology.is_overflow(a.seat_id))
        .map(|a| a.seat_id)
        .collect();

    let Some(overflow) = &result.overflow else {
        if !floor_seats.is_empty() {
            errors.push(error(
                "overflow",
                format!("Floor seats {floor_seats:?} are used but no floor summary exists"),
            ));
        }
        return errors;
    };

    let sum: u32 = overflow.contributors.iter().map(|c| c.count).sum();
    if sum != overflow.total {
        errors.push(error(
            "overflow",
            format!("Floor total {} but contributors sum to {}", overflow.total, sum),
        ));
    }
    if overflow.seat_ids != floor_seats {
        errors.push(error(
            "overflow",
            format!(
                "Floor summary lists seats {:?}, seat map has {:?}",
                overflow.seat_ids, floor_seats
            ),
        ));
    }
    if overflow.contributors.first().map(|c| c.group_id.as_str())
        != Some(overflow.owner_group_id.as_str())
    {
        errors.push(error(
            "overflow",
            format!("Floor owner {} is not the first contributor", overflow.owner_group_id),
        ));
    }
    if overflow.total == 0 {
        errors.push(ValidationError {
            category: "overflow",
            severity: Severity::Warning,
            message: "Floor summary present with zero students".to_string(),
        });
    }
    errors
}

/// Run every check.
pub fn check_result(
    topology: &Topology,
    groups: &[Group],
    result: &AllocationResult,
) -> Vec<ValidationError> {
    let mut errors = check_unique_seats(result);
    errors.extend(check_seat_families(topology, result));
    errors.extend(check_conservation(topology, groups, result));
    errors.extend(check_overflow_summary(topology, result));
    errors
}
