//! Allocation output: seat map, floor summary and per-group errors.

use serde::{Deserialize, Serialize};

use crate::course::{Course, CourseCounts};
use crate::layout::SeatId;
use crate::topology::Topology;

/// Reason recorded for a group that got no seats.
pub const NO_CONTIGUOUS_BLOCK: &str =
    "could not secure a contiguous block of seats; reduce the headcount or adjust other groups";

/// One student seated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub seat_id: SeatId,
    pub group_id: String,
    pub course: Course,
}

/// A group's share of the floor area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowContributor {
    pub group_id: String,
    pub count: u32,
}

/// Students sent to the floor area (floor seats plus unseated spill-over).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowAllocation {
    /// First group, in processing order, forced onto the floor.
    pub owner_group_id: String,
    pub total: u32,
    /// Per-group headcount, in processing order.
    pub contributors: Vec<OverflowContributor>,
    /// Floor seats consumed, in commit order.
    pub seat_ids: Vec<SeatId>,
}

/// Headcount a group could not get seated anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupError {
    pub group_id: String,
    pub group_label: String,
    pub unassigned: CourseCounts,
    pub reason: String,
}

/// Result of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub assignments: Vec<SeatAssignment>,
    pub overflow: Option<OverflowAllocation>,
    pub errors: Vec<GroupError>,
}

impl AllocationResult {
    /// Nothing seated, nothing overflowed, nothing failed.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.overflow.is_none() && self.errors.is_empty()
    }

    /// Students of a group holding a seat, floor seats included.
    pub fn seated_counts(&self, group_id: &str) -> CourseCounts {
        let mut counts = CourseCounts::ZERO;
        for a in self.assignments.iter().filter(|a| a.group_id == group_id) {
            counts.increase(a.course, 1);
        }
        counts
    }

    /// A group's floor headcount (zero if it never overflowed).
    pub fn overflow_for(&self, group_id: &str) -> u32 {
        self.overflow
            .as_ref()
            .and_then(|o| o.contributors.iter().find(|c| c.group_id == group_id))
            .map_or(0, |c| c.count)
    }

    pub fn error_for(&self, group_id: &str) -> Option<&GroupError> {
        self.errors.iter().find(|e| e.group_id == group_id)
    }

    /// Who sits in a seat, if anyone.
    pub fn occupant(&self, seat_id: SeatId) -> Option<&SeatAssignment> {
        self.assignments.iter().find(|a| a.seat_id == seat_id)
    }
}

/// Accumulates commits during a run and folds them into a result.
#[derive(Debug, Default)]
pub(crate) struct ResultBuilder {
    assignments: Vec<SeatAssignment>,
    /// Unseated floor headcount per commit, in commit order.
    floor_area: Vec<(String, u32)>,
    errors: Vec<GroupError>,
    /// Group ids in processing order.
    processed: Vec<String>,
}

impl ResultBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_group(&mut self, group_id: &str) {
        self.processed.push(group_id.to_string());
    }

    pub(crate) fn assign(&mut self, seat_id: SeatId, group_id: &str, course: Course) {
        self.assignments.push(SeatAssignment {
            seat_id,
            group_id: group_id.to_string(),
            course,
        });
    }

    pub(crate) fn add_floor_area(&mut self, group_id: &str, count: u32) {
        if count > 0 {
            self.floor_area.push((group_id.to_string(), count));
        }
    }

    pub(crate) fn fail(&mut self, error: GroupError) {
        self.errors.push(error);
    }

    /// Floor headcount committed so far, floor seats included.
    pub(crate) fn overflow_total(&self, topology: &Topology) -> u32 {
        let seated = self
            .assignments
            .iter()
            .filter(|a| topology.is_overflow(a.seat_id))
            .count() as u32;
        seated + self.floor_area.iter().map(|(_, n)| n).sum::<u32>()
    }

    pub(crate) fn finish(self, topology: &Topology) -> AllocationResult {
        let overflow = build_overflow(topology, &self.assignments, &self.floor_area, &self.processed);
        AllocationResult {
            assignments: self.assignments,
            overflow,
            errors: self.errors,
        }
    }
}

/// Scan committed seats for floor seats, add unseated floor headcount and
/// summarise per group. `None` when nobody went to the floor.
fn build_overflow(
    topology: &Topology,
    assignments: &[SeatAssignment],
    floor_area: &[(String, u32)],
    processed: &[String],
) -> Option<OverflowAllocation> {
    let mut seat_ids = Vec::new();
    let mut per_group: Vec<(&str, u32)> = Vec::new();
    for a in assignments.iter().filter(|a| topology.is_overflow(a.seat_id)) {
        seat_ids.push(a.seat_id);
        add_to(&mut per_group, &a.group_id, 1);
    }
    for (group_id, n) in floor_area {
        add_to(&mut per_group, group_id, *n);
    }
    if per_group.is_empty() {
        return None;
    }

    let rank = |id: &str| processed.iter().position(|p| p == id).unwrap_or(usize::MAX);
    per_group.sort_by_key(|(id, _)| rank(*id));

    let contributors: Vec<OverflowContributor> = per_group
        .iter()
        .map(|(id, count)| OverflowContributor {
            group_id: id.to_string(),
            count: *count,
        })
        .collect();
    Some(OverflowAllocation {
        owner_group_id: contributors[0].group_id.clone(),
        total: contributors.iter().map(|c| c.count).sum(),
        contributors,
        seat_ids,
    })
}

fn add_to<'a>(per_group: &mut Vec<(&'a str, u32)>, group_id: &'a str, n: u32) {
    match per_group.iter_mut().find(|(id, _)| *id == group_id) {
        Some((_, count)) => *count += n,
        None => per_group.push((group_id, n)),
    }
}
