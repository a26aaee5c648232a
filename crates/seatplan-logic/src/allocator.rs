//! Seat allocator: seat every mentor group, one after another.
//!
//! Groups are sorted once (hard-to-place long-desk blocks first, then larger
//! groups), then each group is searched through the relaxation stages in
//! order. A group that fits nowhere may send robot students to the floor;
//! failing that it gets an error and no seats. Earlier placements are never
//! undone to make room for later groups.
//!
//! ```
//! use seatplan_logic::allocator::{allocate, Group};
//! use seatplan_logic::course::CourseCounts;
//!
//! let groups = vec![Group::new("mentor-1", "Aoi", CourseCounts::new(3, 0, 0, 0))];
//! let result = allocate(&groups);
//! assert_eq!(result.assignments.len(), 3);
//! assert!(result.overflow.is_none());
//! assert!(result.errors.is_empty());
//! ```

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{validate_config, AllocatorConfig};
use crate::course::{Course, CourseCounts};
use crate::layout::PriorityTier;
use crate::result::{AllocationResult, GroupError, ResultBuilder, NO_CONTIGUOUS_BLOCK};
use crate::search::{find_run, Occupancy, Placement, SearchRequest, StagePolicy};
use crate::topology::Topology;

/// One mentor's cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub counts: CourseCounts,
}

impl Group {
    pub fn new(id: impl Into<String>, label: impl Into<String>, counts: CourseCounts) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            counts,
        }
    }
}

/// Group list validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Group id is blank.
    EmptyId(usize),
    /// Two groups share an id.
    DuplicateId(String),
    /// Group label is blank.
    EmptyLabel(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::EmptyId(i) => write!(f, "group #{i} has an empty id"),
            InputError::DuplicateId(id) => write!(f, "group id {id:?} is used more than once"),
            InputError::EmptyLabel(id) => write!(f, "group {id:?} has an empty label"),
        }
    }
}

impl std::error::Error for InputError {}

/// Boundary check for a group list, returning all errors found.
///
/// The allocator itself accepts any list; results keyed by id are only
/// meaningful when ids are unique.
pub fn validate_groups(groups: &[Group]) -> Vec<InputError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (i, g) in groups.iter().enumerate() {
        if g.id.trim().is_empty() {
            errors.push(InputError::EmptyId(i));
        } else if !seen.insert(g.id.as_str()) {
            errors.push(InputError::DuplicateId(g.id.clone()));
        }
        if g.label.trim().is_empty() {
            errors.push(InputError::EmptyLabel(g.id.clone()));
        }
    }
    errors
}

/// Headcount per course across a whole roster.
pub fn course_totals(groups: &[Group]) -> CourseCounts {
    groups
        .iter()
        .fold(CourseCounts::ZERO, |acc, g| acc + g.counts)
}

/// Sort key: long-desk-only blocks first, then larger groups first.
pub fn priority_key(counts: &CourseCounts, config: &AllocatorConfig) -> (bool, Reverse<u32>) {
    let needs_block =
        counts.shared_total() >= config.shared_block_threshold && counts.focused() == 0;
    (!needs_block, Reverse(counts.total()))
}

/// Groups in the order they are seated. Ties keep input order.
pub fn processing_order<'g>(groups: &'g [Group], config: &AllocatorConfig) -> Vec<&'g Group> {
    let mut order: Vec<&Group> = groups.iter().collect();
    order.sort_by_key(|g| priority_key(&g.counts, config));
    order
}

/// Seats groups on one topology with one configuration.
#[derive(Debug, Clone)]
pub struct Allocator<'t> {
    topology: &'t Topology,
    config: AllocatorConfig,
}

impl<'t> Allocator<'t> {
    /// The config must pass [`validate_config`]; debug builds assert it.
    pub fn new(topology: &'t Topology, config: AllocatorConfig) -> Self {
        debug_assert!(
            validate_config(&config).is_empty(),
            "invalid allocator config: {:?}",
            validate_config(&config)
        );
        Self { topology, config }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Seat every group. Never fails: groups that fit nowhere come back as
    /// errors in the result.
    pub fn allocate(&self, groups: &[Group]) -> AllocationResult {
        let order = processing_order(groups, &self.config);
        log::info!(
            "Seating {} groups: {}",
            order.len(),
            order
                .iter()
                .map(|g| format!("{}({})", g.label, g.counts))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut occupancy = Occupancy::new(self.topology);
        let mut builder = ResultBuilder::new();
        for group in order {
            builder.begin_group(&group.id);
            self.place_group(group, &mut occupancy, &mut builder);
        }

        let result = builder.finish(self.topology);
        log::info!(
            "Seated {} students on {} of {} seats, {} on the floor, {} groups unplaced",
            result.assignments.len(),
            occupancy.taken_count(),
            self.topology.len(),
            result.overflow.as_ref().map_or(0, |o| o.total),
            result.errors.len()
        );
        result
    }

    fn place_group(&self, group: &Group, occupancy: &mut Occupancy, builder: &mut ResultBuilder) {
        if group.counts.is_empty() {
            log::debug!("{}: nothing to seat", group.label);
            return;
        }

        let request = SearchRequest::new(group.counts, &self.config);
        if let Some((stage, placement)) =
            self.search_stages(occupancy, &request, self.config.stages.iter())
        {
            let on_floor = self.commit(group, &placement, occupancy, builder);
            if on_floor > 0 {
                log::warn!(
                    "{}: seated at {} stage using {} floor seat(s)",
                    group.label,
                    stage.label(),
                    on_floor
                );
            }
            return;
        }

        if let Some((placement, floor_count)) = self.seat_with_overflow(group, occupancy, builder) {
            self.commit(group, &placement, occupancy, builder);
            let (floor_seats, area) = self.send_to_floor(group, floor_count, occupancy, builder);
            log::warn!(
                "{}: {} seated, {} robot student(s) sent to the floor ({} on floor seats, {} unseated)",
                group.label,
                placement.seats.len(),
                floor_count,
                floor_seats,
                area
            );
            return;
        }

        log::warn!(
            "{}: no contiguous block for {}",
            group.label,
            group.counts
        );
        builder.fail(GroupError {
            group_id: group.id.clone(),
            group_label: group.label.clone(),
            unassigned: group.counts,
            reason: NO_CONTIGUOUS_BLOCK.to_string(),
        });
    }

    /// First stage, in order, whose search succeeds.
    fn search_stages<'s>(
        &self,
        occupancy: &Occupancy,
        request: &SearchRequest,
        stages: impl Iterator<Item = &'s StagePolicy>,
    ) -> Option<(StagePolicy, Placement)> {
        for stage in stages {
            match find_run(self.topology, occupancy, request, stage) {
                Some(placement) => {
                    log::debug!(
                        "{} stage placed {} at {:?}",
                        stage.label(),
                        request.counts,
                        placement.seats.iter().map(|s| s.seat_id).collect::<Vec<_>>()
                    );
                    return Some((*stage, placement));
                }
                None => log::debug!("{} stage found no run for {}", stage.label(), request.counts),
            }
        }
        None
    }

    /// Try seating the group with `k` robot students moved to the floor, for
    /// increasing `k`. Only stages that keep the floor seats free are used.
    fn seat_with_overflow(
        &self,
        group: &Group,
        occupancy: &Occupancy,
        builder: &ResultBuilder,
    ) -> Option<(Placement, u32)> {
        let counts = group.counts;
        let total = counts.total();
        let used = builder.overflow_total(self.topology);

        for k in 1..=counts.focused() {
            if total - k < self.config.min_seated_with_overflow {
                break;
            }
            if let Some(capacity) = self.config.overflow_capacity {
                if used + k > capacity {
                    log::debug!("{}: floor capacity {} reached", group.label, capacity);
                    break;
                }
            }
            let mut reduced = counts;
            reduced.robot -= k;
            let request = SearchRequest::new(reduced, &self.config);
            let stages = self.config.stages.iter().filter(|s| !s.allow_overflow);
            if let Some((_, placement)) = self.search_stages(occupancy, &request, stages) {
                return Some((placement, k));
            }
        }
        None
    }

    /// Record a placement and mark its seats taken. Returns how many of them
    /// are floor seats.
    fn commit(
        &self,
        group: &Group,
        placement: &Placement,
        occupancy: &mut Occupancy,
        builder: &mut ResultBuilder,
    ) -> usize {
        let mut on_floor = 0;
        for s in &placement.seats {
            if let Some(i) = self.topology.clockwise_index(s.seat_id) {
                occupancy.take(i);
            }
            if self.topology.is_overflow(s.seat_id) {
                on_floor += 1;
            }
            builder.assign(s.seat_id, &group.id, s.course);
        }
        on_floor
    }

    /// Put `count` robot students on free floor seats, clockwise, and the
    /// rest in the floor area. Returns `(on floor seats, unseated)`.
    fn send_to_floor(
        &self,
        group: &Group,
        count: u32,
        occupancy: &mut Occupancy,
        builder: &mut ResultBuilder,
    ) -> (u32, u32) {
        let mut seated = 0;
        for (i, seat) in self.topology.seats().iter().enumerate() {
            if seated == count {
                break;
            }
            if seat.tier == PriorityTier::Overflow && occupancy.is_free(i) {
                occupancy.take(i);
                builder.assign(seat.id, &group.id, Course::Robot);
                seated += 1;
            }
        }
        builder.add_floor_area(&group.id, count - seated);
        (seated, count - seated)
    }
}

/// Seat groups in the built-in classroom with the default configuration.
pub fn allocate(groups: &[Group]) -> AllocationResult {
    Allocator::new(Topology::classroom(), AllocatorConfig::default()).allocate(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, robot: u32, game: u32, fab: u32, prime: u32) -> Group {
        Group::new(id, id.to_uppercase(), CourseCounts::new(robot, game, fab, prime))
    }

    fn seats_of(result: &AllocationResult, id: &str) -> Vec<u8> {
        result
            .assignments
            .iter()
            .filter(|a| a.group_id == id)
            .map(|a| a.seat_id)
            .collect()
    }

    #[test]
    fn test_priority_order() {
        let groups = vec![
            group("small", 1, 0, 0, 0),
            group("mixed", 2, 3, 0, 0),
            group("block", 0, 2, 2, 0),
            group("big", 5, 0, 0, 0),
            group("mixed2", 2, 3, 0, 0),
        ];
        let order: Vec<&str> = processing_order(&groups, &AllocatorConfig::default())
            .iter()
            .map(|g| g.id.as_str())
            .collect();
        assert_eq!(order, vec!["block", "mixed", "big", "mixed2", "small"]);
    }

    #[test]
    fn test_block_rule_requires_zero_robot() {
        let config = AllocatorConfig::default();
        let (not_block, _) = priority_key(&CourseCounts::new(1, 4, 0, 0), &config);
        assert!(not_block);
        let (not_block, _) = priority_key(&CourseCounts::new(0, 0, 0, 4), &config);
        assert!(!not_block);
    }

    #[test]
    fn test_single_robot_group() {
        let r = allocate(&[group("a", 3, 0, 0, 0)]);
        assert_eq!(seats_of(&r, "a"), vec![22, 23, 24]);
        assert!(r.overflow.is_none());
        assert!(r.errors.is_empty());
    }

    #[test]
    fn test_empty_group_gets_nothing() {
        let r = allocate(&[group("a", 0, 0, 0, 0)]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_sequential_groups_do_not_collide() {
        let r = allocate(&[group("a", 3, 0, 0, 0), group("b", 3, 0, 0, 0)]);
        assert_eq!(seats_of(&r, "a"), vec![22, 23, 24]);
        // 7,8 then jump over 9,10 to 11.
        assert_eq!(seats_of(&r, "b"), vec![7, 8, 11]);
    }

    #[test]
    fn test_robot_overflow_to_floor() {
        let r = allocate(&[group("a", 8, 0, 0, 0)]);
        assert_eq!(seats_of(&r, "a"), vec![7, 8, 9, 10, 11, 12, 17, 18]);
        let o = r.overflow.unwrap();
        assert_eq!(o.owner_group_id, "a");
        assert_eq!(o.total, 2);
        assert_eq!(o.seat_ids, vec![17, 18]);
        assert!(r.errors.is_empty());
    }

    #[test]
    fn test_overflow_spills_past_floor_seats() {
        let r = allocate(&[group("a", 10, 0, 0, 0)]);
        let o = r.overflow.unwrap();
        assert_eq!(o.total, 4);
        assert_eq!(o.seat_ids, vec![17, 18]);
        assert_eq!(r.assignments.len(), 8);
    }

    #[test]
    fn test_overflow_capacity_turns_into_error() {
        let config = AllocatorConfig {
            overflow_capacity: Some(2),
            ..Default::default()
        };
        let allocator = Allocator::new(Topology::classroom(), config);
        let r = allocator.allocate(&[group("a", 10, 0, 0, 0)]);
        assert!(r.assignments.is_empty());
        assert!(r.overflow.is_none());
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].unassigned, CourseCounts::new(10, 0, 0, 0));
    }

    #[test]
    fn test_shared_never_overflows() {
        let r = allocate(&[group("a", 0, 14, 0, 0)]);
        assert!(r.assignments.is_empty());
        assert!(r.overflow.is_none());
        let e = r.error_for("a").unwrap();
        assert_eq!(e.unassigned.game, 14);
        assert_eq!(e.group_label, "A");
        assert_eq!(e.reason, NO_CONTIGUOUS_BLOCK);
    }

    #[test]
    fn test_single_robot_without_seats_errors() {
        // Every robot desk taken: one robot student alone cannot go to the
        // floor because fewer than two would stay seated.
        let groups = vec![
            group("a", 6, 0, 0, 0),
            group("b", 3, 0, 0, 0),
            group("c", 2, 0, 0, 0),
            group("d", 1, 0, 0, 0),
        ];
        let r = allocate(&groups);
        assert_eq!(seats_of(&r, "a"), vec![7, 8, 9, 10, 11, 12]);
        assert_eq!(seats_of(&r, "b"), vec![22, 23, 24]);
        assert_eq!(seats_of(&r, "c"), vec![17, 18]);
        assert!(r.error_for("d").is_some());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid allocator config")]
    fn test_rejects_config_without_stages() {
        let config = AllocatorConfig {
            stages: vec![],
            ..Default::default()
        };
        Allocator::new(Topology::classroom(), config);
    }

    #[test]
    fn test_course_totals() {
        let groups = vec![group("a", 1, 2, 0, 0), group("b", 0, 1, 1, 3)];
        assert_eq!(course_totals(&groups), CourseCounts::new(1, 3, 1, 3));
    }

    #[test]
    fn test_validate_groups() {
        let groups = vec![
            group("a", 1, 0, 0, 0),
            Group::new("a", "dup", CourseCounts::ZERO),
            Group::new(" ", "blank id", CourseCounts::ZERO),
            Group::new("c", "", CourseCounts::ZERO),
        ];
        assert_eq!(
            validate_groups(&groups),
            vec![
                InputError::DuplicateId("a".into()),
                InputError::EmptyId(2),
                InputError::EmptyLabel("c".into()),
            ]
        );
    }
}
