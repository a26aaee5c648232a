//! Placement search: find one contiguous clockwise run for one group.
//!
//! The search is a pure function of the topology, the seats already taken
//! in this run, the group's request and a relaxation stage. For every start
//! offset it walks clockwise collecting a run of free, allowed, adjacent
//! seats, then checks the run has the right mix of robot and long-desk seats
//! and fills it in order.

use serde::{Deserialize, Serialize};

use crate::config::AllocatorConfig;
use crate::course::{Course, CourseCounts, SeatFamily};
use crate::layout::{PriorityTier, SeatId, StartPreferences};
use crate::topology::Topology;

/// Which seats a relaxation stage may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StagePolicy {
    pub allow_low_priority: bool,
    pub allow_overflow: bool,
}

impl StagePolicy {
    /// High-priority seats only.
    pub const STRICT: StagePolicy = StagePolicy {
        allow_low_priority: false,
        allow_overflow: false,
    };
    /// Low-priority seats allowed, floor still excluded.
    pub const RELAXED: StagePolicy = StagePolicy {
        allow_low_priority: true,
        allow_overflow: false,
    };
    /// Everything, including the floor seats.
    pub const LAST_RESORT: StagePolicy = StagePolicy {
        allow_low_priority: true,
        allow_overflow: true,
    };

    pub fn label(&self) -> &'static str {
        match (self.allow_low_priority, self.allow_overflow) {
            (false, false) => "strict",
            (true, false) => "relaxed",
            (true, true) => "last-resort",
            (false, true) => "floor-only",
        }
    }

    /// Whether a seat of this tier may join a run.
    pub fn permits(&self, tier: PriorityTier) -> bool {
        match tier {
            PriorityTier::High => true,
            PriorityTier::Low => self.allow_low_priority,
            PriorityTier::Overflow => self.allow_overflow,
        }
    }

    /// Whether this stage allows everything `other` allows.
    pub fn includes(&self, other: &StagePolicy) -> bool {
        (self.allow_low_priority || !other.allow_low_priority)
            && (self.allow_overflow || !other.allow_overflow)
    }
}

/// Seats taken so far in one allocation run, indexed clockwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    taken: Vec<bool>,
}

impl Occupancy {
    pub fn new(topology: &Topology) -> Self {
        Self {
            taken: vec![false; topology.len()],
        }
    }

    pub fn is_free(&self, index: usize) -> bool {
        !self.taken[index]
    }

    pub fn take(&mut self, index: usize) {
        self.taken[index] = true;
    }

    /// Number of taken seats.
    pub fn taken_count(&self) -> usize {
        self.taken.iter().filter(|&&t| t).count()
    }
}

/// Broad shape of a request; picks the start-seat preference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupShape {
    Empty,
    FocusedOnly,
    SharedOnly,
    Mixed,
}

impl GroupShape {
    pub fn of(counts: &CourseCounts) -> Self {
        match (counts.focused() > 0, counts.shared_total() > 0) {
            (false, false) => GroupShape::Empty,
            (true, false) => GroupShape::FocusedOnly,
            (false, true) => GroupShape::SharedOnly,
            (true, true) => GroupShape::Mixed,
        }
    }
}

/// Everything the search needs to know about one group, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub counts: CourseCounts,
    pub shape: GroupShape,
    /// Large enough on the long-desk side to want a whole block.
    pub wants_shared_block: bool,
    /// May use the synthetic skip pair over the low-priority seats.
    pub allow_skip: bool,
    pub shared_order: [Course; 3],
}

impl SearchRequest {
    pub fn new(counts: CourseCounts, config: &AllocatorConfig) -> Self {
        Self {
            counts,
            shape: GroupShape::of(&counts),
            wants_shared_block: counts.shared_total() >= config.shared_block_threshold,
            allow_skip: counts.focused() <= config.skip_jump_max_focused,
            shared_order: config.shared_order,
        }
    }
}

/// One seat of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedSeat {
    pub seat_id: SeatId,
    pub course: Course,
}

/// A complete seating for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Assigned seats in clockwise run order.
    pub seats: Vec<PlacedSeat>,
    /// Seat the successful walk started from (`None` for an empty request).
    pub start: Option<SeatId>,
}

impl Placement {
    /// Headcount seated per course.
    pub fn counts(&self) -> CourseCounts {
        let mut counts = CourseCounts::ZERO;
        for s in &self.seats {
            counts.increase(s.course, 1);
        }
        counts
    }
}

/// Search every start offset for a run that seats the whole request.
///
/// A run that puts robot students on both low-priority seats back to back is
/// kept only as a fallback: it is returned when no other offset succeeds in
/// this stage, and among such runs the first in offset order wins.
///
/// A stage that admits low-priority seats also retries each failed offset
/// with them excluded, so the skip jump stays available and any run a
/// stricter stage finds is found here too.
pub fn find_run(
    topology: &Topology,
    occupancy: &Occupancy,
    request: &SearchRequest,
    stage: &StagePolicy,
) -> Option<Placement> {
    if request.counts.is_empty() {
        return Some(Placement::default());
    }
    if topology.is_empty() {
        return None;
    }

    let jump_first = StagePolicy {
        allow_low_priority: false,
        ..*stage
    };
    let retry_with_jump =
        stage.allow_low_priority && request.allow_skip && topology.skip_pair().is_some();

    let mut fallback = None;
    for offset in start_offsets(topology, request, stage) {
        let placed = place_from(topology, occupancy, request, stage, offset).or_else(|| {
            if retry_with_jump {
                place_from(topology, occupancy, request, &jump_first, offset)
            } else {
                None
            }
        });
        let Some(placement) = placed else {
            continue;
        };
        if !uses_low_pair(topology, &placement) {
            return Some(placement);
        }
        if fallback.is_none() {
            fallback = Some(placement);
        }
    }
    fallback
}

/// Walk from one offset and fill the run, if it has the right seat mix.
fn place_from(
    topology: &Topology,
    occupancy: &Occupancy,
    request: &SearchRequest,
    stage: &StagePolicy,
    offset: usize,
) -> Option<Placement> {
    let run = try_from_offset(topology, occupancy, request, stage, offset)?;
    let mut placement = arrange(topology, &run, request)?;
    placement.start = Some(topology.seat_at(offset).id);
    Some(placement)
}

/// Clockwise indices to start from: the shape's preferred seats first, then
/// every other offset in ascending order.
pub fn start_offsets(topology: &Topology, request: &SearchRequest, stage: &StagePolicy) -> Vec<usize> {
    let prefs: &StartPreferences = topology.start_preferences();
    let mut order = Vec::with_capacity(topology.len());

    match request.shape {
        GroupShape::SharedOnly if request.wants_shared_block => {
            push_unique(&mut order, topology, &prefs.shared_block);
        }
        GroupShape::Mixed => push_unique(&mut order, topology, &prefs.mixed),
        GroupShape::FocusedOnly => {
            push_unique(&mut order, topology, &prefs.focused_only);
            if stage.allow_low_priority {
                push_unique(&mut order, topology, &prefs.focused_only_low);
            }
            push_unique(&mut order, topology, &prefs.focused_only_tail);
        }
        _ => {}
    }
    if request.wants_shared_block {
        push_unique(&mut order, topology, &prefs.large_shared);
    }

    for i in 0..topology.len() {
        if !order.contains(&i) {
            order.push(i);
        }
    }
    order
}

fn push_unique(order: &mut Vec<usize>, topology: &Topology, seats: &[SeatId]) {
    for &id in seats {
        if let Some(i) = topology.clockwise_index(id) {
            if !order.contains(&i) {
                order.push(i);
            }
        }
    }
}

/// Walk clockwise from `offset` collecting a contiguous run of
/// `request.counts.total()` seats. Returns clockwise indices.
fn try_from_offset(
    topology: &Topology,
    occupancy: &Occupancy,
    request: &SearchRequest,
    stage: &StagePolicy,
    offset: usize,
) -> Option<Vec<usize>> {
    let n = topology.len();
    let needed = request.counts.total() as usize;
    let mut run: Vec<usize> = Vec::with_capacity(needed);
    let mut pos = offset % n;
    let mut steps = 0;

    while steps < n && run.len() < needed {
        let idx = pos;
        pos = (pos + 1) % n;
        steps += 1;

        let seat = topology.seat_at(idx);
        if !occupancy.is_free(idx) {
            run.clear();
            continue;
        }
        if seat.tier == PriorityTier::Overflow && !stage.allow_overflow {
            run.clear();
            continue;
        }
        if seat.tier == PriorityTier::Low && !stage.allow_low_priority {
            match jump_target(topology, occupancy, request, stage, run.last().copied()) {
                Some(target) => {
                    run.push(target);
                    steps += (target + n - idx) % n;
                    pos = (target + 1) % n;
                }
                None => run.clear(),
            }
            continue;
        }

        match run.last() {
            Some(&prev) if !topology.is_adjacent_index(prev, idx, request.allow_skip) => {
                run.clear();
                run.push(idx);
            }
            _ => run.push(idx),
        }
    }

    (run.len() >= needed).then_some(run)
}

/// Where the run continues when it hits a forbidden low-priority seat right
/// after the skip pair's source.
fn jump_target(
    topology: &Topology,
    occupancy: &Occupancy,
    request: &SearchRequest,
    stage: &StagePolicy,
    prev: Option<usize>,
) -> Option<usize> {
    let (source, target) = topology.skip_indices()?;
    if prev != Some(source) || !request.allow_skip {
        return None;
    }
    let usable = occupancy.is_free(target)
        && stage.permits(topology.seat_at(target).tier)
        && topology.is_adjacent_index(source, target, request.allow_skip);
    usable.then_some(target)
}

/// Fill a run in clockwise order: robot seats with robot students, long-desk
/// seats with the shared courses in configured order. Surplus seats stay
/// empty; a seat of one family is never given to the other.
fn arrange(topology: &Topology, run: &[usize], request: &SearchRequest) -> Option<Placement> {
    let required = request.counts;
    let focused_seats = run
        .iter()
        .filter(|&&i| topology.seat_at(i).family == SeatFamily::Focused)
        .count() as u32;
    let shared_seats = run.len() as u32 - focused_seats;
    if focused_seats < required.focused() || shared_seats < required.shared_total() {
        return None;
    }

    let mut remaining = required;
    let mut seats = Vec::with_capacity(required.total() as usize);
    for &i in run {
        let seat = topology.seat_at(i);
        let course = match seat.family {
            SeatFamily::Focused => (remaining.robot > 0).then_some(Course::Robot),
            SeatFamily::Shared => request
                .shared_order
                .iter()
                .copied()
                .find(|&c| remaining.get(c) > 0),
        };
        if let Some(course) = course {
            *remaining.get_mut(course) -= 1;
            seats.push(PlacedSeat {
                seat_id: seat.id,
                course,
            });
        }
    }

    remaining.is_empty().then_some(Placement { seats, start: None })
}

/// Whether two low-priority seats are both used, one right after the other.
fn uses_low_pair(topology: &Topology, placement: &Placement) -> bool {
    placement
        .seats
        .windows(2)
        .any(|w| topology.is_low(w[0].seat_id) && topology.is_low(w[1].seat_id))
}
