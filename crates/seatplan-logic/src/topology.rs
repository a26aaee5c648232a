//! Seat topology and the clockwise adjacency oracle.
//!
//! `Topology` holds the seats of one layout in clockwise order together with
//! the explicit allow-list of consecutive pairs. Contiguity is never inferred
//! from seat numbers: a successor pair that is not listed breaks a run.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use crate::course::SeatFamily;
use crate::layout::{classroom_layout, LayoutSpec, PriorityTier, SeatId, SeatSpec, StartPreferences};

/// Layout validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Layout has no seats.
    Empty,
    /// Seat id listed twice.
    DuplicateSeat(SeatId),
    /// Adjacency pair refers to an unknown seat.
    UnknownEdgeSeat { from: SeatId, to: SeatId },
    /// Skip pair must run from a high seat over one or more low seats to a
    /// high seat.
    InvalidSkipPair { from: SeatId, to: SeatId },
    /// Low and overflow tiers only exist within the focused family.
    TieredSharedSeat(SeatId),
    /// Start preference refers to an unknown seat.
    UnknownStartSeat(SeatId),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::Empty => write!(f, "layout has no seats"),
            TopologyError::DuplicateSeat(id) => write!(f, "seat {id} is listed more than once"),
            TopologyError::UnknownEdgeSeat { from, to } => {
                write!(f, "adjacency pair {from}→{to} refers to an unknown seat")
            }
            TopologyError::InvalidSkipPair { from, to } => write!(
                f,
                "skip pair {from}→{to} must jump from a high seat over low seats to a high seat"
            ),
            TopologyError::TieredSharedSeat(id) => {
                write!(f, "shared seat {id} has a low or overflow tier")
            }
            TopologyError::UnknownStartSeat(id) => {
                write!(f, "start preference refers to unknown seat {id}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Immutable seat graph shared by every allocation run.
#[derive(Debug, Clone)]
pub struct Topology {
    name: String,
    /// Seats in clockwise order.
    seats: Vec<SeatSpec>,
    /// seat id → clockwise index
    index: HashMap<SeatId, usize>,
    /// Allow-listed consecutive pairs, as clockwise indices.
    edges: HashSet<(usize, usize)>,
    skip: Option<(usize, usize)>,
    starts: StartPreferences,
}

impl Topology {
    /// Validate a layout and build its topology, returning every problem found.
    pub fn from_layout(layout: &LayoutSpec) -> Result<Self, Vec<TopologyError>> {
        let errors = validate_layout(layout);
        if errors.is_empty() {
            Ok(Self::build(layout))
        } else {
            Err(errors)
        }
    }

    /// The built-in classroom, built once per process.
    pub fn classroom() -> &'static Topology {
        static CLASSROOM: OnceLock<Topology> = OnceLock::new();
        CLASSROOM.get_or_init(|| Self::build(&classroom_layout()))
    }

    fn build(layout: &LayoutSpec) -> Self {
        let index: HashMap<SeatId, usize> = layout
            .seats
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        let edges = layout
            .adjacent_pairs
            .iter()
            .filter_map(|(a, b)| Some((*index.get(a)?, *index.get(b)?)))
            .collect();
        let skip = layout
            .skip_pair
            .and_then(|(a, b)| Some((*index.get(&a)?, *index.get(&b)?)));
        Self {
            name: layout.name.clone(),
            seats: layout.seats.clone(),
            index,
            edges,
            skip,
            starts: layout.start_preferences.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of seats.
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seats in clockwise order.
    pub fn seats(&self) -> &[SeatSpec] {
        &self.seats
    }

    pub fn seat(&self, id: SeatId) -> Option<&SeatSpec> {
        self.index.get(&id).map(|&i| &self.seats[i])
    }

    /// Seat at a clockwise index, wrapping around the circle.
    pub fn seat_at(&self, index: usize) -> &SeatSpec {
        &self.seats[index % self.seats.len()]
    }

    pub fn family(&self, id: SeatId) -> Option<SeatFamily> {
        self.seat(id).map(|s| s.family)
    }

    pub fn tier(&self, id: SeatId) -> Option<PriorityTier> {
        self.seat(id).map(|s| s.tier)
    }

    pub fn clockwise_index(&self, id: SeatId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn is_overflow(&self, id: SeatId) -> bool {
        self.tier(id) == Some(PriorityTier::Overflow)
    }

    pub fn is_low(&self, id: SeatId) -> bool {
        self.tier(id) == Some(PriorityTier::Low)
    }

    /// Whether `b` directly follows `a` in a contiguous run.
    ///
    /// The synthetic skip pair only counts when `allow_skip` is set.
    pub fn is_adjacent(&self, a: SeatId, b: SeatId, allow_skip: bool) -> bool {
        match (self.clockwise_index(a), self.clockwise_index(b)) {
            (Some(ia), Some(ib)) => self.is_adjacent_index(ia, ib, allow_skip),
            _ => false,
        }
    }

    pub(crate) fn is_adjacent_index(&self, a: usize, b: usize, allow_skip: bool) -> bool {
        self.edges.contains(&(a, b)) || (allow_skip && self.skip == Some((a, b)))
    }

    /// Skip pair as seat ids.
    pub fn skip_pair(&self) -> Option<(SeatId, SeatId)> {
        self.skip
            .map(|(a, b)| (self.seats[a].id, self.seats[b].id))
    }

    pub(crate) fn skip_indices(&self) -> Option<(usize, usize)> {
        self.skip
    }

    /// Overflow seats in clockwise order.
    pub fn overflow_seats(&self) -> impl Iterator<Item = &SeatSpec> + '_ {
        self.seats
            .iter()
            .filter(|s| s.tier == PriorityTier::Overflow)
    }

    /// Number of seats in a family, optionally counting overflow seats.
    pub fn count_family(&self, family: SeatFamily, include_overflow: bool) -> usize {
        self.seats
            .iter()
            .filter(|s| s.family == family)
            .filter(|s| include_overflow || s.tier != PriorityTier::Overflow)
            .count()
    }

    pub fn start_preferences(&self) -> &StartPreferences {
        &self.starts
    }
}

/// Check a layout for structural problems.
pub fn validate_layout(layout: &LayoutSpec) -> Vec<TopologyError> {
    let mut errors = Vec::new();

    if layout.seats.is_empty() {
        errors.push(TopologyError::Empty);
        return errors;
    }

    let mut index: HashMap<SeatId, usize> = HashMap::new();
    for (i, s) in layout.seats.iter().enumerate() {
        if index.insert(s.id, i).is_some() {
            errors.push(TopologyError::DuplicateSeat(s.id));
        }
        if s.family == SeatFamily::Shared && s.tier != PriorityTier::High {
            errors.push(TopologyError::TieredSharedSeat(s.id));
        }
    }

    for &(from, to) in &layout.adjacent_pairs {
        if !index.contains_key(&from) || !index.contains_key(&to) {
            errors.push(TopologyError::UnknownEdgeSeat { from, to });
        }
    }

    if let Some((from, to)) = layout.skip_pair {
        if !valid_skip_pair(layout, &index, from, to) {
            errors.push(TopologyError::InvalidSkipPair { from, to });
        }
    }

    let prefs = &layout.start_preferences;
    let mut unknown: Vec<SeatId> = [
        &prefs.shared_block,
        &prefs.large_shared,
        &prefs.mixed,
        &prefs.focused_only,
        &prefs.focused_only_low,
        &prefs.focused_only_tail,
    ]
    .iter()
    .flat_map(|list| list.iter().copied())
    .filter(|id| !index.contains_key(id))
    .collect();
    unknown.sort_unstable();
    unknown.dedup();
    errors.extend(unknown.into_iter().map(TopologyError::UnknownStartSeat));

    errors
}

fn valid_skip_pair(
    layout: &LayoutSpec,
    index: &HashMap<SeatId, usize>,
    from: SeatId,
    to: SeatId,
) -> bool {
    let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) else {
        return false;
    };
    let n = layout.seats.len();
    let is_high_focused =
        |s: &SeatSpec| s.family == SeatFamily::Focused && s.tier == PriorityTier::High;
    if !is_high_focused(&layout.seats[a]) || !is_high_focused(&layout.seats[b]) {
        return false;
    }
    let gap = (b + n - a) % n;
    if gap < 2 {
        return false;
    }
    (1..gap).all(|k| layout.seats[(a + k) % n].tier == PriorityTier::Low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classroom_layout_is_valid() {
        let errors = validate_layout(&classroom_layout());
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_lookup() {
        let t = Topology::classroom();
        assert_eq!(t.len(), 24);
        assert_eq!(t.family(7), Some(SeatFamily::Focused));
        assert_eq!(t.family(1), Some(SeatFamily::Shared));
        assert_eq!(t.family(99), None);
        assert_eq!(t.tier(9), Some(PriorityTier::Low));
        assert_eq!(t.tier(17), Some(PriorityTier::Overflow));
        assert_eq!(t.clockwise_index(1), Some(0));
        assert_eq!(t.clockwise_index(24), Some(23));
        assert_eq!(t.seat_at(24).id, 1);
    }

    #[test]
    fn test_listed_successors_adjacent() {
        let t = Topology::classroom();
        assert!(t.is_adjacent(1, 2, false));
        assert!(t.is_adjacent(8, 9, false));
        assert!(t.is_adjacent(24, 1, false));
    }

    #[test]
    fn test_gap_breaks_adjacency() {
        let t = Topology::classroom();
        assert!(!t.is_adjacent(5, 6, false));
        assert!(!t.is_adjacent(15, 16, true));
    }

    #[test]
    fn test_adjacency_is_directed() {
        let t = Topology::classroom();
        assert!(!t.is_adjacent(2, 1, false));
        assert!(!t.is_adjacent(1, 3, false));
    }

    #[test]
    fn test_skip_pair_needs_permission() {
        let t = Topology::classroom();
        assert_eq!(t.skip_pair(), Some((8, 11)));
        assert!(!t.is_adjacent(8, 11, false));
        assert!(t.is_adjacent(8, 11, true));
        assert!(!t.is_adjacent(11, 8, true));
    }

    #[test]
    fn test_unknown_seat_never_adjacent() {
        let t = Topology::classroom();
        assert!(!t.is_adjacent(24, 25, true));
    }

    #[test]
    fn test_family_counts() {
        let t = Topology::classroom();
        assert_eq!(t.count_family(SeatFamily::Focused, false), 9);
        assert_eq!(t.count_family(SeatFamily::Focused, true), 11);
        assert_eq!(t.count_family(SeatFamily::Shared, true), 13);
        let floor: Vec<_> = t.overflow_seats().map(|s| s.id).collect();
        assert_eq!(floor, vec![17, 18]);
    }

    #[test]
    fn test_rejects_duplicate_and_unknown() {
        let mut layout = classroom_layout();
        layout.seats[1].id = 1;
        layout.adjacent_pairs.push((30, 1));
        let errors = Topology::from_layout(&layout).unwrap_err();
        assert!(errors.contains(&TopologyError::DuplicateSeat(1)));
        assert!(errors.contains(&TopologyError::UnknownEdgeSeat { from: 30, to: 1 }));
    }

    #[test]
    fn test_rejects_bad_skip_pair() {
        let mut layout = classroom_layout();
        layout.skip_pair = Some((7, 8));
        let errors = Topology::from_layout(&layout).unwrap_err();
        assert_eq!(errors, vec![TopologyError::InvalidSkipPair { from: 7, to: 8 }]);

        layout.skip_pair = Some((8, 12));
        let errors = Topology::from_layout(&layout).unwrap_err();
        assert_eq!(errors, vec![TopologyError::InvalidSkipPair { from: 8, to: 12 }]);
    }

    #[test]
    fn test_rejects_tiered_shared_seat() {
        let mut layout = classroom_layout();
        layout.seats[0].tier = PriorityTier::Overflow;
        let errors = Topology::from_layout(&layout).unwrap_err();
        assert_eq!(errors, vec![TopologyError::TieredSharedSeat(1)]);
    }

    #[test]
    fn test_rejects_empty_layout() {
        let layout = LayoutSpec {
            name: "empty".into(),
            seats: vec![],
            adjacent_pairs: vec![],
            skip_pair: None,
            start_preferences: StartPreferences::default(),
        };
        assert_eq!(
            Topology::from_layout(&layout).unwrap_err(),
            vec![TopologyError::Empty]
        );
    }

    #[test]
    fn test_rejects_unknown_start_seat() {
        let mut layout = classroom_layout();
        layout.start_preferences.mixed.push(42);
        let errors = Topology::from_layout(&layout).unwrap_err();
        assert_eq!(errors, vec![TopologyError::UnknownStartSeat(42)]);
    }
}
