//! Built-in classroom layout: seat table, adjacency allow-list, skip pair
//! and per-shape start preferences.
//!
//! Seats are numbered clockwise starting at the corner of the top L-shaped
//! desk. The numbering is visual: two successor pairs straddle a physical
//! gap between desks and are deliberately missing from the allow-list.
//!
//! ```text
//!   1  2  3  4  5 |gap|  6
//!  24                    7
//!  23  [left sq]  [right sq] 8
//!  22                 9 10   (low)
//!  21                   11
//!  20                   12
//!  19                   13
//!  18 17 (floor)  16 |gap| 15 14
//! ```

use serde::{Deserialize, Serialize};

use crate::course::SeatFamily;

/// Seat identifier as printed on the classroom board.
pub type SeatId = u8;

/// Desirability of a seat within the focused family.
///
/// Shared seats are always `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    High,
    /// Awkward seats used only when a group cannot fit elsewhere.
    Low,
    /// Floor spots beside the robot desks, last resort only.
    Overflow,
}

/// One seat in the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSpec {
    pub id: SeatId,
    pub family: SeatFamily,
    pub tier: PriorityTier,
    /// Reference position in percent of the room (x right, y down).
    /// Documents the adjacency table; never read by the search.
    pub x: f32,
    pub y: f32,
}

/// Start seats tried before the plain clockwise sweep, per group shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartPreferences {
    /// Long-desk-only groups large enough to need a whole block.
    pub shared_block: Vec<SeatId>,
    /// Any group large enough on the shared side, tried after the shape list.
    pub large_shared: Vec<SeatId>,
    /// Groups with both robot and long-desk students.
    pub mixed: Vec<SeatId>,
    /// Robot-only groups, high-priority desks first.
    pub focused_only: Vec<SeatId>,
    /// Appended for robot-only groups once low-priority seats are allowed.
    pub focused_only_low: Vec<SeatId>,
    /// Remaining robot-only starts.
    pub focused_only_tail: Vec<SeatId>,
}

/// Complete description of a seat layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub name: String,
    /// Seats in clockwise order.
    pub seats: Vec<SeatSpec>,
    /// Directed `(from, to)` pairs that are physically consecutive.
    pub adjacent_pairs: Vec<(SeatId, SeatId)>,
    /// Synthetic pair jumping over the low-priority seats.
    pub skip_pair: Option<(SeatId, SeatId)>,
    #[serde(default)]
    pub start_preferences: StartPreferences,
}

fn seat(id: SeatId, family: SeatFamily, tier: PriorityTier, x: f32, y: f32) -> SeatSpec {
    SeatSpec {
        id,
        family,
        tier,
        x,
        y,
    }
}

/// The classroom the engine was built for: 24 seats, 13 shared, 9 robot
/// and 2 floor spots.
pub fn classroom_layout() -> LayoutSpec {
    use PriorityTier::*;
    use SeatFamily::*;

    let seats = vec![
        // Top L-shaped long desk
        seat(1, Shared, High, 22.0, 23.0),
        seat(2, Shared, High, 28.5, 18.0),
        seat(3, Shared, High, 38.5, 18.0),
        seat(4, Shared, High, 48.5, 18.0),
        seat(5, Shared, High, 58.5, 18.0),
        // Top-right long desk
        seat(6, Shared, High, 84.5, 18.0),
        // Right square desks
        seat(7, Focused, High, 79.5, 22.0),
        seat(8, Focused, High, 67.0, 32.0),
        seat(9, Focused, Low, 79.5, 42.0),
        seat(10, Focused, Low, 79.5, 46.5),
        seat(11, Focused, High, 67.0, 56.5),
        seat(12, Focused, High, 79.5, 66.5),
        // Right lower long desk
        seat(13, Shared, High, 79.0, 74.5),
        seat(14, Shared, High, 79.0, 82.5),
        seat(15, Shared, High, 79.0, 90.5),
        // Bottom long desk
        seat(16, Shared, High, 50.0, 92.0),
        // Floor area
        seat(17, Focused, Overflow, 38.0, 88.0),
        seat(18, Focused, Overflow, 28.0, 86.0),
        // Left lower long desk
        seat(19, Shared, High, 22.0, 80.5),
        seat(20, Shared, High, 22.0, 72.5),
        seat(21, Shared, High, 22.0, 64.5),
        // Left square desk
        seat(22, Focused, High, 28.0, 52.5),
        seat(23, Focused, High, 41.0, 42.5),
        seat(24, Focused, High, 28.0, 32.5),
    ];

    // 5→6: the L desk ends well short of the top-right desk.
    // 15→16: the right lower desk and the bottom desk are across an aisle.
    let gaps: [(SeatId, SeatId); 2] = [(5, 6), (15, 16)];
    let n = seats.len();
    let adjacent_pairs = (0..n)
        .map(|i| (seats[i].id, seats[(i + 1) % n].id))
        .filter(|pair| !gaps.contains(pair))
        .collect();

    LayoutSpec {
        name: "classroom".to_string(),
        seats,
        adjacent_pairs,
        skip_pair: Some((8, 11)),
        start_preferences: StartPreferences {
            shared_block: vec![1],
            large_shared: vec![1, 2, 3, 4],
            mixed: vec![22, 7, 11, 19],
            focused_only: vec![22, 23, 24, 7, 8],
            focused_only_low: vec![9, 10],
            focused_only_tail: vec![11, 12],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_counts() {
        let layout = classroom_layout();
        assert_eq!(layout.seats.len(), 24);
        let shared = layout
            .seats
            .iter()
            .filter(|s| s.family == SeatFamily::Shared)
            .count();
        let floor = layout
            .seats
            .iter()
            .filter(|s| s.tier == PriorityTier::Overflow)
            .count();
        assert_eq!(shared, 13);
        assert_eq!(floor, 2);
    }

    #[test]
    fn test_clockwise_numbering() {
        let layout = classroom_layout();
        for (i, s) in layout.seats.iter().enumerate() {
            assert_eq!(s.id as usize, i + 1);
        }
    }

    #[test]
    fn test_gaps_missing_from_allow_list() {
        let layout = classroom_layout();
        assert_eq!(layout.adjacent_pairs.len(), 22);
        assert!(!layout.adjacent_pairs.contains(&(5, 6)));
        assert!(!layout.adjacent_pairs.contains(&(15, 16)));
        assert!(layout.adjacent_pairs.contains(&(24, 1)));
        assert!(layout.adjacent_pairs.contains(&(16, 17)));
    }

    #[test]
    fn test_layout_json_roundtrip() {
        let layout = classroom_layout();
        let json = serde_json::to_string(&layout).unwrap();
        let back: LayoutSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
