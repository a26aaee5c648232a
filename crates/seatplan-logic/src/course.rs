//! Course types, seat families and per-course headcounts.
//!
//! Every student belongs to exactly one course. The robot course is
//! "focused": it may only sit at the square robot desks. The other three
//! courses are "shared": they sit interchangeably at the long desks and
//! never at a robot desk.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A student's course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Course {
    Robot,
    Game,
    Fab,
    Prime,
}

impl Course {
    pub const ALL: [Course; 4] = [Course::Robot, Course::Game, Course::Fab, Course::Prime];

    /// The three long-desk courses in their default fill order.
    pub const SHARED: [Course; 3] = [Course::Game, Course::Fab, Course::Prime];

    /// Seat family this course is confined to.
    pub fn family(self) -> SeatFamily {
        match self {
            Course::Robot => SeatFamily::Focused,
            Course::Game | Course::Fab | Course::Prime => SeatFamily::Shared,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Course::Robot => "robot",
            Course::Game => "game",
            Course::Fab => "fab",
            Course::Prime => "prime",
        }
    }

    /// Two-letter code used on the classroom board.
    pub fn code(self) -> &'static str {
        match self {
            Course::Robot => "RC",
            Course::Game => "PG",
            Course::Fab => "DF",
            Course::Prime => "RT",
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which kind of desk a seat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatFamily {
    /// Square robot desks (and the floor area next to them).
    Focused,
    /// Long desks shared by game, fab and prime.
    Shared,
}

impl SeatFamily {
    /// Whether a student of `course` may occupy a seat of this family.
    pub fn accepts(self, course: Course) -> bool {
        course.family() == self
    }
}

/// Headcount per course. Zero means "no requirement for this course".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseCounts {
    pub robot: u32,
    pub game: u32,
    pub fab: u32,
    pub prime: u32,
}

impl CourseCounts {
    pub const ZERO: CourseCounts = CourseCounts {
        robot: 0,
        game: 0,
        fab: 0,
        prime: 0,
    };

    pub fn new(robot: u32, game: u32, fab: u32, prime: u32) -> Self {
        Self {
            robot,
            game,
            fab,
            prime,
        }
    }

    pub fn get(&self, course: Course) -> u32 {
        match course {
            Course::Robot => self.robot,
            Course::Game => self.game,
            Course::Fab => self.fab,
            Course::Prime => self.prime,
        }
    }

    pub fn get_mut(&mut self, course: Course) -> &mut u32 {
        match course {
            Course::Robot => &mut self.robot,
            Course::Game => &mut self.game,
            Course::Fab => &mut self.fab,
            Course::Prime => &mut self.prime,
        }
    }

    pub fn set(&mut self, course: Course, value: u32) {
        *self.get_mut(course) = value;
    }

    pub fn increase(&mut self, course: Course, n: u32) {
        *self.get_mut(course) += n;
    }

    /// Students who need a focused seat.
    pub fn focused(&self) -> u32 {
        self.robot
    }

    /// Students who need a shared seat (game + fab + prime).
    pub fn shared_total(&self) -> u32 {
        self.game + self.fab + self.prime
    }

    pub fn total(&self) -> u32 {
        self.robot + self.shared_total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Per-course subtraction, clamped at zero.
    pub fn saturating_sub(&self, other: &CourseCounts) -> CourseCounts {
        CourseCounts {
            robot: self.robot.saturating_sub(other.robot),
            game: self.game.saturating_sub(other.game),
            fab: self.fab.saturating_sub(other.fab),
            prime: self.prime.saturating_sub(other.prime),
        }
    }

    /// `(course, headcount)` pairs in [`Course::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Course, u32)> + '_ {
        Course::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

impl std::ops::Add for CourseCounts {
    type Output = CourseCounts;

    fn add(self, rhs: CourseCounts) -> CourseCounts {
        CourseCounts {
            robot: self.robot + rhs.robot,
            game: self.game + rhs.game,
            fab: self.fab + rhs.fab,
            prime: self.prime + rhs.prime,
        }
    }
}

impl fmt::Display for CourseCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RC:{} PG:{} DF:{} RT:{}",
            self.robot, self.game, self.fab, self.prime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_families() {
        assert_eq!(Course::Robot.family(), SeatFamily::Focused);
        for c in Course::SHARED {
            assert_eq!(c.family(), SeatFamily::Shared);
        }
    }

    #[test]
    fn test_family_accepts_only_own_courses() {
        assert!(SeatFamily::Focused.accepts(Course::Robot));
        assert!(!SeatFamily::Focused.accepts(Course::Game));
        assert!(SeatFamily::Shared.accepts(Course::Prime));
        assert!(!SeatFamily::Shared.accepts(Course::Robot));
    }

    #[test]
    fn test_totals() {
        let c = CourseCounts::new(3, 1, 2, 4);
        assert_eq!(c.focused(), 3);
        assert_eq!(c.shared_total(), 7);
        assert_eq!(c.total(), 10);
        assert!(!c.is_empty());
        assert!(CourseCounts::ZERO.is_empty());
    }

    #[test]
    fn test_get_set_add() {
        let mut c = CourseCounts::default();
        c.set(Course::Fab, 2);
        c.increase(Course::Fab, 1);
        c.increase(Course::Robot, 5);
        assert_eq!(c.get(Course::Fab), 3);
        assert_eq!(c.get(Course::Robot), 5);
        assert_eq!(c.get(Course::Game), 0);
    }

    #[test]
    fn test_saturating_sub_clamps() {
        let a = CourseCounts::new(2, 1, 0, 0);
        let b = CourseCounts::new(3, 1, 1, 0);
        assert_eq!(a.saturating_sub(&b), CourseCounts::ZERO);
        assert_eq!(b.saturating_sub(&a), CourseCounts::new(1, 0, 1, 0));
    }

    #[test]
    fn test_iter_order() {
        let c = CourseCounts::new(1, 2, 3, 4);
        let v: Vec<_> = c.iter().collect();
        assert_eq!(
            v,
            vec![
                (Course::Robot, 1),
                (Course::Game, 2),
                (Course::Fab, 3),
                (Course::Prime, 4)
            ]
        );
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let c: CourseCounts = serde_json::from_str(r#"{"robot": 2}"#).unwrap();
        assert_eq!(c, CourseCounts::new(2, 0, 0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CourseCounts::new(1, 0, 2, 0).to_string(),
            "RC:1 PG:0 DF:2 RT:0"
        );
        assert_eq!(Course::Prime.to_string(), "prime");
    }
}
