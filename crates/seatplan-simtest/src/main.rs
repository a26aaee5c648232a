//! SeatPlan Headless Allocation Harness
//!
//! Validates the classroom layout and allocator configuration, seats a
//! roster and checks every result invariant. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p seatplan-simtest
//!   cargo run -p seatplan-simtest -- --groups data/demo_roster.json --verbose
//!   cargo run -p seatplan-simtest -- --groups roster.json --config config.json --json

use std::path::{Path, PathBuf};

use clap::Parser;
use seatplan_logic::allocator::{course_totals, processing_order, validate_groups, Allocator, Group};
use seatplan_logic::config::{validate_config, AllocatorConfig};
use seatplan_logic::course::SeatFamily;
use seatplan_logic::layout::{classroom_layout, PriorityTier};
use seatplan_logic::result::AllocationResult;
use seatplan_logic::topology::{validate_layout, Topology};
use seatplan_logic::validate::{check_result, Severity};
use serde::de::DeserializeOwned;

// ── Demo roster (same JSON as data/demo_roster.json) ────────────────────
const DEMO_ROSTER_JSON: &str = include_str!("../../../data/demo_roster.json");

/// Seat a roster in the classroom and check the result.
#[derive(Parser, Debug)]
struct Cli {
    /// JSON array of groups; the built-in demo roster when omitted
    #[arg(long)]
    groups: Option<PathBuf>,
    /// JSON allocator configuration; defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the allocation result as JSON instead of a seat map
    #[arg(long)]
    json: bool,
    /// Debug logging and per-check detail
    #[arg(long)]
    verbose: bool,
}

// ── Logging ─────────────────────────────────────────────────────────────

/// Filter used when `RUST_LOG` is not set.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the stderr subscriber. The library logs through the `log` facade,
/// which the subscriber picks up as well.
fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    println!("=== SeatPlan Allocation Harness ===\n");

    let mut results = Vec::new();

    // 1. Layout
    results.extend(validate_classroom());

    // 2. Inputs
    let config = load_config(cli.config.as_deref(), &mut results);
    let groups = load_groups(cli.groups.as_deref(), &mut results);

    // 3. Allocation + invariants
    if let (Some(config), Some(groups)) = (config, groups) {
        results.extend(run_allocation(&groups, config, cli.json, cli.verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || cli.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Classroom layout ─────────────────────────────────────────────────

fn validate_classroom() -> Vec<TestResult> {
    println!("--- Classroom Layout ---");
    let mut results = Vec::new();
    let layout = classroom_layout();

    let errors = validate_layout(&layout);
    results.push(TestResult {
        name: "layout_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} seats, {} adjacent pairs", layout.seats.len(), layout.adjacent_pairs.len())
        } else {
            join(errors.iter().map(|e| e.to_string()))
        },
    });

    let topology = Topology::classroom();
    let focused = topology.count_family(SeatFamily::Focused, false);
    let shared = topology.count_family(SeatFamily::Shared, false);
    let floor = topology.overflow_seats().count();
    results.push(TestResult {
        name: "layout_capacity".into(),
        passed: focused > 0 && shared > 0,
        detail: format!("{focused} robot desks, {shared} long-desk seats, {floor} floor seats"),
    });

    results.push(TestResult {
        name: "layout_skip_pair".into(),
        passed: topology.skip_pair().is_some(),
        detail: match topology.skip_pair() {
            Some((from, to)) => format!("{from} → {to} over the low-priority seats"),
            None => "no skip pair".into(),
        },
    });

    results
}

// ── 2. Inputs ───────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn load_config(path: Option<&Path>, results: &mut Vec<TestResult>) -> Option<AllocatorConfig> {
    println!("--- Configuration ---");
    let config = match path {
        Some(p) => match read_json::<AllocatorConfig>(p) {
            Ok(c) => c,
            Err(e) => {
                results.push(TestResult {
                    name: "config_parse".into(),
                    passed: false,
                    detail: format!("JSON parse error: {e}"),
                });
                return None;
            }
        },
        None => AllocatorConfig::default(),
    };

    let errors = validate_config(&config);
    results.push(TestResult {
        name: "config_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!(
                "{} stages, block threshold {}, floor capacity {}",
                config.stages.len(),
                config.shared_block_threshold,
                config
                    .overflow_capacity
                    .map_or_else(|| "unbounded".to_string(), |c| c.to_string())
            )
        } else {
            join(errors.iter().map(|e| e.to_string()))
        },
    });
    errors.is_empty().then_some(config)
}

fn load_groups(path: Option<&Path>, results: &mut Vec<TestResult>) -> Option<Vec<Group>> {
    println!("--- Roster ---");
    let parsed = match path {
        Some(p) => read_json::<Vec<Group>>(p),
        None => serde_json::from_str(DEMO_ROSTER_JSON).map_err(|e| format!("demo roster: {e}")),
    };
    let groups = match parsed {
        Ok(g) => g,
        Err(e) => {
            results.push(TestResult {
                name: "roster_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {e}"),
            });
            return None;
        }
    };

    let errors = validate_groups(&groups);
    let totals = course_totals(&groups);
    results.push(TestResult {
        name: "roster_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} groups, {} students ({})", groups.len(), totals.total(), totals)
        } else {
            join(errors.iter().map(|e| e.to_string()))
        },
    });
    errors.is_empty().then_some(groups)
}

// ── 3. Allocation ───────────────────────────────────────────────────────

fn run_allocation(
    groups: &[Group],
    config: AllocatorConfig,
    json: bool,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Allocation ---");
    let mut results = Vec::new();
    let topology = Topology::classroom();

    if verbose {
        println!("  Processing order:");
        for g in processing_order(groups, &config) {
            println!("    {:12} {}", g.label, g.counts);
        }
    }

    let allocator = Allocator::new(topology, config);
    let result = allocator.allocate(groups);

    let rerun = allocator.allocate(groups);
    results.push(TestResult {
        name: "allocation_deterministic".into(),
        passed: rerun == result,
        detail: "two runs over the same roster agree".into(),
    });

    let violations = check_result(topology, groups, &result);
    for category in ["seats", "family", "conservation", "overflow"] {
        let errors: Vec<_> = violations
            .iter()
            .filter(|v| v.category == category && v.severity == Severity::Error)
            .collect();
        results.push(TestResult {
            name: format!("invariant_{category}"),
            passed: errors.is_empty(),
            detail: if errors.is_empty() {
                "ok".into()
            } else {
                join(errors.iter().map(|e| e.message.clone()))
            },
        });
    }
    for warning in violations.iter().filter(|v| v.severity == Severity::Warning) {
        tracing::warn!("{}: {}", warning.category, warning.message);
    }

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => results.push(TestResult {
                name: "result_json".into(),
                passed: false,
                detail: e.to_string(),
            }),
        }
    } else {
        print!("{}", render_seat_map(topology, groups, &result));
    }

    results
}

/// One line per seat in clockwise order, then the floor summary and errors.
fn render_seat_map(topology: &Topology, groups: &[Group], result: &AllocationResult) -> String {
    let label = |id: &str| {
        groups
            .iter()
            .find(|g| g.id == id)
            .map_or(id.to_string(), |g| g.label.clone())
    };

    let mut out = String::from("  Seat map:\n");
    for seat in topology.seats() {
        let tier = match seat.tier {
            PriorityTier::High => "",
            PriorityTier::Low => " (low)",
            PriorityTier::Overflow => " (floor)",
        };
        let desk = match seat.family {
            SeatFamily::Focused => "robot",
            SeatFamily::Shared => "long",
        };
        let who = match result.occupant(seat.id) {
            Some(a) => format!("{} {}", a.course.code(), label(&a.group_id)),
            None => "·".to_string(),
        };
        out.push_str(&format!("    {:>2} {:5}{:8} {}\n", seat.id, desk, tier, who));
    }

    if let Some(o) = &result.overflow {
        out.push_str(&format!(
            "  Floor area: {} student(s), owner {}, seats {:?}\n",
            o.total,
            label(&o.owner_group_id),
            o.seat_ids
        ));
        for c in &o.contributors {
            out.push_str(&format!("    {:12} {}\n", label(&c.group_id), c.count));
        }
    }
    for e in &result.errors {
        out.push_str(&format!(
            "  Unplaced: {} ({}): {}\n",
            e.group_label, e.unassigned, e.reason
        ));
    }
    out
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatplan_logic::allocator::allocate;

    #[test]
    fn test_demo_roster_parses_and_is_valid() {
        let groups: Vec<Group> = serde_json::from_str(DEMO_ROSTER_JSON).unwrap();
        assert!(!groups.is_empty());
        assert!(validate_groups(&groups).is_empty());
    }

    #[test]
    fn test_demo_roster_passes_every_check() {
        let groups: Vec<Group> = serde_json::from_str(DEMO_ROSTER_JSON).unwrap();
        let results = run_allocation(&groups, AllocatorConfig::default(), false, false);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn test_verbose_switches_to_debug() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "debug");
        assert!(tracing_subscriber::EnvFilter::try_new(default_filter(true)).is_ok());
    }

    #[test]
    fn test_seat_map_lists_every_seat() {
        let groups = vec![Group::new(
            "g1",
            "Aoi",
            seatplan_logic::course::CourseCounts::new(0, 20, 0, 0),
        )];
        let result = allocate(&groups);
        let map = render_seat_map(Topology::classroom(), &groups, &result);
        assert_eq!(map.lines().filter(|l| l.starts_with("    ")).count(), 24);
        assert!(map.contains("Unplaced: Aoi"));
    }
}
