//! Campus Escape Headless Simulation Harness
//!
//! Plays seeded games end to end with a random student policy and checks
//! the containment invariants after every command. Runs entirely
//! in-process: no rendering, no input.
//!
//! Usage:
//!   cargo run -p escape-simtest
//!   cargo run -p escape-simtest -- --games 200 --seed 7 --verbose
//!   cargo run -p escape-simtest -- --layout my_campus.json --config rules.json

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use escape_core::generation::{demo_layout, WorldBuilder, WorldLayout};
use escape_core::persistence;
use escape_core::prelude::*;

// ── Bundled layout (same campus as `demo_layout()`) ─────────────────────
const DEMO_CAMPUS_JSON: &str = include_str!("../../../data/demo_campus.json");

#[derive(Parser)]
#[command(name = "escape-simtest")]
#[command(about = "Plays seeded campus escape games and checks invariants", version)]
struct Cli {
    /// World layout JSON (defaults to the bundled campus)
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Game config JSON (defaults to the standard rules)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First seed; game `n` uses `seed + n`
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of games to play
    #[arg(short, long, default_value_t = 50)]
    games: u64,

    /// Write the final state of the first game to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print every check and the final board of the first game
    #[arg(short, long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    println!("=== Campus Escape Simulation Harness ===\n");

    let layout = match &cli.layout {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading layout {}", path.display()))?;
            WorldLayout::from_json_str(&text)
                .with_context(|| format!("parsing layout {}", path.display()))?
        }
        None => WorldLayout::from_json_str(DEMO_CAMPUS_JSON).context("parsing bundled campus")?,
    };
    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GameConfig::from_json_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    let mut results = Vec::new();

    // 1. Layout validation
    results.extend(validate_layout(&layout, &config));

    // 2. Seeded random play
    results.extend(validate_random_play(&cli, &layout, &config)?);

    // 3. Persistence
    results.extend(validate_persistence(&cli, &layout, &config));

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
    Ok(())
}

fn build(layout: &WorldLayout, config: &GameConfig) -> (Game, usize) {
    let mut builder = WorldBuilder::new(config.clone());
    let errors = builder.apply_layout(layout);
    (builder.finish(), errors.len())
}

// ── Invariants ──────────────────────────────────────────────────────────

/// Every containment edge must be recorded exactly once on each side.
fn check_invariants(game: &Game) -> Result<(), String> {
    for item in game.items() {
        let holders = game.rooms().filter(|r| r.has_item(item.id())).count()
            + game.actors().filter(|a| a.holds(item.id())).count();
        if holders != 1 {
            return Err(format!("{} is held {} times", item.id(), holders));
        }
        let listed = match item.owner() {
            Owner::Room(room) => game.room(room).map_or(false, |r| r.has_item(item.id())),
            Owner::Actor(actor) => game.actor(actor).map_or(false, |a| a.holds(item.id())),
        };
        if !listed {
            return Err(format!("{} points at an owner that does not list it", item.id()));
        }
        if let Some(pair) = item.pair() {
            if game.item(pair).and_then(|p| p.pair()) != Some(item.id()) {
                return Err(format!("{} has a one-sided pairing", item.id()));
            }
        }
    }

    for actor in game.actors() {
        let homes = game
            .rooms()
            .filter(|r| r.has_resident(actor.id()))
            .map(|r| r.id())
            .collect::<Vec<_>>();
        if homes != [actor.room()] {
            return Err(format!("{} is resident in {:?}", actor.name(), homes));
        }
    }

    for room in game.rooms() {
        if room.residents().len() > room.capacity() as usize {
            return Err(format!("{} is over capacity", room.id()));
        }
    }

    for door in game.doors() {
        let (first, second) = door.endpoints();
        let both = [first, second]
            .iter()
            .all(|r| game.room(*r).map_or(false, |room| room.has_door(door.id())));
        if first == second || !both {
            return Err(format!("{} is not wired to two rooms", door.id()));
        }
    }
    Ok(())
}

// ── 1. Layout ───────────────────────────────────────────────────────────

fn validate_layout(layout: &WorldLayout, config: &GameConfig) -> Vec<TestResult> {
    println!("--- Layout ---");
    let mut results = Vec::new();

    let bundled = WorldLayout::from_json_str(DEMO_CAMPUS_JSON);
    results.push(TestResult::new(
        "bundled_matches_builtin",
        bundled.as_ref().map_or(false, |l| *l == demo_layout()),
        "data/demo_campus.json describes demo_layout()",
    ));

    let (game, skipped) = build(layout, config);
    results.push(TestResult::new(
        "layout_builds",
        skipped == 0,
        format!("{} skipped construction steps", skipped),
    ));
    results.push(TestResult::new(
        "layout_has_student",
        game.students().next().is_some(),
        format!("{} students", game.students().count()),
    ));
    let reachable = reachable_rooms(&game);
    results.push(TestResult::new(
        "layout_connected",
        reachable == game.room_count(),
        format!("{}/{} rooms reachable ignoring door direction", reachable, game.room_count()),
    ));
    let winners = game.items().filter(|i| i.is_winning_item()).count();
    results.push(TestResult::new(
        "layout_has_winning_item",
        winners > 0,
        format!("{} real winning items", winners),
    ));
    results.push(TestResult::new(
        "layout_invariants",
        check_invariants(&game).is_ok(),
        check_invariants(&game).err().unwrap_or_else(|| "ok".into()),
    ));
    results
}

fn reachable_rooms(game: &Game) -> usize {
    let Some(start) = game.rooms().next().map(|r| r.id()) else {
        return 0;
    };
    let mut seen = HashSet::from([start]);
    let mut stack = vec![start];
    while let Some(room) = stack.pop() {
        let Some(r) = game.room(room) else {
            continue;
        };
        for door in r.doors() {
            if let Some(next) = game.door(*door).and_then(|d| d.neighbour(room)) {
                if seen.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    seen.len()
}

// ── 2. Random play ──────────────────────────────────────────────────────

struct GameReport {
    status: GameStatus,
    laps: u32,
    commands: usize,
    violation: Option<String>,
    peek_pure: bool,
}

/// Play one game with a random student policy.
fn play(controller: &mut Controller, rng: &mut StdRng) -> GameReport {
    let mut commands = 0;
    let mut peek_pure = true;

    while !controller.is_finished() {
        let Some(student) = controller.active_student() else {
            break;
        };
        let (doors, loose, held) = {
            let game = controller.game();
            let Some(actor) = game.actor(student) else {
                break;
            };
            let Some(room) = game.room(actor.room()) else {
                break;
            };
            (
                room.doors().to_vec(),
                room.items().to_vec(),
                actor.inventory().to_vec(),
            )
        };

        match rng.gen_range(0..8) {
            0 | 1 => {
                if let Some(door) = doors.choose(rng) {
                    controller.move_through(*door);
                }
            }
            2 | 3 => {
                if let Some(item) = loose.choose(rng) {
                    controller.pick_up(*item);
                }
            }
            4 => {
                if let Some(item) = held.choose(rng) {
                    controller.activate(*item);
                }
            }
            5 => {
                let pair: Vec<_> = held.choose_multiple(rng, 2).copied().collect();
                if let [a, b] = pair[..] {
                    controller.link(a, b);
                }
            }
            6 => {
                if let Some(door) = doors.choose(rng) {
                    let before = controller.game().describe();
                    let _ = controller.peek(*door);
                    peek_pure &= controller.game().describe() == before;
                }
            }
            _ => {
                controller.end_turn();
            }
        }
        commands += 1;

        if let Err(violation) = check_invariants(controller.game()) {
            return GameReport {
                status: controller.game().status(),
                laps: controller.game().turn(),
                commands,
                violation: Some(violation),
                peek_pure,
            };
        }
    }

    GameReport {
        status: controller.game().status(),
        laps: controller.game().turn(),
        commands,
        violation: None,
        peek_pure,
    }
}

fn validate_random_play(
    cli: &Cli,
    layout: &WorldLayout,
    config: &GameConfig,
) -> Result<Vec<TestResult>> {
    println!("--- Random play ({} games) ---", cli.games);
    let mut results = Vec::new();
    let mut reports = Vec::new();

    for n in 0..cli.games {
        let seed = cli.seed.wrapping_add(n);
        let config = GameConfig {
            seed: Some(seed),
            ..config.clone()
        };
        let (game, _) = build(layout, &config);
        let mut controller = Controller::new(game);
        let mut rng = StdRng::seed_from_u64(seed);
        let report = play(&mut controller, &mut rng);
        log::debug!(
            "seed {}: {} after {} laps, {} commands",
            seed,
            report.status.as_str(),
            report.laps,
            report.commands
        );

        if n == 0 {
            if cli.verbose {
                println!("{}", controller.game().describe());
            }
            if let Some(path) = &cli.save {
                let file = File::create(path)
                    .with_context(|| format!("creating save file {}", path.display()))?;
                controller
                    .game()
                    .save(BufWriter::new(file))
                    .with_context(|| format!("writing save file {}", path.display()))?;
                println!("  saved first game to {}", path.display());
            }
        }
        reports.push(report);
    }

    let violations: Vec<_> = reports
        .iter()
        .filter_map(|r| r.violation.as_deref())
        .collect();
    results.push(TestResult::new(
        "invariants_hold",
        violations.is_empty(),
        violations
            .first()
            .map_or_else(|| "no violations".to_string(), |v| v.to_string()),
    ));

    let unfinished = reports
        .iter()
        .filter(|r| r.status == GameStatus::Ongoing)
        .count();
    results.push(TestResult::new(
        "games_terminate",
        unfinished == 0,
        format!("{} games still ongoing", unfinished),
    ));

    let overlong = reports
        .iter()
        .filter(|r| r.laps > config.max_turns + 1)
        .count();
    results.push(TestResult::new(
        "lap_limit_respected",
        overlong == 0,
        format!("{} games ran past lap {}", overlong, config.max_turns + 1),
    ));

    results.push(TestResult::new(
        "peek_is_pure",
        reports.iter().all(|r| r.peek_pure),
        "peek never changed the board",
    ));

    let won = reports.iter().filter(|r| r.status == GameStatus::Won).count();
    let lost = reports.iter().filter(|r| r.status == GameStatus::Lost).count();
    let commands: usize = reports.iter().map(|r| r.commands).sum();
    results.push(TestResult::new(
        "outcomes",
        won + lost == reports.len(),
        format!(
            "{} won, {} lost, {:.1} commands/game",
            won,
            lost,
            commands as f64 / reports.len().max(1) as f64
        ),
    ));
    Ok(results)
}

// ── 3. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(cli: &Cli, layout: &WorldLayout, config: &GameConfig) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let config = GameConfig {
        seed: Some(cli.seed),
        ..config.clone()
    };
    let (game, _) = build(layout, &config);
    let mut controller = Controller::new(game);
    for _ in 0..5 {
        if controller.is_finished() {
            break;
        }
        controller.end_turn();
    }
    let game = controller.into_game();

    let mut buffer = Vec::new();
    if let Err(e) = game.save(&mut buffer) {
        results.push(TestResult::new("save", false, e.to_string()));
        return results;
    }
    results.push(TestResult::new(
        "save",
        !buffer.is_empty(),
        format!("{} bytes", buffer.len()),
    ));

    match Game::load(&buffer[..], config.clone()) {
        Ok(loaded) => {
            results.push(TestResult::new(
                "roundtrip_identical",
                loaded.describe() == game.describe(),
                format!("lap {}, {} rooms", loaded.turn(), loaded.room_count()),
            ));

            let highest = game.rooms().map(|r| r.id()).max();
            let mut builder = WorldBuilder::from_game(loaded);
            let fresh = builder.add_room("harness_annex", 1, &[]);
            results.push(TestResult::new(
                "ids_fresh_after_load",
                fresh.as_ref().ok().copied() > highest,
                format!("{:?} after {:?}", fresh.ok(), highest),
            ));
        }
        Err(e) => results.push(TestResult::new("roundtrip_identical", false, e.to_string())),
    }

    buffer.truncate(buffer.len() / 3);
    let truncated = Game::load(&buffer[..], config.clone());
    results.push(TestResult::new(
        "truncated_save_rejected",
        truncated.is_err(),
        truncated.err().map_or_else(|| "loaded".to_string(), |e| e.to_string()),
    ));
    let fallback = persistence::load_or_fresh(&buffer[..], config);
    results.push(TestResult::new(
        "fallback_is_empty",
        fallback.room_count() == 0 && fallback.turn_order().is_empty(),
        "load_or_fresh substitutes an empty game",
    ));
    results
}
