// Terminal front end for the note drills.
//
// Runs one trainer over stdin/stdout: the treble staff trainer (name the
// note drawn on an ASCII staff) or a fretboard trainer (locate the note on
// guitar or ukulele). Practice and timed modes are switched with one-letter
// commands; in timed mode a `CountdownHandle` ticks the shared session in
// the background. Results go to a progress store, a JSON file when
// `--progress` is given and in-memory otherwise.
//
// Usage:
//   drill [OPTIONS]
//     --trainer <NAME>     treble, guitar, or ukulele (default: treble)
//     --config <PATH>      JSON `DrillConfig` file
//     --seed <N>           Fixed seed (default: wall clock)
//     --duration <N>       Timed-mode length in ticks (default: 60)
//     --timed              Start in timed mode
//     --hard               Fretboard hard mode (answer on a required string)
//     --progress <PATH>    Persist statistics to a JSON file
//
// Commands at the prompt:
//   q quit, t start/restart timed, p practice, x reset timed, ? statistics,
//   h toggle hard mode and w/a/s/d move the cursor (fretboard only).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use notedrill_prng::DrillRng;
use notedrill_session::countdown::{CountdownHandle, SharedSession};
use notedrill_session::evaluate::{Evaluator, FretboardEvaluator, NoteNameEvaluator};
use notedrill_session::progress::{
    JsonProgressStore, MemoryProgressStore, ProgressStore, TrainerId,
};
use notedrill_session::trainer::{
    ChoiceCache, SelectionCheck, UsedPositions, check_selection, easy_pool, hard_pool,
    navigate_guarded, staff_pool, start_position,
};
use notedrill_session::{DrillConfig, DrillMode, DrillSession, DrillTarget};
use notedrill_theory::staff::{BOTTOM_LINE_STEP, StaffPlacement, TOP_LINE_STEP};
use notedrill_theory::{Accidental, PitchClass, Position, Tuning};

struct Options {
    trainer: TrainerId,
    config_path: Option<PathBuf>,
    seed: Option<u32>,
    duration: Option<u32>,
    timed: bool,
    hard: bool,
    progress_path: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let options = parse_args();

    let mut config = match &options.config_path {
        Some(path) => DrillConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Failed to load config {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => DrillConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = Some(seed);
    }
    if let Some(duration) = options.duration {
        config.timer_duration = duration;
    }

    let mut store: Box<dyn ProgressStore> = match &options.progress_path {
        Some(path) => match JsonProgressStore::open(path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("Failed to open progress file {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Box::new(MemoryProgressStore::default()),
    };

    info!(trainer = ?options.trainer, seed = ?config.seed, "starting drill");

    let result = match options.trainer.tuning() {
        None => run_staff(&config, &options, store.as_mut()),
        Some(mut tuning) => {
            tuning.max_fret = config.max_fret;
            run_fretboard(&config, &options, tuning, store.as_mut())
        }
    };
    if let Err(e) = result {
        error!(error = %e, "drill aborted");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Options {
    let mut options = Options {
        trainer: TrainerId::Treble,
        config_path: None,
        seed: None,
        duration: None,
        timed: false,
        hard: false,
        progress_path: None,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--trainer" => {
                i += 1;
                options.trainer = match args.get(i).map(String::as_str) {
                    Some("treble") => TrainerId::Treble,
                    Some("guitar") => TrainerId::Guitar,
                    Some("ukulele") => TrainerId::Ukulele,
                    _ => {
                        eprintln!("--trainer requires one of: treble, guitar, ukulele");
                        std::process::exit(1);
                    }
                };
            }
            "--config" => {
                i += 1;
                options.config_path = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                });
            }
            "--seed" => {
                i += 1;
                options.seed = args.get(i).and_then(|s| s.parse().ok()).or_else(|| {
                    eprintln!("--seed requires a valid number");
                    std::process::exit(1);
                });
            }
            "--duration" => {
                i += 1;
                options.duration = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|&d| d > 0)
                    .or_else(|| {
                        eprintln!("--duration requires a positive number");
                        std::process::exit(1);
                    });
            }
            "--progress" => {
                i += 1;
                options.progress_path = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--progress requires a path");
                    std::process::exit(1);
                });
            }
            "--timed" => options.timed = true,
            "--hard" => options.hard = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage() {
    println!("Usage: drill [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --trainer <NAME>     treble, guitar, or ukulele (default: treble)");
    println!("  --config <PATH>      JSON drill config file");
    println!("  --seed <N>           Fixed seed (default: wall clock)");
    println!("  --duration <N>       Timed-mode length in ticks (default: 60)");
    println!("  --timed              Start in timed mode");
    println!("  --hard               Fretboard hard mode");
    println!("  --progress <PATH>    Persist statistics to a JSON file");
    println!("  --help, -h           Show this help");
    println!();
    println!("Commands: q quit, t timed, p practice, x reset, ? stats, h hard mode");
}

fn lock<E: Evaluator>(session: &SharedSession<E>) -> MutexGuard<'_, DrillSession<E>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn prompt(text: &str) -> io::Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

enum Control {
    Handled,
    Quit,
    Answer,
}

/// Mode and bookkeeping commands shared by every trainer. The countdown
/// handle is only ever replaced or dropped with the session unlocked.
fn control<E>(
    input: &str,
    session: &SharedSession<E>,
    countdown: &mut Option<CountdownHandle>,
    config: &DrillConfig,
    trainer: TrainerId,
    store: &dyn ProgressStore,
) -> Control
where
    E: Evaluator + Send + 'static,
{
    match input {
        "q" | "quit" => Control::Quit,
        "t" | "timed" => {
            *countdown = Some(CountdownHandle::start_timed(session, config.tick_interval()));
            println!("Timed mode: {} ticks. Go!", config.timer_duration);
            Control::Handled
        }
        "p" | "practice" => {
            lock(session).set_mode(DrillMode::Practice);
            *countdown = None;
            println!("Practice mode.");
            Control::Handled
        }
        "x" | "reset" => {
            lock(session).reset_timed();
            *countdown = None;
            println!("Timer reset.");
            Control::Handled
        }
        "?" | "stats" => {
            match store.fetch(trainer) {
                Ok(p) => println!(
                    "Lifetime: {}/{} correct ({:.0}%), best streak {}",
                    p.total_correct,
                    p.total_attempts,
                    p.accuracy() * 100.0,
                    p.best_streak
                ),
                Err(e) => println!("Statistics unavailable: {e}"),
            }
            Control::Handled
        }
        _ => Control::Answer,
    }
}

fn status<E: Evaluator>(session: &DrillSession<E>) -> String {
    let score = session.score();
    match session.mode() {
        DrillMode::Practice => format!(
            "[practice] {}/{} streak {}",
            score.correct,
            score.attempts,
            session.streak()
        ),
        DrillMode::Timed if session.is_timer_active() => format!(
            "[timed {}] {}/{} streak {}",
            session.time_remaining(),
            score.correct,
            score.attempts,
            session.streak()
        ),
        DrillMode::Timed => format!(
            "[time's up] final score {}/{} (t to restart, x to reset)",
            score.correct, score.attempts
        ),
    }
}

fn glyph(accidental: Option<Accidental>) -> char {
    match accidental {
        Some(Accidental::Sharp) => '#',
        Some(Accidental::Flat) => 'b',
        _ => ' ',
    }
}

/// Draw one note on a five-line staff, top line first.
fn render_staff(placement: &StaffPlacement) -> String {
    let top = TOP_LINE_STEP.max(placement.step + 1);
    let bottom = BOTTOM_LINE_STEP.min(placement.step - 1);
    let mut out = String::new();
    for step in (bottom..=top).rev() {
        let here = step == placement.step;
        let on_staff = step % 2 == 0 && (BOTTOM_LINE_STEP..=TOP_LINE_STEP).contains(&step);
        let row = match (on_staff, placement.ledger_lines.contains(&step), here) {
            (true, _, true) => format!("{}------o------", glyph(placement.accidental)),
            (true, _, false) => " -------------".to_string(),
            (false, true, true) => format!("{}    --o--", glyph(placement.accidental)),
            (false, true, false) => "      ---".to_string(),
            (false, false, true) => format!("{}      o", glyph(placement.accidental)),
            (false, false, false) => String::new(),
        };
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn choice_rng(config: &DrillConfig) -> DrillRng {
    match config.seed {
        Some(seed) => DrillRng::new(seed.wrapping_add(1)),
        None => DrillRng::from_clock(),
    }
}

fn run_staff(
    config: &DrillConfig,
    options: &Options,
    store: &mut dyn ProgressStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let session: SharedSession<NoteNameEvaluator> = Arc::new(Mutex::new(DrillSession::new(
        staff_pool(),
        NoteNameEvaluator,
        config,
    )?));
    let mut countdown = options
        .timed
        .then(|| CountdownHandle::start_timed(&session, config.tick_interval()));
    let mut rng = choice_rng(config);
    let mut cache = ChoiceCache::default();

    println!("Treble staff drill. Answer with a number or a note name.");
    loop {
        let (text, choices) = {
            let s = lock(&session);
            let target = *s.current_target();
            let choices = cache.choices_for(&mut rng, &target).to_vec();
            let listed: Vec<String> = choices
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}) {c}", i + 1))
                .collect();
            let text = format!(
                "\n{}\n{}{}\n> ",
                status(&s),
                render_staff(&StaffPlacement::for_pitch(&target.pitch)),
                listed.join("  ")
            );
            (text, choices)
        };

        let Some(input) = prompt(&text)? else {
            break;
        };
        match control(&input, &session, &mut countdown, config, TrainerId::Treble, store) {
            Control::Quit => break,
            Control::Handled => continue,
            Control::Answer => {}
        }

        let answer = match input.parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => choices[n - 1],
            Ok(_) => {
                println!("Pick 1-{}.", choices.len());
                continue;
            }
            Err(_) => match input.parse::<PitchClass>() {
                Ok(class) => class,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            },
        };

        let mut s = lock(&session);
        let result = s.submit_and_record(&answer, store, TrainerId::Treble);
        if result.correct {
            println!("Correct! {} (streak {})", result.canonical, result.streak);
        } else {
            println!("No, that was {}.", result.canonical);
        }
        s.next_target()?;
    }

    drop(countdown);
    print_final(&lock(&session));
    Ok(())
}

fn parse_position(input: &str) -> Option<Position> {
    let mut parts = input
        .split(|c: char| c == '/' || c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let string = parts.next()?.parse().ok()?;
    let fret = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some(Position::new(string, fret))
}

fn pool_for(tuning: &Tuning, hard: bool) -> Vec<DrillTarget> {
    if hard { hard_pool(tuning) } else { easy_pool(tuning) }
}

fn run_fretboard(
    config: &DrillConfig,
    options: &Options,
    tuning: Tuning,
    store: &mut dyn ProgressStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let trainer = options.trainer;
    let mut hard = options.hard;
    let session: SharedSession<FretboardEvaluator> = Arc::new(Mutex::new(DrillSession::new(
        pool_for(&tuning, hard),
        FretboardEvaluator::new(tuning.clone()),
        config,
    )?));
    let mut countdown = options
        .timed
        .then(|| CountdownHandle::start_timed(&session, config.tick_interval()));
    let mut used = UsedPositions::default();
    let mut cursor = start_position(&tuning, lock(&session).current_target());

    println!(
        "{} fretboard drill. Answer with \"string fret\" (string 1 = {}), or move the \
         cursor with w/a/s/d and press enter.",
        tuning.name,
        tuning.label(1)?
    );
    loop {
        let (text, target) = {
            let s = lock(&session);
            let target = *s.current_target();
            let ask = match target.required_position {
                Some(required) => format!(
                    "Find {} on the {} string",
                    target.pitch,
                    tuning.label(required.string)?
                ),
                None => format!("Find {}", target.pitch.class),
            };
            let disabled = used.disabled(target.pitch.class);
            let blocked = if hard || disabled.is_empty() {
                String::new()
            } else {
                let listed: Vec<String> = disabled.iter().map(Position::to_string).collect();
                format!(" (already used: {})", listed.join(", "))
            };
            let text = format!(
                "\n{}\n{ask}{blocked}\ncursor {cursor} = {}\n> ",
                status(&s),
                tuning.pitch_at(cursor)?
            );
            (text, target)
        };

        let Some(input) = prompt(&text)? else {
            break;
        };
        match control(&input, &session, &mut countdown, config, trainer, store) {
            Control::Quit => break,
            Control::Handled => continue,
            Control::Answer => {}
        }

        let step = match input.as_str() {
            "w" => Some((-1, 0)),
            "s" => Some((1, 0)),
            "a" => Some((0, -1)),
            "d" => Some((0, 1)),
            _ => None,
        };
        if let Some((string_delta, fret_delta)) = step {
            match navigate_guarded(&tuning, cursor, string_delta, fret_delta, &target, hard, &used) {
                Ok(moved) => cursor = moved,
                Err(blocked) => {
                    let attempted = tuning.navigate(cursor, string_delta, fret_delta);
                    explain(&blocked, attempted, &target);
                }
            }
            continue;
        }

        let position = match input.as_str() {
            "h" => {
                hard = !hard;
                used.clear();
                let next = *lock(&session).replace_pool(pool_for(&tuning, hard))?;
                cursor = start_position(&tuning, &next);
                println!("Hard mode {}.", if hard { "on" } else { "off" });
                continue;
            }
            "" => cursor,
            other => match parse_position(other) {
                Some(position) => position,
                None => {
                    println!("Expected \"string fret\", e.g. \"6 3\".");
                    continue;
                }
            },
        };
        if tuning.pitch_at(position).is_err() || position.fret > tuning.max_fret {
            println!("{position} is off the board.");
            continue;
        }

        let check = check_selection(&tuning, &target, position, hard, &used);
        if check != SelectionCheck::Allowed {
            explain(&check, position, &target);
            continue;
        }

        let mut s = lock(&session);
        let result = s.submit_and_record(&position, store, trainer);
        if result.correct {
            if !hard {
                used.record(target.pitch.class, position);
            }
            println!("Correct! {} (streak {})", result.canonical, result.streak);
        } else {
            let valid: Vec<String> = result.detail.iter().map(Position::to_string).collect();
            println!(
                "No, {position} is {}. {} is at {}.",
                tuning.pitch_at(position)?,
                result.canonical.class,
                valid.join(", ")
            );
        }
        let next = *s.next_target()?;
        cursor = start_position(&tuning, &next);
    }

    drop(countdown);
    print_final(&lock(&session));
    Ok(())
}

fn explain(check: &SelectionCheck, position: Position, target: &DrillTarget) {
    match check {
        SelectionCheck::Allowed => {}
        SelectionCheck::WrongString { label, .. } => {
            println!("Hard mode: the target is on the {label} string.");
        }
        SelectionCheck::AlreadyUsed => {
            println!("{position} was already used for {}; try another spot.", target.pitch.class);
        }
    }
}

fn print_final<E: Evaluator>(session: &DrillSession<E>) {
    let score = session.score();
    println!(
        "\nSession over: {}/{} correct, streak {}.",
        score.correct,
        score.attempts,
        session.streak()
    );
}
