use std::{fs, path::PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::eyre;
use kilominx_core::moves::format_sequence;
use kilominx_core::topology::{FACELET_COUNT, FACELETS_PER_FACE, facelet};
use kilominx_core::{ColorLabel, Face, KilominxState, validate};
use log::LevelFilter;
use narrator::{ScriptItem, render};
use owo_colors::OwoColorize;
use solver::{Solution, SolverConfig, Stage, solve};

/// Solves the Master Kilominx from a sticker color listing
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The level of log detail to send to stderr. Can be set zero to two times.
    #[arg(short, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a sticker listing and print the move sequence that solves it
    Solve {
        /// The sticker listing; twelve `FACE: label ...` lines of twenty labels each
        file: PathBuf,
        /// Also write the instructions to this file, one per line
        #[arg(short, long)]
        export: Option<PathBuf>,
        #[command(flatten)]
        budget: BudgetArgs,
    },
    /// Solve the state a scramble leaves behind on a solved puzzle
    Scramble {
        /// The scramble in move notation, e.g. "F U2 Rs'"
        algorithm: String,
        /// Also write the instructions to this file, one per line
        #[arg(short, long)]
        export: Option<PathBuf>,
        #[command(flatten)]
        budget: BudgetArgs,
    },
    /// Validate a sticker listing without solving it
    Check {
        /// The sticker listing to check
        file: PathBuf,
    },
}

#[derive(Args)]
struct BudgetArgs {
    /// Wall-clock cap per solver stage, in milliseconds
    #[arg(long)]
    max_stage_time_ms: Option<u64>,
    /// Depth cap for the solver's bounded searches
    #[arg(long)]
    max_search_depth: Option<usize>,
    /// Search-node cap per solver stage
    #[arg(long)]
    max_search_nodes: Option<u64>,
}

impl BudgetArgs {
    fn config(&self) -> SolverConfig {
        let defaults = SolverConfig::default();
        SolverConfig {
            max_stage_time_ms: self.max_stage_time_ms.unwrap_or(defaults.max_stage_time_ms),
            max_search_depth: self.max_search_depth.unwrap_or(defaults.max_search_depth),
            max_search_nodes: self.max_search_nodes.unwrap_or(defaults.max_search_nodes),
            cancel: defaults.cancel,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .init();

    match cli.command {
        Commands::Solve {
            file,
            export,
            budget,
        } => {
            let text = fs::read_to_string(&file)?;
            let state = validate(&parse_listing(&text)?)?;
            report(&state, &budget.config(), export.as_deref())?;
        }
        Commands::Scramble {
            algorithm,
            export,
            budget,
        } => {
            let moves: Vec<_> = narrator::parse_script(&algorithm)?
                .into_iter()
                .filter_map(|item| match item {
                    ScriptItem::Move(mv) => Some(mv),
                    ScriptItem::Comment(_) => None,
                })
                .collect();
            let state = KilominxState::solved().after(&moves);
            report(&state, &budget.config(), export.as_deref())?;
        }
        Commands::Check { file } => {
            let text = fs::read_to_string(&file)?;
            validate(&parse_listing(&text)?)?;
            println!("{}", "The listing is a reachable puzzle state.".green());
        }
    }

    Ok(())
}

fn report(
    state: &KilominxState,
    config: &SolverConfig,
    export: Option<&std::path::Path>,
) -> color_eyre::Result<()> {
    let solution = solve(state, config)?;
    if solution.is_empty() {
        println!("{}", "The puzzle is already solved.".green());
        return Ok(());
    }
    println!(
        "{} {}",
        "Solved in".green(),
        format!("{} moves", solution.len()).bold()
    );
    println!("{}", format_sequence(solution.moves()));
    let script = script_items(&solution);
    println!();
    print!("{}", render(&script));
    if let Some(path) = export {
        fs::write(path, render(&script))?;
        println!();
        println!("Instructions written to {}", path.display().bold());
    }
    Ok(())
}

/// The solution as a script: a banner comment per contributing stage,
/// then that stage's moves.
fn script_items(solution: &Solution) -> Vec<ScriptItem> {
    let mut items = Vec::with_capacity(solution.len() + 3);
    for stage in [Stage::Centers, Stage::EdgePairing, Stage::Reduction] {
        let moves = solution.stage_moves(stage);
        if moves.is_empty() {
            continue;
        }
        items.push(ScriptItem::Comment(stage.to_string()));
        items.extend(moves.iter().map(|&mv| ScriptItem::Move(mv)));
    }
    items
}

/// Parse a sticker listing: twelve lines of `FACE: label ...`, twenty
/// labels per face in ring order, `#` comments and blank lines skipped.
fn parse_listing(text: &str) -> color_eyre::Result<[ColorLabel; FACELET_COUNT]> {
    let mut out = [ColorLabel::White; FACELET_COUNT];
    let mut seen = [false; 12];
    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, rest)) = line.split_once(':') else {
            return Err(eyre!("line {number}: expected `FACE: label ...`"));
        };
        let Some(face) = Face::parse(name.trim()) else {
            return Err(eyre!("line {number}: no face is called {:?}", name.trim()));
        };
        if seen[face.index()] {
            return Err(eyre!("line {number}: face {face} is listed twice"));
        }
        seen[face.index()] = true;
        let labels = rest
            .split_whitespace()
            .map(|word| {
                ColorLabel::parse(word)
                    .ok_or_else(|| eyre!("line {number}: no color is called {word:?}"))
            })
            .collect::<color_eyre::Result<Vec<_>>>()?;
        if labels.len() != FACELETS_PER_FACE {
            return Err(eyre!(
                "line {number}: face {face} needs {FACELETS_PER_FACE} labels, found {}",
                labels.len()
            ));
        }
        for (local, &color) in labels.iter().enumerate() {
            out[facelet(face, local)] = color;
        }
    }
    if let Some(missing) = Face::ALL.into_iter().find(|f| !seen[f.index()]) {
        return Err(eyre!("the listing never mentions face {missing}"));
    }
    Ok(out)
}
