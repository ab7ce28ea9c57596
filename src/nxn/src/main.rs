#![warn(clippy::pedantic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use itertools::Itertools;
use log::{LevelFilter, info};
use nxn_core::{
    Alg, Cube, Operator, SolveStep, Solver, SolverConfig,
    geometry::SliceName,
    scramble::{Rng, random_scramble},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Step {
    /// Stop once centers are uniform and edges paired
    Reduce,
    /// Stop once every piece is in its slot
    Permute,
    Full,
}

#[derive(Subcommand)]
enum Commands {
    /// Scramble a cube and solve it.
    Solve {
        /// Number of layers
        #[arg(long, short = 'n', default_value_t = 4)]
        size: usize,
        /// Seed of the random scramble
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Length of the random scramble
        #[arg(long, default_value_t = 60)]
        length: usize,
        /// Use this scramble instead of a random one, e.g. "Rw U2 r' F"
        #[arg(long, conflicts_with = "seed")]
        scramble: Option<String>,
        /// Solver configuration file, in TOML format
        #[arg(long, short = 'c', value_name = "CONFIG")]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Step::Full)]
        step: Step,
        /// Check invariants after every stage
        #[arg(long)]
        debug: bool,
    },
    /// Print a random scramble.
    Scramble {
        #[arg(long, short = 'n', default_value_t = 4)]
        size: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 60)]
        length: usize,
    },
    /// Print how a slice walks around the cube.
    Walk {
        /// M, E or S
        #[arg(long)]
        slice: SliceName,
        #[arg(long, short = 'n', default_value_t = 5)]
        size: usize,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match cli.command {
        Commands::Solve {
            size,
            seed,
            length,
            scramble,
            config,
            step,
            debug,
        } => {
            let config = match config {
                Some(path) => SolverConfig::load(&path)
                    .wrap_err_with(|| format!("Could not load {}", path.display()))?,
                None => SolverConfig::default(),
            };
            let scramble = match scramble {
                Some(text) => text.parse::<Alg>()?,
                None => random_scramble(size, length, &mut Rng::with_seed(seed)),
            };
            println!("Scramble: {scramble}");

            let mut cube = Cube::new(size)?;
            cube.apply_alg(&scramble)?;
            let mut op = Operator::new(cube);
            let step = match step {
                Step::Reduce => SolveStep::Reduce,
                Step::Permute => SolveStep::Permute3x3,
                Step::Full => SolveStep::Full,
            };
            let results = Solver::new(config).solve(&mut op, debug, None, step)?;
            info!("Final state:\n{}", op.cube());

            println!("Solution: {}", op.history().iter().join(" "));
            println!("Moves: {}", results.move_count);
            println!("Parity: {}", results.parity_summary());
            if matches!(step, SolveStep::Full) && !op.cube().is_solved() {
                return Err(eyre!("The cube is not solved"));
            }
        }
        Commands::Scramble { size, seed, length } => {
            println!("{}", random_scramble(size, length, &mut Rng::with_seed(seed)));
        }
        Commands::Walk { slice, size } => {
            let cube = Cube::new(size)?;
            let walking = cube.walking_info(slice)?;
            println!("{slice} on a {size}x{size} ({} inner slices)", walking.n_slices);
            for info in &walking.face_infos {
                println!(
                    "  {}: enters through {:?}, inverted: {}, reference {}",
                    info.face, info.edge, info.inverted, info.reference_point
                );
            }
            for (a, b) in walking
                .face_infos
                .iter()
                .map(|info| info.face)
                .tuple_combinations()
            {
                let transform = walking.get_transform(a, b)?;
                let turns = walking.quarter_turns_between(a, b)?;
                println!(
                    "  {a} -> {b}: {} clockwise rotations, {turns} slice quarter turns",
                    transform.n_rotations
                );
            }
        }
    }

    Ok(())
}
