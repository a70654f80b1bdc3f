use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snake_evolution::draw;
use snake_evolution::evolution::GenePool;
use snake_evolution::snake::Turn;
use snake_evolution::{AppConfig, Event, TrainingSession};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

// How long the real-time loops sleep between polls.
const IDLE: Duration = Duration::from_millis(1);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the seed from the config file
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Train headless on a simulated clock
    Train {
        /// Generations to run
        #[arg(short, long, default_value_t = 100)]
        generations: u64,

        /// Append one JSON line per generation to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Save the gene pool here after every generation
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Start from a saved gene pool
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Train in real time, printing the board after every move
    Watch,
    /// Steer the snake yourself: a/d turn, p pause, r reset, q quit
    Play,
}

enum Command {
    Pause,
    Reset,
    Quit,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snake_evolution=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)?;
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    config.seed = Some(seed);
    tracing::info!(seed, grid = config.grid.length, size = config.population.size, "Starting");

    match args.mode {
        Mode::Train {
            generations,
            report,
            checkpoint,
            resume,
        } => train(config, generations, report, checkpoint, resume),
        Mode::Watch => watch(config),
        Mode::Play => play(config),
    }
}

fn gene_pool(config: &AppConfig, resume: Option<&Path>) -> GenePool {
    // The pool draws from its own stream so the board layout does not shift
    // with the network shape.
    let seed = config.seed.unwrap_or_default().wrapping_add(1);
    match resume {
        Some(path) => GenePool::resume_or_new(path, config.evolution.clone(), seed),
        None => GenePool::new(config.evolution.clone(), seed),
    }
}

fn train(
    mut config: AppConfig,
    generations: u64,
    report: Option<PathBuf>,
    checkpoint: Option<PathBuf>,
    resume: Option<PathBuf>,
) -> Result<()> {
    config.human_player = false;
    let pool = gene_pool(&config, resume.as_deref());

    let mut report = match report {
        Some(path) => Some(BufWriter::new(
            File::options()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening report {}", path.display()))?,
        )),
        None => None,
    };

    let mut now = Instant::now();
    let mut session = TrainingSession::new(&config, pool, now)?;
    let step = session.scheduler().move_delay();
    let mut done = 0;

    while done < generations {
        now += step;
        for event in session.poll(now)? {
            let Event::Rollover(summary) = event else {
                continue;
            };
            println!(
                "Generation {:>4}: best {:>5}  mean {:>8.2}  worst {:>4}  food {:>3}",
                summary.generation, summary.best, summary.mean, summary.worst, summary.best_food
            );
            if let Some(out) = report.as_mut() {
                writeln!(out, "{}", serde_json::to_string(&summary)?)?;
                out.flush()?;
            }
            if let Some(path) = checkpoint.as_deref() {
                session
                    .evaluator()
                    .save(path)
                    .with_context(|| format!("saving checkpoint {}", path.display()))?;
            }
            done += 1;
        }
    }

    if let Some(best) = session.evaluator().best() {
        println!("Best fitness: {}", best.fitness().unwrap_or(0));
    }
    Ok(())
}

fn print_frame<E: snake_evolution::brain::Evaluator>(session: &TrainingSession<E>) {
    // Clear screen, cursor home.
    print!("\x1b[2J\x1b[H");
    for line in draw::render(&session.snapshot()) {
        println!("{line}");
    }
}

fn show(events: &[Event]) {
    for event in events {
        match event {
            Event::Retired {
                individual,
                cause,
                fitness,
                ..
            } => println!("#{individual} {cause:?}  Fitness: {fitness}"),
            Event::Rollover(summary) => println!(
                "Generation {} done: best {}  mean {:.2}",
                summary.generation, summary.best, summary.mean
            ),
            Event::Moved { .. } => {}
        }
    }
}

fn watch(mut config: AppConfig) -> Result<()> {
    config.human_player = false;
    let pool = gene_pool(&config, None);
    let mut session = TrainingSession::new(&config, pool, Instant::now())?;
    loop {
        let events = session.poll(Instant::now())?;
        if !events.is_empty() {
            print_frame(&session);
            show(&events);
        }
        thread::sleep(IDLE);
    }
}

fn play(mut config: AppConfig) -> Result<()> {
    config.human_player = true;
    let pool = gene_pool(&config, None);
    let mut session = TrainingSession::new(&config, pool, Instant::now())?;
    let input = session.input_handle();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for key in line.chars() {
                let command = match key.to_ascii_lowercase() {
                    'a' => {
                        input.request_turn(Turn::Left);
                        continue;
                    }
                    'd' => {
                        input.request_turn(Turn::Right);
                        continue;
                    }
                    'p' => Command::Pause,
                    'r' => Command::Reset,
                    'q' => Command::Quit,
                    _ => continue,
                };
                let quit = matches!(command, Command::Quit);
                if tx.send(command).is_err() || quit {
                    return;
                }
            }
        }
        let _ = tx.send(Command::Quit);
    });

    print_frame(&session);
    loop {
        let now = Instant::now();
        let mut events = Vec::new();
        while let Ok(command) = rx.try_recv() {
            match command {
                Command::Pause => {
                    session.toggle_pause(now);
                    print_frame(&session);
                }
                Command::Reset => events.extend(session.reset(now)?),
                Command::Quit => return Ok(()),
            }
        }
        events.extend(session.poll(now)?);
        if !events.is_empty() {
            print_frame(&session);
            show(&events);
        }
        thread::sleep(IDLE);
    }
}
