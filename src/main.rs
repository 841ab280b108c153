use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use pawnstorm::config::EngineConfig;
use pawnstorm::eval::PstEval;
use pawnstorm::mcts::Mcts;
use pawnstorm::search::alphabeta::AlphaBeta;
use pawnstorm::search::{format_line, SearchBudget, SearchLimits};
use pawnstorm::{CozyPosition, Position, SearchEngine, SearchResult};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineKind {
    Alphabeta,
    Mcts,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Search a chess position with alpha-beta or MCTS", long_about = None)]
struct Args {
    /// Starting FEN position (default: standard start)
    #[arg(long)]
    fen: Option<String>,

    /// Setup moves in UCI notation played from the starting position
    #[arg(long, num_args = 1..)]
    moves: Vec<String>,

    #[arg(long, value_enum, default_value = "alphabeta")]
    engine: EngineKind,

    #[arg(long)]
    depth: Option<u32>,

    /// Node (alpha-beta) or simulation-step (MCTS) ceiling
    #[arg(long)]
    nodes: Option<u64>,

    /// Fixed time per move in milliseconds
    #[arg(long)]
    movetime: Option<u64>,

    #[arg(long)]
    wtime: Option<u64>,
    #[arg(long)]
    btime: Option<u64>,
    #[arg(long)]
    winc: Option<u64>,
    #[arg(long)]
    binc: Option<u64>,

    /// Search until "stop" is read from stdin (or another limit trips)
    #[arg(long)]
    infinite: bool,

    /// MCTS worker threads (overrides the config file)
    #[arg(long)]
    threads: Option<usize>,

    /// MCTS seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Restrict the root to these moves
    #[arg(long, num_args = 1..)]
    searchmoves: Vec<String>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show a live node counter
    #[arg(long)]
    progress: bool,
}

fn ms(v: Option<u64>) -> Option<Duration> { v.map(Duration::from_millis) }

fn limits_from(args: &Args) -> SearchLimits {
    SearchLimits {
        depth: args.depth,
        nodes: args.nodes,
        white_time: ms(args.wtime),
        black_time: ms(args.btime),
        white_increment: ms(args.winc),
        black_increment: ms(args.binc),
        move_time: ms(args.movetime),
        infinite: args.infinite,
        search_moves: args.searchmoves.clone(),
    }
}

fn run_with_progress<F>(budget: &SearchBudget, show: bool, search: F) -> SearchResult<cozy_chess::Move>
where
    F: FnOnce() -> SearchResult<cozy_chess::Move>,
{
    if !show { return search(); }
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        let done = &done;
        s.spawn(move || {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            while !done.load(Ordering::Relaxed) {
                pb.set_message(format!("{} nodes", budget.nodes()));
                std::thread::sleep(Duration::from_millis(100));
            }
            pb.finish_and_clear();
        });
        let res = search();
        done.store(true, Ordering::Relaxed);
        res
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => EngineConfig::from_path(path).with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(t) = args.threads { cfg.mcts.threads = t; }
    if let Some(s) = args.seed { cfg.mcts.seed = s; }
    cfg.validate().context("invalid engine settings")?;

    let mut pos = CozyPosition::with_moves(args.fen.as_deref(), &args.moves).context("setting up position")?;
    let limits = limits_from(&args);
    let budget = SearchBudget::new(&limits, pos.side_to_move());
    info!("searching {:?} with {:?}", args.engine, limits);

    if args.infinite {
        let handle = budget.stop_handle();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(l) if l.trim() == "stop" => { handle.stop(); break; }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        });
    }

    let res = match args.engine {
        EngineKind::Alphabeta => {
            let mut engine: AlphaBeta<CozyPosition, PstEval> = AlphaBeta::with_params(PstEval, cfg.alphabeta);
            run_with_progress(&budget, args.progress, || engine.search(&mut pos, &budget))
        }
        EngineKind::Mcts => {
            let mut engine = Mcts::with_params(PstEval, cfg.mcts).context("starting MCTS workers")?;
            run_with_progress(&budget, args.progress, || engine.search(&mut pos, &budget))
        }
    };

    println!(
        "info depth {} score {} nodes {} time {} pv {}",
        res.depth,
        res.score,
        res.nodes,
        res.elapsed.as_millis(),
        format_line(&res.pv)
    );
    match res.best_move {
        Some(m) => println!("bestmove {}", m),
        None => println!("bestmove (none)"),
    }
    Ok(())
}
