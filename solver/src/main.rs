use std::fs;

use anyhow::{bail, Context};
use numberlink_ilp::audit::audit;
use numberlink_ilp::solver::SatSolver;
use numberlink_ilp::{render, Board, Sense, SolveOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PUZZLES: [(&str, &str); 6] = [
    ("small", "2 1 0
0 0 1
0 0 2
"),
    ("wide", "2 1 0 0
0 0 0 1
0 0 2 0
"),
    ("crossing", "0 0 0 3 0 0 0
0 0 0 0 0 0 0
0 0 0 0 0 0 0
1 0 2 0 1 0 2
0 0 0 0 0 0 0
0 0 0 0 0 0 0
0 0 0 3 0 0 0
"),
    ("tall", "1 0 0 0 0
2 0 0 0 0
0 0 3 0 0
0 0 0 0 0
0 0 1 0 0
0 0 0 0 2
0 0 0 0 3
"),
    ("classic", "1 0 2 0 4
0 0 3 0 5
0 0 0 0 0
0 2 0 4 0
0 1 3 5 0
"),
    ("large", "0 0 0 0 0 0 0 8 0 0
7 0 0 4 0 0 0 0 0 0
0 0 6 0 0 0 0 0 7 0
0 0 0 0 0 0 4 0 0 0
0 0 6 1 0 0 0 0 8 3
0 2 0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 3 0 0
0 0 0 0 2 0 0 5 0 0
0 5 0 0 0 0 1 0 0 0
0 0 0 0 0 0 0 0 0 0
"),
];

/// usage: solver [puzzle name or file] [min|max]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let which = args.next().unwrap_or_else(|| "classic".to_string());
    let sense = match args.next().as_deref() {
        None | Some("min") => Sense::Minimize,
        Some("max") => Sense::Maximize,
        Some(other) => bail!("unknown sense {:?}, expected min or max", other),
    };

    let text = match PUZZLES.iter().find(|(name, _)| *name == which) {
        Some((_, text)) => text.to_string(),
        None => fs::read_to_string(&which).with_context(|| format!("reading puzzle {}", which))?,
    };
    let board: Board = text.parse().with_context(|| format!("parsing puzzle {}", which))?;
    print!("{}", board);

    let model = board.model(&SolveOptions::with_sense(sense))?;
    fs::write("model.lp", model.to_lp()).context("writing model.lp")?;

    let Some(solved) = model.solve(&SatSolver::new())? else {
        println!("no solution");
        return Ok(());
    };

    for violation in audit(&board, &solved.board) {
        warn!(%violation, "solution does not check out");
    }

    let diagram = render(&solved.board);
    println!("{}", diagram);
    fs::write("ascii_board.md", &diagram).context("writing ascii_board.md")?;
    info!(status = ?solved.status, cells = solved.objective_value, "wrote ascii_board.md and model.lp");

    Ok(())
}
