use clap::Parser;
use mimetic_io::{read_history, RunArchive};
use mimetic_lib::report::HistoryReport;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarise a Mimetic run history", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "logs/live.jsonl")]
    live_log: PathBuf,

    /// Run archive to verify against --hash
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Expected SHA-256 of the archive
    #[arg(long, requires = "archive")]
    hash: Option<String>,

    #[arg(short, long, default_value = "report.md")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Analyzing Mimetic run history...");

    if let (Some(archive), Some(hash)) = (&args.archive, &args.hash) {
        let run = RunArchive::load_verified(archive, hash)?;
        println!(
            "Archive verified: {} events, behaviour {}, seed {}",
            run.events.len(),
            run.behaviour,
            run.seed
        );
    }

    let records = read_history(&args.live_log)?;
    let report = HistoryReport::from_records(&records);
    std::fs::write(&args.output, report.to_markdown())?;
    println!("Report generated: {}", args.output.display());

    Ok(())
}
