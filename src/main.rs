use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod analyzer;
mod details;
mod extract;
mod lexicon;
mod models;
mod polarity;
mod report;
mod score;
mod store;

use analyzer::{SentenceWeighting, ThreadAnalyzer};
use models::{CourseAggregate, ThreadAnalysis};

#[derive(Parser)]
#[command(name = "birdwatch")]
#[command(about = "Bird course rankings from Reddit thread dumps", long_about = None)]
struct Cli {
    /// Optional JSON file overriding the built-in term tables.
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank courses across a thread dump
    Rank {
        input: PathBuf,
        #[arg(long, default_value = "baseline")]
        preset: String,
        #[arg(long, default_value = "uniform")]
        weighting: String,
        #[arg(long, default_value_t = 5)]
        top: usize,
        /// Write the full rankings as JSON
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the annotated threads as JSON
        #[arg(long)]
        threads_out: Option<PathBuf>,
    },
    /// Detailed report for a thread dump already filtered to one course
    Details {
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        input: PathBuf,
        #[arg(long, default_value = "baseline")]
        preset: String,
        #[arg(long, default_value = "uniform")]
        weighting: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export rankings as CSV
    Export {
        input: PathBuf,
        #[arg(long, default_value = "baseline")]
        preset: String,
        #[arg(long, default_value = "uniform")]
        weighting: String,
        #[arg(long, default_value = "rankings.csv")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let lexicon = store::load_lexicon(cli.lexicon.as_deref())?;

    match cli.command {
        Commands::Rank {
            input,
            preset,
            weighting,
            top,
            out,
            threads_out,
        } => {
            let threads = store::load_threads(&input)?;
            let (analyses, rankings) = run_rank(&threads, &lexicon, &preset, &weighting)?;

            if let Some(path) = threads_out {
                store::save_json(&path, &analyses)?;
                println!("Annotated threads written to {}.", path.display());
            }
            if let Some(path) = out {
                store::save_rankings(&path, &rankings)?;
                println!("Rankings written to {}.", path.display());
            }

            println!(
                "Processed {} threads and identified {} courses.",
                threads.len(),
                rankings.len()
            );
            if !rankings.is_empty() {
                println!("Top {} bird courses:", top.min(rankings.len()));
                for (i, course) in store::display_rankings(&rankings).iter().take(top).enumerate()
                {
                    println!(
                        "{}. {} - Bird Score: {:.2}/10 - Mentions: {}",
                        i + 1,
                        course.code,
                        course.bird_score,
                        course.mentions
                    );
                }
            }
        }
        Commands::Details { input, out } => {
            let threads = store::load_threads(&input)?;
            let analyzer = details::DetailAnalyzer::new(lexicon)?;
            let Some(course) = analyzer.analyze(&threads) else {
                println!("No course code found in thread titles; nothing to report.");
                return Ok(());
            };

            println!(
                "{}: bird score {:.2}/10 across {} threads ({} recent)",
                course.code, course.bird_score, course.specific_mentions, course.recent_mentions
            );
            if let Some(path) = out {
                store::save_json(&path, &course)
                    .with_context(|| format!("failed to save details for {}", course.code))?;
                println!("Course details written to {}.", path.display());
            }
        }
        Commands::Report {
            input,
            preset,
            weighting,
            out,
        } => {
            let threads = store::load_threads(&input)?;
            let (_, rankings) = run_rank(&threads, &lexicon, &preset, &weighting)?;
            let report = report::build_report(&preset, &rankings, &threads);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            input,
            preset,
            weighting,
            out,
        } => {
            let threads = store::load_threads(&input)?;
            let (_, rankings) = run_rank(&threads, &lexicon, &preset, &weighting)?;
            let written = store::export_csv(&out, &rankings)?;
            println!("Exported {written} courses to {}.", out.display());
        }
    }

    Ok(())
}

fn run_rank(
    threads: &[models::Thread],
    lexicon: &lexicon::Lexicon,
    preset: &str,
    weighting: &str,
) -> anyhow::Result<(Vec<ThreadAnalysis>, Vec<CourseAggregate>)> {
    let weighting = parse_weighting(weighting)?;
    let Some(strategy) = score::preset(preset) else {
        bail!("unknown scoring preset: {preset} (expected baseline or advanced)");
    };

    let analyzer = ThreadAnalyzer::new(lexicon.clone(), weighting)?;
    let analyses: Vec<ThreadAnalysis> = threads.iter().map(|t| analyzer.analyze(t)).collect();
    let rankings = aggregate::rank(&analyses, lexicon, strategy.as_ref());
    Ok((analyses, rankings))
}

fn parse_weighting(name: &str) -> anyhow::Result<SentenceWeighting> {
    match name {
        "uniform" => Ok(SentenceWeighting::Uniform),
        "emphasis" => Ok(SentenceWeighting::Emphasis),
        other => bail!("unknown sentence weighting: {other} (expected uniform or emphasis)"),
    }
}
