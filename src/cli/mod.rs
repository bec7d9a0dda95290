//! Stress Analytics CLI Module
//!
//! Command-line interface for serving the API, inspecting the dataset,
//! training once and generating a synthetic dataset.

use clap::{Args, Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{display_name, load_csv, DataSource, Dataset, SourceConfig};
use crate::reporting::feature_importance;
use crate::synthetic::{label_proportions, Synthesizer};
use crate::training::{TrainEngine, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn bar(share: f64) -> String {
    "█".repeat((share * 30.0).round() as usize)
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stress-analytics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stress-level classifier backend with diagnostic charts")]
#[command(long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where to read the dataset from; shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// SQLite warehouse database file
    #[arg(long, global = true, env = "WAREHOUSE_PATH", default_value = "./warehouse.db")]
    pub warehouse: PathBuf,

    /// Table holding the dataset
    #[arg(long, global = true, env = "DATASET_TABLE", default_value = "stress_level_dataset")]
    pub table: String,

    /// CSV used when the warehouse cannot be read
    #[arg(long, global = true, env = "FALLBACK_CSV", default_value = "./ShapCompatibleDataset.csv")]
    pub fallback_csv: PathBuf,

    /// Label column
    #[arg(long, global = true, env = "LABEL_COLUMN", default_value = "stress_level")]
    pub label: String,
}

impl SourceArgs {
    pub fn to_config(&self) -> SourceConfig {
        SourceConfig {
            warehouse_path: self.warehouse.clone(),
            table: self.table.clone(),
            fallback_csv: self.fallback_csv.clone(),
            label_column: self.label.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API (default)
    Serve {
        /// Server port
        #[arg(short, long, env = "API_PORT", default_value = "5000")]
        port: u16,

        /// Server host
        #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
        host: String,
    },

    /// Show row count, features and label distribution
    Summary,

    /// Train once and print accuracy and feature importance
    Train {
        /// Number of trees in the forest
        #[arg(long, default_value = "300")]
        trees: usize,
    },

    /// Generate a synthetic dataset shaped like the source
    Synthesize {
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Read the source from this CSV instead of the configured data source
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of rows to generate
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Trees in the labelling forest
        #[arg(long, default_value = "100")]
        trees: usize,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn load(source: &SourceArgs) -> anyhow::Result<Dataset> {
    step_run("Loading data");
    let start = Instant::now();
    let data_source = DataSource::from_config(&source.to_config());
    let dataset = data_source.load_dataset();
    data_source.close();
    let dataset = dataset?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        dataset.n_rows(),
        dataset.n_columns(),
        start.elapsed()
    ));
    Ok(dataset)
}

pub fn cmd_summary(source: &SourceArgs) -> anyhow::Result<()> {
    section("Summary");
    let dataset = load(source)?;
    let summary = dataset.summary(&source.label)?;

    println!();
    println!("  {:<16} {}", muted("Rows"), summary.total_rows.to_string().white().bold());
    println!("  {:<16} {}", muted("Features"), summary.feature_count.to_string().white().bold());
    for name in &summary.features {
        println!("    {} {}", dim("·"), name);
    }

    section(&format!("{} distribution", display_name(&source.label)));
    let total = summary.total_rows.max(1) as f64;
    for (label, count) in &summary.label_distribution {
        let share = *count as f64 / total;
        println!(
            "  {:<6} {:>6} {:>7} {}",
            label.to_string().white(),
            count,
            muted(&format!("{:.1}%", share * 100.0)),
            accent(&bar(share))
        );
    }
    println!();
    Ok(())
}

pub fn cmd_train(source: &SourceArgs, trees: usize) -> anyhow::Result<()> {
    section("Train");
    let dataset = load(source)?;

    let engine = TrainEngine::new(TrainingConfig::default().with_n_estimators(trees));
    step_run(&format!(
        "Training {} trees of depth {}",
        engine.config().n_estimators,
        engine.config().max_depth
    ));
    let start = Instant::now();
    let outcome = engine.train(&dataset, &source.label)?;
    step_done(&format!("{:?}", start.elapsed()));

    let ranked = feature_importance(&outcome.model, &outcome.features)?;

    println!();
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", outcome.accuracy).white().bold());
    println!("  {:<16} {}", muted("Test rows"), outcome.test_features.nrows().to_string().white());

    section("Feature importance");
    let top = ranked.first().map(|fi| fi.importance).unwrap_or(1.0).max(f64::EPSILON);
    for fi in &ranked {
        println!(
            "  {:<32} {:.4} {}",
            display_name(&fi.feature),
            fi.importance,
            accent(&bar(fi.importance / top))
        );
    }
    println!();
    Ok(())
}

pub fn cmd_synthesize(
    source: &SourceArgs,
    input: Option<&Path>,
    output: &Path,
    samples: usize,
    seed: u64,
    trees: usize,
) -> anyhow::Result<()> {
    section("Synthesize");

    let dataset = match input {
        Some(path) => {
            step_run(&format!("Loading {}", path.display()));
            let dataset = Dataset::from_frame(load_csv(path)?)?;
            step_done(&format!("{} rows × {} cols", dataset.n_rows(), dataset.n_columns()));
            dataset
        }
        None => load(source)?,
    };

    step_run(&format!("Generating {} rows", samples));
    let start = Instant::now();
    let synthesis = Synthesizer::new()
        .with_n_samples(samples)
        .with_n_estimators(trees)
        .with_seed(seed)
        .generate(&dataset, &source.label)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output.display()));
    let mut frame = synthesis.frame.clone();
    let mut file = std::fs::File::create(output)?;
    CsvWriter::new(&mut file).finish(&mut frame)?;
    step_done(&format!("{} rows × {} cols", frame.height(), frame.width()));

    section("Feature importance");
    for fi in &synthesis.importances {
        println!("  {:<32} {:.4}", display_name(&fi.feature), fi.importance);
    }

    section("Label proportions");
    println!("  {:<8} {:>10} {:>10}", muted("label"), muted("source"), muted("synthetic"));
    let source_shares = label_proportions(&synthesis.source_labels);
    let synthetic_shares = label_proportions(&synthesis.synthetic_labels);
    let mut labels: Vec<i64> = source_shares
        .iter()
        .chain(&synthetic_shares)
        .map(|(label, _)| *label)
        .collect();
    labels.sort_unstable();
    labels.dedup();
    let share_of = |shares: &[(i64, f64)], label: i64| {
        shares
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0.0, |(_, s)| *s)
    };
    for label in labels {
        println!(
            "  {:<8} {:>10} {:>10}",
            label.to_string().white(),
            format!("{:.3}", share_of(source_shares.as_slice(), label)),
            format!("{:.3}", share_of(synthetic_shares.as_slice(), label)).white().bold()
        );
    }
    println!();
    Ok(())
}

pub async fn cmd_serve(source: &SourceArgs, host: &str, port: u16) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Stress Analytics".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Table  ", &source.table));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let config = ServerConfig {
        host: host.to_string(),
        port,
        ..Default::default()
    };
    run_server(config, source.to_config()).await
}
