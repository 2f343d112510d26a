use anyhow::{Context, Result};
use bubble_grader::{GraderConfig, GradingReport, LayoutConfig, SheetDefinition, SheetGrader};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet_grader")]
#[command(about = "Grade photographed multiple-choice answer sheets against an answer key")]
#[command(version)]
struct Cli {
    /// Log debug detail (band formation, detection counts).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one answer sheet image.
    Grade(GradeArgs),

    /// Print the row and band geometry implied by a layout.
    Layout(SheetArgs),
}

#[derive(Debug, Clone, Args)]
struct SheetArgs {
    /// JSON sheet definition (layout, answer key, tuning). Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of questions on the sheet.
    #[arg(long)]
    questions: Option<usize>,

    /// Alternatives per question.
    #[arg(long)]
    alternatives: Option<usize>,

    /// Side-by-side column blocks of questions.
    #[arg(long)]
    column_blocks: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct GradeArgs {
    /// Path to the sheet image.
    #[arg(long)]
    image: PathBuf,

    #[command(flatten)]
    sheet: SheetArgs,

    /// Correct alternative per question, comma separated (e.g. 0,2,1,4).
    #[arg(long, value_delimiter = ',')]
    answer_key: Option<Vec<usize>>,

    /// Ink coverage, in percent, a bubble must exceed to count as marked.
    #[arg(long)]
    fill_threshold: Option<f64>,

    /// Write debug images (confirmation card, answer key, detection overlay) here.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Print the report as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    // --- 1. Argument Parsing & Logging ---
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Grade(args) => run_grade(&args),
        Commands::Layout(args) => run_layout(&args),
    }
}

fn load_definition(args: &SheetArgs) -> Result<Option<SheetDefinition>> {
    let Some(path) = &args.config else {
        return Ok(None);
    };
    let definition = SheetDefinition::from_json_file(path)
        .with_context(|| format!("reading sheet definition {}", path.display()))?;
    Ok(Some(definition))
}

fn resolve_layout(args: &SheetArgs, base: Option<LayoutConfig>) -> Result<LayoutConfig> {
    let questions = args
        .questions
        .or(base.map(|l| l.question_count()))
        .context("--questions is required without --config")?;
    let alternatives = args
        .alternatives
        .or(base.map(|l| l.alternatives_per_question()))
        .context("--alternatives is required without --config")?;
    let column_blocks = args
        .column_blocks
        .or(base.map(|l| l.column_blocks()))
        .context("--column-blocks is required without --config")?;
    Ok(LayoutConfig::new(questions, alternatives, column_blocks)?)
}

fn build_definition(args: &GradeArgs) -> Result<SheetDefinition> {
    let base = load_definition(&args.sheet)?;
    let layout = resolve_layout(&args.sheet, base.as_ref().map(|d| d.config.layout))?;

    let (mut config, base_key) = match base {
        Some(definition) => (definition.config, Some(definition.answer_key)),
        None => (GraderConfig::new(layout), None),
    };
    config.layout = layout;
    if let Some(threshold) = args.fill_threshold {
        config.fill_threshold_percent = threshold;
    }
    if let Some(dir) = &args.debug_dir {
        config.debug_dir = Some(dir.clone());
    }

    let answer_key = args
        .answer_key
        .clone()
        .or(base_key)
        .context("--answer-key is required without --config")?;

    Ok(SheetDefinition { config, answer_key })
}

// ── grade ──────────────────────────────────────────────────────────────

fn run_grade(args: &GradeArgs) -> Result<()> {
    // --- 2. Grader Initialization ---
    let definition = build_definition(args)?;
    let debug = definition.config.debug_dir.is_some();
    let grader = SheetGrader::from_definition(definition)?;

    // --- 3. Grading ---
    let report = grader
        .grade_file(&args.image, debug)
        .with_context(|| format!("failed to grade {}", args.image.display()))?;

    // --- 4. Output ---
    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), "wrote report");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &GradingReport) {
    for result in report.results.values() {
        let marked = match result.marked_alternative {
            Some(alternative) => alternative.to_string(),
            None => "-".to_string(),
        };
        let verdict = if result.is_correct() { "correct" } else { "wrong" };
        println!(
            "question {:>3}: marked {:>2}  key {:>2}  {}",
            result.question_index, marked, result.correct_alternative, verdict
        );
    }
    println!(
        "score: {}/{} ({} unanswered or ambiguous)",
        report.total_correct, report.question_count, report.unanswered
    );
}

// ── layout ─────────────────────────────────────────────────────────────

fn run_layout(args: &SheetArgs) -> Result<()> {
    let base = load_definition(args)?;
    let layout = resolve_layout(args, base.map(|d| d.config.layout))?;

    println!(
        "layout: {} questions x {} alternatives in {} column blocks",
        layout.question_count(),
        layout.alternatives_per_question(),
        layout.column_blocks()
    );
    println!("rows per column block: {}", layout.rows_per_column_block());
    println!("first band size:       {}", layout.first_band_size());
    println!("expected bubbles:      {}", layout.expected_detections());
    Ok(())
}
