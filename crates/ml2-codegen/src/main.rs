//! CLI entry point for the ML2 code generator.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use ml2_codegen::render::Dialect;
use ml2_codegen::{
    DataAnalyticsSpec, GenerationOutcome, GenerationReport, Generator, GeneratorConfig, Severity,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Exit status when fatal diagnostics stopped generation.
const EXIT_FATAL_DIAGNOSTICS: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    author = "ML2 Team",
    version,
    about = "Generate scikit-learn/Keras pipeline scripts and Java glue from an ML2 data-analytics spec",
    long_about = "Turns a data-analytics spec (JSON) into preprocess, train and predict scripts \
                  plus the Java fragments that run them.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  ML2_OUTPUT_ROOT    Default for --output\n  \
                  ML2_PYTHON         Default for --python\n\n\
                  EXAMPLES:\n  \
                  # Generate scripts under ./output/python-scripts\n  \
                  ml2-codegen --spec region.json\n\n  \
                  # Preview the resolved plan and diagnostics\n  \
                  ml2-codegen --spec region.json --dry-run\n\n  \
                  # Also write the Java glue and a JSON report\n  \
                  ml2-codegen --spec region.json --glue Region.java.txt -r"
)]
struct Args {
    /// Path to the data-analytics spec (JSON)
    #[arg(short, long)]
    spec: String,

    /// Generation root; scripts land in <output>/python-scripts
    #[arg(short, long)]
    output: Option<String>,

    /// Resolve and render without writing anything
    ///
    /// Shows the resolved plan, diagnostics, scripts and artifacts
    #[arg(long)]
    dry_run: bool,

    /// Output the JSON generation report to stdout instead of a summary
    ///
    /// Disables all logs so stdout holds only the report.
    #[arg(long)]
    json: bool,

    /// Write generation_report.json next to the scripts
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Write the Java glue fragments to this file
    #[arg(long)]
    glue: Option<String>,

    /// Root path the Java host uses to reach the scripts, if different
    #[arg(long)]
    host_root: Option<String>,

    /// Interpreter named in the scripts' shebang
    #[arg(long)]
    python: Option<String>,

    /// Held-out fraction for the train/test split (0.0 - 1.0)
    #[arg(long, default_value = "0.25")]
    test_size: f64,

    /// Seed for the train/test split
    #[arg(long)]
    random_state: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let spec_path = Path::new(&args.spec);
    if !spec_path.exists() {
        return Err(anyhow!("Spec file not found: {}", args.spec));
    }
    let mut spec = load_spec(spec_path)?;
    info!("Loaded spec '{}' from {}", spec.name, args.spec);

    let config = build_config(&args)?;
    let generator = build_generator(&args, config)?;

    if args.dry_run {
        let outcome = generator.dry_run(&spec)?;
        if args.json {
            println!("{}", outcome.report().to_json()?);
        } else {
            print_dry_run(&outcome, &args, generator.config());
        }
        return finish(&outcome);
    }

    let outcome = generator.generate(&mut spec)?;
    if outcome.is_abandoned() {
        if args.json {
            println!("{}", outcome.report().to_json()?);
        } else {
            print_diagnostics(&outcome);
        }
        return finish(&outcome);
    }

    if outcome.automl_upgraded {
        fs::write(spec_path, serde_json::to_string_pretty(&spec)?)
            .with_context(|| format!("Failed to persist AutoML upgrade to {}", args.spec))?;
        info!("Persisted AutoML upgrade to {}", args.spec);
    }

    if let Some(ref glue_path) = args.glue {
        write_glue(&outcome, Path::new(glue_path))?;
        info!("Host glue written to: {}", glue_path);
    }

    let report = outcome.report();
    if args.emit_report {
        let report_path = report.write_to(generator.config().layout().root())?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_human_readable_summary(&report, &outcome, &args);
    Ok(())
}

/// Read and deserialize the spec document.
fn load_spec(path: &Path) -> Result<DataAnalyticsSpec> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid spec document {}", path.display()))
}

/// Merge CLI flags with `ML2_*` environment defaults.
fn build_config(args: &Args) -> Result<GeneratorConfig> {
    let output_root = args
        .output
        .clone()
        .or_else(|| env::var("ML2_OUTPUT_ROOT").ok())
        .unwrap_or_else(|| "./output".to_string());

    let mut builder = GeneratorConfig::builder()
        .output_root(PathBuf::from(output_root))
        .test_size(args.test_size);

    if let Some(python) = args.python.clone().or_else(|| env::var("ML2_PYTHON").ok()) {
        builder = builder.python_interpreter(python);
    }
    if let Some(seed) = args.random_state {
        builder = builder.random_state(seed);
    }
    if let Some(ref root) = args.host_root {
        builder = builder.host_root(root);
    }

    Ok(builder.build()?)
}

fn build_generator(args: &Args, config: GeneratorConfig) -> Result<Generator> {
    let mut builder = Generator::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.step.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Concatenate the glue fragments into `path`.
fn write_glue(outcome: &GenerationOutcome, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, outcome.glue_source())
        .with_context(|| format!("Failed to write glue to {}", path.display()))
}

/// Exit with [`EXIT_FATAL_DIAGNOSTICS`] when generation was abandoned.
fn finish(outcome: &GenerationOutcome) -> Result<()> {
    if outcome.is_abandoned() {
        error!(
            "Generation of '{}' abandoned: {} fatal diagnostic(s)",
            outcome.spec_name,
            outcome.diagnostics.count(Severity::Fatal)
        );
        std::process::exit(EXIT_FATAL_DIAGNOSTICS);
    }
    Ok(())
}

fn print_diagnostics(outcome: &GenerationOutcome) {
    if outcome.diagnostics.is_empty() {
        println!("  No diagnostics");
        return;
    }
    for diagnostic in outcome.diagnostics.iter() {
        let marker = match diagnostic.severity {
            Severity::Info => "i",
            Severity::Warning => "!",
            Severity::Fatal => "x",
        };
        println!("  {} {}", marker, diagnostic);
    }
}

/// Run dry-run mode output.
///
/// Uses `println!` on purpose: this is the primary output of `--dry-run`
/// and must show regardless of the log level.
fn print_dry_run(outcome: &GenerationOutcome, args: &Args, config: &GeneratorConfig) {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of generated pipeline");
    println!("{}\n", "=".repeat(80));

    println!("SPEC");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.spec);
    println!("  Name: {}", outcome.spec_name);
    if outcome.automl_upgraded {
        println!("  AutoML: upgrade would be applied and persisted");
    }
    println!();

    println!("DIAGNOSTICS");
    println!("{}", "-".repeat(40));
    print_diagnostics(outcome);
    println!();

    let Some(plan) = &outcome.plan else {
        println!("{}", "=".repeat(80));
        println!("Generation would be abandoned; fix the fatal diagnostics above");
        println!("{}", "=".repeat(80));
        return;
    };

    println!("RESOLVED PLAN");
    println!("{}", "-".repeat(40));
    println!("  Algorithm: {} ({})", plan.algorithm, plan.abbrev);
    println!("  Backend:   {}", plan.backend);
    println!("  Task:      {}", plan.task);
    if let Some(scaler) = plan.scaler {
        println!("  Scaler:    {}", scaler.class_name());
    } else if let Some(normalizer) = plan.normalizer {
        println!("  Normalizer: {}", normalizer.norm());
    }
    println!();

    println!("HYPERPARAMETERS");
    println!("{}", "-".repeat(40));
    let params = plan.model.params();
    if params.is_empty() {
        println!("  (library defaults)");
    }
    for (name, value) in params.rendered_pairs(Dialect::Python) {
        println!("  {:<24} {}", name, value);
    }
    println!();

    let layout = config.layout();
    println!("SCRIPTS (would be written)");
    println!("{}", "-".repeat(40));
    for script in &outcome.scripts {
        println!(
            "  - {} ({} lines)",
            layout.root().join(&script.file_name).display(),
            script.source.lines().count()
        );
    }
    println!();

    println!("ARTIFACTS (produced at run time)");
    println!("{}", "-".repeat(40));
    for name in plan.artifacts.file_names() {
        println!("  - {}", layout.pickle(name).display());
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To generate, run without --dry-run");
    if args.glue.is_none() {
        println!("Add --glue <file> to save the Java host glue");
    }
    println!("{}", "=".repeat(80));
}

/// Print a human-readable summary of the generation run.
fn print_human_readable_summary(report: &GenerationReport, outcome: &GenerationOutcome, args: &Args) {
    let counts = report.diagnostic_counts;

    println!();
    println!("{}", "=".repeat(80));
    println!("GENERATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Spec:      {} ({})", report.spec, args.spec);
    if let Some(ref algorithm) = report.algorithm {
        println!("Algorithm: {}", algorithm);
    }
    if let (Some(backend), Some(task)) = (report.backend, report.task) {
        println!("Backend:   {}  Task: {}", backend, task);
    }
    println!();

    println!("Scripts:");
    for script in &report.scripts {
        println!(
            "  - {}",
            script.path.as_deref().unwrap_or(script.file_name.as_str())
        );
    }
    println!();

    println!(
        "Diagnostics: {} info, {} warning(s), {} fatal",
        counts.info, counts.warning, counts.fatal
    );
    if counts.warning > 0 {
        for diagnostic in outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
        {
            warn!("{}", diagnostic);
            println!("  ! {}", diagnostic);
        }
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save generation_report.json");
    println!("{}", "=".repeat(80));
}
