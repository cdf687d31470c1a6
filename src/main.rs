//! bscope - size, type and duplicate analysis for unpacked app bundles.
//!
//! Usage:
//!   bscope summary <PATH>      Sizes, largest files and modules, type breakdown
//!   bscope duplicates <PATH>   Find duplicate files
//!   bscope export <PATH>       Export tree and analytics to JSON
//!   bscope --help              Show help

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tracing::Level;

use bundlescope_analyze::{
    AnalyticsReport, Analyzer, AssetDuplicate, AssetRendition, RankedEntry,
    enrich_asset_catalogs, find_asset_duplicates, find_duplicates,
};
use bundlescope_scan::{BundleScanner, BundleTree, EntryPolicy, ScanConfig};

#[derive(Parser)]
#[command(
    name = "bscope",
    version,
    about = "Size, type and duplicate analysis for unpacked application bundles",
    long_about = "bscope walks an already-extracted bundle directory (an .app, or the \
                  contents of an .ipa or .apk), hashes every file and reports where \
                  the bytes go."
)]
struct Cli {
    /// Log scan phases to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ScanArgs {
    /// Bundle directory (or single file) to analyze
    path: PathBuf,

    /// Hashing threads (0 = one per core)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Skip symlinks and special files instead of failing
    #[arg(long)]
    skip_unsupported: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show a size summary
    Summary {
        #[command(flatten)]
        scan: ScanArgs,

        /// Number of entries to show per ranking
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Find duplicate files
    Duplicates {
        #[command(flatten)]
        scan: ScanArgs,

        /// Maximum number of duplicate groups to show
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the tree and analytics to JSON
    Export {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON map of `.car` relative path to rendition records
        #[arg(long)]
        renditions: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    tree: &'a BundleTree,
    analytics: &'a AnalyticsReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    asset_duplicates: Vec<AssetDuplicate>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::INFO } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Summary { scan, top } => run_summary(&scan, top)?,
        Command::Duplicates { scan, top, format } => run_duplicates(&scan, top, format)?,
        Command::Export {
            scan,
            output,
            renditions,
        } => run_export(&scan, output, renditions)?,
    }

    Ok(())
}

/// Build the tree for the requested path.
fn scan(args: &ScanArgs) -> Result<BundleTree> {
    let policy = if args.skip_unsupported {
        EntryPolicy::Skip
    } else {
        EntryPolicy::Fail
    };
    let config = ScanConfig::builder()
        .root(args.path.as_path())
        .threads(args.threads)
        .unsupported_entries(policy)
        .build()
        .wrap_err("Invalid scan configuration")?;

    eprintln!("Scanning {}...", args.path.display());

    BundleScanner::new()
        .scan(&config)
        .wrap_err_with(|| format!("Scan of {} failed", args.path.display()))
}

/// Print sizes, rankings and the type breakdown.
fn run_summary(args: &ScanArgs, top_n: usize) -> Result<()> {
    let tree = scan(args)?;
    let report = Analyzer::new().analyze(&tree.root);

    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} - {}",
        tree.root_path.display(),
        format_size(tree.total_size())
    );
    println!(
        " {} files, {} directories",
        tree.total_files(),
        tree.total_dirs()
    );
    println!(" Content hash {}", tree.root.content_hash);
    println!(" Scanned in {:.2}s", tree.scan_duration.as_secs_f64());
    println!("{}", "─".repeat(70));

    print_ranking("Largest files", report.top_files(top_n), report.root_size);
    print_ranking("Largest modules", report.top_modules(top_n), report.root_size);

    println!();
    println!(" By type:");
    for share in report.type_breakdown.iter() {
        println!(
            "   {:<14} {:>10} {:>6} files {:>6.1}% {}",
            share.kind.label(),
            format_size(share.total_size),
            share.file_count,
            share.percentage,
            make_bar(share.percentage / 100.0, 20)
        );
    }

    println!();
    if report.duplicates.has_duplicates() {
        println!(
            " {} duplicate groups, {} wasted ({:.1}%)",
            report.duplicates.group_count(),
            format_size(report.duplicates.total_wasted_space),
            report.duplicates.total_wasted_percent
        );
    } else {
        println!(" No duplicate files found.");
    }

    if tree.has_warnings() {
        println!();
        println!("{} warning(s) during scan", tree.warnings.len());
    }

    Ok(())
}

fn print_ranking<'a>(title: &str, entries: impl Iterator<Item = &'a RankedEntry>, root_size: u64) {
    println!();
    println!(" {title}:");
    for entry in entries {
        let ratio = if root_size > 0 {
            entry.size as f64 / root_size as f64
        } else {
            0.0
        };
        println!(
            "   {:<48} {:>10} {:>5.1}% {}",
            truncate(&entry.relative_path, 48),
            format_size(entry.size),
            ratio * 100.0,
            make_bar(ratio, 10)
        );
    }
}

/// Run duplicate detection.
fn run_duplicates(args: &ScanArgs, top_n: usize, format: OutputFormat) -> Result<()> {
    let tree = scan(args)?;
    let mut report = find_duplicates(&tree.root);
    report.groups.truncate(top_n);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate File Report");
            println!("{}", "─".repeat(70));
            println!();

            if report.groups.is_empty() {
                println!(" No duplicate files found.");
            } else {
                println!(
                    " Found {} files in duplicate groups out of {}",
                    report.files_with_duplicates, report.files_analyzed
                );
                println!(
                    " Total wasted space: {} ({:.1}%)",
                    format_size(report.total_wasted_space),
                    report.total_wasted_percent
                );
                println!();

                for (i, group) in report.groups.iter().enumerate() {
                    println!(
                        " Group {} ({} files, {} each, {} wasted)",
                        i + 1,
                        group.count(),
                        format_size(group.size),
                        format_size(group.wasted_space)
                    );
                    for path in &group.paths {
                        println!("   {path}");
                    }
                    println!();
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Export the tree, its analytics and optional asset-catalog enrichment.
fn run_export(args: &ScanArgs, output: Option<PathBuf>, renditions: Option<PathBuf>) -> Result<()> {
    let mut tree = scan(args)?;
    let analytics = Analyzer::new().analyze(&tree.root);

    let mut asset_duplicates = Vec::new();
    if let Some(path) = renditions {
        let catalogs = load_renditions(&path)?;
        let merged = enrich_asset_catalogs(&mut tree.root, &catalogs);
        eprintln!("Merged {merged} of {} asset catalogs", catalogs.len());
        asset_duplicates = find_asset_duplicates(&catalogs);
    }

    let document = ExportDocument {
        tree: &tree,
        analytics: &analytics,
        asset_duplicates,
    };
    let json = serde_json::to_string_pretty(&document)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

fn load_renditions(path: &Path) -> Result<BTreeMap<String, Vec<AssetRendition>>> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).wrap_err("Invalid renditions file")
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}
