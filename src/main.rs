use anyhow::{Context, Result};
use clap::Parser;
use snapshot_bench_charts::chart::{
    output_paths, render_speedup_chart, render_throughput_chart, render_time_chart,
};
use snapshot_bench_charts::pivot::{AlgoPair, PivotIndex};
use snapshot_bench_charts::record::read_records;
use std::path::PathBuf;

const DEFAULT_TITLE: &str = "Snapshot Hashing Throughput — SHA-256 Vs PH128 (150k Tx, 10KB)";

#[derive(Parser)]
#[command(name = "snapshot-bench-charts")]
#[command(about = "Render comparison charts from snapshot hashing benchmark results")]
struct Cli {
    /// Input CSV with benchmark results
    #[arg(long, default_value = "snapshot_bench.csv")]
    csv: PathBuf,

    /// Output directory for the generated images
    #[arg(long, default_value = ".")]
    outdir: PathBuf,

    /// Title for the absolute-throughput chart
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Baseline algorithm label (first series)
    #[arg(long, default_value = "SHA-256")]
    baseline: String,

    /// Comparison algorithm label (second series)
    #[arg(long, default_value = "PH128")]
    contender: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let records = read_records(&cli.csv)?;
    let pair = AlgoPair::new(cli.baseline, cli.contender);
    let index = PivotIndex::build(pair, records);

    print_summary(&index);

    std::fs::create_dir_all(&cli.outdir).context("Failed to create output directory")?;
    let paths = output_paths(&cli.csv, &cli.outdir)?;

    render_time_chart(&index, &paths.time)?;
    render_speedup_chart(&index, &paths.speedup)?;
    render_throughput_chart(&index, &paths.throughput, &cli.title)?;

    println!("OK! Files saved:");
    println!(" - {}", paths.time.display());
    println!(" - {}", paths.speedup.display());
    println!(" - {}", paths.throughput.display());

    Ok(())
}

/// Per-file comparison table for the operator, paired files only.
fn print_summary(index: &PivotIndex) {
    let paired: Vec<_> = index.paired().collect();
    if paired.is_empty() {
        println!("No file has results for both algorithms; charts will be empty.");
        return;
    }

    let pair = index.pair();
    println!(
        "Loaded {} file entries ({} with both algorithms)",
        index.len(),
        paired.len()
    );

    println!(
        "\n  {:<28} {:>14} {:>14} {:>10}",
        "File",
        format!("{} ms", pair.baseline),
        format!("{} ms", pair.contender),
        "Speedup"
    );
    println!("  {:-<68}", "");

    for (file, baseline, contender) in paired {
        let speedup =
            if baseline.throughput_mib_per_s != 0.0 && contender.throughput_mib_per_s != 0.0 {
                format!(
                    "{:.2}x",
                    contender.throughput_mib_per_s / baseline.throughput_mib_per_s
                )
            } else {
                "-".to_string()
            };

        println!(
            "  {:<28} {:>14.2} {:>14.2} {:>10}",
            file, baseline.elapsed_ms_median, contender.elapsed_ms_median, speedup
        );
    }
    println!();
}
