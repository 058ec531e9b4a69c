use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "blockgraph workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmarks once per build flavour and compare them
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,

        /// Restrict to one bench target
        #[arg(long)]
        bench: Option<String>,
    },
}

/// A build flavour: baseline name and the cargo feature arguments that select it.
struct Flavour {
    name: &'static str,
    features: &'static [&'static str],
}

const FLAVOURS: &[Flavour] = &[
    Flavour {
        name: "sequential",
        features: &["--no-default-features", "--features", "tracing"],
    },
    Flavour {
        name: "parallel",
        features: &[],
    },
];

const BENCHES: &[&str] = &["primitives_benchmark", "csr_benchmark", "ingest_benchmark"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            quick,
            report_only,
            bench,
        } => {
            let targets: Vec<&str> = match bench.as_deref() {
                Some(one) => {
                    if !BENCHES.contains(&one) {
                        anyhow::bail!("unknown bench target `{one}` (expected one of {BENCHES:?})");
                    }
                    vec![one]
                }
                None => BENCHES.to_vec(),
            };
            if !report_only {
                run_benchmarks(&targets, quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(targets: &[&str], quick: bool) -> Result<()> {
    println!("Running comparative benchmarks...");

    for flavour in FLAVOURS {
        for target in targets {
            println!("\n>>> {target} [{}]", flavour.name);
            let start = Instant::now();

            let mut cmd = Command::new("cargo");
            cmd.env("CARGO_INCREMENTAL", "0");
            cmd.arg("bench").arg("--bench").arg(target).args(flavour.features);

            // Args for the test runner (Criterion) go after --
            cmd.arg("--");
            cmd.arg("--save-baseline").arg(flavour.name);

            if quick {
                cmd.arg("--measurement-time").arg("0.1");
                cmd.arg("--noplot");
                cmd.arg("--sample-size").arg("10");
            }

            let status = cmd
                .status()
                .with_context(|| format!("failed to run {target} for {}", flavour.name))?;

            if status.success() {
                println!("Finished {target} [{}] in {:.2?}", flavour.name, start.elapsed());
            } else {
                eprintln!("Warning: {target} failed for {}", flavour.name);
            }
        }
    }

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let mut results: HashMap<String, HashMap<String, f64>> = HashMap::new();

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    collect_results(criterion_dir, criterion_dir, &mut results);

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }

    use std::io::Write;
    let mut file = fs::File::create(report_path)?;

    writeln!(file, "# Sequential vs Parallel Benchmark Report")?;
    writeln!(file)?;
    writeln!(file, "| Workload | sequential | parallel | speedup |")?;
    writeln!(file, "|---|---|---|---|")?;

    let mut workloads: Vec<_> = results.keys().collect();
    workloads.sort();

    for workload in workloads {
        let row = &results[workload];
        let seq = row.get("sequential").copied();
        let par = row.get("parallel").copied();
        let speedup = match (seq, par) {
            (Some(s), Some(p)) if s > 0.0 => format!("**{:.2}x**", p / s),
            _ => "-".to_string(),
        };
        writeln!(
            file,
            "| {} | {} | {} | {} |",
            workload,
            seq.map_or_else(|| "N/A".to_string(), format_rate),
            par.map_or_else(|| "N/A".to_string(), format_rate),
            speedup
        )?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_rate(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M/s", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K/s", ops / 1_000.0)
    } else {
        format!("{ops:.0}/s")
    }
}

/// Walks criterion's output tree. Layout: `<root>/<group>/<bench...>/<baseline>/estimates.json`.
fn collect_results(root: &Path, dir: &Path, results: &mut HashMap<String, HashMap<String, f64>>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(root, &path, results);
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }
        let Some(baseline_dir) = path.parent() else {
            continue;
        };
        let Some(baseline) = baseline_dir.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if !FLAVOURS.iter().any(|f| f.name == baseline) {
            continue;
        }
        let Some(workload_dir) = baseline_dir.parent() else {
            continue;
        };
        let Ok(rel) = workload_dir.strip_prefix(root) else {
            continue;
        };
        let workload = rel.to_string_lossy().replace('\\', "/");
        if workload.split('/').any(|part| part == "report") {
            continue;
        }

        // Throughput comes from benchmark.json next to the estimates when the group declares one.
        let elements = fs::read_to_string(baseline_dir.join("benchmark.json"))
            .ok()
            .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
            .and_then(|j| j.get("throughput")?.get("Elements")?.as_f64())
            .unwrap_or(1.0);

        let mean_ns = fs::read_to_string(&path)
            .ok()
            .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
            .and_then(|j| j.get("mean")?.get("point_estimate")?.as_f64())
            .unwrap_or(0.0);

        if mean_ns > 0.0 {
            results
                .entry(workload)
                .or_default()
                .insert(baseline.to_string(), elements * 1e9 / mean_ns);
        }
    }
}
