//! phyloreg CLI - phyloregions from beta-diversity matrices

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use phyloreg_algorithms::clustering::{cluster, select_linkage, ClusterParams, Linkage};
use phyloreg_algorithms::community::{beta_diversity, weighted_endemism, BetaIndex};
use phyloreg_algorithms::evaluation::ClusterEvaluator;
use phyloreg_algorithms::pipeline::{run_batch, run_prepared_batch, split_by_subregion, RegionalizationParams};
use phyloreg_colormap::RegionPalette;
use phyloreg_core::io::{
    read_community, read_distance_matrix, read_geometries, read_json, read_subregions, write_distance_matrix,
    write_json,
};
use phyloreg_core::DistanceMatrix;
use phyloreg_parallel::{mean_over_replicates, num_cpus, ProcessingMode};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "phyloreg")]
#[command(author, version, about = "Optimal phyloregions from beta-diversity matrices", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a dissimilarity matrix
    Info {
        /// Matrix file (CSV or TSV)
        input: PathBuf,
    },
    /// Cluster a matrix and select the number of regions
    Cluster {
        /// Matrix file (CSV or TSV)
        input: PathBuf,
        /// Linkage: average, weighted, single, complete, or auto
        #[arg(short, long, default_value = "average")]
        linkage: String,
        /// Largest number of regions to try (default: min(n - 1, 20))
        #[arg(short, long)]
        k_max: Option<usize>,
    },
    /// Build phyloregions, optionally per subregion
    Regionalize {
        /// Matrix files; several files are treated as replicates and averaged
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Unit geometry table (unit,x,y[,size])
        #[arg(short, long)]
        geometry: PathBuf,
        /// Subregion table (unit,subregion)
        #[arg(short, long)]
        subregions: Option<PathBuf>,
        /// Write region features as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Worker threads (1 = sequential, default: all cores)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Region palette: categorical or hue
        #[arg(short, long)]
        palette: Option<String>,
        /// Linkage: average, weighted, single or complete
        #[arg(short, long)]
        linkage: Option<String>,
        /// Largest number of regions to try
        #[arg(short, long)]
        k_max: Option<usize>,
        /// JSON parameter file; explicit flags take precedence
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compute taxonomic beta diversity from a presence/absence table
    Beta {
        /// Community table (site,taxon1,taxon2,...)
        input: PathBuf,
        /// Output matrix file
        output: PathBuf,
        /// Index: simpson or sorensen
        #[arg(short, long, default_value = "simpson")]
        index: String,
        /// Also print weighted endemism per site
        #[arg(short, long)]
        endemism: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging disabled: {e}");
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_matrix(path: &Path) -> Result<DistanceMatrix> {
    let pb = spinner("Reading matrix...");
    let matrix = read_distance_matrix(path)
        .with_context(|| format!("Failed to read matrix {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} units", matrix.size());
    Ok(matrix)
}

fn parse_linkage(name: &str) -> Result<Linkage> {
    Linkage::from_name(name).with_context(|| format!("Unknown linkage: {name}"))
}

fn parse_palette(name: &str) -> Result<RegionPalette> {
    RegionPalette::from_name(name).with_context(|| format!("Unknown palette: {name}"))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let matrix = read_matrix(&input)?;

            println!("File: {}", input.display());
            println!("Units: {}", matrix.size());
            let preview: Vec<&str> = matrix.units().iter().take(5).map(String::as_str).collect();
            let more = if matrix.size() > 5 { ", ..." } else { "" };
            println!("  {}{}", preview.join(", "), more);
            if let Some((min, max, mean)) = matrix.summary() {
                println!("\nDissimilarity (off-diagonal):");
                println!("  Min: {:.4}", min);
                println!("  Max: {:.4}", max);
                println!("  Mean: {:.4}", mean);
            }
        }

        // ── Cluster ──────────────────────────────────────────────────
        Commands::Cluster { input, linkage, k_max } => {
            let matrix = read_matrix(&input)?;
            let start = Instant::now();

            let pb = spinner("Clustering...");
            let dendrogram = if linkage.eq_ignore_ascii_case("auto") {
                let choice = select_linkage(&matrix, Linkage::ALL).context("Failed to cluster")?;
                for (l, r) in &choice.candidates {
                    info!("{:>8} linkage: cophenetic r = {}", l.name(), r.map_or("n/a".to_string(), |r| format!("{r:.4}")));
                }
                choice.dendrogram
            } else {
                let linkage = parse_linkage(&linkage)?;
                cluster(&matrix, &ClusterParams { linkage }).context("Failed to cluster")?
            };
            pb.set_message("Selecting number of regions...");
            let evaluation = ClusterEvaluator::new(&matrix)
                .evaluate(&dendrogram, k_max)
                .context("Failed to select the number of regions")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            println!("Linkage: {}", dendrogram.linkage());
            if let Some(r) = dendrogram.cophenetic_correlation(&matrix)? {
                println!("Cophenetic correlation: {:.4}", r);
            }
            println!("Selected k = {} (mean silhouette {:.4})", evaluation.k, evaluation.score);
            println!("\n   k  silhouette  explained");
            for p in &evaluation.curve {
                let mark = if p.k == evaluation.k { " *" } else { "" };
                println!("{:>4}  {:>10.4}  {:>9.4}{}", p.k, p.score, p.explained, mark);
            }
            println!("\nMembership:");
            for label in 1..=evaluation.partition.k() {
                println!("  {:>3}: {}", label, evaluation.partition.members(label).join(", "));
            }
            println!("  Processing time: {:.2?}", elapsed);
        }

        // ── Regionalize ──────────────────────────────────────────────
        Commands::Regionalize {
            inputs,
            geometry,
            subregions,
            output,
            threads,
            palette,
            linkage,
            k_max,
            config,
        } => {
            let mut params: RegionalizationParams = match &config {
                Some(path) => read_json(path)
                    .with_context(|| format!("Failed to read parameters {}", path.display()))?,
                None => RegionalizationParams::default(),
            };
            if let Some(name) = &linkage {
                params.cluster.linkage = parse_linkage(name)?;
            }
            if k_max.is_some() {
                params.evaluation.k_max = k_max;
            }
            if let Some(name) = &palette {
                params.assembly.palette = parse_palette(name)?;
            }
            let mode = ProcessingMode::from_threads(threads);
            info!("Using {:?} ({} cores available)", mode, num_cpus());

            let replicates = inputs.iter().map(|p| read_matrix(p)).collect::<Result<Vec<_>>>()?;
            let matrix = if replicates.len() == 1 {
                replicates.into_iter().next().context("No matrix given")?
            } else {
                info!("Averaging {} replicate matrices", replicates.len());
                mean_over_replicates(&replicates, mode).context("Failed to average replicates")?
            };

            let lookup = read_geometries(&geometry)
                .with_context(|| format!("Failed to read geometry {}", geometry.display()))?;

            let start = Instant::now();
            let pb = spinner("Building regions...");
            let report = match &subregions {
                Some(path) => {
                    let table = read_subregions(path)
                        .with_context(|| format!("Failed to read subregions {}", path.display()))?;
                    run_prepared_batch(split_by_subregion(&matrix, &table), &lookup, &params, mode)
                }
                None => {
                    let mut single = BTreeMap::new();
                    single.insert("all".to_string(), matrix);
                    run_batch(single, &lookup, &params, mode)
                }
            };
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            print!("{report}");
            for (name, result) in report.succeeded() {
                for warning in result.warnings() {
                    println!("  warning [{name}]: {warning}");
                }
            }

            if let Some(path) = &output {
                write_json(&report.to_features(), path).context("Failed to write regions")?;
                done("Regions", path, elapsed);
            } else {
                println!("  Processing time: {:.2?}", elapsed);
            }

            if report.succeeded().next().is_none() {
                bail!("No subregion could be regionalized");
            }
        }

        // ── Beta diversity ───────────────────────────────────────────
        Commands::Beta {
            input,
            output,
            index,
            endemism,
        } => {
            let index = BetaIndex::from_name(&index).with_context(|| format!("Unknown index: {index}"))?;
            let pb = spinner("Reading community table...");
            let community = read_community(&input)
                .with_context(|| format!("Failed to read community table {}", input.display()))?;
            pb.finish_and_clear();
            info!("Input: {} sites x {} taxa", community.sites().len(), community.taxa().len());

            let start = Instant::now();
            let matrix = beta_diversity(&community, index).context("Failed to compute beta diversity")?;
            let elapsed = start.elapsed();
            write_distance_matrix(&matrix, &output).context("Failed to write output")?;

            if endemism {
                println!("{:<16} {:>8} {:>10} {:>10}", "site", "richness", "WE", "CWE");
                for s in weighted_endemism(&community) {
                    println!("{:<16} {:>8} {:>10.4} {:>10.4}", s.site, s.richness, s.weighted, s.corrected);
                }
            }
            done(&format!("{} beta diversity", index.name()), &output, elapsed);
        }
    }

    Ok(())
}
