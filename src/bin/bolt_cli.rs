//! Command-line driver: generate points, assemble levels, analyze bolts.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bolt_engine::analyze::{AnalyzeError, Analyzer};
use bolt_engine::format::{
    self, BasketOrderFile, BasketsFile, BoltsFile, FormatError, PointsFile, SceneFile,
};
use bolt_engine::graph::{GraphError, MeshGraph, Topology, TopologyError};
use bolt_engine::level::{LevelError, LevelSettings, build_level};
use bolt_engine::points::{DistributionMode, GenerationError, generate};
use clap::{Parser, Subcommand};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "bolt-cli")]
#[command(about = "Bolt-point generation and level assembly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bolt points for a scene file
    Generate {
        scene: PathBuf,
        /// Point export; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the requested point total
        #[arg(long)]
        total: Option<i64>,
        #[arg(long, value_enum)]
        mode: Option<DistributionMode>,
    },
    /// Place coloured bolts on exported points
    Level {
        points: PathBuf,
        #[arg(long)]
        bolts: Option<i64>,
        #[arg(long)]
        colors: Option<i64>,
        #[arg(long)]
        seed: Option<u64>,
        /// Use points even when another mesh blocks them
        #[arg(long)]
        include_blocked: bool,
        #[arg(long)]
        baskets_out: Option<PathBuf>,
        #[arg(long)]
        bolts_out: Option<PathBuf>,
    },
    /// Order bolts and group them into baskets
    Analyze {
        bolts: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        group_size: usize,
    },
    /// Print the mesh removal order of a point export
    Order { points: PathBuf },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("cannot write to stdout: {0}")]
    Stdout(#[from] std::io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate {
            scene,
            output,
            total,
            mode,
        } => cmd_generate(&scene, output.as_deref(), total, mode),
        Commands::Level {
            points,
            bolts,
            colors,
            seed,
            include_blocked,
            baskets_out,
            bolts_out,
        } => {
            let mut settings = LevelSettings {
                seed,
                skip_blocked_points: !include_blocked,
                ..LevelSettings::default()
            };
            if let Some(bolts) = bolts {
                settings.total_bolts = bolts;
            }
            if let Some(colors) = colors {
                settings.total_colors = colors;
            }
            cmd_level(&points, &settings, baskets_out.as_deref(), bolts_out.as_deref())
        }
        Commands::Analyze {
            bolts,
            output,
            group_size,
        } => cmd_analyze(&bolts, output.as_deref(), group_size),
        Commands::Order { points } => cmd_order(&points),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bolt-cli error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn emit<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            format::write_json(path, value)?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let text = format::to_json(value)?;
            writeln!(std::io::stdout().lock(), "{text}")?;
        }
    }
    Ok(())
}

fn cmd_generate(
    scene_path: &Path,
    output: Option<&Path>,
    total: Option<i64>,
    mode: Option<DistributionMode>,
) -> Result<(), CliError> {
    let file: SceneFile = format::read_json(scene_path)?;
    let scene = file.to_scene()?;
    let mut settings = file.settings;
    if let Some(total) = total {
        settings.total_points = total;
    }
    if let Some(mode) = mode {
        settings.mode = mode;
    }

    let generation = generate(&scene, &settings)?;
    if let Some(timing) = &generation.report.timing {
        log::info!(
            "distribution {} ns, allocation {} ns, projection {} ns",
            timing.distribution_ns,
            timing.allocation_ns,
            timing.projection_ns
        );
    }

    let graph = MeshGraph::from_points(&scene, &generation.points)?;
    let topology = Topology::sort(&graph)?;
    let order: Vec<&str> = topology.order.iter().filter_map(|&m| graph.name(m)).collect();
    log::info!("removal order: {}", order.join(" -> "));

    emit(&PointsFile::from_points(&scene, &generation.points), output)
}

fn cmd_level(
    points_path: &Path,
    settings: &LevelSettings,
    baskets_out: Option<&Path>,
    bolts_out: Option<&Path>,
) -> Result<(), CliError> {
    let file: PointsFile = format::read_json(points_path)?;
    let level = build_level(&file.points, settings)?;

    emit(&BasketsFile::from_plans(&level.baskets), baskets_out)?;
    let bolts = BoltsFile::from_dependencies(level.dependencies());
    match bolts_out {
        Some(path) => emit(&bolts, Some(path)),
        None => {
            log::info!("{} bolts placed; pass --bolts-out to save their dependencies", bolts.bolts.len());
            Ok(())
        }
    }
}

fn cmd_analyze(bolts_path: &Path, output: Option<&Path>, group_size: usize) -> Result<(), CliError> {
    let file: BoltsFile = format::read_json(bolts_path)?;
    let analysis = Analyzer::new(group_size).run(file.into_dependencies())?;

    for bolt in &analysis.ordered {
        log::info!(
            "bolt {} | depth={}, parents={}, pawns={}",
            bolt.bolt_id,
            bolt.depth,
            bolt.parents.len(),
            bolt.pawns.len()
        );
    }
    for triple in &analysis.triples {
        log::info!(
            "basket (colour {}): {}",
            triple.color_id,
            triple.ids().collect::<Vec<_>>().join(", ")
        );
    }
    emit(&BasketOrderFile::new(&analysis.triples, analysis.dropped.clone()), output)
}

fn cmd_order(points_path: &Path) -> Result<(), CliError> {
    let file: PointsFile = format::read_json(points_path)?;
    let graph = MeshGraph::from_names(
        file.points
            .iter()
            .map(|p| (p.parent_mesh_id.as_str(), p.blocked_by())),
    );
    let topology = Topology::sort(&graph)?;

    let mut out = std::io::stdout().lock();
    for (rank, mesh) in topology.order.iter().enumerate() {
        let name = graph.name(*mesh).unwrap_or_default();
        let blockers: Vec<&str> = graph
            .blockers_of(*mesh)
            .filter_map(|b| graph.name(b))
            .collect();
        if blockers.is_empty() {
            writeln!(out, "{rank}: {name}")?;
        } else {
            writeln!(out, "{rank}: {name} (after {})", blockers.join(", "))?;
        }
    }
    Ok(())
}
