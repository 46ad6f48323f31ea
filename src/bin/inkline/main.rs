//! Inkline CLI - mesh preparation for outline rendering.
//!
//! Usage: inkline <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `inkline --help` for available commands. Set `RUST_LOG=debug` for
//! per-stage logging.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use inkline::algo::{
    qem_decimate_with_progress, BoundingBox, DecimateOptions, Normalization, Progress,
};
use inkline::io::{self, LoadOptions};
use inkline::mesh::{HalfEdgeMesh, NormalWeighting};
use inkline::pipeline::{rebuild, FileSource, RebuildConfig, DEFAULT_TARGET_VERTEX_COUNT};

#[derive(Parser)]
#[command(name = "inkline")]
#[command(author, version, about = "Mesh preparation for outline rendering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Fan-triangulate polygons instead of rejecting them
        #[arg(long)]
        triangulate: bool,
    },

    /// Decimate (simplify) a mesh to a vertex count
    Decimate {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Target number of vertices
        #[arg(short = 'n', long, conflicts_with = "ratio")]
        vertices: Option<usize>,

        /// Target ratio of vertices to keep (0.0 to 1.0)
        #[arg(short, long, default_value = "0.5")]
        ratio: f64,

        /// Keep boundary vertices fixed
        #[arg(long)]
        preserve_boundary: bool,

        /// Stop once the cheapest collapse exceeds this error
        #[arg(long)]
        max_error: Option<f64>,

        /// Fan-triangulate polygons instead of rejecting them
        #[arg(long)]
        triangulate: bool,
    },

    /// Run the full rebuild and summarize the render buffers
    Build {
        /// Input mesh file
        input: PathBuf,

        /// Decimate before building buffers
        #[arg(long)]
        simplify: bool,

        /// Target number of vertices when simplifying
        #[arg(short = 'n', long, default_value_t = DEFAULT_TARGET_VERTEX_COUNT)]
        vertices: usize,

        /// Vertex normal weighting
        #[arg(short, long, value_enum, default_value = "area")]
        weighting: Weighting,

        /// Keep boundary vertices fixed when simplifying
        #[arg(long)]
        preserve_boundary: bool,

        /// Check that the adjacency stream fits 16-bit indices
        #[arg(long = "u16")]
        narrow: bool,

        /// Fan-triangulate polygons instead of rejecting them
        #[arg(long)]
        triangulate: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Weighting {
    /// Every incident face counts the same
    Uniform,
    /// Faces weighted by area
    Area,
    /// Faces weighted by corner angle
    Angle,
}

impl From<Weighting> for NormalWeighting {
    fn from(w: Weighting) -> Self {
        match w {
            Weighting::Uniform => NormalWeighting::Uniform,
            Weighting::Area => NormalWeighting::Area,
            Weighting::Angle => NormalWeighting::Angle,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, triangulate } => {
            cmd_info(&input, triangulate)?;
        }

        Commands::Decimate {
            input,
            output,
            vertices,
            ratio,
            preserve_boundary,
            max_error,
            triangulate,
        } => {
            let mut options = match vertices {
                Some(n) => DecimateOptions::with_target_vertices(n),
                None => DecimateOptions::with_target_ratio(ratio),
            }
            .with_preserve_boundary(preserve_boundary);
            if let Some(max_error) = max_error {
                options = options.with_max_error(max_error);
            }
            cmd_decimate(&input, &output, &options, triangulate)?;
        }

        Commands::Build {
            input,
            simplify,
            vertices,
            weighting,
            preserve_boundary,
            narrow,
            triangulate,
        } => {
            let config = RebuildConfig::default()
                .with_simplification(simplify)
                .with_target_vertex_count(vertices)
                .with_normal_weighting(weighting.into())
                .with_preserve_boundary(preserve_boundary)
                .with_load_options(LoadOptions::default().with_triangulate(triangulate));
            cmd_build(&input, &config, narrow)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only ever move forward.
        let (percent, increased) = loop {
            let old_max = max_percent.load(Ordering::Relaxed);
            let new_max = old_max.max(raw_percent);
            if new_max == old_max {
                break (old_max, false);
            }
            match max_percent.compare_exchange_weak(
                old_max,
                new_max,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break (new_max, true),
                Err(_) => continue,
            }
        };

        if !increased && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn load(input: &PathBuf, triangulate: bool) -> inkline::error::Result<HalfEdgeMesh> {
    io::load_with(input, &LoadOptions::default().with_triangulate(triangulate))
}

fn cmd_info(input: &PathBuf, triangulate: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input, triangulate)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());

    let boundary = mesh.num_boundary_halfedges();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        let boundary_verts = mesh
            .vertex_ids()
            .filter(|&v| mesh.is_boundary_vertex(v))
            .count();
        println!(
            "Topology: Open ({} boundary half-edges, {} boundary vertices)",
            boundary, boundary_verts
        );
    }

    let total_area: f64 = mesh.face_ids().map(|f| mesh.face_area(f)).sum();
    println!("Surface area: {:.6}", total_area);

    if let Some(bounds) = BoundingBox::of_mesh(&mesh) {
        let (min, max) = (bounds.min, bounds.max);
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let size = bounds.size();
        println!("Dimensions: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    }

    match Normalization::from_mesh(&mesh) {
        Ok(n) => println!(
            "Normalization: scale {:.6}, center ({:.3}, {:.3}, {:.3})",
            n.scale, n.center.x, n.center.y, n.center.z
        ),
        Err(e) => println!("Normalization: {}", e),
    }

    print_diagnostics(mesh.diagnostics());
    Ok(())
}

fn cmd_decimate(
    input: &PathBuf,
    output: &PathBuf,
    options: &DecimateOptions,
    triangulate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input, triangulate)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let target = options.compute_target(mesh.num_vertices());
    println!("Decimating to {} vertices...", target);

    let progress = create_progress();

    let start = Instant::now();
    let report = qem_decimate_with_progress(&mut mesh, options, &progress)?;
    let elapsed = start.elapsed();

    println!(
        "Result: {} vertices, {} faces ({} collapses)",
        mesh.num_vertices(),
        mesh.num_faces(),
        report.collapses
    );
    if !report.is_complete() {
        println!(
            "Warning: requested {} vertices, achieved {}",
            report.requested_vertices, report.achieved_vertices
        );
    }

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_build(
    input: &PathBuf,
    config: &RebuildConfig,
    check_u16: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let buffers = rebuild(&FileSource::new(input), config)?;
    let elapsed = start.elapsed();

    println!("File: {}", input.display());
    if let Some(report) = &buffers.decimation {
        println!(
            "Decimation: {} -> {} vertices (requested {}, {} collapses)",
            report.original_vertices,
            report.achieved_vertices,
            report.requested_vertices,
            report.collapses
        );
    }
    println!("Vertices: {}", buffers.num_vertices());
    println!("Triangles: {}", buffers.num_faces());
    println!(
        "Buffers: positions {} B, normals {} B, adjacency {} B",
        buffers.positions_bytes().len(),
        buffers.normals_bytes().len(),
        buffers.adjacency_bytes().len()
    );
    let n = &buffers.normalization;
    println!(
        "Normalization: scale {:.6}, center ({:.3}, {:.3}, {:.3})",
        n.scale, n.center.x, n.center.y, n.center.z
    );
    println!("Self-paired adjacency slots: {}", buffers.self_paired_slots());

    if check_u16 {
        let narrow = buffers.adjacency_u16()?;
        println!("16-bit adjacency: {} B", narrow.len() * 2);
    }

    print_diagnostics(&buffers.diagnostics);
    println!("Built in {:.2?}", elapsed);
    Ok(())
}

fn print_diagnostics(diagnostics: &[inkline::error::Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("Diagnostics ({}):", diagnostics.len());
    for d in diagnostics {
        println!("  {}", d);
    }
}
