//! gltfbridge CLI
//!
//! Drives the export core over a JSON scene description: resolves the
//! shared resources of a scene, samples blend shape targets, or shows the
//! sampler a filter/tiling combination maps to.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use gltfbridge_core::logging::{init_with_config, TracingConfig};
use gltfbridge_core::Plug;
use gltfbridge_export::{isolate, ExportOptions, ExportResources, FilterKind, TilingFlags};
use gltfbridge_host::{FsImageSource, MemoryScene, SceneDescription, SceneGraph};

/// gltfbridge - glTF export resource and blend shape tooling
#[derive(Parser)]
#[command(name = "gltfbridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the materials, images, samplers and textures of a scene
    Resources(SceneArgs),

    /// Sample every blend shape target of a scene
    BlendShapes(SceneArgs),

    /// Show the sampler for a filter and tiling combination
    Sampler(SamplerArgs),
}

#[derive(Args)]
struct SceneArgs {
    /// Path to the scene description (JSON)
    scene: PathBuf,

    /// Export options file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SamplerArgs {
    /// Filter kind: off, mipmap, box, quadratic, quartic, gaussian
    #[arg(long, default_value = "mipmap")]
    filter: FilterKind,

    /// U tiling: none, wrap, mirror, wrap|mirror
    #[arg(long, default_value = "wrap")]
    u: TilingFlags,

    /// V tiling: none, wrap, mirror, wrap|mirror
    #[arg(long, default_value = "wrap")]
    v: TilingFlags,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_config(TracingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Resources(args) => cmd_resources(&args),
        Commands::BlendShapes(args) => cmd_blend_shapes(&args),
        Commands::Sampler(args) => cmd_sampler(&args),
    }
}

fn load_options(args: &SceneArgs) -> Result<ExportOptions> {
    match &args.config {
        Some(path) => ExportOptions::load(path)
            .with_context(|| format!("Failed to load export options from {}", path.display())),
        None => Ok(ExportOptions::default()),
    }
}

fn load_scene(path: &Path) -> Result<MemoryScene> {
    info!("Loading scene: {:?}", path);
    let description = SceneDescription::load(path).context("Failed to read scene description")?;
    description.build().context("Failed to build scene")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct Assignment {
    shading_group: String,
    material: Option<usize>,
}

fn cmd_resources(args: &SceneArgs) -> Result<()> {
    let options = load_options(args)?;
    let scene = load_scene(&args.scene)?;
    let root = args.scene.parent().unwrap_or_else(|| Path::new("."));
    let pretty = options.pretty_json;

    let mut resources = ExportResources::new(options, FsImageSource::with_root(root))?;
    let groups: Vec<_> = scene.nodes_of_type("shadingEngine").collect();

    let mut assignments = Vec::with_capacity(groups.len());
    for group in groups {
        let name = scene.node_name(group)?;
        let material = resources
            .material_for_primitive(&scene, Some(group))
            .with_context(|| format!("Failed to resolve material of {name}"))?;
        // Second pass must hit the cache
        let again = resources.material_for_primitive(&scene, Some(group))?;
        if again != material {
            anyhow::bail!("material of {name} was not reused");
        }

        assignments.push(Assignment {
            shading_group: name,
            material: material.map(|handle| handle.index()),
        });
    }

    let cache = resources.cache();
    info!(
        "Resolved {} materials, {} images, {} samplers, {} textures",
        cache.materials().len(),
        cache.texturing().images().len(),
        cache.texturing().samplers().len(),
        cache.texturing().textures().len()
    );

    print_json(
        &serde_json::json!({
            "assignments": assignments,
            "tables": cache.tables(),
        }),
        pretty,
    )
}

#[derive(Serialize)]
struct BlendShapeReport {
    node: String,
    /// Effective weights with each target active in turn
    targets: Vec<Vec<f64>>,
    restored: bool,
}

fn cmd_blend_shapes(args: &SceneArgs) -> Result<()> {
    let options = load_options(args)?;
    let mut scene = load_scene(&args.scene)?;

    if options.skip_blend_shapes {
        info!("Blend shapes disabled by configuration");
        return print_json(&Vec::<BlendShapeReport>::new(), options.pretty_json);
    }

    let deformers: Vec<_> = scene.nodes_of_type("blendShape").collect();
    let mut reports = Vec::with_capacity(deformers.len());

    for deformer in deformers {
        let name = scene.node_name(deformer)?;
        let before = scene.clone();
        let weight_array = Plug::new(deformer, "weight");

        let targets = isolate(&mut scene, weight_array, |isolator| {
            isolator.sample_targets(|_, scene| {
                let array = Plug::new(deformer, "weight");
                scene
                    .element_plugs(&array)?
                    .iter()
                    .map(|plug| scene.plug_value(plug))
                    .collect::<gltfbridge_core::Result<Vec<f64>>>()
            })
        })
        .with_context(|| format!("Failed to sample blend shape {name}"))?;

        reports.push(BlendShapeReport {
            node: name,
            targets,
            restored: scene == before,
        });
    }

    print_json(&reports, options.pretty_json)
}

fn cmd_sampler(args: &SamplerArgs) -> Result<()> {
    let mut resources = ExportResources::new(ExportOptions::default(), FsImageSource::new())?;
    let handle = resources.resolve_sampler(args.filter, args.u, args.v);
    let sampler = resources
        .cache()
        .sampler(handle)
        .context("sampler missing from its table")?;

    print_json(sampler, true)
}
