//! Print the node tree of a glTF model with the bounds the viewer would
//! place it at

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use modelview_core::SceneNode;
use modelview_visualization::place_model;

#[derive(Parser)]
#[command(name = "inspect_model")]
#[command(about = "List the nodes of a glTF model")]
struct Cli {
    /// Model to read (.gltf or .glb)
    model: PathBuf,

    /// Uniform scale applied before placement
    #[arg(long, default_value_t = 0.01)]
    scale: f32,
}

fn print_tree(node: &SceneNode, depth: usize) {
    let kind = match &node.mesh {
        Some(mesh) => format!(
            "mesh, {} vertices, {} faces, color {}",
            mesh.geometry.vertex_count(),
            mesh.geometry.face_count(),
            mesh.material.color
        ),
        None => "group".to_string(),
    };
    let name = if node.name.is_empty() { "<unnamed>" } else { node.name.as_str() };
    println!("{}{} ({})", "  ".repeat(depth), name, kind);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut root = modelview_io::read_scene(&cli.model)
        .with_context(|| format!("Failed to load {}", cli.model.display()))?;

    print_tree(&root, 0);
    println!("{} mesh nodes", root.mesh_count());

    let raw = root.world_bounding_box();
    println!("Bounds as authored: {:?} .. {:?}", raw.min, raw.max);

    place_model(&mut root, cli.scale);
    let placed = root.world_bounding_box();
    println!("Bounds in viewer:   {:?} .. {:?}", placed.min, placed.max);
    Ok(())
}
