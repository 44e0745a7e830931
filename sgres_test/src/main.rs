use clap::Parser;
use rayon::prelude::*;
use sgres_lib::{Node, NodeType, ResourceFile};
use std::{io::Cursor, path::Path};
use tracing_subscriber::EnvFilter;

/// Test read/write for all resource files recursively in a game dump.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// The root folder of the game dump
    root_folder: String,

    /// Also build transform trees and remove duplicate vertices for each file
    #[arg(long)]
    data: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let folder = Path::new(&cli.root_folder);
    let start = std::time::Instant::now();

    let patterns = ["*.{5gd,gmdc,5cr,cres,5tm,txmt}"];
    globwalk::GlobWalkerBuilder::from_patterns(folder, &patterns)
        .build()?
        .filter_map(|p| p.ok())
        .par_bridge()
        .for_each(|path| {
            if let Some(file) = check_read_write(path.path()) {
                if cli.data {
                    check_data(path.path(), &file);
                }
            }
        });

    println!("Finished in {:?}", start.elapsed());
    Ok(())
}

fn check_read_write(path: &Path) -> Option<ResourceFile> {
    let before = match std::fs::read(path) {
        Ok(before) => before,
        Err(e) => {
            println!("Error opening {path:?}: {e}");
            return None;
        }
    };

    match ResourceFile::read(&mut Cursor::new(&before)) {
        Ok(file) => {
            // Check any supported file for 1:1 read/write.
            let mut writer = Cursor::new(Vec::new());
            match file.write(&mut writer) {
                Ok(()) => {
                    if before != writer.into_inner() {
                        println!("Read/write not 1:1 for {path:?}");
                    }
                }
                Err(e) => println!("Error writing {path:?}: {e}"),
            }
            Some(file)
        }
        Err(e) => {
            println!("Error reading {path:?}: {e}");
            None
        }
    }
}

fn check_data(path: &Path, file: &ResourceFile) {
    if file.node_types().iter().any(|t| t.has_transform())
        && file.nodes.first().map(Node::node_type) == Some(NodeType::Resource)
    {
        if let Err(e) = sgres_data::build_transform_tree(&file.nodes) {
            println!("Error building transform tree for {path:?}: {e}");
        }
    }

    for (i, node) in file.nodes.iter().enumerate() {
        if let Node::GeometryDataContainer(container) = node {
            match sgres_data::remove_doubles(container.geometry.clone()) {
                Ok(geometry) => {
                    // The deduplicated geometry should still be valid to write.
                    if let Err(e) = geometry.write(&mut Cursor::new(Vec::new())) {
                        println!("Error writing deduplicated node {i} for {path:?}: {e}");
                    }
                }
                Err(e) => println!("Error removing doubles for node {i} in {path:?}: {e}"),
            }
        }
    }
}
