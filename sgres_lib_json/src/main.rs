use clap::Parser;
use sgres_lib::ResourceFile;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Convert resource files to JSON and JSON back to resource files.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// The resource file or a .json file to convert back
    input: PathBuf,

    /// The output path. Defaults to the input path with .json added or removed
    output: Option<PathBuf>,

    /// Print a human readable summary of each node instead of writing JSON
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.input.extension().and_then(|e| e.to_str()) {
        Some("json") => read_json_write_data(&cli.input, cli.output),
        _ if cli.dump => dump(&cli.input),
        _ => read_data_write_json(&cli.input, cli.output),
    }
}

fn read_data_write_json(
    input_path: &Path,
    output_path: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    // Modify the input if no output is specified to allow dragging a file onto the executable.
    let json_output_path = output_path.unwrap_or_else(|| {
        let mut path = input_path.as_os_str().to_owned();
        path.push(".json");
        PathBuf::from(path)
    });

    let parse_start_time = Instant::now();
    let file = ResourceFile::from_file(input_path)?;
    eprintln!("Parse: {:?}", parse_start_time.elapsed());

    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(json_output_path, json)?;
    Ok(())
}

fn read_json_write_data(
    input_path: &Path,
    output_path: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    // Removing the extension restores the original name for files created by this tool.
    let output_path = output_path.unwrap_or_else(|| input_path.with_extension(""));

    let json = std::fs::read_to_string(input_path)?;
    let file: ResourceFile = serde_json::from_str(&json)?;

    let export_time = Instant::now();
    file.write_to_file(output_path)?;
    eprintln!("Export: {:?}", export_time.elapsed());
    Ok(())
}

fn dump(input_path: &Path) -> Result<(), Box<dyn Error>> {
    let file = ResourceFile::from_file(input_path)?;
    println!("{file}");
    for (i, node) in file.nodes.iter().enumerate() {
        println!("\n>Node #{i}\n{node}");
    }
    Ok(())
}
