// src/main.rs
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};

use s2_indices::batch::{self, BatchSummary};
use s2_indices::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    Builder::from_env(Env::default().default_filter_or(cli.log_level())).init();
    log::debug!("s2-indices {} {:?}", s2_indices::VERSION, cli);

    let write = cli.write_options();
    let summary = match &cli.command {
        Commands::Process {
            bands,
            output_dir,
            scene,
        } => {
            let bands = bands.iter().cloned().collect::<BTreeMap<_, _>>();
            let written = batch::generate_indices(&bands, output_dir, &scene.process_options(write))
                .with_context(|| format!("processing bands into {}", output_dir.display()))?;
            BatchSummary {
                scenes: 1,
                written,
                failed: Vec::new(),
            }
        }
        Commands::Batch { root, scene } => batch::process_folder(root, &scene.process_options(write))
            .with_context(|| format!("scanning {}", root.display()))?,
        Commands::Run { config } => batch::process_batch(config)
            .with_context(|| format!("running batch configuration {}", config.display()))?,
    };

    for path in &summary.written {
        log::debug!("wrote {}", path.display());
    }
    println!(
        "Processing complete: {} scenes, {} files written, {} failed",
        summary.scenes,
        summary.written.len(),
        summary.failed.len()
    );
    Ok(())
}
