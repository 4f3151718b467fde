// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Command-line front end that loads a pipeline description, runs it and
//! prints the latency report.
//!
//! For example, run using:
//!   cargo run --bin daolite -- --graph daolite-pipeline/pipelines/scao.yaml
//!   --hardware daolite-pipeline/pipelines/hardware.yaml --details

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use daolite_hardware::HardwareRegistry;
use daolite_pipeline::config::Config;
use daolite_pipeline::executor::Executor;
use daolite_pipeline::types::PipelineDescription;
use daolite_track::builder::setup_trackers;
use daolite_track::entity::toplevel;

fn main() -> Result<()> {
    let config = Config::from_sources(Config::parse())?;
    let tracker = setup_trackers(&config.trackers_config())?;
    let top = toplevel(&tracker, "top");

    let mut registry = HardwareRegistry::builtin()?;
    if let Some(hardware) = &config.hardware {
        let names = registry.add_from_file(hardware)?;
        println!(
            "Loaded {} resources from {}",
            names.len(),
            hardware.display()
        );
    }

    let graph_path: PathBuf = config
        .graph
        .clone()
        .ok_or_else(|| anyhow!("No pipeline given, use --graph <FILE>"))?;
    let description = PipelineDescription::from_file(&graph_path)?;
    let loaded = description.build_graph(&top, &registry, config.default_resource.as_deref())?;
    for warning in &loaded.warnings {
        eprintln!("Warning: {warning}");
    }

    println!(
        "Loaded pipeline with {} components from {}",
        loaded.graph.len(),
        graph_path.display()
    );

    let result = Executor::new(&top).run(&loaded.graph);
    tracker.shutdown();
    let report = result?;

    println!("{report}");
    if config.details() {
        print!("{}", report.details());
    }

    if let Some(output) = &config.output {
        std::fs::write(output, report.to_yaml()?)
            .map_err(|e| anyhow!("Unable to write {}: {e}", output.display()))?;
    }

    Ok(())
}
