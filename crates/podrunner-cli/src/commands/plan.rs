//! `podctl plan` — Show the runtime configuration of each container.

use std::path::PathBuf;

use clap::Args;
use podrunner_common::config::PodRunnerConfig;
use podrunner_common::types::PodSpec;
use podrunner_runtime::translate::ConfigTranslator;

use crate::output::{format_bytes, format_services};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the pod descriptor (JSON).
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if the pod descriptor cannot be read or is invalid.
pub fn execute(args: &PlanArgs, config: &PodRunnerConfig) -> anyhow::Result<()> {
    let spec = PodSpec::from_file(&args.file)?;
    let translator = ConfigTranslator::new(config.name_prefix.clone());

    println!("Pod plan for: {}", spec.name);
    println!("{}", "\u{2550}".repeat(35));
    println!();

    for container in &spec.containers {
        let runtime = translator.translate(&spec, container)?;
        println!("  + {}", runtime.name);
        println!("      image: {}", runtime.image);
        if !container.http_ports.is_empty() {
            println!("      ports: {}", format_services(&container.http_ports));
        }
        println!(
            "      memory: {}",
            runtime.memory_bytes.map_or_else(|| "unlimited".to_string(), format_bytes)
        );
        if container.cpus > 0.0 {
            println!("      cpus: {}", container.cpus);
        }
    }

    println!();
    println!("  {} container(s) will be started.", spec.containers.len());
    Ok(())
}
