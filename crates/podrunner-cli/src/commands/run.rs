//! `podctl run` — Start a pod and tear it down on Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use podrunner_common::config::PodRunnerConfig;
use podrunner_common::status::PodPhase;
use podrunner_common::types::PodSpec;
use podrunner_core::{Collaborators, ControllerSettings, PodController};
use podrunner_runtime::engine::docker::DockerEngine;
use podrunner_runtime::engine::memory::MemoryEngine;
use podrunner_runtime::engine::RuntimeEngine;
use podrunner_runtime::registry::ServiceRegistry;
use podrunner_runtime::registry::consul::ConsulRegistry;
use podrunner_runtime::registry::memory::MemoryRegistry;
use podrunner_runtime::status::StatusStore;
use podrunner_runtime::status::json::JsonStatusStore;
use podrunner_runtime::translate::ConfigTranslator;

use crate::output::{BOLD, CYAN, DIM, GREEN, RED, RESET, YELLOW};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the pod descriptor (JSON).
    pub file: PathBuf,

    /// Simulate the container runtime and service registry in memory.
    #[arg(long)]
    pub local: bool,

    /// Return once the pod has started instead of waiting for Ctrl+C.
    #[arg(short, long)]
    pub detach: bool,

    /// Remove containers without a grace period on shutdown.
    #[arg(short, long)]
    pub force: bool,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the pod descriptor is invalid, the Docker endpoint
/// is unusable, or teardown fails.
pub async fn execute(args: RunArgs, config: &PodRunnerConfig) -> anyhow::Result<()> {
    let spec = PodSpec::from_file(&args.file)?;
    let pod = spec.name.clone();
    let status: Arc<dyn StatusStore> = Arc::new(JsonStatusStore::new(&config.status_file));
    let deps = collaborators(&args, config, status.clone())?;

    let began = Instant::now();
    eprintln!();
    eprintln!(
        "  {BOLD}podctl{RESET} {DIM}v{}{RESET}  pod {BOLD}{pod}{RESET}",
        env!("CARGO_PKG_VERSION")
    );
    let controller = PodController::new(spec, deps, ControllerSettings::from(config));
    controller.await_start().await;

    let latest = status
        .get_latest(&pod)
        .await?
        .and_then(|s| s.latest().map(|e| e.report.clone()));
    match &latest {
        Some(report) if report.status == PodPhase::Running => {
            eprintln!(
                "  {GREEN}{BOLD}{report}{RESET} {DIM}in {:.1}s{RESET}",
                began.elapsed().as_secs_f64()
            );
        }
        Some(report) => eprintln!("  {RED}{BOLD}{report}{RESET}"),
        None => eprintln!("  {YELLOW}No status recorded.{RESET}"),
    }
    for service in controller.registered_services() {
        eprintln!(
            "    {GREEN}●{RESET} {BOLD}{}{RESET} {DIM}[{}]{RESET} {CYAN}->{RESET} port {}",
            service.service, service.container, service.port
        );
    }

    if args.detach {
        eprintln!();
        eprintln!("  Running detached. Containers keep running after podctl exits.");
        return Ok(());
    }

    eprintln!();
    eprintln!("  Press {BOLD}Ctrl+C{RESET} to stop the pod...");
    tokio::signal::ctrl_c().await?;

    eprintln!();
    eprintln!("  Stopping pod {pod}...");
    controller.stop(args.force).await?;
    eprintln!("  {GREEN}Pod removed.{RESET}");
    Ok(())
}

fn collaborators(
    args: &RunArgs,
    config: &PodRunnerConfig,
    status: Arc<dyn StatusStore>,
) -> anyhow::Result<Collaborators> {
    let (engine, registry): (Arc<dyn RuntimeEngine>, Arc<dyn ServiceRegistry>) = if args.local {
        tracing::info!("using in-memory runtime and registry");
        (Arc::new(MemoryEngine::new()), Arc::new(MemoryRegistry::new()))
    } else {
        (
            Arc::new(DockerEngine::connect(config.docker_host.as_deref())?),
            Arc::new(ConsulRegistry::new(config.consul_addr.clone())),
        )
    };
    Ok(Collaborators {
        engine,
        registry,
        status,
        translator: ConfigTranslator::new(config.name_prefix.clone()),
    })
}
