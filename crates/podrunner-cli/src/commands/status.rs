//! `podctl status` — Show the recorded status history of a pod.

use clap::Args;
use podrunner_common::config::PodRunnerConfig;
use podrunner_runtime::status::StatusStore;
use podrunner_runtime::status::json::JsonStatusStore;

use crate::output::format_entry;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Pod name.
    pub pod: String,

    /// Print the raw history as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Returns an error if the status store cannot be read.
pub async fn execute(args: &StatusArgs, config: &PodRunnerConfig) -> anyhow::Result<()> {
    let store = JsonStatusStore::new(&config.status_file);
    let Some(status) = store.get_latest(&args.pod).await? else {
        println!("No status recorded for pod '{}'.", args.pod);
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{:<22} {:<10} {:<28} {}",
        "REPORTED AT", "STATUS", "REASON", "MESSAGE"
    );
    for entry in &status.history {
        println!("{}", format_entry(entry));
    }
    Ok(())
}
