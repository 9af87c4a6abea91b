//! ABOUTME: Subcommand implementations and the shared adapter-wiring helper they dispatch through

mod eval;
mod serve;
mod wiring;

use crate::cli::{Commands, EvalCommands, OutputFormat};
use ragcore_config::RagConfig;

/// Dispatches a parsed [`Commands`] to its implementation. Returns `Ok(())`
/// on success; any `Err` propagates to `main` as a process exit code of 1.
pub async fn execute(command: Commands, config: RagConfig, output: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Serve { addr } => serve::run(config, addr).await,
        Commands::Eval { action } => match action {
            EvalCommands::Run { dataset, version_label, evaluate_generation } => {
                eval::run(config, &dataset, version_label, evaluate_generation, output).await
            }
            EvalCommands::Compare { baseline, candidate } => eval::compare(config, &baseline, &candidate, output).await,
        },
    }
}
