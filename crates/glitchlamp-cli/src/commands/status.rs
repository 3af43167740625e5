//! Generation status command.

use clap::Args;

use glitchlamp_client::{Backend, GenerationMonitor};

#[derive(Args)]
pub struct StatusArgs {
    /// Pause generation first
    #[arg(long, conflicts_with = "resume")]
    pause: bool,

    /// Resume generation first
    #[arg(long)]
    resume: bool,
}

pub fn run(backend: &dyn Backend, args: StatusArgs) -> anyhow::Result<()> {
    if args.pause {
        backend.pause_generation()?;
        println!("Generation paused");
    } else if args.resume {
        backend.resume_generation()?;
        println!("Generation resumed");
    }

    let mut monitor = GenerationMonitor::new();
    monitor.update(backend.generation_status()?);
    // Progress is optional; older backends lack the endpoint.
    match backend.progress() {
        Ok(progress) => monitor.update_progress(progress),
        Err(e) => tracing::debug!("no progress: {e}"),
    }

    println!("Status: {}", monitor.summary());
    let status = monitor.status();
    if let Some(node) = &status.current_node {
        println!("Current node: {node}");
    }
    if !status.processed_nodes.is_empty() {
        let done: Vec<String> = status.processed_nodes.iter().map(ToString::to_string).collect();
        println!("Processed: {}", done.join(", "));
    }
    if let Some(message) = &status.message {
        println!("Message: {message}");
    }

    let workers = backend.workers().unwrap_or_default();
    if !workers.is_empty() {
        println!();
        println!("Workers:");
        for worker in workers {
            let progress = worker.progress.map(|p| format!(" {p:.0}%")).unwrap_or_default();
            let task = worker.task.as_deref().unwrap_or("");
            println!("  {:8} {:10} {}{}", worker.id, worker.status, task, progress);
        }
    }
    Ok(())
}
