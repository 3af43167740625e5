//! Settings inspection commands.

use clap::{Args, Subcommand};

use glitchlamp_client::{Backend, RetryPolicy, bridge};

use super::common;

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the stored settings as JSON
    Show,

    /// Print the effect chain the settings describe
    Chain,
}

pub fn run(backend: &dyn Backend, args: SettingsArgs) -> anyhow::Result<()> {
    match args.command {
        SettingsCommand::Show => {
            let settings = backend.settings()?;
            println!("{}", settings.to_json_pretty()?);
        }
        SettingsCommand::Chain => {
            let registry = common::registry(backend)?;
            let (settings, chain) = bridge::load_chain(backend, &registry, RetryPolicy::default())?;
            let playback = settings.playback();
            println!("Chain ({} nodes):", chain.len());
            common::print_nodes(&chain.to_wire());
            println!();
            println!(
                "Clip: {} s (±{} s), quality {}, speed {}x",
                playback.duration,
                playback.duration_variation,
                playback.video_quality,
                playback.playback_speed
            );
        }
    }
    Ok(())
}
