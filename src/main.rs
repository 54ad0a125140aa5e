mod app;
mod network;
mod physics;
mod position;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::{LaunchConfig, Preset};
use crate::network::NetworkSettings;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Network data as JSON. Falls back to the built-in preset.
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Preset::Example)]
    preset: Preset,

    /// Reveal the network edge by edge.
    #[arg(long)]
    incremental_attach: bool,

    /// Share position storage with the physics bodies instead of copying.
    #[arg(long)]
    bind_physics: bool,

    /// Bind entities as they attach rather than once attachment ends.
    #[arg(long)]
    incremental_bind: bool,

    #[arg(long, default_value_t = 100)]
    attach_delay_ms: u64,

    /// Directory of portrait images.
    #[arg(long)]
    portraits: Option<PathBuf>,

    /// Fixed spawn seed.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    #[arg(long, default_value_t = 800.0)]
    height: f32,

    /// Show nodes at full size immediately.
    #[arg(long)]
    no_grow_in: bool,
}

impl Args {
    fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            data_path: self.data.clone(),
            preset: self.preset,
            portraits_dir: self.portraits.clone(),
            settings: NetworkSettings {
                incremental_attach: self.incremental_attach,
                incremental_bind: self.incremental_bind,
                bind_physics: self.bind_physics,
                attach_delay: Duration::from_millis(self.attach_delay_ms),
                seed: self.seed,
            },
            grow_in: !self.no_grow_in,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("people_network=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn main() -> eframe::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.launch_config();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([args.width, args.height]),
        ..Default::default()
    };

    eframe::run_native(
        "people-network",
        options,
        Box::new(move |cc| Ok(Box::new(app::PeopleNetworkApp::new(cc, config)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_settings() {
        let args = Args::try_parse_from([
            "people-network",
            "--preset",
            "simple",
            "--incremental-attach",
            "--bind-physics",
            "--attach-delay-ms",
            "0",
            "--no-grow-in",
        ])
        .expect("valid flags");
        let config = args.launch_config();

        assert_eq!(config.preset, Preset::Simple);
        assert!(config.settings.incremental_attach);
        assert!(config.settings.bind_physics);
        assert!(!config.settings.incremental_bind);
        assert_eq!(config.settings.attach_delay, Duration::ZERO);
        assert!(!config.grow_in);
        assert!(config.data_path.is_none());
    }
}
