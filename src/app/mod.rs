use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, TextureHandle};
use tracing::info;

use crate::network::defaults::{example_network, simple_network};
use crate::network::graphics::FrameCounts;
use crate::network::portrait::{DirectoryPortraits, NoPortraits, PortraitSource};
use crate::network::{NetworkData, NetworkSettings, PeopleNetwork};

mod graph;
mod render_utils;
mod ui;

/// Built-in datasets used when no data file is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    #[default]
    Example,
    Simple,
}

impl Preset {
    fn data(self) -> NetworkData {
        match self {
            Self::Example => example_network(),
            Self::Simple => simple_network(),
        }
    }
}

/// Everything the app needs to (re)build a network.
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    pub data_path: Option<PathBuf>,
    pub preset: Preset,
    pub portraits_dir: Option<PathBuf>,
    pub settings: NetworkSettings,
    pub grow_in: bool,
}

pub struct PeopleNetworkApp {
    config: LaunchConfig,
    state: AppState,
}

struct LoadedNetwork {
    data: NetworkData,
    portraits: Arc<dyn PortraitSource>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedNetwork, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    data: NetworkData,
    portraits: Arc<dyn PortraitSource>,
    settings: NetworkSettings,
    grow_in: bool,
    /// Built on the first frame, once the graph rect size is known.
    network: Option<PeopleNetwork>,
    network_error: Option<String>,
    textures: HashMap<String, TextureHandle>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    hook_status: Option<String>,
    frame_counts: FrameCounts,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    node_count: usize,
    matches: Vec<String>,
}

impl PeopleNetworkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: LaunchConfig) -> Self {
        let state = Self::start_load(config.clone());
        Self { config, state }
    }

    fn spawn_load(config: LaunchConfig) -> Receiver<Result<LoadedNetwork, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_network(&config).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: LaunchConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }
}

fn load_network(config: &LaunchConfig) -> anyhow::Result<LoadedNetwork> {
    let data = match &config.data_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading network data from {}", path.display()))?;
            NetworkData::from_json(&raw)
                .with_context(|| format!("parsing network data from {}", path.display()))?
        }
        None => config.preset.data(),
    };

    let portraits: Arc<dyn PortraitSource> = match &config.portraits_dir {
        Some(dir) => Arc::new(
            DirectoryPortraits::scan(dir)
                .with_context(|| format!("scanning portraits in {}", dir.display()))?,
        ),
        None => Arc::new(NoPortraits),
    };

    info!(
        nodes = data.nodes.len(),
        edges = data.edges.len(),
        "network data loaded"
    );
    Ok(LoadedNetwork { data, portraits })
}

impl eframe::App for PeopleNetworkApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(loaded) => AppState::Ready(Box::new(ViewModel::new(loaded, &self.config))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading people network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the people network");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.config.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &mut reload_requested);
                if reload_requested {
                    model.destroy_network();
                    transition = Some(Self::start_load(self.config.clone()));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
