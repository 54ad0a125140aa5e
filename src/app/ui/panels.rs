use std::collections::{HashMap, VecDeque};

use eframe::egui::{self, Align, Context, Layout, RichText, Ui};
use tracing::{info, warn};

use crate::network::graphics::FrameCounts;
use crate::network::node::Node;
use crate::network::{ConnectionType, EdgeRef, Lifecycle, NodeRef, PeopleNetwork};
use crate::physics::DEFAULT_STEP_MS;

use super::super::{LaunchConfig, LoadedNetwork, ViewModel};

const TEST_NODE_ID: &str = "212";
const TEST_EDGE_SOURCE: &str = "1";

impl ViewModel {
    pub(in crate::app) fn new(loaded: LoadedNetwork, config: &LaunchConfig) -> Self {
        Self {
            data: loaded.data,
            portraits: loaded.portraits,
            settings: config.settings,
            grow_in: config.grow_in,
            network: None,
            network_error: None,
            textures: HashMap::new(),
            search: String::new(),
            search_match_cache: None,
            hook_status: None,
            frame_counts: FrameCounts::default(),
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("people network");
                    ui.separator();
                    ui.label(self.lifecycle_text());
                    if let Some(network) = &self.network {
                        ui.label(format!("nodes: {}", network.graphics().node_count()));
                        ui.label(format!("edges: {}", network.graphics().edge_count()));
                    }
                    if let Some(network) = self.network.as_mut()
                        && ui
                            .add_enabled(!network.is_focusing(), egui::Button::new("Focus you"))
                            .on_hover_text("Home")
                            .clicked()
                    {
                        network.focus_center_node();
                    }
                    if ui.button("Restart").clicked() {
                        self.destroy_network();
                    }
                    if ui.button("Reload data").clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.fps_display_text());
                        ui.label(format!(
                            "visible: {} nodes / {} edges",
                            self.frame_counts.visible_nodes, self.frame_counts.visible_edges
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    fn lifecycle_text(&self) -> String {
        if self.network_error.is_some() {
            return "failed".to_owned();
        }
        match self.network.as_ref().map(|network| network.lifecycle()) {
            None => "starting".to_owned(),
            Some(Lifecycle::Constructed) => "constructed".to_owned(),
            Some(Lifecycle::Awakening) => "attaching...".to_owned(),
            Some(Lifecycle::Running) => "running".to_owned(),
            Some(Lifecycle::Destroyed) => "destroyed".to_owned(),
        }
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Search");
        ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("label"));
        if let Some(cache) = &self.search_match_cache
            && !cache.query.is_empty()
        {
            ui.label(format!("{} matching", cache.matches.len()));
        }

        ui.separator();
        ui.heading("Settings");
        ui.label(format!("incremental attach: {}", self.settings.incremental_attach));
        ui.label(format!("bind physics: {}", self.settings.bind_physics));
        ui.label(format!("incremental bind: {}", self.settings.incremental_bind));
        ui.label(format!("attach delay: {} ms", self.settings.attach_delay.as_millis()));

        if let Some(network) = self.network.as_mut() {
            let running = network.is_physics_running();
            ui.horizontal(|ui| {
                let toggle = if running { "Pause physics" } else { "Resume physics" };
                if ui.button(toggle).clicked() {
                    if running {
                        network.pause_physics();
                    } else {
                        network.resume_physics();
                    }
                }
                if ui.add_enabled(!running, egui::Button::new("Step")).clicked() {
                    network.step_physics(DEFAULT_STEP_MS);
                }
            });
        }

        if let Some(network) = &self.network {
            ui.label(format!("grow in: {}", network.has_animation_started()));
            if let Some((nodes, edges)) = network.attach_progress() {
                ui.label(format!("attached: {nodes} nodes / {edges} edges"));
            }

            ui.separator();
            ui.heading("View");
            let viewport = network.graphics().viewport();
            let screen = viewport.screen_size();
            ui.label(format!("canvas: {:.0} x {:.0}", screen.x, screen.y));
            ui.label(format!("zoom: {:.2}", viewport.scale()));
            ui.label(format!("offset: {:.0}, {:.0}", viewport.offset().x, viewport.offset().y));
            ui.label(format!("bodies: {}", network.dynamics().body_count()));
            ui.label(format!("constraints: {}", network.dynamics().constraint_count()));
            if let Some(hovered) = network.hovered().and_then(|id| network.graphics().node(id)) {
                ui.separator();
                ui.heading("Hovered");
                Self::draw_node_inspector(ui, network, hovered);
            }
            if let Some(err) = network.attach_error() {
                ui.label(RichText::new(format!("attach: {err}")).color(ui.visuals().warn_fg_color));
            }
        }

        ui.separator();
        ui.heading("Test hooks");
        let ready = self
            .network
            .as_ref()
            .is_some_and(|network| network.is_network_setup());
        ui.add_enabled_ui(ready, |ui| {
            if ui.button("Add test node").clicked() {
                self.run_hook("add node", |network| {
                    network.add_node(NodeRef::new(TEST_NODE_ID, "Test", ConnectionType::Family))
                });
            }
            if ui.button("Add test edge").clicked() {
                self.run_hook("add edge", |network| {
                    network.add_edge(EdgeRef::new(
                        TEST_NODE_ID,
                        TEST_EDGE_SOURCE,
                        TEST_NODE_ID,
                        ConnectionType::Family,
                    ))
                });
            }
            if ui.button("Remove test node").clicked() {
                self.run_hook("remove node", |network| network.remove_node(TEST_NODE_ID));
            }
        });
        if let Some(status) = &self.hook_status {
            ui.label(status.as_str());
        }

        if let Some(error) = &self.network_error {
            ui.separator();
            ui.label(RichText::new(error.as_str()).color(ui.visuals().error_fg_color));
        }
    }

    fn draw_node_inspector(ui: &mut Ui, network: &PeopleNetwork, node: &Node) {
        let dragging = if node.is_dragging() { " (dragging)" } else { "" };
        ui.label(format!("{} ({}){dragging}", node.label(), node.connection_type()));
        if let Some(body) = network.dynamics().body_state(node.id()) {
            let kind = if body.is_static { "static" } else { "dynamic" };
            ui.label(format!("body: {kind}, speed {:.2}", body.velocity.length()));
        }
        for edge in network.graphics().edges().filter(|edge| edge.touches(node.id())) {
            let other = if edge.source() == node.id() { edge.target() } else { edge.source() };
            let other = network.graphics().node(other).map_or(other, Node::label);
            match network.dynamics().constraint_state(edge.id()) {
                Some(constraint) => {
                    ui.label(format!(
                        "-> {other} ({}), rest {:.0}",
                        edge.connection_type(),
                        constraint.params.length
                    ));
                }
                None => {
                    ui.label(format!("-> {other} ({})", edge.connection_type()));
                }
            }
        }
    }

    fn run_hook(
        &mut self,
        name: &str,
        hook: impl FnOnce(&mut PeopleNetwork) -> crate::network::Result<()>,
    ) {
        let Some(network) = self.network.as_mut() else {
            return;
        };
        self.hook_status = Some(match hook(network) {
            Ok(()) => {
                info!(hook = name, "test hook applied");
                format!("{name}: ok")
            }
            Err(err) => {
                warn!(hook = name, %err, "test hook failed");
                format!("{name}: {err}")
            }
        });
    }

    /// Tears the network down; the next frame builds a fresh one.
    pub(in crate::app) fn destroy_network(&mut self) {
        if let Some(mut network) = self.network.take() {
            network.destroy();
        }
        self.network_error = None;
        self.search_match_cache = None;
        self.hook_status = None;
        self.textures.clear();
        self.frame_counts = FrameCounts::default();
    }
}
