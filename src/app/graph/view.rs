use std::time::Instant;

use eframe::egui::{Align2, Color32, FontId, Sense, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::error;

use crate::network::PeopleNetwork;
use crate::network::node::Node;
use crate::network::portrait::PortraitLoader;
use crate::physics::SpringWorld;

use super::super::render_utils::{EguiSurface, draw_background};
use super::super::{SearchMatchCache, ViewModel};

/// Frames longer than this are treated as a stall rather than simulated.
const MAX_FRAME_MS: f32 = 100.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn matching_nodes<'a>(nodes: impl Iterator<Item = &'a Node>, query: &str) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    nodes
        .filter(|node| fuzzy_match_score(&matcher, node.label(), query).is_some())
        .map(|node| node.id().to_owned())
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        if self.network.is_none() && self.network_error.is_none() {
            self.build_network(rect.size());
        }
        if let Some(message) = &self.network_error
            && self.network.is_none()
        {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(18.0),
                Color32::LIGHT_RED,
            );
            return;
        }

        self.handle_network_input(ui, rect, &response);
        self.apply_search();

        let frame_ms = (ui.input(|input| input.stable_dt) * 1000.0).min(MAX_FRAME_MS);
        let Some(network) = self.network.as_mut() else {
            return;
        };
        network.set_screen_size(rect.size());
        match network.update(frame_ms, Instant::now()) {
            Ok(counts) => self.frame_counts = counts,
            Err(err) => {
                error!(%err, "network update failed");
                self.network_error = Some(err.to_string());
                self.network = None;
                return;
            }
        }

        let mut surface = EguiSurface::new(&painter, rect.min.to_vec2(), &mut self.textures);
        network.draw(&mut surface);
        ui.ctx().request_repaint();
    }

    /// Builds the network for a graph rect of `size`, growing from its center.
    fn build_network(&mut self, size: eframe::egui::Vec2) {
        let mut network = PeopleNetwork::new(
            self.data.clone(),
            size,
            size * 0.5,
            Box::new(SpringWorld::default()),
            PortraitLoader::new(self.portraits.clone()),
            self.settings,
        );

        match network.awake(Instant::now()) {
            Ok(()) => {
                if self.grow_in {
                    network.setup();
                } else {
                    network.show_full_size();
                }
                self.network = Some(network);
            }
            Err(err) => {
                error!(%err, "network failed to start");
                network.destroy();
                self.network_error = Some(err.to_string());
            }
        }
    }

    fn apply_search(&mut self) {
        let Some(network) = self.network.as_mut() else {
            return;
        };

        let query = self.search.trim();
        let node_count = network.graphics().node_count();
        if let Some(cached) = &self.search_match_cache
            && cached.query == query
            && cached.node_count == node_count
        {
            return;
        }

        let matches = if query.is_empty() {
            Vec::new()
        } else {
            matching_nodes(network.graphics().nodes(), query)
        };
        network.set_emphasized(matches.iter().map(String::as_str));
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            node_count,
            matches,
        });
    }
}
