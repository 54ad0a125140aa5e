use eframe::egui::{self, CursorIcon, InputState, Key, PointerButton, Pos2, Rect, Ui, Vec2};

use super::super::ViewModel;

const NUDGE_STEP: f32 = 40.0;

/// Arrow keys pan the view; the content moves opposite to the key.
fn arrow_nudge(input: &InputState) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if input.key_down(Key::ArrowLeft) {
        direction.x += 1.0;
    }
    if input.key_down(Key::ArrowRight) {
        direction.x -= 1.0;
    }
    if input.key_down(Key::ArrowUp) {
        direction.y += 1.0;
    }
    if input.key_down(Key::ArrowDown) {
        direction.y -= 1.0;
    }
    direction * NUDGE_STEP
}

/// Pointer position relative to the graph rect, if it lies inside it.
fn local(rect: Rect, point: Option<Pos2>) -> Option<Vec2> {
    point.filter(|point| rect.contains(*point)).map(|point| point - rect.min)
}

impl ViewModel {
    /// Routes wheel, drag and hover input into the network. Ctrl/Cmd + drag
    /// pans; a plain drag starting on a node moves that node.
    pub(in crate::app) fn handle_network_input(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let Some(network) = self.network.as_mut() else {
            return;
        };

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                // egui scrolls up with positive y; wheel zoom expects the opposite.
                network.zoom_by_wheel(-scroll);
            }
        }

        if !ui.ctx().wants_keyboard_input() {
            let nudge = ui.input(arrow_nudge);
            if nudge != Vec2::ZERO {
                network.nudge_view(nudge);
            }
            if ui.input(|input| input.key_pressed(Key::Home)) {
                network.focus_center_node();
            }
        }

        let (pointer, press_origin, modifiers) = ui.input(|input| {
            (
                input.pointer.hover_pos(),
                input.pointer.press_origin(),
                input.modifiers,
            )
        });
        let pointer = local(rect, pointer);

        if response.drag_started_by(PointerButton::Primary)
            && let Some(start) = local(rect, press_origin)
        {
            if modifiers.command || modifiers.ctrl {
                network.begin_pan(start);
            } else {
                network.begin_drag(start);
            }
        }

        if response.dragged_by(PointerButton::Primary)
            && let Some(point) = pointer
        {
            if network.is_panning() {
                network.pan_to(point);
            } else {
                network.drag_to(point);
            }
        }

        if response.drag_stopped() {
            network.end_pan();
            network.end_drag();
        }

        let hovering = if network.is_panning() {
            false
        } else {
            network.hover_at(pointer)
        };

        if network.is_panning() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if hovering || network.dragging().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn pointer_is_made_rect_local() {
        let rect = Rect::from_min_size(pos2(280.0, 40.0), vec2(800.0, 600.0));
        assert_eq!(local(rect, Some(pos2(300.0, 50.0))), Some(vec2(20.0, 10.0)));
        assert_eq!(local(rect, Some(pos2(10.0, 50.0))), None);
        assert_eq!(local(rect, None), None);
    }
}
