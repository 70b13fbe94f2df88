use std::collections::{HashMap, HashSet};

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, vec2};

use crate::memory::parse_timestamp;
use crate::util::{ellipsize, format_seconds};

use super::super::render_utils::{
    SEARCH_ACCENT, SELECTION_COLOR, TEXT_PRIMARY, TEXT_SECONDARY, blend_color, circle_visible,
    dim_color, draw_background, edge_visible,
};
use super::super::{EdgeKind, NodeKind, ViewModel};

impl ViewModel {
    /// Central canvas: feeds raw pointer input into the interaction
    /// controller, then paints the scene the builder produced. No layout or
    /// similarity decisions are made here.
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.scene_dirty {
            self.rebuild_scene();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.auto_fit_pending && rect.width() > 0.0 && rect.height() > 0.0 {
            if let Some(scene) = &self.scene {
                self.controller.auto_fit(scene, rect.size());
            }
            self.auto_fit_pending = false;
        }

        let pointer = ui
            .input(|input| input.pointer.latest_pos())
            .map(|position| position - rect.left_top());
        let (primary_pressed, primary_released, pointer_present) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.has_pointer(),
            )
        });
        let scroll = ui.input(|input| input.raw_scroll_delta.y);

        if response.double_clicked() {
            self.controller.on_double_click();
        }

        if let Some(scene) = &self.scene {
            if let Some(point) = pointer {
                if response.hovered() && scroll.abs() > f32::EPSILON {
                    // egui's scroll sign is inverted relative to wheel deltaY.
                    self.controller.on_wheel(point, -scroll);
                }
                if primary_pressed && response.hovered() {
                    self.controller.on_pointer_down(scene, point);
                }
                if self.controller.on_pointer_move(point) {
                    self.scene_dirty = true;
                }
            }
            if primary_released {
                self.controller.on_pointer_up();
            }
            if !pointer_present {
                self.controller.on_pointer_left();
            }
            self.controller
                .update_hover(scene, pointer.filter(|_| response.hovered()));
        }

        // A drag changed an override; rebuild before painting this frame.
        if self.scene_dirty {
            self.rebuild_scene();
        }

        let viewport = self.controller.viewport;
        draw_background(&painter, rect, viewport.pan, viewport.zoom);

        let Some(scene) = &self.scene else {
            return;
        };

        if scene.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No memories match the current filters.",
                FontId::proportional(14.0),
                TEXT_SECONDARY,
            );
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        }

        let to_screen =
            |world: eframe::egui::Vec2| rect.left_top() + viewport.world_to_screen(world);
        let screen_positions = scene
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), to_screen(node.pos)))
            .collect::<HashMap<_, _>>();

        let hovered_id = self.controller.hovered.as_deref();
        let selected_id = self.controller.selected.as_deref();

        let mut visible_edge_count = 0usize;
        for edge in &scene.edges {
            let (Some(&start), Some(&end)) = (
                screen_positions.get(edge.source.as_str()),
                screen_positions.get(edge.target.as_str()),
            ) else {
                continue;
            };

            if !edge_visible(rect, start, end, 4.0) {
                continue;
            }

            let thickness = (edge.visual.thickness * viewport.zoom).max(0.4);
            if edge.visual.glow > 0.0 {
                let glow_alpha = (edge.visual.glow * edge.visual.opacity * 160.0) as u8;
                painter.line_segment(
                    [start, end],
                    Stroke::new(
                        thickness + (3.0 * viewport.zoom.min(1.5)),
                        Color32::from_rgba_unmultiplied(
                            edge.color.r(),
                            edge.color.g(),
                            edge.color.b(),
                            glow_alpha,
                        ),
                    ),
                );
            }

            let alpha = (edge.visual.opacity * 255.0) as u8;
            painter.line_segment(
                [start, end],
                Stroke::new(
                    thickness,
                    Color32::from_rgba_unmultiplied(
                        edge.color.r(),
                        edge.color.g(),
                        edge.color.b(),
                        alpha,
                    ),
                ),
            );
            visible_edge_count += 1;

            // Annotate the selected node's links with their strength.
            let touches_selection = selected_id
                .is_some_and(|id| edge.source.as_str() == id || edge.target.as_str() == id);
            if touches_selection && viewport.zoom > 0.8 {
                let midpoint = start + ((end - start) * 0.5);
                painter.text(
                    midpoint,
                    Align2::CENTER_CENTER,
                    format!("{:.2}", edge.similarity),
                    FontId::proportional(10.0),
                    TEXT_SECONDARY,
                );
            }
        }
        self.visible_edge_count = visible_edge_count;

        let search_targets = scene
            .edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::SearchHighlight)
            .map(|edge| edge.target.as_str())
            .collect::<HashSet<_>>();
        let search_active = !self.search.trim().is_empty();

        let mut visible_node_count = 0usize;
        for node in &scene.nodes {
            let position = to_screen(node.pos);
            let radius = node.radius() * viewport.zoom;
            if !circle_visible(rect, position, radius) {
                continue;
            }
            visible_node_count += 1;

            let is_hovered = node.is_hovered || hovered_id == Some(node.id.as_str());
            let is_selected = selected_id == Some(node.id.as_str());
            let is_search_match = search_targets.contains(node.id.as_str());

            let mut fill = node.color;
            if is_hovered {
                fill = blend_color(fill, Color32::WHITE, 0.25);
            } else if search_active
                && !is_search_match
                && matches!(node.kind, NodeKind::Sentence { .. })
            {
                fill = dim_color(fill, 0.45);
            }

            let stroke_color = if is_search_match {
                SEARCH_ACCENT
            } else if is_selected {
                SELECTION_COLOR
            } else {
                Color32::from_rgba_unmultiplied(15, 15, 15, 190)
            };
            let stroke_width = if node.is_dragging {
                4.0
            } else if is_search_match || is_selected {
                3.0
            } else {
                2.0
            };
            let stroke = Stroke::new(stroke_width, stroke_color);

            match node.kind {
                NodeKind::Root { member_count } => {
                    painter.circle_filled(position, radius, fill);
                    painter.circle_stroke(position, radius, stroke);
                    if radius > 14.0 {
                        painter.text(
                            position + vec2(0.0, -6.0),
                            Align2::CENTER_CENTER,
                            "Source",
                            FontId::proportional(12.0),
                            TEXT_PRIMARY,
                        );
                        painter.text(
                            position + vec2(0.0, 8.0),
                            Align2::CENTER_CENTER,
                            format!("{member_count} memories"),
                            FontId::proportional(10.0),
                            TEXT_SECONDARY,
                        );
                    }
                }
                NodeKind::Category {
                    category,
                    member_count,
                } => {
                    let corner = 8.0 * viewport.zoom.min(1.5);
                    let node_rect = Rect::from_center_size(position, vec2(radius, radius) * 2.0);
                    painter.rect_filled(node_rect, corner, fill);
                    painter.rect_stroke(node_rect, corner, stroke, egui::StrokeKind::Inside);
                    if radius > 10.0 {
                        painter.text(
                            position + vec2(0.0, -5.0),
                            Align2::CENTER_CENTER,
                            category.label(),
                            FontId::proportional(10.0),
                            TEXT_PRIMARY,
                        );
                        painter.text(
                            position + vec2(0.0, 8.0),
                            Align2::CENTER_CENTER,
                            member_count.to_string(),
                            FontId::proportional(9.0),
                            TEXT_SECONDARY,
                        );
                    }
                }
                NodeKind::Sentence { record_index } => {
                    painter.circle_filled(position, radius, fill);
                    painter.circle_stroke(position, radius, stroke);

                    let show_label = is_hovered
                        || is_selected
                        || (is_search_match && viewport.zoom > 0.35)
                        || viewport.zoom > 1.35;
                    if show_label && let Some(record) = self.archive.memories.get(record_index) {
                        painter.text(
                            position + vec2(radius + 5.0, 0.0),
                            Align2::LEFT_CENTER,
                            ellipsize(&record.sentence, 42),
                            FontId::proportional(12.0),
                            Color32::from_gray(238),
                        );
                    }
                }
            }

            if is_selected {
                painter.circle_stroke(position, radius + 5.0, Stroke::new(1.5, SELECTION_COLOR));
            }
        }
        self.visible_node_count = visible_node_count;

        if hovered_id.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if let Some(node) = hovered_id.and_then(|id| scene.node(id)) {
            let status = match node.kind {
                NodeKind::Root { member_count } => {
                    format!("{}  |  {member_count} memories", self.archive.source_id)
                }
                NodeKind::Category {
                    category,
                    member_count,
                } => format!("{}  |  {member_count} memories", category.label()),
                NodeKind::Sentence { record_index } => self
                    .archive
                    .memories
                    .get(record_index)
                    .map(|record| {
                        let mut parts = vec![
                            ellipsize(&record.sentence, 72).into_owned(),
                            record.category().label().to_owned(),
                        ];
                        if let Some(seconds) = record
                            .metadata
                            .timestamp
                            .as_deref()
                            .and_then(parse_timestamp)
                        {
                            parts.push(format_seconds(seconds));
                        }
                        parts.join("  |  ")
                    })
                    .unwrap_or_default(),
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                status,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.controller.is_gesture_active() {
            ui.ctx().request_repaint();
        }
    }
}
