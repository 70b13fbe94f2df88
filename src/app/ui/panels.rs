use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout};

use crate::memory::MemoryArchive;

use super::super::{InteractionController, RankingMode, ViewModel};

impl ViewModel {
    pub(in crate::app) const INITIAL_RANKING_ROWS: usize = 20;
    pub(in crate::app) const RANKING_PAGE_ROWS: usize = 20;
    pub(in crate::app) const RANKING_PREFETCH_MARGIN: usize = 4;
    pub(in crate::app) const INITIAL_RELATED_ROWS: usize = 16;
    pub(in crate::app) const RELATED_PAGE_ROWS: usize = 16;
    pub(in crate::app) const RELATED_PREFETCH_MARGIN: usize = 4;

    pub(in crate::app) fn new(archive: MemoryArchive) -> Self {
        Self {
            archive,
            search: String::new(),
            category_filter: None,
            ranking_mode: RankingMode::Importance,
            controller: InteractionController::new(),
            scene: None,
            scene_dirty: true,
            scene_revision: 0,
            auto_fit_pending: true,
            node_count: 0,
            edge_count: 0,
            visible_node_count: 0,
            visible_edge_count: 0,
            ranking_rows_visible: Self::INITIAL_RANKING_ROWS,
            related_rows_visible: Self::INITIAL_RELATED_ROWS,
            related_cache: None,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        archive_path: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);
        if self.scene_dirty {
            self.rebuild_scene();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("memograph");
                    ui.separator();
                    ui.label(format!("source: {}", self.archive.source_id));
                    ui.label(format!("index: {}", self.archive.index_id));
                    ui.label(format!("memories: {}", self.archive.record_count()));
                    ui.label(format!("archive: {archive_path}"));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload archive"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(visible_text) = self.visible_graph_text() {
                            ui.label(visible_text);
                        }
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading memory archive...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.controller.selected == selected {
            return;
        }

        self.controller.selected = selected;
        self.related_rows_visible = Self::INITIAL_RELATED_ROWS;
        self.related_cache = None;
    }
}
