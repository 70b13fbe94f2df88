use eframe::egui::{self, Align, Layout, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::ellipsize;

use super::super::{RankingMode, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search memories").on_hover_text(
            "Highlight matching memories with an accent edge from the source node.",
        );
        let search_response = ui.text_edit_singleline(&mut self.search);
        if search_response.changed() {
            self.scene_dirty = true;
        }

        ui.separator();

        ui.label("Category filter")
            .on_hover_text("Rebuild the graph from memories of a single category.");
        let mut filter_changed = false;
        ui.horizontal_wrapped(|ui| {
            filter_changed |= ui
                .selectable_value(&mut self.category_filter, None, "All")
                .changed();
            for (category, count) in self.archive.category_counts() {
                filter_changed |= ui
                    .selectable_value(
                        &mut self.category_filter,
                        Some(category),
                        format!("{} ({count})", category.label()),
                    )
                    .changed();
            }
        });
        if filter_changed {
            self.scene_dirty = true;
            self.auto_fit_pending = true;
        }

        ui.separator();

        ui.horizontal(|ui| {
            if ui
                .button("Fit view")
                .on_hover_text("Frame every node in the viewport.")
                .clicked()
            {
                self.auto_fit_pending = true;
            }
            if ui
                .button("Reset view")
                .on_hover_text("Return to the origin at 1x zoom.")
                .clicked()
            {
                self.controller.reset_view();
            }
            if ui
                .button("Reset layout")
                .on_hover_text("Forget every dragged node position.")
                .clicked()
                && self.controller.clear_overrides()
            {
                self.scene_dirty = true;
            }
        });

        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.separator();

        egui::CollapsingHeader::new("Memory rankings")
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.ranking_mode, RankingMode::Importance, "Importance")
                        .on_hover_text("Memories with the highest layout importance.");
                    ui.selectable_value(&mut self.ranking_mode, RankingMode::Confidence, "Confidence")
                        .on_hover_text("Memories the extraction pipeline was most confident about.");
                });
                ui.add_space(6.0);
                self.draw_memory_ranking(ui);
            });
    }

    fn draw_memory_ranking(&mut self, ui: &mut Ui) {
        let query = self.search.trim();
        let matcher = SkimMatcherV2::default();

        let mut ranked = self
            .archive
            .memories
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                query.is_empty() || matcher.fuzzy_match(&record.sentence, query).is_some()
            })
            .map(|(index, record)| {
                let value = match self.ranking_mode {
                    RankingMode::Importance => record.importance(),
                    RankingMode::Confidence => record.confidence,
                };
                (index, value)
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.archive.memories[a.0].id.cmp(&self.archive.memories[b.0].id))
        });

        let row_total = ranked.len();
        let row_count = row_total.min(self.ranking_rows_visible);
        let mut should_load_more = false;
        let mut selected_id = None;

        egui::ScrollArea::vertical()
            .id_salt("memory_ranking_scroll")
            .max_height(260.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, row_count, |ui, row_range| {
                if row_range.end + Self::RANKING_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }

                for index in row_range {
                    let Some(&(record_index, value)) = ranked.get(index) else {
                        continue;
                    };
                    let Some(record) = self.archive.memories.get(record_index) else {
                        continue;
                    };

                    let is_selected =
                        self.controller.selected.as_deref() == Some(record.id.as_str());

                    let row_response = ui
                        .horizontal(|ui| {
                            let clicked = ui
                                .selectable_label(is_selected, ellipsize(&record.sentence, 40).as_ref())
                                .on_hover_text(record.sentence.as_str())
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(format!("{value:.2}"));
                            });
                            clicked
                        })
                        .inner;

                    if row_response {
                        selected_id = Some(record.id.clone());
                    }
                }
            });

        if let Some(id) = selected_id {
            self.set_selected(Some(id));
        }

        if should_load_more && row_count < row_total {
            self.ranking_rows_visible = (row_count + Self::RANKING_PAGE_ROWS).min(row_total);
        }
    }
}
