use eframe::egui::{self, RichText, Ui};

use crate::memory::{combined_similarity, parse_timestamp};
use crate::util::{ellipsize, format_seconds};

use super::super::{NodeKind, RelatedCache, RelatedEntry, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Memory Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.controller.selected.clone() else {
            ui.label("Select a node from the graph or the rankings.");
            return;
        };

        let Some(kind) = self
            .scene
            .as_ref()
            .and_then(|scene| scene.node(&selected_id))
            .map(|node| node.kind)
        else {
            ui.label("The selected node is not part of the current graph.");
            return;
        };

        match kind {
            NodeKind::Root { member_count } => {
                ui.label(RichText::new(format!("Source {}", self.archive.source_id)).strong());
                ui.small(format!("index {}", self.archive.index_id));
                ui.add_space(6.0);
                ui.label(format!("Memories in scope: {member_count}"));
                ui.label(format!(
                    "Memories in archive: {}",
                    self.archive.record_count()
                ));
            }
            NodeKind::Category {
                category,
                member_count,
            } => {
                ui.label(RichText::new(category.label()).strong());
                ui.add_space(6.0);
                ui.label(format!("Member memories: {member_count}"));

                let members = self
                    .archive
                    .memories
                    .iter()
                    .filter(|record| record.category() == category)
                    .collect::<Vec<_>>();
                if !members.is_empty() {
                    let mean = members
                        .iter()
                        .map(|record| record.importance())
                        .sum::<f32>()
                        / members.len() as f32;
                    ui.label(format!("Mean importance: {mean:.2}"));
                }
            }
            NodeKind::Sentence { record_index } => {
                self.draw_memory_card(ui, record_index, &selected_id);
            }
        }
    }

    fn draw_memory_card(&mut self, ui: &mut Ui, record_index: usize, selected_id: &str) {
        let Some(record) = self.archive.memories.get(record_index) else {
            ui.label("The selected memory no longer exists in the archive.");
            return;
        };

        ui.label(RichText::new(record.sentence.as_str()).strong());
        ui.small(record.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Category: {}", record.category().label()));
        if let Some(timestamp) = record.metadata.timestamp.as_deref() {
            match parse_timestamp(timestamp) {
                Some(seconds) => {
                    ui.label(format!("Timestamp: {}", format_seconds(seconds)));
                }
                None => {
                    ui.label(format!("Timestamp: {timestamp} (unparsed)"));
                }
            }
        }
        if let Some(emotion) = record.metadata.emotion.as_deref() {
            ui.label(format!("Emotion: {emotion}"));
        }
        ui.label(format!("Importance: {:.2}", record.importance()));
        ui.label(format!("Confidence: {:.2}", record.confidence));
        if record.embedding_values().is_none() {
            ui.label("Embedding: missing or malformed");
        }

        ui.separator();
        ui.label(RichText::new("Related memories").strong());

        let entries = self.related_entries(selected_id, record_index);
        if entries.is_empty() {
            ui.label("No scored relations for this memory.");
            return;
        }

        let row_total = entries.len();
        let row_count = row_total.min(self.related_rows_visible);
        let mut should_load_more = false;
        let mut next_selected = None;

        egui::ScrollArea::vertical()
            .id_salt("related_memories_scroll")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, row_count, |ui, row_range| {
                if row_range.end + Self::RELATED_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }

                for index in row_range {
                    let Some(entry) = entries.get(index) else {
                        continue;
                    };
                    let Some(related) = self.archive.memories.get(entry.record_index) else {
                        continue;
                    };

                    let label = format!(
                        "{}  ({:.2})",
                        ellipsize(&related.sentence, 38),
                        entry.similarity
                    );
                    if ui
                        .link(label)
                        .on_hover_text(related.sentence.as_str())
                        .clicked()
                    {
                        next_selected = Some(related.id.clone());
                    }
                }
            });

        if let Some(id) = next_selected {
            self.set_selected(Some(id));
        }

        if should_load_more && row_count < row_total {
            self.related_rows_visible = (row_count + Self::RELATED_PAGE_ROWS).min(row_total);
        }
    }

    /// Related memories ranked by combined similarity, cached per selection
    /// and scene revision since the pairwise scan parses every embedding.
    fn related_entries(&mut self, selected_id: &str, record_index: usize) -> Vec<RelatedEntry> {
        if let Some(cache) = &self.related_cache
            && cache.selected_id == selected_id
            && cache.scene_revision == self.scene_revision
        {
            return cache.entries.clone();
        }

        let Some(record) = self.archive.memories.get(record_index) else {
            return Vec::new();
        };

        let mut entries = self
            .archive
            .memories
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != record_index)
            .map(|(index, other)| RelatedEntry {
                record_index: index,
                similarity: combined_similarity(record, other),
            })
            .filter(|entry| entry.similarity > 0.0)
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.record_index.cmp(&b.record_index))
        });

        self.related_cache = Some(RelatedCache {
            selected_id: selected_id.to_owned(),
            scene_revision: self.scene_revision,
            entries: entries.clone(),
        });

        entries
    }
}
