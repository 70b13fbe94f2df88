use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::Vec2;

use crate::memory::{
    Category, MemoryRecord, blend_similarity, metadata_similarity, semantic_similarity_between,
};

use super::super::render_utils::{
    CATEGORY_NODE_SIZE, ROOT_COLOR, ROOT_NODE_SIZE, category_color, edge_color, sentence_size,
};
use super::super::{EdgeKind, EdgeVisual, GraphEdge, GraphNode, GraphScene, NodeKind, ViewModel};

const CATEGORY_RING_RADIUS: f32 = 350.0;
const SENTENCE_CLUSTER_RADIUS: f32 = 200.0;
const MIN_SENTENCE_DISTANCE: f32 = 60.0;
const SIMILARITY_THRESHOLD: f32 = 0.6;
const RELAXATION_PASSES: usize = 3;

pub(in crate::app) struct SceneParams<'a> {
    pub(in crate::app) records: &'a [MemoryRecord],
    pub(in crate::app) source_id: &'a str,
    pub(in crate::app) search: &'a str,
    pub(in crate::app) category_filter: Option<Category>,
    pub(in crate::app) overrides: &'a HashMap<String, Vec2>,
    pub(in crate::app) dragging_id: Option<&'a str>,
}

impl EdgeVisual {
    fn from_similarity(similarity: f32) -> Self {
        let similarity = similarity.clamp(0.0, 1.0);
        Self {
            opacity: 0.1 + (similarity * 0.7),
            thickness: 1.0 + (similarity * 3.0),
            glow: similarity * 0.6,
        }
    }

    fn search_highlight() -> Self {
        Self {
            opacity: 0.9,
            thickness: 3.0,
            glow: 0.8,
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn rebuild_scene(&mut self) {
        let scene = build_scene(&SceneParams {
            records: &self.archive.memories,
            source_id: &self.archive.source_id,
            search: &self.search,
            category_filter: self.category_filter,
            overrides: &self.controller.overrides,
            dragging_id: self.controller.dragging_id(),
        });

        self.scene_revision = self.scene_revision.wrapping_add(1);
        self.node_count = scene.nodes.len();
        self.edge_count = scene.edges.len();
        self.scene = Some(scene);
        self.scene_dirty = false;
    }
}

/// Deterministic scene construction: the same inputs always produce the same
/// node ids and coordinates, so overrides and selection stay attached to the
/// same logical entities across rebuilds.
pub(in crate::app) fn build_scene(params: &SceneParams<'_>) -> GraphScene {
    let filtered = params
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            params
                .category_filter
                .is_none_or(|filter| record.category() == filter)
        })
        .collect::<Vec<_>>();

    if filtered.is_empty() {
        return GraphScene::empty();
    }

    // Group in first-seen record order so category ring slots are stable.
    let mut groups: Vec<(Category, Vec<usize>)> = Vec::new();
    for (position, (_, record)) in filtered.iter().enumerate() {
        let category = record.category();
        match groups.iter_mut().find(|(existing, _)| *existing == category) {
            Some((_, members)) => members.push(position),
            None => groups.push((category, vec![position])),
        }
    }

    let mut nodes = Vec::with_capacity(1 + groups.len() + filtered.len());
    let mut edges = Vec::new();

    let root_id = format!("source-{}", params.source_id);
    let root_pos = params
        .overrides
        .get(&root_id)
        .copied()
        .unwrap_or(Vec2::ZERO);
    nodes.push(GraphNode {
        id: root_id.clone(),
        kind: NodeKind::Root {
            member_count: filtered.len(),
        },
        pos: root_pos,
        size: ROOT_NODE_SIZE,
        color: ROOT_COLOR,
        is_hovered: false,
        is_dragging: params.dragging_id == Some(root_id.as_str()),
    });

    let mut category_centers = Vec::with_capacity(groups.len());
    for (index, (category, members)) in groups.iter().enumerate() {
        let category_id = format!("category-{}", category.label());
        let angle = (index as f32 / groups.len() as f32) * TAU;
        let ring_pos = root_pos + (Vec2::angled(angle) * CATEGORY_RING_RADIUS);
        let pos = params
            .overrides
            .get(&category_id)
            .copied()
            .unwrap_or(ring_pos);
        let weight = (members.len() as f32 / 10.0).min(1.0);

        edges.push(GraphEdge {
            id: format!("root-category-{}", category.label()),
            source: root_id.clone(),
            target: category_id.clone(),
            similarity: weight,
            kind: EdgeKind::RootCategory,
            visual: EdgeVisual::from_similarity(weight),
            color: edge_color(EdgeKind::RootCategory, weight),
        });

        nodes.push(GraphNode {
            id: category_id.clone(),
            kind: NodeKind::Category {
                category: *category,
                member_count: members.len(),
            },
            pos,
            size: CATEGORY_NODE_SIZE,
            color: category_color(*category),
            is_hovered: false,
            is_dragging: params.dragging_id == Some(category_id.as_str()),
        });
        category_centers.push(pos);
    }

    let sentence_start = nodes.len();
    let mut sentence_records = Vec::with_capacity(filtered.len());
    for ((category, members), center) in groups.iter().zip(&category_centers) {
        let category_id = format!("category-{}", category.label());
        for (member_index, &position) in members.iter().enumerate() {
            let (record_index, record) = filtered[position];
            let importance = record.importance();

            // Two full turns across the member set spreads members that would
            // otherwise share a ray; three radius bands break up the ring.
            let angle = (member_index as f32 / members.len() as f32) * (2.0 * TAU);
            let band = SENTENCE_CLUSTER_RADIUS * (0.3 + ((member_index % 3) as f32 * 0.3));
            let computed = *center + (Vec2::angled(angle) * band);
            let pos = params
                .overrides
                .get(&record.id)
                .copied()
                .unwrap_or(computed);

            edges.push(GraphEdge {
                id: format!("category-sentence-{category_id}-{}", record.id),
                source: category_id.clone(),
                target: record.id.clone(),
                similarity: importance,
                kind: EdgeKind::CategorySentence,
                visual: EdgeVisual::from_similarity(importance),
                color: edge_color(EdgeKind::CategorySentence, importance),
            });

            nodes.push(GraphNode {
                id: record.id.clone(),
                kind: NodeKind::Sentence { record_index },
                pos,
                size: sentence_size(&record.sentence, importance),
                color: category_color(*category),
                is_hovered: false,
                is_dragging: params.dragging_id == Some(record.id.as_str()),
            });
            sentence_records.push(record);
        }
    }

    // Exhaustive pairwise scoring; embeddings are parsed once per record. A
    // record whose embedding fails to parse scores 0 against everything and
    // never clears the threshold, but keeps its structural edges.
    let embeddings = sentence_records
        .iter()
        .map(|record| record.embedding_values())
        .collect::<Vec<_>>();

    for i in 0..sentence_records.len() {
        for j in (i + 1)..sentence_records.len() {
            let semantic =
                semantic_similarity_between(embeddings[i].as_deref(), embeddings[j].as_deref());
            let similarity = blend_similarity(
                semantic,
                metadata_similarity(sentence_records[i], sentence_records[j]),
            );

            if similarity > SIMILARITY_THRESHOLD {
                edges.push(GraphEdge {
                    id: format!(
                        "similarity-{}-{}",
                        sentence_records[i].id, sentence_records[j].id
                    ),
                    source: sentence_records[i].id.clone(),
                    target: sentence_records[j].id.clone(),
                    similarity,
                    kind: EdgeKind::SentenceSentence,
                    visual: EdgeVisual::from_similarity(similarity),
                    color: edge_color(EdgeKind::SentenceSentence, similarity),
                });
            }
        }
    }

    // Search never removes nodes; it only adds accent edges from the root.
    let query = params.search.trim().to_lowercase();
    if !query.is_empty() {
        for record in &sentence_records {
            if record.sentence.to_lowercase().contains(&query) {
                edges.push(GraphEdge {
                    id: format!("search-{root_id}-{}", record.id),
                    source: root_id.clone(),
                    target: record.id.clone(),
                    similarity: 1.0,
                    kind: EdgeKind::SearchHighlight,
                    visual: EdgeVisual::search_highlight(),
                    color: edge_color(EdgeKind::SearchHighlight, 1.0),
                });
            }
        }
    }

    relax_collisions(&mut nodes[sentence_start..]);

    GraphScene { nodes, edges }
}

/// Cheap declutter pass over the sentence cluster, not a physical simulation:
/// order-dependent, deterministic, and not required to converge. Coincident
/// pairs use a separating distance of 1 so nothing divides by zero.
fn relax_collisions(nodes: &mut [GraphNode]) {
    for _ in 0..RELAXATION_PASSES {
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let delta = nodes[j].pos - nodes[i].pos;
                let length = delta.length();
                let distance = if length > 0.0 { length } else { 1.0 };
                if distance >= MIN_SENTENCE_DISTANCE {
                    continue;
                }

                let nudge = (delta / distance) * ((MIN_SENTENCE_DISTANCE - distance) / 4.0);
                nodes[i].pos -= nudge;
                nodes[j].pos += nudge;
            }
        }
    }
}
