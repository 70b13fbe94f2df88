use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Color32, Context, Vec2};

use crate::memory::{self, Category, MemoryArchive};

mod graph;
mod render_utils;
mod ui;

pub struct MemographApp {
    archive_path: String,
    state: AppState,
    reload_rx: Option<Receiver<Result<MemoryArchive, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<MemoryArchive, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    archive: MemoryArchive,
    search: String,
    category_filter: Option<Category>,
    ranking_mode: RankingMode,
    controller: InteractionController,
    scene: Option<GraphScene>,
    scene_dirty: bool,
    scene_revision: u64,
    auto_fit_pending: bool,
    node_count: usize,
    edge_count: usize,
    visible_node_count: usize,
    visible_edge_count: usize,
    ranking_rows_visible: usize,
    related_rows_visible: usize,
    related_cache: Option<RelatedCache>,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RankingMode {
    Importance,
    Confidence,
}

#[derive(Clone, Debug)]
struct GraphScene {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphScene {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

#[derive(Clone, Debug)]
struct GraphNode {
    id: String,
    kind: NodeKind,
    pos: Vec2,
    size: f32,
    color: Color32,
    is_hovered: bool,
    is_dragging: bool,
}

impl GraphNode {
    fn radius(&self) -> f32 {
        self.size / 2.0
    }
}

#[derive(Clone, Copy, Debug)]
enum NodeKind {
    Root {
        member_count: usize,
    },
    Category {
        category: Category,
        member_count: usize,
    },
    Sentence {
        record_index: usize,
    },
}

#[derive(Clone, Debug)]
struct GraphEdge {
    id: String,
    source: String,
    target: String,
    similarity: f32,
    kind: EdgeKind,
    visual: EdgeVisual,
    color: Color32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeKind {
    RootCategory,
    CategorySentence,
    SentenceSentence,
    SearchHighlight,
}

#[derive(Clone, Copy, Debug)]
struct EdgeVisual {
    opacity: f32,
    thickness: f32,
    glow: f32,
}

#[derive(Clone, Copy, Debug)]
struct Viewport {
    pan: Vec2,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

#[derive(Clone, Debug)]
enum Gesture {
    Idle,
    Panning {
        last: Vec2,
        moved: bool,
    },
    Dragging {
        node_id: String,
        origin: Vec2,
        last: Vec2,
        moved: bool,
    },
}

struct InteractionController {
    viewport: Viewport,
    overrides: HashMap<String, Vec2>,
    gesture: Gesture,
    hovered: Option<String>,
    selected: Option<String>,
}

struct RelatedCache {
    selected_id: String,
    scene_revision: u64,
    entries: Vec<RelatedEntry>,
}

#[derive(Clone, Copy)]
struct RelatedEntry {
    record_index: usize,
    similarity: f32,
}

impl MemographApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, archive_path: String) -> Self {
        let state = Self::start_load(archive_path.clone());
        Self {
            archive_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(archive_path: String) -> Receiver<Result<MemoryArchive, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = memory::load_archive(&archive_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(archive_path: String) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(archive_path),
        }
    }
}

impl eframe::App for MemographApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(archive) => AppState::Ready(Box::new(ViewModel::new(archive))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading memory archive...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load memory archive");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.archive_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.archive_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.archive_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(archive) => AppState::Ready(Box::new(ViewModel::new(archive))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
