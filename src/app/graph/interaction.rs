use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use super::super::{Gesture, GraphNode, GraphScene, InteractionController, Viewport};

pub(in crate::app) const MIN_ZOOM: f32 = 0.1;
pub(in crate::app) const MAX_ZOOM: f32 = 5.0;
const AUTO_FIT_PADDING: f32 = 50.0;
const ZOOM_OUT_FACTOR: f32 = 0.9;
const ZOOM_IN_FACTOR: f32 = 1.1;

impl Viewport {
    fn new() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }

    pub(in crate::app) fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.pan) / self.zoom
    }

    pub(in crate::app) fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.pan + (world * self.zoom)
    }

    fn clamped(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

impl InteractionController {
    pub(in crate::app) fn new() -> Self {
        Self {
            viewport: Viewport::new(),
            overrides: HashMap::new(),
            gesture: Gesture::Idle,
            hovered: None,
            selected: None,
        }
    }

    pub(in crate::app) fn dragging_id(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Dragging { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    pub(in crate::app) fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Topmost-first hit test: later nodes draw above earlier ones, so they
    /// win ties. Distances are measured in world space against half the node
    /// size.
    pub(in crate::app) fn hit_test<'a>(
        &self,
        scene: &'a GraphScene,
        screen: Vec2,
    ) -> Option<&'a GraphNode> {
        let world = self.viewport.screen_to_world(screen);
        scene
            .nodes
            .iter()
            .rev()
            .find(|node| (node.pos - world).length() <= node.radius())
    }

    pub(in crate::app) fn update_hover(&mut self, scene: &GraphScene, screen: Option<Vec2>) {
        self.hovered = screen
            .and_then(|point| self.hit_test(scene, point))
            .map(|node| node.id.clone());
    }

    /// A press on a node starts a drag, anywhere else starts a pan; the two
    /// are mutually exclusive by construction.
    pub(in crate::app) fn on_pointer_down(&mut self, scene: &GraphScene, screen: Vec2) {
        self.gesture = match self.hit_test(scene, screen) {
            Some(node) => Gesture::Dragging {
                node_id: node.id.clone(),
                origin: node.pos,
                last: screen,
                moved: false,
            },
            None => Gesture::Panning {
                last: screen,
                moved: false,
            },
        };
    }

    /// Advance the active gesture. Returns true when a node override changed
    /// and the scene needs a rebuild.
    pub(in crate::app) fn on_pointer_move(&mut self, screen: Vec2) -> bool {
        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Panning { last, moved } => {
                let delta = screen - *last;
                if delta == Vec2::ZERO {
                    return false;
                }
                *last = screen;
                *moved = true;
                // Pan is screen-space: the delta is applied unscaled.
                self.viewport.pan += delta;
                false
            }
            Gesture::Dragging {
                node_id,
                origin,
                last,
                moved,
            } => {
                let delta = screen - *last;
                if delta == Vec2::ZERO {
                    return false;
                }
                *last = screen;
                *moved = true;
                let world_delta = delta / self.viewport.zoom;
                // The entry is created on the first movement, seeded from the
                // grabbed node's position so the drag is continuous; a plain
                // click never touches the store.
                let entry = self.overrides.entry(node_id.clone()).or_insert(*origin);
                *entry += world_delta;
                true
            }
        }
    }

    /// A gesture that never moved is a click; a click on a node toggles its
    /// selection.
    pub(in crate::app) fn on_pointer_up(&mut self) {
        if let Gesture::Dragging {
            node_id,
            moved: false,
            ..
        } = &self.gesture
        {
            let clicked = node_id.clone();
            self.selected = if self.selected.as_deref() == Some(clicked.as_str()) {
                None
            } else {
                Some(clicked)
            };
        }
        self.gesture = Gesture::Idle;
    }

    pub(in crate::app) fn on_pointer_left(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Zoom toward the cursor: the world point under it stays put. A positive
    /// delta (wheel down) zooms out.
    pub(in crate::app) fn on_wheel(&mut self, screen: Vec2, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }

        let factor = if delta_y > 0.0 {
            ZOOM_OUT_FACTOR
        } else {
            ZOOM_IN_FACTOR
        };
        let new_zoom = self.viewport.clamped(self.viewport.zoom * factor);
        let world = self.viewport.screen_to_world(screen);

        self.viewport.zoom = new_zoom;
        self.viewport.pan = screen - (world * new_zoom);
    }

    pub(in crate::app) fn on_double_click(&mut self) {
        self.reset_view();
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.viewport.pan = Vec2::ZERO;
        self.viewport.zoom = 1.0;
    }

    /// Frame every node: bounding box over node extents plus padding, zoomed
    /// to fit and centered in the viewport.
    pub(in crate::app) fn auto_fit(&mut self, scene: &GraphScene, viewport_size: Vec2) {
        if scene.nodes.is_empty() || viewport_size.x <= 0.0 || viewport_size.y <= 0.0 {
            return;
        }

        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for node in &scene.nodes {
            let half = vec2(node.radius(), node.radius());
            min = min.min(node.pos - half);
            max = max.max(node.pos + half);
        }

        let content = max - min;
        let center = (min + max) / 2.0;
        let fit = ((viewport_size.x - (AUTO_FIT_PADDING * 2.0)) / content.x)
            .min((viewport_size.y - (AUTO_FIT_PADDING * 2.0)) / content.y);

        self.viewport.zoom = self.viewport.clamped(fit);
        self.viewport.pan = (viewport_size / 2.0) - (center * self.viewport.zoom);
    }

    pub(in crate::app) fn clear_overrides(&mut self) -> bool {
        if self.overrides.is_empty() {
            return false;
        }
        self.overrides.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use eframe::egui::Color32;

    use super::super::super::NodeKind;
    use super::*;

    fn node(id: &str, x: f32, y: f32, size: f32) -> GraphNode {
        GraphNode {
            id: id.to_owned(),
            kind: NodeKind::Sentence { record_index: 0 },
            pos: vec2(x, y),
            size,
            color: Color32::WHITE,
            is_hovered: false,
            is_dragging: false,
        }
    }

    fn scene(nodes: Vec<GraphNode>) -> GraphScene {
        GraphScene {
            nodes,
            edges: Vec::new(),
        }
    }

    #[test]
    fn zoom_stays_clamped_through_any_wheel_sequence() {
        let mut controller = InteractionController::new();
        let cursor = vec2(300.0, 200.0);

        for _ in 0..100 {
            controller.on_wheel(cursor, -1.0);
            assert!(controller.viewport.zoom <= MAX_ZOOM);
            assert!(controller.viewport.zoom >= MIN_ZOOM);
        }
        assert_relative_eq!(controller.viewport.zoom, MAX_ZOOM);

        for _ in 0..200 {
            controller.on_wheel(cursor, 1.0);
            assert!(controller.viewport.zoom <= MAX_ZOOM);
            assert!(controller.viewport.zoom >= MIN_ZOOM);
        }
        assert_relative_eq!(controller.viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn wheel_keeps_the_world_point_under_the_cursor() {
        let mut controller = InteractionController::new();
        controller.viewport.pan = vec2(37.0, -12.0);
        controller.viewport.zoom = 1.7;

        let cursor = vec2(420.0, 260.0);
        let world_before = controller.viewport.screen_to_world(cursor);

        controller.on_wheel(cursor, 1.0);
        let world_after = controller.viewport.screen_to_world(cursor);
        assert_relative_eq!(world_before.x, world_after.x, epsilon = 1e-3);
        assert_relative_eq!(world_before.y, world_after.y, epsilon = 1e-3);

        controller.on_wheel(cursor, -1.0);
        let world_again = controller.viewport.screen_to_world(cursor);
        assert_relative_eq!(world_before.x, world_again.x, epsilon = 1e-3);
        assert_relative_eq!(world_before.y, world_again.y, epsilon = 1e-3);
    }

    #[test]
    fn hit_test_prefers_the_topmost_node() {
        let scene = scene(vec![
            node("below", 0.0, 0.0, 40.0),
            node("above", 5.0, 0.0, 40.0),
        ]);
        let controller = InteractionController::new();

        let hit = controller.hit_test(&scene, vec2(2.0, 0.0)).unwrap();
        assert_eq!(hit.id, "above");

        assert!(controller.hit_test(&scene, vec2(100.0, 100.0)).is_none());
    }

    #[test]
    fn hit_test_accounts_for_pan_and_zoom() {
        let scene = scene(vec![node("target", 50.0, 50.0, 20.0)]);
        let mut controller = InteractionController::new();
        controller.viewport.pan = vec2(100.0, 40.0);
        controller.viewport.zoom = 2.0;

        // screen = pan + world * zoom = (200, 140)
        let hit = controller.hit_test(&scene, vec2(200.0, 140.0)).unwrap();
        assert_eq!(hit.id, "target");

        // More than size / 2 away in world space.
        assert!(controller.hit_test(&scene, vec2(230.0, 140.0)).is_none());
    }

    #[test]
    fn pan_applies_raw_screen_deltas() {
        let scene = scene(vec![node("far", 1000.0, 1000.0, 20.0)]);
        let mut controller = InteractionController::new();
        controller.viewport.zoom = 2.0;

        controller.on_pointer_down(&scene, vec2(10.0, 10.0));
        assert!(controller.dragging_id().is_none());

        controller.on_pointer_move(vec2(15.0, 17.0));
        assert_eq!(controller.viewport.pan, vec2(5.0, 7.0));

        controller.on_pointer_move(vec2(15.0, 10.0));
        assert_eq!(controller.viewport.pan, vec2(5.0, 0.0));

        controller.on_pointer_up();
        assert!(!controller.is_gesture_active());
        assert!(controller.overrides.is_empty());
    }

    #[test]
    fn drag_moves_only_the_grabbed_override_by_world_delta() {
        let scene = scene(vec![
            node("still", -200.0, 0.0, 30.0),
            node("grabbed", 10.0, 0.0, 20.0),
        ]);
        let mut controller = InteractionController::new();
        controller.viewport.zoom = 2.0;

        // screen position of "grabbed": pan 0 + (10, 0) * 2 = (20, 0)
        controller.on_pointer_down(&scene, vec2(20.0, 0.0));
        assert_eq!(controller.dragging_id(), Some("grabbed"));
        // Nothing is stored until the pointer actually moves.
        assert!(controller.overrides.is_empty());

        let rebuilt = controller.on_pointer_move(vec2(24.0, 6.0));
        assert!(rebuilt);
        assert_eq!(controller.overrides["grabbed"], vec2(12.0, 3.0));
        assert_eq!(controller.overrides.len(), 1);
        // Pan is untouched while dragging.
        assert_eq!(controller.viewport.pan, Vec2::ZERO);

        controller.on_pointer_up();
        assert_eq!(controller.overrides["grabbed"], vec2(12.0, 3.0));
    }

    #[test]
    fn click_without_movement_toggles_selection() {
        let scene = scene(vec![node("target", 0.0, 0.0, 40.0)]);
        let mut controller = InteractionController::new();

        controller.on_pointer_down(&scene, vec2(0.0, 0.0));
        controller.on_pointer_up();
        assert_eq!(controller.selected.as_deref(), Some("target"));

        controller.on_pointer_down(&scene, vec2(0.0, 0.0));
        controller.on_pointer_up();
        assert_eq!(controller.selected, None);

        // Clicks never create override entries.
        assert!(controller.overrides.is_empty());
    }

    #[test]
    fn a_moved_gesture_is_not_a_click() {
        let scene = scene(vec![node("target", 0.0, 0.0, 40.0)]);
        let mut controller = InteractionController::new();

        controller.on_pointer_down(&scene, vec2(0.0, 0.0));
        controller.on_pointer_move(vec2(6.0, 0.0));
        controller.on_pointer_up();
        assert_eq!(controller.selected, None);

        // Panning over empty space never touches the selection either.
        controller.selected = Some("target".to_owned());
        controller.on_pointer_down(&scene, vec2(500.0, 500.0));
        controller.on_pointer_up();
        assert_eq!(controller.selected.as_deref(), Some("target"));
    }

    #[test]
    fn pointer_leaving_ends_the_gesture_without_click_semantics() {
        let scene = scene(vec![node("target", 0.0, 0.0, 40.0)]);
        let mut controller = InteractionController::new();

        controller.on_pointer_down(&scene, vec2(0.0, 0.0));
        controller.on_pointer_left();
        assert!(!controller.is_gesture_active());
        assert_eq!(controller.selected, None);
    }

    #[test]
    fn double_click_hard_resets_the_viewport() {
        let scene = scene(vec![node("far", 1000.0, 1000.0, 20.0)]);
        let mut controller = InteractionController::new();

        controller.on_wheel(vec2(100.0, 100.0), -1.0);
        controller.on_pointer_down(&scene, vec2(0.0, 0.0));
        controller.on_pointer_move(vec2(40.0, 40.0));
        controller.on_pointer_up();
        assert_ne!(controller.viewport.pan, Vec2::ZERO);

        controller.on_double_click();
        assert_eq!(controller.viewport.pan, Vec2::ZERO);
        assert_eq!(controller.viewport.zoom, 1.0);
    }

    #[test]
    fn auto_fit_centers_a_single_node_and_bounds_zoom() {
        let scene = scene(vec![node("only", 100.0, 50.0, 400.0)]);
        let mut controller = InteractionController::new();
        let viewport_size = vec2(800.0, 600.0);

        controller.auto_fit(&scene, viewport_size);

        // min((800 - 100) / 400, (600 - 100) / 400) = 1.25
        assert_relative_eq!(controller.viewport.zoom, 1.25);

        let screen = controller.viewport.world_to_screen(vec2(100.0, 50.0));
        assert_relative_eq!(screen.x, 400.0, epsilon = 1e-3);
        assert_relative_eq!(screen.y, 300.0, epsilon = 1e-3);
    }

    #[test]
    fn auto_fit_clamps_to_the_zoom_bounds() {
        let scene = scene(vec![node("tiny", 0.0, 0.0, 4.0)]);
        let mut controller = InteractionController::new();

        controller.auto_fit(&scene, vec2(800.0, 600.0));
        assert_relative_eq!(controller.viewport.zoom, MAX_ZOOM);

        // The node center still maps to the viewport center.
        let screen = controller.viewport.world_to_screen(Vec2::ZERO);
        assert_relative_eq!(screen.x, 400.0);
        assert_relative_eq!(screen.y, 300.0);
    }

    #[test]
    fn auto_fit_ignores_empty_scenes_and_degenerate_viewports() {
        let mut controller = InteractionController::new();
        controller.auto_fit(&scene(Vec::new()), vec2(800.0, 600.0));
        assert_eq!(controller.viewport.zoom, 1.0);
        assert_eq!(controller.viewport.pan, Vec2::ZERO);

        let populated = scene(vec![node("only", 0.0, 0.0, 40.0)]);
        controller.auto_fit(&populated, vec2(0.0, 600.0));
        assert_eq!(controller.viewport.zoom, 1.0);
    }

    #[test]
    fn clear_overrides_reports_whether_anything_was_dropped() {
        let scene = scene(vec![node("target", 0.0, 0.0, 40.0)]);
        let mut controller = InteractionController::new();

        assert!(!controller.clear_overrides());

        controller.on_pointer_down(&scene, vec2(0.0, 0.0));
        controller.on_pointer_move(vec2(5.0, 5.0));
        controller.on_pointer_up();
        assert!(controller.clear_overrides());
        assert!(controller.overrides.is_empty());
    }

    #[test]
    fn update_hover_tracks_the_pointer() {
        let nodes = scene(vec![node("target", 0.0, 0.0, 40.0)]);
        let mut controller = InteractionController::new();

        controller.update_hover(&nodes, Some(vec2(3.0, 3.0)));
        assert_eq!(controller.hovered.as_deref(), Some("target"));

        controller.update_hover(&nodes, Some(vec2(300.0, 300.0)));
        assert_eq!(controller.hovered, None);

        controller.update_hover(&nodes, None);
        assert_eq!(controller.hovered, None);
    }

    #[test]
    fn viewport_transforms_roundtrip() {
        let viewport = Viewport {
            pan: vec2(120.0, -40.0),
            zoom: 2.5,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        };

        let world = vec2(-33.0, 71.0);
        let roundtrip = viewport.screen_to_world(viewport.world_to_screen(world));
        assert_relative_eq!(roundtrip.x, world.x, epsilon = 1e-4);
        assert_relative_eq!(roundtrip.y, world.y, epsilon = 1e-4);
    }
}
