use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::memory::Category;

use super::EdgeKind;

pub(super) const ROOT_NODE_SIZE: f32 = 80.0;
pub(super) const CATEGORY_NODE_SIZE: f32 = 60.0;
pub(super) const SENTENCE_SIZE_MIN: f32 = 32.0;
pub(super) const SENTENCE_SIZE_MAX: f32 = 64.0;

pub(super) const ROOT_COLOR: Color32 = Color32::from_rgb(139, 92, 246);
pub(super) const SEARCH_ACCENT: Color32 = Color32::from_rgb(245, 158, 11);
pub(super) const SELECTION_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const TEXT_PRIMARY: Color32 = Color32::from_rgb(248, 250, 252);
pub(super) const TEXT_SECONDARY: Color32 = Color32::from_rgb(203, 213, 225);

const BACKGROUND_COLOR: Color32 = Color32::from_rgb(15, 20, 25);

pub(super) fn category_color(category: Category) -> Color32 {
    match category {
        Category::Topic => Color32::from_rgb(239, 68, 68),
        Category::Entity => Color32::from_rgb(59, 130, 246),
        Category::Action => Color32::from_rgb(16, 185, 129),
        Category::Dialogue => Color32::from_rgb(245, 158, 11),
        Category::Description => Color32::from_rgb(107, 114, 128),
        Category::Emotion => Color32::from_rgb(236, 72, 153),
        Category::Brand => Color32::from_rgb(220, 38, 38),
        Category::Setting => Color32::from_rgb(5, 150, 105),
    }
}

/// Sentence node diameter from text length and importance, bounded so a
/// single verbose memory cannot dominate the canvas.
pub(super) fn sentence_size(sentence: &str, importance: f32) -> f32 {
    let length_factor = (sentence.chars().count() as f32 / 100.0).min(1.0);
    let size = SENTENCE_SIZE_MIN + (length_factor * 16.0) + (importance * 16.0);
    size.clamp(SENTENCE_SIZE_MIN, SENTENCE_SIZE_MAX)
}

/// Edge stroke color: hue per edge kind, saturation and lightness scaled by
/// similarity so stronger links read brighter.
pub(super) fn edge_color(kind: EdgeKind, similarity: f32) -> Color32 {
    let hue = match kind {
        EdgeKind::RootCategory => 260.0,
        EdgeKind::CategorySentence => 200.0,
        EdgeKind::SentenceSentence => 280.0,
        EdgeKind::SearchHighlight => 45.0,
    };

    let similarity = similarity.clamp(0.0, 1.0);
    hsl_color(hue, 0.6 + (similarity * 0.4), 0.4 + (similarity * 0.3))
}

fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let chroma = (1.0 - ((2.0 * lightness) - 1.0).abs()) * saturation.clamp(0.0, 1.0);
    let sector = hue.rem_euclid(360.0) / 60.0;
    let secondary = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, secondary, 0.0),
        1 => (secondary, chroma, 0.0),
        2 => (0.0, chroma, secondary),
        3 => (0.0, secondary, chroma),
        4 => (secondary, 0.0, chroma),
        _ => (chroma, 0.0, secondary),
    };

    let offset = lightness - (chroma / 2.0);
    Color32::from_rgb(
        ((r + offset).clamp(0.0, 1.0) * 255.0) as u8,
        ((g + offset).clamp(0.0, 1.0) * 255.0) as u8,
        ((b + offset).clamp(0.0, 1.0) * 255.0) as u8,
    )
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, BACKGROUND_COLOR);

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.left_top() + pan;

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let a_min_x = a1.x.min(a2.x);
    let a_max_x = a1.x.max(a2.x);
    let a_min_y = a1.y.min(a2.y);
    let a_max_y = a1.y.max(a2.y);
    let b_min_x = b1.x.min(b2.x);
    let b_max_x = b1.x.max(b2.x);
    let b_min_y = b1.y.min(b2.y);
    let b_max_y = b1.y.max(b2.y);

    if a_max_x < b_min_x || b_max_x < a_min_x || a_max_y < b_min_y || b_max_y < a_min_y {
        return false;
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn sentence_size_stays_within_bounds() {
        assert_eq!(sentence_size("", 0.0), SENTENCE_SIZE_MIN);

        let long = "x".repeat(400);
        assert_eq!(sentence_size(&long, 1.0), SENTENCE_SIZE_MAX);

        let mid = sentence_size("a fifty character sentence about a harbor drone!!", 0.5);
        assert!(mid > SENTENCE_SIZE_MIN && mid < SENTENCE_SIZE_MAX);
    }

    #[test]
    fn hsl_primaries_convert_exactly() {
        assert_eq!(hsl_color(0.0, 1.0, 0.5), Color32::from_rgb(255, 0, 0));
        assert_eq!(hsl_color(120.0, 1.0, 0.5), Color32::from_rgb(0, 255, 0));
        assert_eq!(hsl_color(240.0, 1.0, 0.5), Color32::from_rgb(0, 0, 255));
        assert_eq!(hsl_color(0.0, 0.0, 1.0), Color32::from_rgb(255, 255, 255));
    }

    #[test]
    fn stronger_edges_are_brighter() {
        let weak = edge_color(EdgeKind::SentenceSentence, 0.0);
        let strong = edge_color(EdgeKind::SentenceSentence, 1.0);
        let luminance = |color: Color32| {
            (color.r() as u32) + (color.g() as u32) + (color.b() as u32)
        };
        assert!(luminance(strong) > luminance(weak));
    }

    #[test]
    fn edge_visibility_culls_far_segments() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));

        assert!(edge_visible(rect, pos2(10.0, 10.0), pos2(90.0, 90.0), 0.0));
        // Crosses the rect without either endpoint inside.
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(200.0, 200.0), pos2(300.0, 250.0), 0.0));
    }
}
