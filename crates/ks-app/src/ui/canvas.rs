use egui::{Color32, FontId, Painter, Pos2, Stroke};
use glam::Vec2;
use ks_core::scene::{Scene, Shape};

const ARROW_HEAD: f32 = 12.0;
const STROKE_WIDTH: f32 = 2.0;
const MARKER_RADIUS: f32 = 6.0;

fn pos(v: Vec2) -> Pos2 {
    Pos2::new(v.x, v.y)
}

fn color([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// Paints every static shape of the scene, then the marker at `marker_t`
/// seconds into its cycle.
pub fn paint_scene(painter: &Painter, scene: &Scene, marker_t: f32) {
    for shape in &scene.shapes {
        match shape {
            Shape::Clear { color: c } => {
                painter.rect_filled(painter.clip_rect(), 0.0, color(*c));
            }
            Shape::Node { center, radius, color: c, label } => {
                painter.circle(pos(*center), *radius, color(*c), Stroke::new(STROKE_WIDTH, Color32::WHITE));
                painter.text(
                    pos(*center + Vec2::new(0.0, radius + 14.0)),
                    egui::Align2::CENTER_TOP,
                    label,
                    FontId::proportional(14.0),
                    Color32::WHITE,
                );
            }
            Shape::Arrow { from, to, color: c } => {
                paint_arrow(painter, *from, *to, color(*c));
            }
            Shape::SelfLoop { center, radius, color: c } => {
                painter.circle_stroke(pos(*center), *radius, Stroke::new(STROKE_WIDTH, color(*c)));
            }
            Shape::Label { anchor, text, color: c } => {
                painter.text(
                    pos(*anchor),
                    egui::Align2::CENTER_BOTTOM,
                    text,
                    FontId::proportional(13.0),
                    color(*c),
                );
            }
        }
    }

    if let Some(marker) = &scene.marker {
        painter.circle_filled(pos(marker.position(marker_t)), MARKER_RADIUS, Color32::from_rgb(255, 200, 60));
    }
}

fn paint_arrow(painter: &Painter, from: Vec2, to: Vec2, c: Color32) {
    let stroke = Stroke::new(STROKE_WIDTH, c);
    painter.line_segment([pos(from), pos(to)], stroke);

    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return;
    }
    let back = to - dir * ARROW_HEAD;
    let side = dir.perp() * (ARROW_HEAD * 0.5);
    painter.add(egui::Shape::convex_polygon(
        vec![pos(to), pos(back + side), pos(back - side)],
        c,
        Stroke::NONE,
    ));
}
