//! Pure rendering of a sequencer state into draw commands.
//!
//! [`render`] never touches a real surface; the UI walks the returned
//! [`Scene`] and paints it. The moving marker is returned separately because
//! it depends on time, not on the discrete sequencer state.

use std::f32::consts::{PI, TAU};
use glam::Vec2;
use crate::catalog::{Catalog, Node, Step};
use crate::sequencer::SequencerState;

pub const BACKGROUND: [u8; 3] = [18, 20, 26];
pub const TRANSITION_COLOR: [u8; 3] = [230, 230, 240];

/// Seconds for one marker traversal
pub const MARKER_PERIOD: f32 = 1.6;

/// Screen-space rectangle the scene is laid out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Surface {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Maps a normalized catalog position into the surface.
    pub fn map(&self, p: Vec2) -> Vec2 {
        self.origin + p * self.size
    }

    pub fn node_radius(&self) -> f32 {
        (self.size.x.min(self.size.y) * 0.07).clamp(12.0, 48.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Clear {
        color: [u8; 3],
    },
    Node {
        center: Vec2,
        radius: f32,
        color: [u8; 3],
        label: String,
    },
    Arrow {
        from: Vec2,
        to: Vec2,
        color: [u8; 3],
    },
    SelfLoop {
        center: Vec2,
        radius: f32,
        color: [u8; 3],
    },
    Label {
        anchor: Vec2,
        text: String,
        color: [u8; 3],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerPath {
    Line { from: Vec2, to: Vec2 },
    Loop { center: Vec2, radius: f32 },
}

/// Animated dot for the active step, identified by the step ordinal so the
/// owner can restart its clock whenever the step changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub step: usize,
    pub path: MarkerPath,
    pub period: f32,
}

impl Marker {
    /// Position `t` seconds after the marker started.
    pub fn position(&self, t: f32) -> Vec2 {
        let phase = (t / self.period).rem_euclid(1.0);
        match self.path {
            MarkerPath::Line { from, to } => from.lerp(to, phase),
            MarkerPath::Loop { center, radius } => {
                // Swing back and forth along the loop, never completing it.
                let angle = PI + 0.8 * PI * (TAU * phase).sin();
                center + radius * Vec2::new(angle.sin(), angle.cos())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub shapes: Vec<Shape>,
    pub marker: Option<Marker>,
}

pub fn render(catalog: &Catalog, state: &SequencerState, surface: Surface) -> Scene {
    let radius = surface.node_radius();
    let mut shapes = vec![Shape::Clear { color: BACKGROUND }];

    for node in catalog.nodes() {
        shapes.push(Shape::Node {
            center: surface.map(node.position),
            radius,
            color: node.color,
            label: node.label.clone(),
        });
    }

    let marker = catalog.step_at(state.cursor).and_then(|step| {
        let source = catalog.node(&step.source)?;
        let target = catalog.node(&step.target)?;
        Some(transition(step, source, target, surface, radius, &mut shapes))
    });

    Scene { shapes, marker }
}

fn transition(
    step: &Step,
    source: &Node,
    target: &Node,
    surface: Surface,
    node_radius: f32,
    shapes: &mut Vec<Shape>,
) -> Marker {
    let from = surface.map(source.position);
    let to = surface.map(target.position);

    let path = if step.is_self_loop() {
        let loop_radius = node_radius * 0.9;
        let center = from - Vec2::new(0.0, node_radius + loop_radius * 0.6);
        shapes.push(Shape::SelfLoop {
            center,
            radius: loop_radius,
            color: TRANSITION_COLOR,
        });
        shapes.push(Shape::Label {
            anchor: center - Vec2::new(0.0, loop_radius + 14.0),
            text: step.title.clone(),
            color: TRANSITION_COLOR,
        });
        MarkerPath::Loop {
            center,
            radius: loop_radius,
        }
    } else {
        let dir = (to - from).normalize_or_zero();
        let (from, to) = (from + dir * node_radius, to - dir * node_radius);
        shapes.push(Shape::Arrow {
            from,
            to,
            color: TRANSITION_COLOR,
        });
        shapes.push(Shape::Label {
            anchor: from.lerp(to, 0.5) - Vec2::new(0.0, 18.0),
            text: step.title.clone(),
            color: TRANSITION_COLOR,
        });
        MarkerPath::Line { from, to }
    };

    Marker {
        step: step.ordinal,
        path,
        period: MARKER_PERIOD,
    }
}
