use egui::{Color32, Context, Key, RichText, Sense};
use glam::Vec2;
use ks_core::scene::{self, Surface};
use crate::ui::canvas::paint_scene;
use crate::ui::{UiComponent, UiContext, UiEvent, View};

/// Step list, transport controls and the animated diagram.
#[derive(Default)]
pub struct SequencerPanel {
    // Step the marker is animating and when it started.
    marker_clock: Option<(usize, f64)>,
}

impl SequencerPanel {
    fn handle_shortcuts(&self, ctx: &Context, ui_ctx: &UiContext) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let shortcuts = [
            (Key::ArrowRight, UiEvent::NextStep),
            (Key::ArrowLeft, UiEvent::PrevStep),
            (Key::Space, UiEvent::TogglePlay),
            (Key::Home, UiEvent::ResetSteps),
        ];
        for (key, event) in shortcuts {
            if ctx.input(|i| i.key_pressed(key)) {
                ui_ctx.send_event(event);
            }
        }
    }

    fn show_steps(&self, ctx: &Context, ui_ctx: &UiContext) {
        let state = ui_ctx.sequencer;
        let catalog = &ui_ctx.catalog;

        egui::SidePanel::right("sequencer_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("Handshake");
                ui.separator();

                match catalog.step_at(state.cursor) {
                    None => {
                        ui.label(RichText::new("No step selected").color(Color32::GRAY));
                        ui.label(
                            RichText::new("Press ▶ or → to walk through the exchange.")
                                .small()
                                .color(Color32::GRAY)
                        );
                    }
                    Some(step) => {
                        ui.label(
                            RichText::new(format!("Step {} of {}", step.ordinal, catalog.len()))
                                .small()
                                .color(Color32::LIGHT_BLUE)
                        );
                        ui.label(RichText::new(&step.title).strong().size(16.0));
                        ui.add_space(4.0);
                        ui.label(&step.description);
                    }
                }

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.add_enabled(state.cursor > 0, egui::Button::new("⏮ Prev")).clicked() {
                        ui_ctx.send_event(UiEvent::PrevStep);
                    }

                    let play_label = if state.playing { "⏸ Pause" } else { "▶ Play" };
                    if ui.add_enabled(state.playing || state.cursor < catalog.len(), egui::Button::new(play_label)).clicked() {
                        ui_ctx.send_event(UiEvent::TogglePlay);
                    }

                    if ui.add_enabled(state.cursor < catalog.len(), egui::Button::new("Next ⏭")).clicked() {
                        ui_ctx.send_event(UiEvent::NextStep);
                    }

                    if ui.button("⟲ Reset").clicked() {
                        ui_ctx.send_event(UiEvent::ResetSteps);
                    }
                });

                ui.add_space(10.0);
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for step in catalog.steps() {
                        let current = step.ordinal == state.cursor;
                        let color = if current {
                            Color32::YELLOW
                        } else if step.ordinal < state.cursor {
                            Color32::GRAY
                        } else {
                            Color32::WHITE
                        };
                        ui.label(RichText::new(format!("{}. {}", step.ordinal, step.title)).color(color));
                    }
                });

                ui.separator();
                ui.label(
                    RichText::new("← → step · Space play/pause · Home reset")
                        .small()
                        .color(Color32::GRAY)
                );
            });
    }

    fn show_canvas(&mut self, ctx: &Context, ui_ctx: &UiContext) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
                let rect = response.rect;
                let surface = Surface::new(
                    Vec2::new(rect.min.x, rect.min.y),
                    Vec2::new(rect.width(), rect.height()),
                );

                let scene = scene::render(&ui_ctx.catalog, &ui_ctx.sequencer, surface);
                let now = ctx.input(|i| i.time);

                self.marker_clock = match (scene.marker, self.marker_clock) {
                    (Some(marker), Some((step, start))) if marker.step == step => Some((step, start)),
                    (Some(marker), _) => Some((marker.step, now)),
                    (None, _) => None,
                };

                let t = self.marker_clock.map(|(_, start)| (now - start) as f32).unwrap_or_default();
                paint_scene(&painter, &scene, t);

                if self.marker_clock.is_some() {
                    ctx.request_repaint();
                }
            });
    }
}

impl UiComponent for SequencerPanel {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext) {
        if ui_ctx.active_view != View::Visualizer {
            self.marker_clock = None;
            return;
        }

        self.handle_shortcuts(ctx, ui_ctx);
        self.show_steps(ctx, ui_ctx);
        self.show_canvas(ctx, ui_ctx);
    }
}
