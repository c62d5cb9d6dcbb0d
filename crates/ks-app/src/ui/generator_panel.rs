use std::sync::Arc;
use egui::{Color32, ColorImage, Context, RichText, TextEdit, TextureHandle, TextureOptions, Ui};
use ks_core::job::{GenerationJob, JobStatus};
use ks_core::{AspectRatio, Resolution};
use crate::generator::{GenerationView, Preview};
use crate::ui::{UiComponent, UiContext, UiEvent, View};

const DEFAULT_PROMPT: &str = "A cinematic shot of this scene, 4k, highly detailed";
const PREVIEW_HEIGHT: f32 = 160.0;

pub struct GeneratorPanel {
    prompt_text: String,
    aspect_ratio: AspectRatio,
    resolution: Resolution,
    // Uploaded copy of the current preview, keyed by its allocation.
    preview: Option<(Arc<Preview>, TextureHandle)>,
}

impl Default for GeneratorPanel {
    fn default() -> Self {
        Self {
            prompt_text: DEFAULT_PROMPT.to_string(),
            aspect_ratio: AspectRatio::default(),
            resolution: Resolution::default(),
            preview: None,
        }
    }
}

/// The image is the request; the prompt only steers it.
pub(crate) fn can_generate(view: &GenerationView) -> bool {
    view.credential_available && !view.busy && view.image_name.is_some()
}

fn status_color(status: JobStatus) -> Color32 {
    match status {
        JobStatus::Submitted => Color32::LIGHT_BLUE,
        JobStatus::Polling => Color32::YELLOW,
        JobStatus::Done => Color32::GREEN,
        JobStatus::Failed => Color32::RED,
    }
}

impl GeneratorPanel {
    fn preview_texture(&mut self, ctx: &Context, preview: Option<&Arc<Preview>>) -> Option<TextureHandle> {
        let Some(preview) = preview else {
            self.preview = None;
            return None;
        };

        match &self.preview {
            Some((cached, texture)) if Arc::ptr_eq(cached, preview) => Some(texture.clone()),
            _ => {
                let image = ColorImage::from_rgba_unmultiplied(preview.size, &preview.rgba);
                let texture = ctx.load_texture("first_frame_preview", image, TextureOptions::LINEAR);
                self.preview = Some((preview.clone(), texture.clone()));
                Some(texture)
            }
        }
    }

    fn show_key_prompt(&self, ui: &mut Ui, ui_ctx: &UiContext) {
        egui::Frame::new()
            .fill(Color32::from_rgb(60, 40, 30))
            .inner_margin(egui::Margin::same(10))
            .corner_radius(5.0)
            .show(ui, |ui| {
                ui.label(RichText::new("🔑 An API key is required").strong());
                ui.label(
                    RichText::new("Generation is billed to the project that owns the key.")
                        .small()
                        .color(Color32::GRAY)
                );
                if ui.button("Select API key…").clicked() {
                    ui_ctx.send_event(UiEvent::SelectKey);
                }
            });
    }

    fn show_form(&mut self, ui: &mut Ui, ui_ctx: &UiContext, view: &GenerationView) {
        ui.heading(RichText::new("✨ Prompt").size(16.0));
        ui.add(
            TextEdit::multiline(&mut self.prompt_text)
                .desired_width(f32::INFINITY)
                .desired_rows(3)
                .hint_text("Optional: describe the motion")
        );
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui.button("🖼 Choose first frame…").clicked() {
                ui_ctx.send_event(UiEvent::PickImage);
            }
            match &view.image_name {
                Some(name) => {
                    ui.label(name);
                    if ui.small_button("✖").clicked() {
                        ui_ctx.send_event(UiEvent::ClearImage);
                    }
                }
                None => {
                    ui.label(RichText::new("No image selected").color(Color32::GRAY));
                }
            }
        });
        ui.add_space(5.0);

        if let Some(texture) = self.preview_texture(ui.ctx(), view.image_preview.as_ref()) {
            let size = texture.size_vec2();
            let scale = (PREVIEW_HEIGHT / size.y).min(1.0);
            ui.add(egui::Image::new(&texture).fit_to_exact_size(size * scale).corner_radius(4.0));
            ui.add_space(5.0);
        }

        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Aspect ratio")
                .selected_text(self.aspect_ratio.name())
                .show_ui(ui, |ui| {
                    for ratio in AspectRatio::all() {
                        ui.selectable_value(&mut self.aspect_ratio, ratio, ratio.name());
                    }
                });

            egui::ComboBox::from_label("Resolution")
                .selected_text(self.resolution.id())
                .show_ui(ui, |ui| {
                    for resolution in Resolution::all() {
                        ui.selectable_value(&mut self.resolution, resolution, resolution.id());
                    }
                });
        });
        ui.add_space(8.0);

        let generate_button = ui.add_enabled(
            can_generate(view),
            egui::Button::new(RichText::new("🎬 Generate video").size(14.0))
                .min_size(egui::vec2(ui.available_width(), 30.0))
        );

        if generate_button.clicked() {
            ui_ctx.send_event(UiEvent::Generate {
                prompt: self.prompt_text.trim().to_string(),
                aspect_ratio: self.aspect_ratio,
                resolution: self.resolution,
            });
        }

        ui.label(
            RichText::new(format!(
                "{} · usually ready in about {}s",
                ui_ctx.model.name(),
                ui_ctx.model.estimated_time_secs()
            ))
            .small()
            .color(Color32::GRAY)
        );
    }

    fn show_job_card(&self, ui: &mut Ui, ui_ctx: &UiContext, job: &GenerationJob, view: &GenerationView) {
        egui::Frame::new()
            .fill(Color32::from_gray(30))
            .corner_radius(5.0)
            .inner_margin(egui::Margin::same(10))
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(60)))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(job.status.icon())
                            .size(24.0)
                            .color(status_color(job.status))
                    );
                    ui.add_space(5.0);

                    ui.vertical(|ui| {
                        ui.label(RichText::new(&job.request.prompt).strong());
                        ui.label(
                            RichText::new(format!(
                                "{} · {} · {}",
                                job.status.label(),
                                job.request.aspect_ratio.id(),
                                job.request.resolution.id()
                            ))
                            .small()
                            .color(status_color(job.status))
                        );

                        let time_str = if job.status.is_terminal() {
                            format!("Finished in {}s after {} polls", job.elapsed_secs(), job.polls)
                        } else {
                            let elapsed = (chrono::Utc::now() - job.created_at).num_seconds();
                            format!("Elapsed: {}s · polls: {}", elapsed, job.polls)
                        };
                        ui.label(RichText::new(time_str).small().color(Color32::GRAY));
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        match job.status {
                            JobStatus::Submitted | JobStatus::Polling => {
                                ui.spinner();
                            }
                            JobStatus::Done => {
                                if ui.button("💾 Save video…").clicked() {
                                    ui_ctx.send_event(UiEvent::SaveVideo);
                                }
                            }
                            JobStatus::Failed => {}
                        }
                    });
                });

                if let Some(path) = &view.artifact_path {
                    ui.separator();
                    ui.label(
                        RichText::new(format!("{} ({} KiB)", path.display(), view.artifact_len / 1024))
                            .small()
                            .monospace()
                    );
                }
            });
    }
}

impl UiComponent for GeneratorPanel {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext) {
        if ui_ctx.active_view != View::Generator {
            return;
        }

        let view = &ui_ctx.generation;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.set_max_width(720.0);
            ui.heading("Image to video");
            ui.separator();

            if view.credential_available {
                self.show_form(ui, ui_ctx, view);
            } else {
                self.preview = None;
                self.show_key_prompt(ui, ui_ctx);
            }
            ui.add_space(10.0);

            if let Some(error) = &view.error {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(error).color(Color32::RED));
                    if ui.small_button("✖").clicked() {
                        ui_ctx.send_event(UiEvent::DismissError);
                    }
                });
                ui.add_space(5.0);
            }

            if let Some(job) = &view.job {
                self.show_job_card(ui, ui_ctx, job, view);
            }
        });

        if view.busy {
            // Keep the elapsed counter moving.
            ctx.request_repaint_after(std::time::Duration::from_secs(1));
        }
    }
}
