use egui::{Color32, Context, RichText};
use crate::events::AppEvent;
use crate::ui::{UiComponent, UiContext, UiEvent, View};

#[derive(Default)]
pub struct TopPanel {
    status: Option<String>,
}

impl UiComponent for TopPanel {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🎞 kinoscope");
                ui.separator();

                for view in [View::Generator, View::Visualizer] {
                    let selected = ui_ctx.active_view == view;
                    if ui.selectable_label(selected, view.title()).clicked() && !selected {
                        ui_ctx.send_event(UiEvent::SwitchView(view));
                    }
                }

                ui.separator();
                ui.label(RichText::new("Status:").color(Color32::LIGHT_BLUE));
                ui.label(self.status.as_deref().unwrap_or("Ready"));
            });
        });
    }

    fn on_app_event(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(status) => self.status = Some(status.clone()),
        }
    }
}
