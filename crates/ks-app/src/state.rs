use std::sync::Arc;
use std::time::Duration;
use egui_wgpu::wgpu;
use ks_core::catalog::Catalog;
use ks_core::request::GenerationRequest;
use ks_genai::{CredentialHost, GenError};
use log::{error, info, warn};
use tokio::runtime::Handle;
use winit::event_loop::EventLoopProxy;
use winit::window::Window;
use crate::config::AppConfig;
use crate::credentials::DesktopCredentials;
use crate::error::AppError;
use crate::events::{AppEvent, EventSink, GenEvent, KsEvent, SeqEvent};
use crate::generator::{Generator, PickedImage};
use crate::gfx::GfxState;
use crate::sequencer::SequencerDriver;
use crate::ui;
use crate::ui::{UiContext, UiEvent, UiState, View};

const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.07, g: 0.08, b: 0.1, a: 1.0 };

pub struct AppState {
    pub(crate) window: Arc<Window>,
    event_loop_proxy: Arc<EventLoopProxy<KsEvent>>,

    pub gfx: GfxState,
    pub ui: UiState,

    pub(crate) generator: Generator,
    pub(crate) sequencer: SequencerDriver,
}

fn load_catalog(config: &AppConfig) -> Result<Catalog, AppError> {
    match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::from_path(path)?;
            info!("Loaded {} steps from {}", catalog.len(), path.display());
            Ok(catalog)
        }
        None => Ok(Catalog::reference()),
    }
}

impl AppState {
    pub async fn new(
        window: Arc<Window>,
        event_loop_proxy: Arc<EventLoopProxy<KsEvent>>,
        config: &AppConfig,
        runtime: Handle,
    ) -> anyhow::Result<Self> {
        let catalog = Arc::new(load_catalog(config)?);
        let sink: Arc<dyn EventSink> = event_loop_proxy.clone();

        let credentials: Arc<dyn CredentialHost> = Arc::new(DesktopCredentials::new(config.api_key.clone()));
        let mut generator = Generator::new(config, credentials, sink.clone(), runtime.clone());
        generator.refresh_credentials().await;

        let sequencer = SequencerDriver::new(catalog.clone(), config.tick_interval, sink, runtime);

        let gfx = GfxState::new(window.clone()).await?;
        let ui_ctx = UiContext::new(event_loop_proxy.clone(), catalog, config.model);
        let mut ui_state = UiState::new(&gfx, window.clone(), ui_ctx);

        ui_state.add_component(Box::new(ui::TopPanel::default()));
        ui_state.add_component(Box::new(ui::GeneratorPanel::default()));
        ui_state.add_component(Box::new(ui::SequencerPanel::default()));

        let mut state = Self {
            window,
            event_loop_proxy,
            gfx,
            ui: ui_state,
            generator,
            sequencer,
        };
        state.sync_ui();

        Ok(state)
    }

    pub fn push_event(&self, event: AppEvent) {
        self.event_loop_proxy.send(KsEvent::App(event));
    }

    fn status(&self, message: impl Into<String>) {
        self.push_event(AppEvent::Status(message.into()));
    }

    /// Copies generator and sequencer snapshots into the UI context.
    fn sync_ui(&mut self) {
        let ui_ctx = &mut self.ui.ui_ctx;
        ui_ctx.generation = self.generator.view();
        ui_ctx.sequencer = self.sequencer.state();
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gfx.resize(new_size);
    }

    /// Leaving a view tears down whatever it was running.
    fn switch_view(&mut self, view: View) {
        let previous = self.ui.ui_ctx.active_view;
        if previous == view {
            return;
        }

        match previous {
            View::Generator => self.generator.teardown(),
            View::Visualizer => self.sequencer.teardown(),
        }
        self.ui.ui_ctx.active_view = view;
        info!("Switched to {:?}", view);
    }

    /// Draws a frame and returns how soon egui wants the next one.
    pub fn render(&mut self) -> anyhow::Result<Option<Duration>> {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(None);
        }

        let output = match self.gfx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gfx.reconfigure();
                return Ok(Some(Duration::ZERO));
            }
            Err(e) => return Err(e.into()),
        };
        let target = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.gfx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame")
        });

        let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        let repaint_after = self.ui.paint(&self.gfx, &self.window, &mut encoder, &target);

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(repaint_after)
    }

    pub fn on_ui_event(&mut self, event: UiEvent) {
        let result = pollster::block_on(async {
            match event {
                UiEvent::SwitchView(view) => self.switch_view(view),

                UiEvent::SelectKey => {
                    if self.generator.select_key().await {
                        self.status("API key selected");
                    }
                }
                UiEvent::PickImage => self.pick_image().await?,
                UiEvent::ClearImage => self.generator.set_image(None),
                UiEvent::Generate { prompt, aspect_ratio, resolution } => {
                    let request = GenerationRequest::new(prompt)
                        .with_aspect_ratio(aspect_ratio)
                        .with_resolution(resolution);
                    match self.generator.submit(request).await {
                        Ok(id) => self.status(format!("Generating video ({})", id)),
                        // Already surfaced in the generator panel.
                        Err(e) => warn!("Generation not started: {}", e),
                    }
                }
                UiEvent::SaveVideo => self.save_video().await?,
                UiEvent::DismissError => self.generator.dismiss_error(),

                UiEvent::NextStep => {
                    self.sequencer.next();
                }
                UiEvent::PrevStep => {
                    self.sequencer.prev();
                }
                UiEvent::ResetSteps => {
                    self.sequencer.reset();
                }
                UiEvent::TogglePlay => {
                    self.sequencer.toggle_play();
                }
            }
            anyhow::Ok(())
        });

        if let Err(e) = result {
            error!("{:#}", e);
            self.status(format!("Error: {}", e));
        }
        self.sync_ui();
    }

    async fn pick_image(&mut self) -> anyhow::Result<()> {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Choose first frame")
            .add_filter("Image", &["png", "jpg", "jpeg", "webp"])
            .pick_file()
        else {
            return Ok(());
        };

        let bytes = tokio::fs::read(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match PickedImage::from_bytes(name.clone(), bytes) {
            Ok(picked) => {
                info!("Picked {} ({})", name, picked.image.mime_type);
                self.generator.set_image(Some(picked));
            }
            Err(e) => {
                self.generator.set_image(None);
                self.generator.report(&GenError::Validation(format!("{}: {}", name, e)));
            }
        }
        Ok(())
    }

    async fn save_video(&mut self) -> anyhow::Result<()> {
        let Some(dest) = rfd::FileDialog::new()
            .set_title("Save video")
            .set_file_name("kinoscope.mp4")
            .add_filter("MP4 video", &["mp4"])
            .save_file()
        else {
            return Ok(());
        };

        self.generator.save_artifact(&dest).await?;
        self.status(format!("Saved video to {}", dest.display()));
        Ok(())
    }

    pub fn on_gen_event(&mut self, event: GenEvent) {
        let finished = matches!(event, GenEvent::Finished { .. });
        let failure = self.generator.on_gen_event(event);

        match failure {
            Some(message) => self.status(format!("Generation failed: {}", message)),
            None if finished && self.generator.view().artifact_path.is_some() => self.status("Video ready"),
            None => {}
        }
        self.sync_ui();
    }

    pub fn on_seq_event(&mut self, event: SeqEvent) {
        if self.sequencer.on_event(event).is_some() {
            self.sync_ui();
        }
    }

    pub fn on_app_event(&mut self, event: AppEvent) {
        self.ui.on_app_event(&event);
    }

    /// Window is closing: cancel background work before the runtime goes.
    pub fn shutdown(&mut self) {
        self.generator.teardown();
        self.sequencer.teardown();
    }
}
