mod top_panel;
mod generator_panel;
mod sequencer_panel;
mod canvas;

pub use top_panel::TopPanel;
pub use generator_panel::GeneratorPanel;
pub use sequencer_panel::SequencerPanel;

use std::sync::Arc;
use std::time::Duration;
use egui::Context;
use egui_wgpu::wgpu;
use ks_core::catalog::Catalog;
use ks_core::sequencer::SequencerState;
use ks_core::{AspectRatio, Resolution, VideoModel};
use winit::event_loop::EventLoopProxy;
use winit::window::Window;
use crate::events::{AppEvent, EventSink, KsEvent};
use crate::generator::GenerationView;
use crate::gfx::GfxState;

/// Which demo the shell is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Generator,
    Visualizer,
}

impl View {
    pub fn title(&self) -> &str {
        match self {
            Self::Generator => "🎬 Video Generator",
            Self::Visualizer => "🔐 Auth Visualizer",
        }
    }
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    SwitchView(View),

    // Generator
    SelectKey,
    PickImage,
    ClearImage,
    Generate {
        prompt: String,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
    },
    SaveVideo,
    DismissError,

    // Sequencer
    NextStep,
    PrevStep,
    ResetSteps,
    TogglePlay,
}

pub struct UiContext {
    pub active_view: View,
    pub model: VideoModel,
    pub generation: GenerationView,
    pub catalog: Arc<Catalog>,
    pub sequencer: SequencerState,
    pub event_loop_proxy: Arc<EventLoopProxy<KsEvent>>,
}

impl UiContext {
    pub fn new(event_loop_proxy: Arc<EventLoopProxy<KsEvent>>, catalog: Arc<Catalog>, model: VideoModel) -> Self {
        Self {
            active_view: View::default(),
            model,
            generation: GenerationView::default(),
            catalog,
            sequencer: SequencerState::default(),
            event_loop_proxy,
        }
    }

    pub fn send_event(&self, event: UiEvent) {
        self.event_loop_proxy.send(KsEvent::Ui(event));
    }
}

pub struct UiState {
    pub(crate) egui_state: egui_winit::State,
    pub(crate) egui_ctx: egui::Context,
    pub(crate) egui_renderer: egui_wgpu::Renderer,

    components: Vec<Box<dyn UiComponent>>,
    pub(crate) ui_ctx: UiContext,
}

impl UiState {
    pub fn new(gfx: &GfxState, window: Arc<Window>, ui_ctx: UiContext) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gfx.device, gfx.config.format, egui_wgpu::RendererOptions::default());

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            components: Vec::new(),
            ui_ctx,
        }
    }

    /// Runs every component for one frame and records the egui pass onto
    /// `target`, loading whatever the encoder already cleared there.
    /// Returns how soon egui wants the next frame.
    pub fn paint(
        &mut self,
        gfx: &GfxState,
        window: &Window,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Option<Duration> {
        let raw_input = self.egui_state.take_egui_input(window);
        let output = self.egui_ctx.run(raw_input, |ctx| {
            for component in self.components.iter_mut() {
                component.show(ctx, &self.ui_ctx);
            }
        });
        self.egui_state.handle_platform_output(window, output.platform_output);

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gfx.config.width, gfx.config.height],
            pixels_per_point: output.pixels_per_point,
        };
        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);

        for (id, delta) in &output.textures_delta.set {
            self.egui_renderer.update_texture(&gfx.device, &gfx.queue, *id, delta);
        }
        self.egui_renderer.update_buffers(&gfx.device, &gfx.queue, encoder, &primitives, &screen);

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ui"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        self.egui_renderer.render(&mut pass.forget_lifetime(), &primitives, &screen);

        for id in &output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .map(|viewport| viewport.repaint_delay)
    }

    pub fn add_component(&mut self, component: Box<dyn UiComponent>) {
        self.components.push(component);
    }

    /// Broadcast an AppEvent to every component
    pub fn on_app_event(&mut self, event: &AppEvent) {
        for component in self.components.iter_mut() {
            component.on_app_event(event);
        }
    }
}

pub trait UiComponent : Send + Sync {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext);

    fn on_app_event(&mut self, _event: &AppEvent) {}
}
