use std::sync::Arc;
use std::time::Instant;
use log::error;
use tokio::runtime::Handle;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{WindowAttributes, WindowId};
use crate::config::AppConfig;
use crate::events::KsEvent;
use crate::state::AppState;

pub struct App {
    config: AppConfig,
    runtime: Handle,
    event_loop_proxy: Arc<EventLoopProxy<KsEvent>>,
    state: Option<AppState>,
    needs_redraw: bool,
    repaint_at: Option<Instant>,
}

impl App {
    pub fn new(event_loop: &EventLoop<KsEvent>, config: AppConfig, runtime: Handle) -> Self {
        let event_loop_proxy = Arc::new(event_loop.create_proxy());

        Self {
            config,
            runtime,
            event_loop_proxy,
            state: None,
            needs_redraw: false,
            repaint_at: None,
        }
    }

    fn request_redraw(&mut self) {
        self.needs_redraw = true;
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl ApplicationHandler<KsEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title("kinoscope")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 800.0));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let state = pollster::block_on(AppState::new(
            window,
            self.event_loop_proxy.clone(),
            &self.config,
            self.runtime.clone(),
        ));

        match state {
            Ok(state) => {
                self.state = Some(state);
                self.request_redraw();
            }
            Err(e) => {
                error!("Failed to start: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: KsEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            KsEvent::Ui(e) => state.on_ui_event(e),
            KsEvent::App(e) => state.on_app_event(e),
            KsEvent::Gen(e) => state.on_gen_event(e),
            KsEvent::Seq(e) => state.on_seq_event(e),
        }
        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        if state.window.id() != window_id {
            return;
        }

        // Let egui handle the event first
        let response = state.ui.egui_state.on_window_event(&state.window, &event);
        if response.repaint {
            self.needs_redraw = true;
            state.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                state.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size);
                self.needs_redraw = true;
            }
            WindowEvent::RedrawRequested => {
                self.needs_redraw = false;
                self.repaint_at = None;
                match state.render() {
                    Ok(Some(delay)) if delay.is_zero() => self.needs_redraw = true,
                    // Duration::MAX means egui has nothing scheduled.
                    Ok(Some(delay)) => self.repaint_at = Instant::now().checked_add(delay),
                    Ok(None) => {}
                    Err(e) => error!("Render failed: {:#}", e),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(at) = self.repaint_at {
            if Instant::now() >= at {
                self.repaint_at = None;
                self.needs_redraw = true;
            }
        }

        if self.needs_redraw {
            if let Some(state) = &self.state {
                state.window.request_redraw();
            }
        }

        match self.repaint_at {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
