mod app;
mod config;
mod credentials;
mod error;
mod events;
mod generator;
mod gfx;
mod sequencer;
mod state;
mod ui;

use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};
use crate::config::AppConfig;
use crate::events::KsEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    log::info!("Using model {} against {}", config.model.id(), config.api_base);

    let event_loop: EventLoop<KsEvent> = EventLoop::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = app::App::new(&event_loop, config, tokio::runtime::Handle::current());
    event_loop.run_app(&mut app)?;

    Ok(())
}
