use std::sync::Arc;
use std::time::Duration;
use ks_core::catalog::Catalog;
use ks_core::sequencer::{Sequencer, SequencerState};
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use crate::events::{EventSink, KsEvent, SeqEvent};

/// Armed auto-advance timer. Dropping it cancels the task.
struct Autoplay {
    epoch: u64,
    _guard: DropGuard,
}

/// Owns the step sequencer and its auto-advance timer.
///
/// Ticks are delivered through the event loop and carry the epoch of the
/// timer that produced them, so a tick queued before a pause or reset is
/// ignored instead of advancing the cursor.
pub struct SequencerDriver {
    catalog: Arc<Catalog>,
    sequencer: Sequencer,
    tick_interval: Duration,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    autoplay: Option<Autoplay>,
    epoch: u64,
}

impl SequencerDriver {
    pub fn new(catalog: Arc<Catalog>, tick_interval: Duration, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        let sequencer = Sequencer::new(catalog.len());
        Self {
            catalog,
            sequencer,
            tick_interval,
            sink,
            runtime,
            autoplay: None,
            epoch: 0,
        }
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.autoplay.is_some()
    }

    pub fn next(&mut self) -> SequencerState {
        let state = self.sequencer.next();
        self.sync_timer(state)
    }

    pub fn prev(&mut self) -> SequencerState {
        let state = self.sequencer.prev();
        self.sync_timer(state)
    }

    pub fn reset(&mut self) -> SequencerState {
        let state = self.sequencer.reset();
        self.sync_timer(state)
    }

    pub fn toggle_play(&mut self) -> SequencerState {
        let state = self.sequencer.toggle_play();
        self.sync_timer(state)
    }

    /// View is going away: stop the timer and start over next time.
    pub fn teardown(&mut self) {
        self.reset();
    }

    pub fn on_event(&mut self, event: SeqEvent) -> Option<SequencerState> {
        match event {
            SeqEvent::Tick { epoch } => {
                if self.autoplay.as_ref().map(|a| a.epoch) != Some(epoch) {
                    return None;
                }
                let state = self.sequencer.tick();
                Some(self.sync_timer(state))
            }
        }
    }

    fn sync_timer(&mut self, state: SequencerState) -> SequencerState {
        match (state.playing, self.autoplay.is_some()) {
            (true, false) => self.arm(),
            (false, true) => self.autoplay = None,
            _ => {}
        }
        state
    }

    fn arm(&mut self) {
        self.epoch += 1;
        let epoch = self.epoch;
        let period = self.tick_interval;
        let sink = self.sink.clone();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        self.runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => sink.send(KsEvent::Seq(SeqEvent::Tick { epoch })),
                }
            }
        });

        self.autoplay = Some(Autoplay {
            epoch,
            _guard: token.drop_guard(),
        });
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;
    use super::*;
    use crate::events::testing::channel_sink;

    const TICK: Duration = Duration::from_millis(2000);

    fn driver() -> (SequencerDriver, UnboundedReceiver<KsEvent>) {
        let (sink, rx) = channel_sink();
        let driver = SequencerDriver::new(Arc::new(Catalog::reference()), TICK, Arc::new(sink), Handle::current());
        (driver, rx)
    }

    async fn next_tick(rx: &mut UnboundedReceiver<KsEvent>) -> SeqEvent {
        match rx.recv().await {
            Some(KsEvent::Seq(event)) => event,
            other => panic!("expected a tick, got {other:?}"),
        }
    }

    /// Lets virtual time run and feeds whatever ticks arrive to the driver.
    async fn drain(driver: &mut SequencerDriver, rx: &mut UnboundedReceiver<KsEvent>, wait: Duration) {
        tokio::time::sleep(wait).await;
        while let Ok(KsEvent::Seq(event)) = rx.try_recv() {
            driver.on_event(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_advances_once_per_interval() {
        let (mut driver, mut rx) = driver();
        let n = driver.catalog().len();
        let start = Instant::now();

        assert!(driver.toggle_play().playing);
        for k in 1..n {
            let tick = next_tick(&mut rx).await;
            let state = driver.on_event(tick).unwrap();

            assert_eq!(start.elapsed(), TICK * k as u32);
            assert_eq!(state, SequencerState { cursor: k, playing: true });
        }

        let tick = next_tick(&mut rx).await;
        assert_eq!(driver.on_event(tick).unwrap(), SequencerState { cursor: n, playing: false });
        assert!(!driver.is_timer_armed());

        drain(&mut driver, &mut rx, TICK * 5).await;
        assert_eq!(driver.state().cursor, n);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_playing_stops_advancing() {
        let (mut driver, mut rx) = driver();
        driver.toggle_play();
        let tick = next_tick(&mut rx).await;
        driver.on_event(tick);
        assert_eq!(driver.state().cursor, 1);

        // A tick from the old timer is already queued when the reset lands.
        let stale = next_tick(&mut rx).await;
        driver.reset();
        assert_eq!(driver.on_event(stale), None);

        drain(&mut driver, &mut rx, TICK * 10).await;
        assert_eq!(driver.state(), SequencerState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_disarms_and_replay_uses_a_new_epoch() {
        let (mut driver, mut rx) = driver();
        driver.toggle_play();
        let first = next_tick(&mut rx).await;

        driver.toggle_play();
        assert!(!driver.is_timer_armed());
        assert_eq!(driver.on_event(first), None);

        driver.toggle_play();
        let second = next_tick(&mut rx).await;
        assert_ne!(first, second);
        assert_eq!(driver.on_event(second).unwrap().cursor, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_driver_cancels_the_timer() {
        let (mut driver, mut rx) = driver();
        driver.toggle_play();
        assert!(driver.is_timer_armed());
        drop(driver);

        // The timer task held the last sender; once it is gone the channel closes.
        tokio::time::sleep(TICK * 3).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_steps_do_not_disturb_autoplay() {
        let (mut driver, mut rx) = driver();
        driver.toggle_play();
        driver.next();
        driver.next();
        driver.prev();
        assert!(driver.is_timer_armed());

        let tick = next_tick(&mut rx).await;
        assert_eq!(driver.on_event(tick).unwrap().cursor, 2);
    }
}
