use serde::{Deserialize, Serialize};

/// Cursor over an N step catalog. `cursor == 0` means nothing is shown yet,
/// `cursor == N` is the final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequencerState {
    pub cursor: usize,
    pub playing: bool,
}

/// Deterministic step state machine.
///
/// Commands return the resulting state so callers can redraw without
/// reaching back into the sequencer. Timing lives outside: whoever owns the
/// timer calls [`Sequencer::tick`].
#[derive(Debug, Clone)]
pub struct Sequencer {
    len: usize,
    state: SequencerState,
}

impl Sequencer {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            state: SequencerState::default(),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_complete(&self) -> bool {
        self.state.cursor == self.len
    }

    pub fn reset(&mut self) -> SequencerState {
        self.state = SequencerState::default();
        self.state
    }

    pub fn next(&mut self) -> SequencerState {
        if self.state.cursor < self.len {
            self.state.cursor += 1;
        }
        if self.state.cursor == self.len {
            self.state.playing = false;
        }
        self.state
    }

    pub fn prev(&mut self) -> SequencerState {
        self.state.cursor = self.state.cursor.saturating_sub(1);
        self.state
    }

    /// Flips `playing`; never moves the cursor. A finished sequence stays
    /// paused until it is reset or stepped back.
    pub fn toggle_play(&mut self) -> SequencerState {
        if self.state.playing {
            self.state.playing = false;
        } else if !self.is_complete() {
            self.state.playing = true;
        }
        self.state
    }

    pub fn pause(&mut self) -> SequencerState {
        self.state.playing = false;
        self.state
    }

    /// Timer callback: advances only while playing.
    pub fn tick(&mut self) -> SequencerState {
        if self.state.playing {
            self.next()
        } else {
            self.state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug)]
    enum Command {
        Next,
        Prev,
        Reset,
        Toggle,
        Tick,
    }

    const COMMANDS: [Command; 5] = [Command::Next, Command::Prev, Command::Reset, Command::Toggle, Command::Tick];

    fn apply(seq: &mut Sequencer, command: Command) -> SequencerState {
        match command {
            Command::Next => seq.next(),
            Command::Prev => seq.prev(),
            Command::Reset => seq.reset(),
            Command::Toggle => seq.toggle_play(),
            Command::Tick => seq.tick(),
        }
    }

    #[test]
    fn cursor_stays_in_bounds_for_every_sequence() {
        // Every command sequence of length 6 over catalogs of 1..=4 steps.
        for len in 1..=4usize {
            let total = COMMANDS.len().pow(6);
            for mut code in 0..total {
                let mut seq = Sequencer::new(len);
                for _ in 0..6 {
                    let command = COMMANDS[code % COMMANDS.len()];
                    code /= COMMANDS.len();

                    let state = apply(&mut seq, command);
                    assert!(state.cursor <= len, "{command:?} left cursor at {}", state.cursor);
                    assert!(!(state.playing && state.cursor == len), "playing at final step");
                }
            }
        }
    }

    #[test]
    fn next_at_end_and_prev_at_start_are_noops() {
        let mut seq = Sequencer::new(3);
        assert_eq!(seq.prev(), SequencerState { cursor: 0, playing: false });

        for _ in 0..3 {
            seq.next();
        }
        let end = seq.state();
        assert_eq!(seq.next(), end);
        assert_eq!(end.cursor, 3);
    }

    #[test]
    fn reaching_the_end_stops_playback() {
        let mut seq = Sequencer::new(7);
        seq.toggle_play();

        for k in 1..7 {
            let state = seq.tick();
            assert_eq!(state, SequencerState { cursor: k, playing: true });
        }

        assert_eq!(seq.tick(), SequencerState { cursor: 7, playing: false });
        assert_eq!(seq.tick().cursor, 7);
    }

    #[test]
    fn ticks_are_ignored_while_paused() {
        let mut seq = Sequencer::new(4);
        seq.next();
        assert_eq!(seq.tick().cursor, 1);
    }

    #[test]
    fn play_at_end_keeps_the_cursor() {
        let mut seq = Sequencer::new(7);
        for _ in 0..7 {
            seq.next();
        }

        assert_eq!(seq.toggle_play(), SequencerState { cursor: 7, playing: false });
        assert_eq!(seq.tick(), SequencerState { cursor: 7, playing: false });

        seq.prev();
        assert_eq!(seq.toggle_play(), SequencerState { cursor: 6, playing: true });
        assert_eq!(seq.tick(), SequencerState { cursor: 7, playing: false });
    }

    #[test]
    fn toggle_never_moves_the_cursor() {
        for len in 0..=3usize {
            for start in 0..=len {
                let mut seq = Sequencer::new(len);
                for _ in 0..start {
                    seq.next();
                }
                assert_eq!(seq.toggle_play().cursor, start);
                assert_eq!(seq.toggle_play().cursor, start);
            }
        }
    }

    #[test]
    fn reset_clears_playing() {
        let mut seq = Sequencer::new(5);
        seq.toggle_play();
        seq.tick();

        assert_eq!(seq.reset(), SequencerState::default());
    }
}
