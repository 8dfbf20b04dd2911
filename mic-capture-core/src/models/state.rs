/// Mixer session state machine.
///
/// ```text
/// idle → running → draining → stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

impl MixerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stopped_is_terminal() {
        assert!(MixerState::Running.is_running());
        assert!(!MixerState::Draining.is_running());
        assert!(MixerState::Stopped.is_terminal());
        assert!(!MixerState::Idle.is_terminal());
    }
}
