//! Session-wide toggles.

use crate::Config;

/// Enabled/debug toggles consulted before every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    pub enabled: bool,
    pub debug: bool,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
        }
    }
}

impl ModeState {
    /// Initial toggles for a new session.
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.enabled,
            debug: config.debug,
        }
    }

    /// Flip the enabled toggle, returning the new value.
    pub fn toggle_enabled(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Flip the debug toggle, returning the new value.
    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_round_trip() {
        let mut mode = ModeState::default();
        assert!(mode.enabled);
        assert!(!mode.toggle_enabled());
        assert!(mode.toggle_enabled());
        assert!(mode.toggle_debug());
        assert!(!mode.toggle_debug());
    }

    #[test]
    fn starts_from_config() {
        let config = Config {
            enabled: false,
            debug: true,
            ..Config::default()
        };
        assert_eq!(
            ModeState::from_config(&config),
            ModeState {
                enabled: false,
                debug: true
            }
        );
    }
}
