/// Where the clock gets its notion of "now"
///
/// Fixed at construction for the lifetime of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Host wall-clock time, read fresh on every call
    #[default]
    Real,
    /// Time set only by explicit `advance` calls from a driver
    Simulated,
}

impl ClockMode {
    /// Map the boolean construction flag onto a mode
    pub fn from_simulation_flag(simulation_mode: bool) -> Self {
        if simulation_mode {
            ClockMode::Simulated
        } else {
            ClockMode::Real
        }
    }
}

/// Clock configuration
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Time source for this clock
    pub mode: ClockMode,
    /// Identifier used in log lines
    pub name: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: ClockMode::Real,
            name: "LockstepClock".to_string(),
        }
    }
}

impl ClockConfig {
    /// Wall-clock configuration
    pub fn real() -> Self {
        Self::default()
    }

    /// Externally driven configuration
    pub fn simulated() -> Self {
        Self {
            mode: ClockMode::Simulated,
            ..Default::default()
        }
    }

    /// Override the clock name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
