//! Stylesheet for terminal output.

use owo_colors::Style;

use crate::domain::cloud::PowerState;

/// Colors for every kind of line the CLI prints. All plain when colors are
/// off.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    /// Secondary text: keys, file lists, registry markers.
    pub dim: Style,
    pub bold: Style,
    /// Host names and section titles.
    pub header: Style,
    /// A running VM or container.
    pub live: Style,
    /// Anything stopped, deallocated or unknown.
    pub idle: Style,
    /// A VM on its way up or down.
    pub transition: Style,
}

impl Styles {
    /// Stylesheet for the terminal, plain unless `colored`.
    #[must_use]
    pub fn for_terminal(colored: bool) -> Self {
        if !colored {
            return Self::default();
        }
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            bold: Style::new().bold(),
            header: Style::new().bold().cyan(),
            live: Style::new().green().bold(),
            idle: Style::new().dimmed(),
            transition: Style::new().yellow(),
        }
    }

    #[must_use]
    pub fn power(&self, state: PowerState) -> Style {
        match state {
            PowerState::Running => self.live,
            PowerState::Starting | PowerState::Stopping | PowerState::Deallocating => {
                self.transition
            }
            PowerState::Stopped | PowerState::Deallocated | PowerState::Unknown => self.idle,
        }
    }

    #[must_use]
    pub fn workload(&self, running: bool) -> Style {
        if running { self.live } else { self.idle }
    }
}
