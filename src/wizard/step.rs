//! Wizard step state machine: which screen the user is on.

use serde::{Deserialize, Serialize};

/// The screens of the intake wizard.
///
/// Progresses linearly: Welcome → Name → Request → Files → Thanks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    Name,
    Request,
    Files,
    Thanks,
}

impl Step {
    /// Every step, in wizard order.
    pub const ALL: [Step; 5] = [
        Step::Welcome,
        Step::Name,
        Step::Request,
        Step::Files,
        Step::Thanks,
    ];

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Step) -> bool {
        self.next() == Some(target)
    }

    /// Whether this step is terminal (the wizard is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Thanks)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<Step> {
        use Step::*;
        match self {
            Welcome => Some(Name),
            Name => Some(Request),
            Request => Some(Files),
            Files => Some(Thanks),
            Thanks => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Name => "name",
            Self::Request => "request",
            Self::Files => "files",
            Self::Thanks => "thanks",
        }
    }

    /// Parse a stored step identifier. Anything unrecognised is `Welcome`.
    pub fn parse_lenient(raw: &str) -> Step {
        raw.parse().unwrap_or_default()
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown step: {s}"))
    }
}
