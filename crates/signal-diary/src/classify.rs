//! Connection health tiers.
//!
//! The thresholds here drive report wording and are part of the public
//! contract: 0-1 issues is Good, 2-4 Light, 5-9 Fair, 10 or more Poor.

use std::fmt;

use serde::Serialize;

/// Ordinal connection health derived from a window's issue count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No meaningful problems.
    Good,
    /// A few problems.
    Light,
    /// Regular problems worth monitoring.
    Fair,
    /// Frequent problems.
    Poor,
}

/// Map a window's issue count to its tier.
#[must_use]
pub fn classify(total: usize) -> Tier {
    match total {
        0..=1 => Tier::Good,
        2..=4 => Tier::Light,
        5..=9 => Tier::Fair,
        _ => Tier::Poor,
    }
}

impl Tier {
    /// Display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Light => "Light Issues Detected",
            Self::Fair => "Fair - Moderate Issues",
            Self::Poor => "Poor - Frequent Issues",
        }
    }

    /// Short status word printed next to the label.
    #[must_use]
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Good | Self::Light => "STABLE",
            Self::Fair => "MONITORING",
            Self::Poor => "NEEDS ATTENTION",
        }
    }

    /// Whether reports should carry an advisory block.
    #[must_use]
    pub fn is_urgent(self) -> bool {
        matches!(self, Self::Fair | Self::Poor)
    }

    /// CSS class used by the printable report.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Good => "status-good",
            Self::Light => "status-light",
            Self::Fair => "status-fair",
            Self::Poor => "status-poor",
        }
    }

    /// Accent color as a hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Good => "#16a34a",
            Self::Light => "#65a30d",
            Self::Fair => "#d97706",
            Self::Poor => "#dc2626",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
