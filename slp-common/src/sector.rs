//! Deployment sectors and their quick actions

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scenario a session is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Healthcare,
    #[default]
    Enterprise,
    Education,
}

/// Display metadata for a sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectorInfo {
    pub name: &'static str,
    pub scenario: &'static str,
    pub description: &'static str,
}

/// Sector-specific shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub name: &'static str,
    /// Letter shown on the shortcut button
    pub gesture: char,
    /// Page the client should open, if the action is a link
    pub url: Option<&'static str>,
}

const HEALTHCARE_ACTIONS: [QuickAction; 5] = [
    QuickAction {
        name: "Patient Info",
        gesture: 'P',
        url: Some("https://www.epic.com"),
    },
    QuickAction {
        name: "Medical Chart",
        gesture: 'M',
        url: None,
    },
    QuickAction {
        name: "Emergency",
        gesture: 'E',
        url: None,
    },
    QuickAction {
        name: "Communicate",
        gesture: 'C',
        url: None,
    },
    QuickAction {
        name: "Voice CMD",
        gesture: 'V',
        url: None,
    },
];

const ENTERPRISE_ACTIONS: [QuickAction; 5] = [
    QuickAction {
        name: "Dashboard",
        gesture: 'D',
        url: Some("https://www.tableau.com"),
    },
    QuickAction {
        name: "CAD Control",
        gesture: 'C',
        url: None,
    },
    QuickAction {
        name: "Presentation",
        gesture: 'P',
        url: None,
    },
    QuickAction {
        name: "Monitors",
        gesture: 'M',
        url: None,
    },
    QuickAction {
        name: "Voice CMD",
        gesture: 'V',
        url: None,
    },
];

const EDUCATION_ACTIONS: [QuickAction; 5] = [
    QuickAction {
        name: "Lesson Control",
        gesture: 'L',
        url: Some("https://classroom.google.com"),
    },
    QuickAction {
        name: "Whiteboard",
        gesture: 'W',
        url: Some("https://whiteboard.microsoft.com"),
    },
    QuickAction {
        name: "Assessment",
        gesture: 'A',
        url: None,
    },
    QuickAction {
        name: "Accessibility",
        gesture: 'X',
        url: Some("https://accessibility.google"),
    },
    QuickAction {
        name: "Voice CMD",
        gesture: 'V',
        url: None,
    },
];

const HEALTHCARE_DESCRIPTION: &str =
    "Medical chart access, patient communication, and rehabilitation support";

impl Sector {
    pub const ALL: [Sector; 3] = [
        Sector::Healthcare,
        Sector::Enterprise,
        Sector::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Healthcare => "healthcare",
            Sector::Enterprise => "enterprise",
            Sector::Education => "education",
        }
    }

    pub fn info(&self) -> SectorInfo {
        match self {
            Sector::Healthcare => SectorInfo {
                name: "🏥 Healthcare",
                scenario: "Patient Accessibility & Rehabilitation",
                description: HEALTHCARE_DESCRIPTION,
            },
            Sector::Enterprise => SectorInfo {
                name: "💼 Enterprise",
                scenario: "Manufacturing Control & Productivity",
                description: "CAD control, presentations, and multi-monitor management",
            },
            Sector::Education => SectorInfo {
                name: "🎓 Education",
                scenario: "Inclusive Learning & Disability Support",
                description: "Interactive learning, whiteboard control, and accessibility tools",
            },
        }
    }

    pub fn quick_actions(&self) -> &'static [QuickAction] {
        match self {
            Sector::Healthcare => &HEALTHCARE_ACTIONS,
            Sector::Enterprise => &ENTERPRISE_ACTIONS,
            Sector::Education => &EDUCATION_ACTIONS,
        }
    }

    /// Case-insensitive lookup of a quick action by name
    pub fn find_action(&self, name: &str) -> Option<&'static QuickAction> {
        let wanted = name.trim();
        self.quick_actions()
            .iter()
            .find(|action| action.name.eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "healthcare" => Ok(Sector::Healthcare),
            "enterprise" => Ok(Sector::Enterprise),
            "education" => Ok(Sector::Education),
            other => Err(Error::InvalidInput(format!("Unknown sector: {}", other))),
        }
    }
}
