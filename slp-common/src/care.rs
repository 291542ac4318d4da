//! Healthcare care requests
//!
//! In the healthcare sector a handful of letters stand for patient requests
//! (meals, medication, help). Raising one records a [`CareNotification`];
//! emergencies, and routine requests held longer than
//! [`EMERGENCY_HOLD_SECS`], are escalated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hold time after which any care request counts as an emergency
pub const EMERGENCY_HOLD_SECS: f64 = 3.0;

/// Entry in the care gesture table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CareGesture {
    pub gesture: char,
    pub name: &'static str,
    pub description: &'static str,
    pub emergency: bool,
}

const CARE_GESTURES: [CareGesture; 8] = [
    CareGesture {
        gesture: 'B',
        name: "Breakfast",
        description: "Request breakfast",
        emergency: false,
    },
    CareGesture {
        gesture: 'L',
        name: "Lunch",
        description: "Request lunch",
        emergency: false,
    },
    CareGesture {
        gesture: 'D',
        name: "Dinner",
        description: "Request dinner",
        emergency: false,
    },
    CareGesture {
        gesture: 'T',
        name: "Tablets",
        description: "Request medication",
        emergency: false,
    },
    CareGesture {
        gesture: 'W',
        name: "Water",
        description: "Request water",
        emergency: false,
    },
    CareGesture {
        gesture: 'P',
        name: "Pain",
        description: "Report pain",
        emergency: true,
    },
    CareGesture {
        gesture: 'H',
        name: "Help",
        description: "Request assistance",
        emergency: true,
    },
    CareGesture {
        gesture: 'E',
        name: "Emergency",
        description: "Critical emergency",
        emergency: true,
    },
];

/// All care gestures
pub fn care_gestures() -> &'static [CareGesture] {
    &CARE_GESTURES
}

/// Care gesture bound to a letter, if any
pub fn care_gesture(letter: char) -> Option<&'static CareGesture> {
    let letter = letter.to_ascii_uppercase();
    CARE_GESTURES.iter().find(|g| g.gesture == letter)
}

/// Recorded care request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareNotification {
    pub gesture: char,
    pub name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub emergency: bool,
    pub hold_duration_secs: f64,
}

impl CareNotification {
    pub fn new(gesture: &CareGesture, held: Duration, timestamp: DateTime<Utc>) -> Self {
        let hold_duration_secs = held.as_secs_f64();
        Self {
            gesture: gesture.gesture,
            name: gesture.name.to_string(),
            description: gesture.description.to_string(),
            timestamp,
            emergency: gesture.emergency || hold_duration_secs > EMERGENCY_HOLD_SECS,
            hold_duration_secs,
        }
    }

    /// Subject line for the staff alert
    pub fn subject(&self) -> &'static str {
        if self.emergency {
            "URGENT"
        } else {
            "Patient Request"
        }
    }

    /// Plain-text body of the staff alert
    pub fn alert_body(&self) -> String {
        format!(
            "Patient Gesture Notification:\n\
             Gesture: {} - {}\n\
             Description: {}\n\
             Time: {}\n\
             Emergency: {}\n\
             Hold Duration: {:.1} seconds",
            self.gesture,
            self.name,
            self.description,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            if self.emergency { "YES" } else { "No" },
            self.hold_duration_secs,
        )
    }
}

/// Append-only log of care notifications for one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct CareLog {
    entries: Vec<CareNotification>,
}

impl CareLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, notification: CareNotification) {
        self.entries.push(notification);
    }

    pub fn all(&self) -> &[CareNotification] {
        &self.entries
    }

    /// Most recent `n` entries, oldest first
    pub fn recent(&self, n: usize) -> &[CareNotification] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn emergencies(&self) -> impl Iterator<Item = &CareNotification> {
        self.entries.iter().filter(|n| n.emergency)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(care_gesture('w').unwrap().name, "Water");
        assert!(care_gesture('Z').is_none());
        assert_eq!(care_gestures().len(), 8);
    }

    #[test]
    fn test_emergency_flag_from_table() {
        let pain = care_gesture('P').unwrap();
        let n = CareNotification::new(pain, Duration::ZERO, Utc::now());
        assert!(n.emergency);
        assert_eq!(n.subject(), "URGENT");
    }

    #[test]
    fn test_long_hold_escalates_routine_request() {
        let water = care_gesture('W').unwrap();
        let short = CareNotification::new(water, Duration::from_secs(3), Utc::now());
        assert!(!short.emergency, "exactly 3.0s is not an escalation");

        let long = CareNotification::new(water, Duration::from_millis(3100), Utc::now());
        assert!(long.emergency);
        assert!(long.alert_body().contains("Hold Duration: 3.1 seconds"));
    }

    #[test]
    fn test_care_log_recent_and_emergencies() {
        let mut log = CareLog::new();
        for letter in ['B', 'P', 'W', 'H', 'L'] {
            let gesture = care_gesture(letter).unwrap();
            log.record(CareNotification::new(gesture, Duration::ZERO, Utc::now()));
        }

        assert_eq!(log.len(), 5);
        let recent: Vec<char> = log.recent(2).iter().map(|n| n.gesture).collect();
        assert_eq!(recent, vec!['H', 'L']);
        assert_eq!(log.recent(10).len(), 5);
        assert_eq!(log.emergencies().count(), 2);
    }
}
