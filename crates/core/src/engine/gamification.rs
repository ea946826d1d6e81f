//! Motivational copy and badges derived from the current streak.
//!
//! Pure functions of the streak value only; recomputed fresh on every
//! completion, never stored.

use serde::{Deserialize, Serialize};

/// Milestone badges, awarded when the streak lands exactly on a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    FirstStep,
    WeekWarrior,
    MonthMaster,
    CenturyChampion,
    YearOfLight,
}

impl Badge {
    /// The badge earned at exactly this streak length, if any.
    #[must_use]
    pub fn for_streak(streak: u32) -> Option<Self> {
        match streak {
            1 => Some(Badge::FirstStep),
            7 => Some(Badge::WeekWarrior),
            30 => Some(Badge::MonthMaster),
            100 => Some(Badge::CenturyChampion),
            365 => Some(Badge::YearOfLight),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Badge::FirstStep => "First Step",
            Badge::WeekWarrior => "Week Warrior",
            Badge::MonthMaster => "Month Master",
            Badge::CenturyChampion => "Century Champion",
            Badge::YearOfLight => "Year of Light",
        }
    }
}

/// Picks the first matching band for the streak value.
#[must_use]
pub fn motivational_message(streak: u32) -> &'static str {
    match streak {
        1 => "A beautiful beginning. Come back tomorrow to keep it going!",
        s if s <= 3 => "The first days are the hardest. You are building something.",
        s if s <= 7 => "A whole week of light is within reach. Stay steady.",
        s if s <= 30 => "Your daily reading is becoming part of who you are.",
        s if s <= 100 => "Months of devotion. Your consistency is remarkable.",
        _ => "Your dedication is an inspiration to everyone around you.",
    }
}
