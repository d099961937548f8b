//! Fixed, non-overlapping categorical classifications used as aggregation
//! keys and similarity features. Every classifier is total.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hour of day (0-23) of `ts` in the display timezone.
pub fn local_hour(ts: DateTime<Utc>, tz: Tz) -> u32 {
    ts.with_timezone(&tz).hour()
}

pub fn local_weekday(ts: DateTime<Utc>, tz: Tz) -> Weekday {
    ts.with_timezone(&tz).weekday()
}

pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Six sessions covering the day, used for drawdown loss breakdowns.
/// Late night wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionBucket {
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
    Night,
    LateNight,
}

impl SessionBucket {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=8 => SessionBucket::EarlyMorning,
            9..=11 => SessionBucket::Morning,
            12..=14 => SessionBucket::Afternoon,
            15..=17 => SessionBucket::Evening,
            18..=20 => SessionBucket::Night,
            _ => SessionBucket::LateNight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionBucket::EarlyMorning => "early-morning",
            SessionBucket::Morning => "morning",
            SessionBucket::Afternoon => "afternoon",
            SessionBucket::Evening => "evening",
            SessionBucket::Night => "night",
            SessionBucket::LateNight => "late-night",
        }
    }
}

impl fmt::Display for SessionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market sessions used as the time-of-day similarity feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSession {
    AsiaMorning,
    AsiaAfternoon,
    EuropeEarly,
    EuropeLate,
    NySession,
    Other,
}

impl MatchSession {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=8 => MatchSession::AsiaMorning,
            9..=14 => MatchSession::AsiaAfternoon,
            15..=17 => MatchSession::EuropeEarly,
            18..=20 => MatchSession::EuropeLate,
            21..=23 => MatchSession::NySession,
            _ => MatchSession::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSession::AsiaMorning => "asia-morning",
            MatchSession::AsiaAfternoon => "asia-afternoon",
            MatchSession::EuropeEarly => "europe-early",
            MatchSession::EuropeLate => "europe-late",
            MatchSession::NySession => "ny-session",
            MatchSession::Other => "other",
        }
    }
}

/// Four-hour slots used for bucketed loss-streak drill-downs.
/// `NyEarly` wraps past midnight (22:00-02:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreakSlot {
    AsiaMorning,
    AsiaAfternoon,
    EuropeEarly,
    EuropeLate,
    NyEarly,
    NyLate,
}

impl StreakSlot {
    pub const ALL: [StreakSlot; 6] = [
        StreakSlot::AsiaMorning,
        StreakSlot::AsiaAfternoon,
        StreakSlot::EuropeEarly,
        StreakSlot::EuropeLate,
        StreakSlot::NyEarly,
        StreakSlot::NyLate,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=9 => StreakSlot::AsiaMorning,
            10..=13 => StreakSlot::AsiaAfternoon,
            14..=17 => StreakSlot::EuropeEarly,
            18..=21 => StreakSlot::EuropeLate,
            2..=5 => StreakSlot::NyLate,
            _ => StreakSlot::NyEarly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreakSlot::AsiaMorning => "asia-morning",
            StreakSlot::AsiaAfternoon => "asia-afternoon",
            StreakSlot::EuropeEarly => "europe-early",
            StreakSlot::EuropeLate => "europe-late",
            StreakSlot::NyEarly => "ny-early",
            StreakSlot::NyLate => "ny-late",
        }
    }

    pub fn hours_label(&self) -> &'static str {
        match self {
            StreakSlot::AsiaMorning => "06-10",
            StreakSlot::AsiaAfternoon => "10-14",
            StreakSlot::EuropeEarly => "14-18",
            StreakSlot::EuropeLate => "18-22",
            StreakSlot::NyEarly => "22-02",
            StreakSlot::NyLate => "02-06",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl fmt::Display for StreakSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.hours_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingBucket {
    Short,
    Medium,
    Long,
}

impl HoldingBucket {
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes < 60.0 {
            HoldingBucket::Short
        } else if minutes < 240.0 {
            HoldingBucket::Medium
        } else {
            HoldingBucket::Long
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RBucket {
    #[serde(rename = "no-sl")]
    NoStop,
    #[serde(rename = "<=-3")]
    AtOrBelowNeg3,
    #[serde(rename = "(-3,-1]")]
    Neg3ToNeg1,
    #[serde(rename = "(-1,0)")]
    Neg1To0,
    #[serde(rename = "[0,1)")]
    ZeroTo1,
    #[serde(rename = "[1,3)")]
    OneTo3,
    #[serde(rename = ">=3")]
    AtOrAbove3,
}

impl RBucket {
    pub fn from_r(r: Option<f64>) -> Self {
        let Some(r) = r else {
            return RBucket::NoStop;
        };
        if r <= -3.0 {
            RBucket::AtOrBelowNeg3
        } else if r <= -1.0 {
            RBucket::Neg3ToNeg1
        } else if r < 0.0 {
            RBucket::Neg1To0
        } else if r < 1.0 {
            RBucket::ZeroTo1
        } else if r < 3.0 {
            RBucket::OneTo3
        } else {
            RBucket::AtOrAbove3
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RBucket::NoStop => "no-sl",
            RBucket::AtOrBelowNeg3 => "<=-3",
            RBucket::Neg3ToNeg1 => "(-3,-1]",
            RBucket::Neg1To0 => "(-1,0)",
            RBucket::ZeroTo1 => "[0,1)",
            RBucket::OneTo3 => "[1,3)",
            RBucket::AtOrAbove3 => ">=3",
        }
    }
}
