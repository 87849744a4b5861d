use std::fmt;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conference {
    Western,
    Eastern,
}

impl Conference {
    pub const ALL: [Conference; 2] = [Conference::Western, Conference::Eastern];

    pub fn label(self) -> &'static str {
        match self {
            Conference::Western => "Western",
            Conference::Eastern => "Eastern",
        }
    }

    pub fn parse(raw: &str) -> Option<Conference> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "western" | "west" => Some(Conference::Western),
            "eastern" | "east" => Some(Conference::Eastern),
            _ => None,
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Site label -> canonical full name.
const TEAM_NAMES: &[(&str, &str)] = &[
    ("Lakers", "Los Angeles Lakers"),
    ("Clippers", "LA Clippers"),
    ("Nuggets", "Denver Nuggets"),
    ("Thunder", "Oklahoma City Thunder"),
    ("Rockets", "Houston Rockets"),
    ("Jazz", "Utah Jazz"),
    ("Mavericks", "Dallas Mavericks"),
    ("Trail Blazers", "Portland Trail Blazers"),
    ("Grizzlies", "Memphis Grizzlies"),
    ("Suns", "Phoenix Suns"),
    ("Spurs", "San Antonio Spurs"),
    ("Kings", "Sacramento Kings"),
    ("Pelicans", "New Orleans Pelicans"),
    ("Timberwolves", "Minnesota Timberwolves"),
    ("Warriors", "Golden State Warriors"),
    ("Bucks", "Milwaukee Bucks"),
    ("Raptors", "Toronto Raptors"),
    ("Celtics", "Boston Celtics"),
    ("Heat", "Miami Heat"),
    ("Pacers", "Indiana Pacers"),
    ("76ers", "Philadelphia 76ers"),
    ("Magic", "Orlando Magic"),
    ("Nets", "Brooklyn Nets"),
    ("Wizards", "Washington Wizards"),
    ("Hornets", "Charlotte Hornets"),
    ("Bulls", "Chicago Bulls"),
    ("Knicks", "New York Knicks"),
    ("Pistons", "Detroit Pistons"),
    ("Hawks", "Atlanta Hawks"),
    ("Cavaliers", "Cleveland Cavaliers"),
];

/// Maps a standings-page label to the team's canonical name.
///
/// The table is a fixed fixture, so a miss is reported as an error rather
/// than defaulted.
pub fn canonical_team_name(label: &str) -> Result<&'static str> {
    let label = label.trim();
    TEAM_NAMES
        .iter()
        .find(|(short, full)| *short == label || *full == label)
        .map(|(_, full)| *full)
        .ok_or_else(|| anyhow!("no canonical team name for label {label:?}"))
}

pub fn all_canonical_names() -> impl Iterator<Item = &'static str> {
    TEAM_NAMES.iter().map(|(_, full)| *full)
}
