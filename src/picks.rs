use std::collections::HashMap;
use std::fmt;

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::teams::Conference;

pub const BETTOR: &str = "Bettor";
pub const SEED_SLOTS: u8 = 8;

pub const STANDINGS_PICKS_HEADER: [&str; 6] = [
    "Email",
    "Name",
    "Picks Source",
    "Conference",
    "Picks Rank",
    "Team",
];

pub const TIEBREAKER_PICKS_HEADER: [&str; 5] =
    ["Email", "Name", "Picks Source", "Tiebreaker #", "Pick Value"];

/// Canonical response field a form question is renamed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    Name,
    PicksSource,
    Seed { conference: Conference, rank: u8 },
    Tiebreaker(u8),
}

impl Field {
    /// Accepts `Email`, `Name`, `Picks Source`, `Western_1`..`Eastern_8` and
    /// `Tiebreaker_N`.
    pub fn parse(raw: &str) -> Option<Field> {
        let raw = raw.trim();
        match raw {
            "Email" => return Some(Field::Email),
            "Name" => return Some(Field::Name),
            "Picks Source" => return Some(Field::PicksSource),
            _ => {}
        }
        let (prefix, suffix) = raw.split_once('_')?;
        let n = suffix.parse::<u8>().ok()?;
        if prefix == "Tiebreaker" {
            return (n > 0).then_some(Field::Tiebreaker(n));
        }
        let conference = Conference::parse(prefix)?;
        (1..=SEED_SLOTS)
            .contains(&n)
            .then_some(Field::Seed {
                conference,
                rank: n,
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Email => f.write_str("Email"),
            Field::Name => f.write_str("Name"),
            Field::PicksSource => f.write_str("Picks Source"),
            Field::Seed { conference, rank } => write!(f, "{conference}_{rank}"),
            Field::Tiebreaker(n) => write!(f, "Tiebreaker_{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub label: String,
    pub field: String,
}

pub fn default_column_map() -> Vec<ColumnMapping> {
    let mut out = vec![
        mapping("Email Address", "Email"),
        mapping("What is your name?", "Name"),
        mapping("Are these picks from a bettor or the media?", "Picks Source"),
    ];
    for conference in Conference::ALL {
        for rank in 1..=SEED_SLOTS {
            out.push(mapping(
                &format!("{conference} Conference Seeding [{} Seed]", ordinal(rank)),
                &format!("{conference}_{rank}"),
            ));
        }
    }
    for n in 1..=2 {
        out.push(mapping(&format!("Tiebreaker #{n}"), &format!("Tiebreaker_{n}")));
    }
    out
}

fn mapping(label: &str, field: &str) -> ColumnMapping {
    ColumnMapping {
        label: label.to_string(),
        field: field.to_string(),
    }
}

fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Question text -> canonical field.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    by_label: HashMap<String, Field>,
}

impl ColumnMap {
    pub fn new(mappings: &[ColumnMapping]) -> Result<Self> {
        let mut by_label = HashMap::new();
        for m in mappings {
            let field = Field::parse(&m.field)
                .ok_or_else(|| anyhow!("unknown canonical field {:?} for {:?}", m.field, m.label))?;
            by_label.insert(m.label.trim().to_string(), field);
        }
        Ok(Self { by_label })
    }

    pub fn field(&self, label: &str) -> Option<Field> {
        self.by_label.get(label.trim()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Participant {
    pub email: String,
    pub name: String,
    pub source: String,
}

impl Participant {
    /// Exact match on the submitted source; a skipped answer is not a bettor.
    pub fn is_bettor(&self) -> bool {
        self.source == BETTOR
    }
}

/// One form submission after renaming; unmapped columns are gone.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub participant: Participant,
    pub values: Vec<(Field, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Melted<K> {
    pub participant: Participant,
    pub key: K,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsPick {
    pub participant: Participant,
    pub conference: Conference,
    pub picks_rank: u8,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiebreakerPick {
    pub participant: Participant,
    pub index: u8,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPicks {
    /// One entry per submission, including those with no seed answers.
    pub participants: Vec<Participant>,
    pub standings: Vec<StandingsPick>,
    pub tiebreakers: Vec<TiebreakerPick>,
}

/// Parses the raw response grid (header row first) into the two long tables.
pub fn parse_responses(grid: &[Vec<String>], map: &ColumnMap) -> Result<ParsedPicks> {
    let records = rename_columns(grid, map)?;

    let standings = melt(&records, |field| match field {
        Field::Seed { conference, rank } => Some((conference, rank)),
        _ => None,
    })
    .into_iter()
    .map(|m| StandingsPick {
        participant: m.participant,
        conference: m.key.0,
        picks_rank: m.key.1,
        team: m.value,
    })
    .collect();

    let tiebreakers = melt(&records, |field| match field {
        Field::Tiebreaker(n) => Some(n),
        _ => None,
    })
    .into_iter()
    .map(|m| {
        let value = parse_pick_value(&m.value);
        if value.is_none() {
            warn!(
                email = %m.participant.email,
                tiebreaker = m.key,
                raw = %m.value,
                "tiebreaker pick is not a number"
            );
        }
        TiebreakerPick {
            participant: m.participant,
            index: m.key,
            value,
        }
    })
    .collect();

    Ok(ParsedPicks {
        participants: records.iter().map(|r| r.participant.clone()).collect(),
        standings,
        tiebreakers,
    })
}

pub fn rename_columns(grid: &[Vec<String>], map: &ColumnMap) -> Result<Vec<ResponseRecord>> {
    let Some((header, body)) = grid.split_first() else {
        return Ok(Vec::new());
    };

    let mut columns: Vec<(usize, Field)> = Vec::new();
    for (idx, label) in header.iter().enumerate() {
        let Some(field) = map.field(label) else {
            debug!(column = %label, "dropping unmapped response column");
            continue;
        };
        if let Some((other, _)) = columns.iter().find(|(_, f)| *f == field) {
            bail!("columns {other} and {idx} both map to {field}");
        }
        columns.push((idx, field));
    }

    let mut out = Vec::new();
    for row in body {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut participant = Participant {
            email: String::new(),
            name: String::new(),
            source: String::new(),
        };
        let mut values = Vec::new();
        for (idx, field) in &columns {
            let value = row.get(*idx).map(|v| v.trim()).unwrap_or_default();
            match field {
                Field::Email => participant.email = value.to_string(),
                Field::Name => participant.name = value.to_string(),
                Field::PicksSource => participant.source = value.to_string(),
                _ => values.push((*field, value.to_string())),
            }
        }
        out.push(ResponseRecord {
            participant,
            values,
        });
    }
    Ok(out)
}

/// Wide-to-long reshape: one output row per record and selected column,
/// carrying the participant along. Blank answers produce no row.
pub fn melt<K>(records: &[ResponseRecord], select: impl Fn(Field) -> Option<K>) -> Vec<Melted<K>> {
    let mut out = Vec::new();
    for record in records {
        for (field, value) in &record.values {
            let Some(key) = select(*field) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            out.push(Melted {
                participant: record.participant.clone(),
                key,
                value: value.clone(),
            });
        }
    }
    out
}

fn parse_pick_value(raw: &str) -> Option<i64> {
    let cleaned = raw.trim().replace(',', "");
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    let v = cleaned.parse::<f64>().ok()?;
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for raw in ["Email", "Name", "Picks Source", "Western_1", "Eastern_8", "Tiebreaker_2"] {
            let field = Field::parse(raw).unwrap();
            assert_eq!(field.to_string(), raw);
        }
        assert_eq!(Field::parse("Western_9"), None);
        assert_eq!(Field::parse("Central_1"), None);
        assert_eq!(Field::parse("Tiebreaker_0"), None);
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
    }

    #[test]
    fn default_map_covers_every_seed() {
        let map = ColumnMap::new(&default_column_map()).unwrap();
        assert_eq!(
            map.field("Eastern Conference Seeding [3rd Seed]"),
            Some(Field::Seed {
                conference: Conference::Eastern,
                rank: 3
            })
        );
        assert_eq!(map.field("Timestamp"), None);
    }

    #[test]
    fn bad_canonical_field_rejected() {
        assert!(ColumnMap::new(&[mapping("Q", "Southern_1")]).is_err());
    }

    #[test]
    fn pick_values() {
        assert_eq!(parse_pick_value("1,250"), Some(1250));
        assert_eq!(parse_pick_value(" 72 "), Some(72));
        assert_eq!(parse_pick_value("72.0"), Some(72));
        assert_eq!(parse_pick_value("72.5"), None);
        assert_eq!(parse_pick_value("lots"), None);
    }
}
