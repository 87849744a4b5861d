use std::collections::{BTreeMap, HashMap};

use crate::picks::{Participant, SEED_SLOTS, StandingsPick, TiebreakerPick};
use crate::player_stats::TiebreakerDefinition;
use crate::standings::StandingsRow;
use crate::teams::Conference;

/// Points by |picked seed - actual rank|; distances past the end score 0.
pub const RANK_POINTS: [i64; 4] = [7, 5, 3, 1];

/// Rank given to a team a bettor did not seed at all.
pub const UNPICKED_RANK: u8 = SEED_SLOTS + 1;

pub const PICKS_SUMMARY_HEADER: [&str; 7] = [
    "Conference",
    "Team",
    "Highest Rank",
    "Lowest Rank",
    "Median Rank",
    "Most Common Rank",
    "# Ranked",
];

pub fn rank_points(picks_rank: u32, standings_rank: u32) -> i64 {
    let distance = picks_rank.abs_diff(standings_rank) as usize;
    RANK_POINTS.get(distance).copied().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredStandingsPick {
    pub pick: StandingsPick,
    pub standings_rank: Option<u32>,
    pub rank_points: i64,
    pub playoff_points: i64,
    pub total_points: i64,
}

pub fn score_standings_picks(
    standings: &[StandingsRow],
    picks: &[StandingsPick],
) -> Vec<ScoredStandingsPick> {
    let by_team: HashMap<&str, &StandingsRow> =
        standings.iter().map(|row| (row.team.as_str(), row)).collect();

    picks
        .iter()
        .map(|pick| {
            let row = by_team.get(pick.team.as_str());
            let standings_rank = row.map(|r| r.rank);
            let rank_points = standings_rank
                .map(|rank| rank_points(pick.picks_rank as u32, rank))
                .unwrap_or(0);
            let playoff_points = row.map(|r| r.playoff_points).unwrap_or(0);
            ScoredStandingsPick {
                pick: pick.clone(),
                standings_rank,
                rank_points,
                playoff_points,
                total_points: rank_points + playoff_points,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredTiebreakerPick {
    pub pick: TiebreakerPick,
    pub actual: Option<i64>,
    pub difference: Option<i64>,
}

pub fn score_tiebreaker_picks(
    definitions: &[TiebreakerDefinition],
    picks: &[TiebreakerPick],
) -> Vec<ScoredTiebreakerPick> {
    picks
        .iter()
        .map(|pick| {
            let actual = definitions
                .iter()
                .find(|d| d.index == pick.index)
                .and_then(|d| d.value);
            let difference = match (pick.value, actual) {
                (Some(v), Some(a)) => Some((v - a).abs()),
                _ => None,
            };
            ScoredTiebreakerPick {
                pick: pick.clone(),
                actual,
                difference,
            }
        })
        .collect()
}

/// Aggregates of bettor picks for one team. `None` means blank: the value
/// only reflects bettors who left the team unseeded.
#[derive(Debug, Clone, PartialEq)]
pub struct PicksSummaryRow {
    pub conference: Conference,
    pub team: String,
    pub highest: Option<u8>,
    pub lowest: Option<u8>,
    pub median: Option<f64>,
    pub most_common: Option<u8>,
    pub ranked_share: f64,
}

/// Distribution of bettor seed picks per standings team.
///
/// Every (team, bettor) pair gets at least one value; a bettor who did not
/// seed the team counts as [`UNPICKED_RANK`]. Bettors come from
/// `participants`, so one who left every seed blank still counts. Media and
/// blank-source picks are excluded.
pub fn summarize_standings_picks(
    standings: &[StandingsRow],
    participants: &[Participant],
    picks: &[StandingsPick],
) -> Vec<PicksSummaryRow> {
    let bettor_picks = picks
        .iter()
        .filter(|p| p.participant.is_bettor())
        .collect::<Vec<_>>();

    let mut bettors: Vec<&str> = Vec::new();
    let emails = participants
        .iter()
        .filter(|p| p.is_bettor())
        .chain(bettor_picks.iter().map(|p| &p.participant))
        .map(|p| p.email.as_str());
    for email in emails {
        if !bettors.contains(&email) {
            bettors.push(email);
        }
    }

    let mut picked: HashMap<(&str, Conference, &str), Vec<u8>> = HashMap::new();
    for pick in &bettor_picks {
        picked
            .entry((
                pick.participant.email.as_str(),
                pick.conference,
                pick.team.as_str(),
            ))
            .or_default()
            .push(pick.picks_rank);
    }

    standings
        .iter()
        .map(|row| {
            let mut ranks = Vec::with_capacity(bettors.len());
            for email in &bettors {
                match picked.get(&(*email, row.conference, row.team.as_str())) {
                    Some(found) => ranks.extend(found.iter().copied()),
                    None => ranks.push(UNPICKED_RANK),
                }
            }
            summarize_ranks(row.conference, &row.team, ranks)
        })
        .collect()
}

fn summarize_ranks(conference: Conference, team: &str, mut ranks: Vec<u8>) -> PicksSummaryRow {
    ranks.sort_unstable();
    let ranked = ranks.iter().filter(|r| **r != UNPICKED_RANK).count();
    let ranked_share = if ranks.is_empty() {
        0.0
    } else {
        ranked as f64 / ranks.len() as f64
    };

    PicksSummaryRow {
        conference,
        team: team.to_string(),
        highest: ranks.first().copied().filter(|r| is_seeded(*r)),
        lowest: ranks.last().copied().filter(|r| is_seeded(*r)),
        median: median(&ranks),
        most_common: mode(&ranks).filter(|r| is_seeded(*r)),
        ranked_share,
    }
}

fn is_seeded(rank: u8) -> bool {
    rank <= SEED_SLOTS
}

// Blank whenever an unseeded value sits in the middle, including the
// midpoint of an even count.
fn median(sorted: &[u8]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        let mid = sorted[n / 2];
        return is_seeded(mid).then_some(mid as f64);
    }
    let (lo, hi) = (sorted[n / 2 - 1], sorted[n / 2]);
    if !is_seeded(hi) {
        return None;
    }
    Some((lo as f64 + hi as f64) / 2.0)
}

// Ties go to the smallest rank.
fn mode(ranks: &[u8]) -> Option<u8> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for rank in ranks {
        *counts.entry(*rank).or_default() += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == best)
        .map(|(rank, _)| rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_points_table() {
        assert_eq!(rank_points(3, 3), 7);
        assert_eq!(rank_points(3, 4), 5);
        assert_eq!(rank_points(4, 3), 5);
        assert_eq!(rank_points(1, 3), 3);
        assert_eq!(rank_points(5, 3), 3);
        assert_eq!(rank_points(1, 4), 1);
        assert_eq!(rank_points(8, 5), 1);
        assert_eq!(rank_points(1, 5), 0);
        assert_eq!(rank_points(8, 15), 0);
    }

    #[test]
    fn median_blanks_unseeded_midpoint() {
        assert_eq!(median(&[1, 9]), None);
        assert_eq!(median(&[2, 4]), Some(3.0));
        assert_eq!(median(&[1, 2, 9]), Some(2.0));
        assert_eq!(median(&[1, 9, 9]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mode_prefers_smallest_on_tie() {
        assert_eq!(mode(&[1, 9]), Some(1));
        assert_eq!(mode(&[3, 3, 2, 2, 9]), Some(2));
        assert_eq!(mode(&[9, 9, 4]), Some(9));
        assert_eq!(mode(&[]), None);
    }
}
