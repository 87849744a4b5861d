use nba_sheets::picks::{BETTOR, Participant, StandingsPick, TiebreakerPick};
use nba_sheets::player_stats::TiebreakerDefinition;
use nba_sheets::scoring::{
    PicksSummaryRow, score_standings_picks, score_tiebreaker_picks, summarize_standings_picks,
};
use nba_sheets::standings::{PlayoffBands, StandingsRow};
use nba_sheets::teams::Conference;

fn standing(conference: Conference, rank: u32, team: &str) -> StandingsRow {
    StandingsRow {
        conference,
        rank,
        team: team.to_string(),
        record: "0-0".to_string(),
        pct: 0.0,
        games_back: 0.0,
        playoff_points: PlayoffBands::default().points(rank),
    }
}

fn participant(email: &str, source: &str) -> Participant {
    Participant {
        email: email.to_string(),
        name: email.split('@').next().unwrap_or_default().to_string(),
        source: source.to_string(),
    }
}

fn pick(who: &Participant, conference: Conference, picks_rank: u8, team: &str) -> StandingsPick {
    StandingsPick {
        participant: who.clone(),
        conference,
        picks_rank,
        team: team.to_string(),
    }
}

fn standings() -> Vec<StandingsRow> {
    vec![
        standing(Conference::Western, 1, "Oklahoma City Thunder"),
        standing(Conference::Western, 2, "Denver Nuggets"),
        standing(Conference::Western, 7, "Los Angeles Lakers"),
        standing(Conference::Eastern, 1, "Boston Celtics"),
    ]
}

fn row<'a>(rows: &'a [PicksSummaryRow], team: &str) -> &'a PicksSummaryRow {
    rows.iter()
        .find(|r| r.team == team)
        .expect("summary row should exist")
}

#[test]
fn one_bettor_seeding_a_team_the_other_skipped() {
    let a = participant("a@example.com", BETTOR);
    let b = participant("b@example.com", BETTOR);
    let picks = vec![
        pick(&a, Conference::Western, 1, "Oklahoma City Thunder"),
        pick(&b, Conference::Western, 1, "Denver Nuggets"),
    ];
    let rows = summarize_standings_picks(&standings(), &[a, b], &picks);
    assert_eq!(rows.len(), 4);

    let thunder = row(&rows, "Oklahoma City Thunder");
    assert_eq!(thunder.highest, Some(1));
    assert_eq!(thunder.lowest, None);
    assert_eq!(thunder.median, None);
    assert_eq!(thunder.most_common, Some(1));
    assert_eq!(thunder.ranked_share, 0.5);
}

#[test]
fn team_nobody_seeded_is_blank() {
    let a = participant("a@example.com", BETTOR);
    let b = participant("b@example.com", BETTOR);
    let picks = vec![
        pick(&a, Conference::Western, 1, "Oklahoma City Thunder"),
        pick(&b, Conference::Western, 2, "Oklahoma City Thunder"),
    ];
    let rows = summarize_standings_picks(&standings(), &[a, b], &picks);

    let lakers = row(&rows, "Los Angeles Lakers");
    assert_eq!(lakers.highest, None);
    assert_eq!(lakers.lowest, None);
    assert_eq!(lakers.median, None);
    assert_eq!(lakers.most_common, None);
    assert_eq!(lakers.ranked_share, 0.0);

    let thunder = row(&rows, "Oklahoma City Thunder");
    assert_eq!(thunder.highest, Some(1));
    assert_eq!(thunder.lowest, Some(2));
    assert_eq!(thunder.median, Some(1.5));
    assert_eq!(thunder.most_common, Some(1));
    assert_eq!(thunder.ranked_share, 1.0);
}

#[test]
fn media_picks_are_left_out() {
    let a = participant("a@example.com", BETTOR);
    let press = participant("press@example.com", "Media");
    let picks = vec![
        pick(&a, Conference::Eastern, 1, "Boston Celtics"),
        pick(&press, Conference::Western, 1, "Los Angeles Lakers"),
    ];
    let rows = summarize_standings_picks(&standings(), &[a, press], &picks);

    let lakers = row(&rows, "Los Angeles Lakers");
    assert_eq!(lakers.highest, None);
    assert_eq!(lakers.ranked_share, 0.0);

    let celtics = row(&rows, "Boston Celtics");
    assert_eq!(celtics.highest, Some(1));
    assert_eq!(celtics.ranked_share, 1.0);
}

#[test]
fn no_bettors_means_zero_share_everywhere() {
    let press = participant("press@example.com", "Media");
    let picks = vec![pick(&press, Conference::Western, 1, "Denver Nuggets")];
    let rows = summarize_standings_picks(&standings(), &[press], &picks);
    assert!(rows.iter().all(|r| r.ranked_share == 0.0 && r.highest.is_none()));
}

#[test]
fn blank_source_submissions_are_left_out() {
    let a = participant("a@example.com", BETTOR);
    let unknown = participant("x@example.com", "");
    let picks = vec![
        pick(&a, Conference::Western, 1, "Oklahoma City Thunder"),
        pick(&unknown, Conference::Western, 1, "Denver Nuggets"),
    ];
    let rows = summarize_standings_picks(&standings(), &[a, unknown], &picks);

    let nuggets = row(&rows, "Denver Nuggets");
    assert_eq!(nuggets.highest, None);
    assert_eq!(nuggets.ranked_share, 0.0);

    let thunder = row(&rows, "Oklahoma City Thunder");
    assert_eq!(thunder.highest, Some(1));
    assert_eq!(thunder.ranked_share, 1.0);
}

#[test]
fn bettor_without_seed_answers_still_counts() {
    let a = participant("a@example.com", BETTOR);
    let silent = participant("s@example.com", BETTOR);
    let picks = vec![pick(&a, Conference::Western, 2, "Denver Nuggets")];
    let rows = summarize_standings_picks(&standings(), &[a, silent], &picks);

    let nuggets = row(&rows, "Denver Nuggets");
    assert_eq!(nuggets.highest, Some(2));
    assert_eq!(nuggets.lowest, None);
    assert_eq!(nuggets.ranked_share, 0.5);

    let lakers = row(&rows, "Los Angeles Lakers");
    assert_eq!(lakers.ranked_share, 0.0);
}

#[test]
fn standings_picks_score_both_directions() {
    let a = participant("a@example.com", BETTOR);
    let picks = vec![
        pick(&a, Conference::Western, 1, "Oklahoma City Thunder"),
        pick(&a, Conference::Western, 4, "Denver Nuggets"),
        pick(&a, Conference::Western, 3, "Los Angeles Lakers"),
        pick(&a, Conference::Western, 5, "Seattle SuperSonics"),
    ];
    let scored = score_standings_picks(&standings(), &picks);

    assert_eq!(scored[0].standings_rank, Some(1));
    assert_eq!(scored[0].rank_points, 7);
    assert_eq!(scored[0].playoff_points, 8);
    assert_eq!(scored[0].total_points, 15);

    assert_eq!(scored[1].rank_points, 3);
    assert_eq!(scored[2].rank_points, 0);
    assert_eq!(scored[2].playoff_points, 4);
    assert_eq!(scored[2].total_points, 4);

    assert_eq!(scored[3].standings_rank, None);
    assert_eq!(scored[3].total_points, 0);
}

#[test]
fn tiebreaker_difference_is_absolute() {
    let a = participant("a@example.com", BETTOR);
    let definitions = vec![
        TiebreakerDefinition {
            index: 1,
            description: "assists".to_string(),
            value: Some(61),
        },
        TiebreakerDefinition {
            index: 2,
            description: "games".to_string(),
            value: None,
        },
    ];
    let picks = vec![
        TiebreakerPick {
            participant: a.clone(),
            index: 1,
            value: Some(50),
        },
        TiebreakerPick {
            participant: a.clone(),
            index: 1,
            value: Some(70),
        },
        TiebreakerPick {
            participant: a,
            index: 2,
            value: Some(6),
        },
    ];
    let scored = score_tiebreaker_picks(&definitions, &picks);
    assert_eq!(scored[0].difference, Some(11));
    assert_eq!(scored[1].difference, Some(9));
    assert_eq!(scored[2].actual, None);
    assert_eq!(scored[2].difference, None);
}
