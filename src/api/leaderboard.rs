use crate::errors::AppError;
use crate::model::player::LeaderboardRow;
use crate::schema::{
    leaderboard::dsl as lb_dsl, submissions::dsl as sub_dsl, user_points::dsl as up_dsl,
};
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, sum};
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fully recomputes the leaderboard snapshot from the raw history tables.
///
/// Aggregates the point ledger and submission history per player, bulk-upserts
/// one row per player seen in any of them, then assigns ranks 1..n ordered by
/// total points descending (ties broken by player id). Runs on the caller's
/// connection so it participates in the caller's transaction.
///
/// Returns the number of ranked rows.
pub(super) fn recompute(conn: &mut PgConnection) -> Result<i64, AppError> {
    let now = Utc::now();

    let point_totals: Vec<(i64, Option<i64>)> = up_dsl::user_points
        .group_by(up_dsl::player_id)
        .select((up_dsl::player_id, sum(up_dsl::points)))
        .load(conn)?;

    let win_counts: Vec<(i64, i64)> = sub_dsl::submissions
        .filter(sub_dsl::is_winner.eq(true))
        .group_by(sub_dsl::player_id)
        .select((sub_dsl::player_id, count_star()))
        .load(conn)?;

    let participation_counts: Vec<(i64, i64)> = sub_dsl::submissions
        .group_by(sub_dsl::player_id)
        .select((sub_dsl::player_id, count_star()))
        .load(conn)?;

    let last_activities: Vec<(i64, Option<DateTime<Utc>>)> = sub_dsl::submissions
        .group_by(sub_dsl::player_id)
        .select((sub_dsl::player_id, max(sub_dsl::submitted_at)))
        .load(conn)?;

    let mut rows: BTreeMap<i64, LeaderboardRow> = BTreeMap::new();
    let blank_row = |player_id: i64| LeaderboardRow {
        player_id,
        total_points: 0,
        total_wins: 0,
        total_participation: 0,
        last_activity_at: None,
        rank: 0,
        updated_at: now,
    };

    for (player_id, points) in point_totals {
        rows.entry(player_id).or_insert_with(|| blank_row(player_id)).total_points =
            points.unwrap_or(0);
    }
    for (player_id, wins) in win_counts {
        rows.entry(player_id).or_insert_with(|| blank_row(player_id)).total_wins = wins;
    }
    for (player_id, submissions) in participation_counts {
        rows.entry(player_id)
            .or_insert_with(|| blank_row(player_id))
            .total_participation = submissions;
    }
    for (player_id, last_activity) in last_activities {
        rows.entry(player_id)
            .or_insert_with(|| blank_row(player_id))
            .last_activity_at = last_activity;
    }

    debug!("Aggregated leaderboard state for {} players", rows.len());

    if !rows.is_empty() {
        let upserts: Vec<LeaderboardRow> = rows.into_values().collect();
        diesel::insert_into(lb_dsl::leaderboard)
            .values(&upserts)
            .on_conflict(lb_dsl::player_id)
            .do_update()
            .set((
                lb_dsl::total_points.eq(excluded(lb_dsl::total_points)),
                lb_dsl::total_wins.eq(excluded(lb_dsl::total_wins)),
                lb_dsl::total_participation.eq(excluded(lb_dsl::total_participation)),
                lb_dsl::last_activity_at.eq(excluded(lb_dsl::last_activity_at)),
                lb_dsl::updated_at.eq(excluded(lb_dsl::updated_at)),
            ))
            .execute(conn)?;
    }

    let ordered_player_ids: Vec<i64> = lb_dsl::leaderboard
        .order((lb_dsl::total_points.desc(), lb_dsl::player_id.asc()))
        .select(lb_dsl::player_id)
        .load(conn)?;

    for (index, player_id) in ordered_player_ids.iter().enumerate() {
        diesel::update(lb_dsl::leaderboard.find(*player_id))
            .set(lb_dsl::rank.eq((index + 1) as i32))
            .execute(conn)?;
    }

    info!("Leaderboard recomputed: {} players ranked", ordered_player_ids.len());
    Ok(ordered_player_ids.len() as i64)
}
