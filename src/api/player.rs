use super::helper;

use crate::model::player::{
    LeaderboardEntry, LeaderboardPageResponse, NewSubmission, PlayerBadge, PlayerBookCredit,
    PlayerDiscountCode, PlayerRewardsResponse, PublishedGame, SubmitEntryResponse,
};
use crate::payloads::player::{GetLeaderboardParams, GetPlayerRewardsParams, SubmitEntryPayload};
use crate::{
    errors::AppError,
    response::ApiResponse,
    schema::{
        badges::dsl as badges_dsl, book_credits::dsl as bc_dsl, discount_codes::dsl as dc_dsl,
        games::dsl as games_dsl, leaderboard::dsl as lb_dsl, players::dsl as players_dsl,
        questions::dsl as q_dsl, submissions::dsl as sub_dsl, user_badges::dsl as ub_dsl,
        user_points::dsl as up_dsl,
    },
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use deadpool_diesel::postgres::Pool;
use diesel::dsl::sum;
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, instrument, warn};

const MAX_PAGE_SIZE: i64 = 100;

/// Lists games that are open to the community: published and not expired.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<PublishedGame>`: Open games, most recently published first (200 OK).
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool))]
pub async fn get_published_games(
    State(pool): State<Pool>,
) -> Result<ApiResponse<Vec<PublishedGame>>, AppError> {
    info!("Fetching published games");

    let now = Utc::now();
    let games = helper::run_query(&pool, move |conn| {
        games_dsl::games
            .filter(games_dsl::status.eq("published"))
            .filter(
                games_dsl::expires_at
                    .is_null()
                    .or(games_dsl::expires_at.gt(now)),
            )
            .order(games_dsl::published_at.desc())
            .select((
                games_dsl::id,
                games_dsl::title,
                games_dsl::description,
                games_dsl::game_type,
                games_dsl::difficulty,
                games_dsl::config,
                games_dsl::expires_at,
                games_dsl::published_at,
            ))
            .load::<PublishedGame>(conn)
    })
    .await?;

    info!("Successfully fetched {} published games", games.len());
    Ok(ApiResponse::ok(games))
}

/// Submits a player's entry for a game.
///
/// Request Body: `SubmitEntryPayload`
///
/// Quiz entries are scored immediately against the stored question set;
/// other game types are stored unscored for manual review. Nothing prevents
/// a player from entering the same game more than once.
///
/// Returns (wrapped in `ApiResponse`)
/// * `SubmitEntryResponse`: New submission id and auto-score, if any (200 OK).
/// * `404 Not Found`: If the player or game doesn't exist.
/// * `422 Unprocessable Entity`: If the player is disabled, or the game is
///   not published or has expired.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn submit_entry(
    State(pool): State<Pool>,
    Json(payload): Json<SubmitEntryPayload>,
) -> Result<ApiResponse<SubmitEntryResponse>, AppError> {
    let player_id = payload.player_id;
    let game_id = payload.game_id;
    info!(
        "Player {} submitting an entry for game {}",
        player_id, game_id
    );
    debug!("Submit entry payload: {:?}", payload);

    let player_disabled = helper::run_query(&pool, move |conn| {
        players_dsl::players
            .find(player_id)
            .select(players_dsl::disabled)
            .first::<bool>(conn)
            .optional()
    })
    .await?;

    let Some(player_disabled) = player_disabled else {
        error!("Player with ID {} not found.", player_id);
        return Err(AppError::NotFound(format!(
            "Player with ID {} not found.",
            player_id
        )));
    };

    if player_disabled {
        warn!("Disabled player {} attempted to enter game {}", player_id, game_id);
        return Err(AppError::UnprocessableEntity(format!(
            "Player with ID {} is disabled.",
            player_id
        )));
    }

    let game = helper::run_query(&pool, move |conn| {
        games_dsl::games
            .find(game_id)
            .select((
                games_dsl::game_type,
                games_dsl::status,
                games_dsl::expires_at,
            ))
            .first::<(String, String, Option<DateTime<Utc>>)>(conn)
            .optional()
    })
    .await?;

    let Some((game_type, status, expires_at)) = game else {
        error!("Game with ID {} not found.", game_id);
        return Err(AppError::NotFound(format!(
            "Game with ID {} not found.",
            game_id
        )));
    };

    if status != "published" {
        warn!(
            "Game {} is in status '{}'; rejecting entry from player {}",
            game_id, status, player_id
        );
        return Err(AppError::UnprocessableEntity(format!(
            "Game with ID {} is not open for entries.",
            game_id
        )));
    }

    if let Some(expires_at) = expires_at {
        if expires_at <= Utc::now() {
            warn!(
                "Game {} expired at {}; rejecting entry from player {}",
                game_id, expires_at, player_id
            );
            return Err(AppError::UnprocessableEntity(format!(
                "Game with ID {} has expired.",
                game_id
            )));
        }
    }

    let score = if game_type == "quiz" {
        let questions = helper::run_query(&pool, move |conn| {
            q_dsl::questions
                .filter(q_dsl::game_id.eq(game_id))
                .select((
                    q_dsl::id,
                    q_dsl::question_type,
                    q_dsl::correct_answer,
                    q_dsl::points,
                ))
                .load::<(i64, String, JsonValue, i32)>(conn)
        })
        .await?;

        let score = score_quiz_answers(&payload.answers, &questions);
        info!(
            "Auto-scored quiz entry for player {} in game {}: {} points",
            player_id, game_id, score
        );
        Some(score)
    } else {
        None
    };

    let answers = payload.answers;
    let now = Utc::now();

    let conn = pool.get().await?;
    let submission_result: Result<i64, AppError> = conn
        .interact(move |conn_sync| {
            conn_sync.transaction(|transaction_conn| {
                let new_submission = NewSubmission {
                    game_id,
                    player_id,
                    answers,
                    score,
                };

                let submission_id = diesel::insert_into(sub_dsl::submissions)
                    .values(&new_submission)
                    .returning(sub_dsl::id)
                    .get_result::<i64>(transaction_conn)?;

                diesel::update(players_dsl::players.find(player_id))
                    .set(players_dsl::last_active.eq(now))
                    .execute(transaction_conn)?;

                Ok(submission_id)
            })
        })
        .await?;

    let submission_id = submission_result?;
    info!(
        "Recorded submission {} for player {} in game {}",
        submission_id, player_id, game_id
    );
    Ok(ApiResponse::ok(SubmitEntryResponse {
        submission_id,
        score,
    }))
}

/// Retrieves a page of the leaderboard snapshot.
///
/// Query Parameters:
/// * `page` / `limit`: Pagination (1-based page, capped at 100 per page).
///
/// Returns (wrapped in `ApiResponse`)
/// * `LeaderboardPageResponse`: Entries ordered by rank with display names,
///   plus the total row count (200 OK).
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_leaderboard(
    State(pool): State<Pool>,
    Query(params): Query<GetLeaderboardParams>,
) -> Result<ApiResponse<LeaderboardPageResponse>, AppError> {
    info!("Fetching leaderboard page");
    debug!("Get leaderboard params: {:?}", params);

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let (total, entries) = helper::run_query(&pool, move |conn| {
        let total = lb_dsl::leaderboard.count().get_result::<i64>(conn)?;

        let entries = lb_dsl::leaderboard
            .inner_join(players_dsl::players)
            .order(lb_dsl::rank.asc())
            .offset(offset)
            .limit(limit)
            .select((
                lb_dsl::rank,
                lb_dsl::player_id,
                players_dsl::display_name,
                lb_dsl::total_points,
                lb_dsl::total_wins,
                lb_dsl::total_participation,
                lb_dsl::last_activity_at,
            ))
            .load::<LeaderboardEntry>(conn)?;

        Ok((total, entries))
    })
    .await?;

    info!(
        "Returning {} of {} leaderboard entries",
        entries.len(),
        total
    );
    Ok(ApiResponse::ok(LeaderboardPageResponse {
        entries,
        total,
        page,
        limit,
    }))
}

/// Retrieves everything a player has earned: badges, the point total, and
/// unredeemed discount codes and book credits.
///
/// Query Parameters:
/// * `player_id`: The ID of the player.
///
/// Returns (wrapped in `ApiResponse`)
/// * `PlayerRewardsResponse` (200 OK).
/// * `404 Not Found`: If the player doesn't exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_player_rewards(
    State(pool): State<Pool>,
    Query(params): Query<GetPlayerRewardsParams>,
) -> Result<ApiResponse<PlayerRewardsResponse>, AppError> {
    let player_id = params.player_id;
    info!("Fetching rewards for player {}", player_id);

    let player_exists = helper::run_query(&pool, move |conn| {
        diesel::select(diesel::dsl::exists(players_dsl::players.find(player_id)))
            .get_result::<bool>(conn)
    })
    .await?;

    if !player_exists {
        error!("Player with ID {} not found.", player_id);
        return Err(AppError::NotFound(format!(
            "Player with ID {} not found.",
            player_id
        )));
    }

    let (total_points, badges, discount_codes, book_credits) =
        helper::run_query(&pool, move |conn| {
            let total_points = up_dsl::user_points
                .filter(up_dsl::player_id.eq(player_id))
                .select(sum(up_dsl::points))
                .first::<Option<i64>>(conn)?
                .unwrap_or(0);

            let badges = ub_dsl::user_badges
                .inner_join(badges_dsl::badges)
                .filter(ub_dsl::player_id.eq(player_id))
                .order(ub_dsl::awarded_at.desc())
                .select((
                    ub_dsl::badge_id,
                    badges_dsl::name,
                    badges_dsl::icon,
                    badges_dsl::badge_type,
                    badges_dsl::rarity,
                    ub_dsl::game_id,
                    ub_dsl::awarded_at,
                ))
                .load::<PlayerBadge>(conn)?;

            let discount_codes = dc_dsl::discount_codes
                .filter(dc_dsl::player_id.eq(player_id))
                .filter(dc_dsl::used_at.is_null())
                .order(dc_dsl::expires_at.asc())
                .select((dc_dsl::code, dc_dsl::percentage, dc_dsl::expires_at))
                .load::<PlayerDiscountCode>(conn)?;

            let book_credits = bc_dsl::book_credits
                .filter(bc_dsl::player_id.eq(player_id))
                .filter(bc_dsl::used_at.is_null())
                .order(bc_dsl::expires_at.asc())
                .select((bc_dsl::amount, bc_dsl::expires_at))
                .load::<PlayerBookCredit>(conn)?;

            Ok((total_points, badges, discount_codes, book_credits))
        })
        .await?;

    info!(
        "Player {} has {} points, {} badges, {} codes, {} credits",
        player_id,
        total_points,
        badges.len(),
        discount_codes.len(),
        book_credits.len()
    );
    Ok(ApiResponse::ok(PlayerRewardsResponse {
        total_points,
        badges,
        discount_codes,
        book_credits,
    }))
}

fn score_quiz_answers(answers: &JsonValue, questions: &[(i64, String, JsonValue, i32)]) -> i32 {
    let mut score = 0;
    for (question_id, question_type, correct_answer, points) in questions {
        let Some(answer) = answers.get(question_id.to_string()) else {
            continue;
        };
        if answer_matches(question_type, correct_answer, answer) {
            score += points;
        }
    }
    score
}

fn answer_matches(question_type: &str, correct_answer: &JsonValue, answer: &JsonValue) -> bool {
    let Some(given) = answer_text(answer) else {
        return false;
    };
    let accepted: Vec<&str> = match correct_answer {
        JsonValue::String(value) => vec![value.as_str()],
        JsonValue::Array(values) => values.iter().filter_map(JsonValue::as_str).collect(),
        _ => return false,
    };
    // Short answers tolerate case and surrounding whitespace.
    if question_type == "short_answer" {
        accepted
            .iter()
            .any(|correct| correct.trim().eq_ignore_ascii_case(given.trim()))
    } else {
        accepted.iter().any(|correct| *correct == given)
    }
}

fn answer_text(answer: &JsonValue) -> Option<String> {
    match answer {
        JsonValue::String(value) => Some(value.clone()),
        JsonValue::Bool(value) => Some(value.to_string()),
        JsonValue::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
