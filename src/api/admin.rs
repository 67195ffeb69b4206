use super::{helper, leaderboard, rewards};
use anyhow::anyhow;

use crate::model::admin::{
    AwardRewardsResponse, BadgeChangeset, BadgeData, BadgeSummary, BadgesPageResponse, Game,
    GameChangeset, GameDetailResponse, GameSummary, GamesPageResponse, NewBadge, NewGame,
    NewQuestion, NewRewardRule, QuestionData, RefreshLeaderboardResponse, RewardRuleData,
    SelectWinnersResponse, SubmissionData, SubmissionReviewChangeset,
};
use crate::payloads::admin::{
    AwardRewardsPayload, CreateBadgePayload, CreateGamePayload, DeleteBadgePayload,
    DeleteGamePayload, GetBadgesParams, GetGameParams, GetGameSubmissionsParams, GetGamesParams,
    ModifyBadgePayload, ModifyGamePayload, QuestionPayload, RefreshLeaderboardPayload,
    ReviewSubmissionPayload, RewardRulePayload, SelectWinnersPayload,
};
use crate::{
    errors::AppError,
    response::ApiResponse,
    schema::{
        badges::dsl as badges_dsl, games::dsl as games_dsl, questions::dsl as q_dsl,
        reward_rules::dsl as rr_dsl, submissions::dsl as sub_dsl, user_badges::dsl as ub_dsl,
    },
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use deadpool_diesel::postgres::Pool;
use diesel::dsl::{count_star, exists};
use diesel::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

const GAME_TYPES: [&str; 3] = ["quiz", "writing_challenge", "puzzle"];
const GAME_DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];
const GAME_STATUSES: [&str; 3] = ["draft", "published", "archived"];
const QUESTION_TYPES: [&str; 3] = ["multiple_choice", "true_false", "short_answer"];
const REWARD_TYPES: [&str; 4] = ["badge", "points", "discount_code", "book_credit"];
const BADGE_TYPES: [&str; 4] = ["game_winner", "participation", "streak", "milestone"];
const BADGE_RARITIES: [&str; 4] = ["common", "rare", "epic", "legendary"];

const MAX_PAGE_SIZE: i64 = 100;

fn ensure_known(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    warn!("Rejected unknown {} '{}'. Allowed: {:?}", field, value, allowed);
    Err(AppError::UnprocessableEntity(format!(
        "Invalid {} '{}'. Allowed values: {:?}",
        field, value, allowed
    )))
}

fn validate_questions(questions: &[QuestionPayload]) -> Result<(), AppError> {
    for question in questions {
        ensure_known("question type", &question.question_type, &QUESTION_TYPES)?;
        let answer_ok = question.correct_answer.is_string()
            || question
                .correct_answer
                .as_array()
                .is_some_and(|values| values.iter().all(|v| v.is_string()));
        if !answer_ok {
            warn!(
                "Rejected question '{}': correct_answer is neither string nor string array",
                question.question_text
            );
            return Err(AppError::UnprocessableEntity(
                "correct_answer must be a string or an array of strings.".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_rewards(rewards: &[RewardRulePayload]) -> Result<(), AppError> {
    for rule in rewards {
        ensure_known("reward type", &rule.reward_type, &REWARD_TYPES)?;
    }
    Ok(())
}

/// Retrieves a page of games for the admin dashboard.
///
/// Query Parameters:
/// * `admin_id`: The ID of the acting administrator.
/// * `page` / `limit`: Pagination (1-based page, capped at 100 per page).
/// * `status`: Optional equality filter (draft/published/archived).
/// * `game_type`: Optional equality filter (quiz/writing_challenge/puzzle).
/// * `search`: Optional case-insensitive substring match on title or description.
///
/// Returns (wrapped in `ApiResponse`)
/// * `GamesPageResponse`: Game summaries (newest first) annotated with live
///   submission and winner counts, plus the total row count (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `422 Unprocessable Entity`: If a filter value is not a known enum value.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_games(
    State(pool): State<Pool>,
    Query(params): Query<GetGamesParams>,
) -> Result<ApiResponse<GamesPageResponse>, AppError> {
    let admin_id = params.admin_id;
    info!("Listing games for administrator {}", admin_id);
    debug!("Get games params: {:?}", params);

    helper::check_admin_role(&pool, admin_id).await?;

    if let Some(ref status) = params.status {
        ensure_known("status filter", status, &GAME_STATUSES)?;
    }
    if let Some(ref game_type) = params.game_type {
        ensure_known("game type filter", game_type, &GAME_TYPES)?;
    }

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let status_filter = params.status.clone();
    let type_filter = params.game_type.clone();
    let search_filter = params.search.clone();

    let (total, games, submission_counts, winner_counts) =
        helper::run_query(&pool, move |conn| {
            let mut count_query = games_dsl::games.into_boxed();
            let mut page_query = games_dsl::games.into_boxed();

            if let Some(status) = status_filter {
                count_query = count_query.filter(games_dsl::status.eq(status.clone()));
                page_query = page_query.filter(games_dsl::status.eq(status));
            }
            if let Some(game_type) = type_filter {
                count_query = count_query.filter(games_dsl::game_type.eq(game_type.clone()));
                page_query = page_query.filter(games_dsl::game_type.eq(game_type));
            }
            if let Some(search) = search_filter {
                let pattern = format!("%{}%", search);
                count_query = count_query.filter(
                    games_dsl::title
                        .ilike(pattern.clone())
                        .or(games_dsl::description.ilike(pattern.clone())),
                );
                page_query = page_query.filter(
                    games_dsl::title
                        .ilike(pattern.clone())
                        .or(games_dsl::description.ilike(pattern)),
                );
            }

            let total = count_query.count().get_result::<i64>(conn)?;

            let games = page_query
                .order(games_dsl::created_at.desc())
                .offset(offset)
                .limit(limit)
                .load::<Game>(conn)?;

            let page_ids: Vec<i64> = games.iter().map(|game| game.id).collect();

            let submission_counts: Vec<(i64, i64)> = sub_dsl::submissions
                .filter(sub_dsl::game_id.eq_any(page_ids.clone()))
                .group_by(sub_dsl::game_id)
                .select((sub_dsl::game_id, count_star()))
                .load(conn)?;

            let winner_counts: Vec<(i64, i64)> = sub_dsl::submissions
                .filter(sub_dsl::game_id.eq_any(page_ids))
                .filter(sub_dsl::is_winner.eq(true))
                .group_by(sub_dsl::game_id)
                .select((sub_dsl::game_id, count_star()))
                .load(conn)?;

            Ok((total, games, submission_counts, winner_counts))
        })
        .await?;

    let submission_counts: HashMap<i64, i64> = submission_counts.into_iter().collect();
    let winner_counts: HashMap<i64, i64> = winner_counts.into_iter().collect();

    let summaries: Vec<GameSummary> = games
        .into_iter()
        .map(|game| GameSummary {
            submission_count: submission_counts.get(&game.id).copied().unwrap_or(0),
            winner_count: winner_counts.get(&game.id).copied().unwrap_or(0),
            id: game.id,
            title: game.title,
            game_type: game.game_type,
            difficulty: game.difficulty,
            status: game.status,
            expires_at: game.expires_at,
            published_at: game.published_at,
            created_at: game.created_at,
            updated_at: game.updated_at,
        })
        .collect();

    info!(
        "Returning {} of {} games for administrator {}",
        summaries.len(),
        total,
        admin_id
    );
    Ok(ApiResponse::ok(GamesPageResponse {
        games: summaries,
        total,
        page,
        limit,
    }))
}

/// Retrieves one game with its reward rules and, for quizzes, its questions.
///
/// Query Parameters:
/// * `admin_id`: The ID of the acting administrator.
/// * `game_id`: The ID of the game.
///
/// Returns (wrapped in `ApiResponse`)
/// * `GameDetailResponse`: Full game record; `questions` is present for
///   quizzes only, sorted ascending by `order` (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the game doesn't exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_game(
    State(pool): State<Pool>,
    Query(params): Query<GetGameParams>,
) -> Result<ApiResponse<GameDetailResponse>, AppError> {
    let admin_id = params.admin_id;
    let game_id = params.game_id;
    info!(
        "Fetching game {} for administrator {}",
        game_id, admin_id
    );

    helper::check_admin_role(&pool, admin_id).await?;

    let game = helper::run_query(&pool, move |conn| {
        games_dsl::games.find(game_id).first::<Game>(conn).optional()
    })
    .await?;

    let Some(game) = game else {
        error!("Game with ID {} not found.", game_id);
        return Err(AppError::NotFound(format!(
            "Game with ID {} not found.",
            game_id
        )));
    };

    let rewards = helper::run_query(&pool, move |conn| {
        rr_dsl::reward_rules
            .filter(rr_dsl::game_id.eq(game_id))
            .order(rr_dsl::id.asc())
            .select((
                rr_dsl::id,
                rr_dsl::reward_type,
                rr_dsl::reward_value,
                rr_dsl::for_winner,
                rr_dsl::for_participation,
            ))
            .load::<RewardRuleData>(conn)
    })
    .await?;

    let questions = if game.game_type == "quiz" {
        let loaded = helper::run_query(&pool, move |conn| {
            q_dsl::questions
                .filter(q_dsl::game_id.eq(game_id))
                .order(q_dsl::order.asc())
                .select((
                    q_dsl::id,
                    q_dsl::question_type,
                    q_dsl::question_text,
                    q_dsl::options,
                    q_dsl::correct_answer,
                    q_dsl::points,
                    q_dsl::order,
                ))
                .load::<QuestionData>(conn)
        })
        .await?;
        Some(loaded)
    } else {
        None
    };

    info!(
        "Successfully fetched game {} ({} reward rules)",
        game_id,
        rewards.len()
    );
    Ok(ApiResponse::ok(GameDetailResponse {
        id: game.id,
        title: game.title,
        description: game.description,
        game_type: game.game_type,
        difficulty: game.difficulty,
        status: game.status,
        config: game.config,
        expires_at: game.expires_at,
        published_at: game.published_at,
        created_by: game.created_by,
        created_at: game.created_at,
        updated_at: game.updated_at,
        rewards,
        questions,
    }))
}

/// Creates a new game in draft status.
///
/// Request Body: `CreateGamePayload`
///
/// For quizzes a non-empty `questions` array is inserted alongside the game,
/// preserving the caller-supplied `order`. Optional `rewards` rules are
/// inserted as well. Game, questions and rules land in one transaction.
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The ID of the newly created game (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `422 Unprocessable Entity`: If an enum value or question shape is invalid.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(pool, payload))]
pub async fn create_game(
    State(pool): State<Pool>,
    Json(payload): Json<CreateGamePayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!(
        "Administrator {} creating game '{}'",
        payload.admin_id, payload.title
    );
    debug!("Create game payload: {:?}", payload);

    helper::check_admin_role(&pool, payload.admin_id).await?;

    ensure_known("game type", &payload.game_type, &GAME_TYPES)?;
    ensure_known("difficulty", &payload.difficulty, &GAME_DIFFICULTIES)?;
    if let Some(ref questions) = payload.questions {
        validate_questions(questions)?;
    }
    if let Some(ref rewards) = payload.rewards {
        validate_rewards(rewards)?;
    }

    if payload.questions.is_some() && payload.game_type != "quiz" {
        warn!(
            "Questions supplied for non-quiz game '{}'; they will be ignored",
            payload.title
        );
    }

    let conn = pool.get().await?;
    let creation_result: Result<i64, AppError> = conn
        .interact(move |conn_sync| {
            let payload = payload;
            conn_sync.transaction(|transaction_conn| {
                let is_quiz = payload.game_type == "quiz";
                let new_game = NewGame {
                    title: payload.title,
                    description: payload.description,
                    game_type: payload.game_type,
                    difficulty: payload.difficulty,
                    status: "draft".to_string(),
                    config: payload.config.unwrap_or_else(|| json!({})),
                    expires_at: payload.expires_at,
                    created_by: payload.admin_id,
                };

                let inserted_game_id = diesel::insert_into(games_dsl::games)
                    .values(&new_game)
                    .returning(games_dsl::id)
                    .get_result::<i64>(transaction_conn)?;

                if is_quiz {
                    if let Some(questions) = payload.questions {
                        let new_questions: Vec<NewQuestion> = questions
                            .into_iter()
                            .map(|question| NewQuestion {
                                game_id: inserted_game_id,
                                question_type: question.question_type,
                                question_text: question.question_text,
                                options: question.options,
                                correct_answer: question.correct_answer,
                                points: question.points,
                                order: question.order,
                            })
                            .collect();
                        if !new_questions.is_empty() {
                            diesel::insert_into(q_dsl::questions)
                                .values(&new_questions)
                                .execute(transaction_conn)?;
                        }
                    }
                }

                if let Some(rewards) = payload.rewards {
                    let new_rules: Vec<NewRewardRule> = rewards
                        .into_iter()
                        .map(|rule| NewRewardRule {
                            game_id: inserted_game_id,
                            reward_type: rule.reward_type,
                            reward_value: rule.reward_value,
                            for_winner: rule.for_winner,
                            for_participation: rule.for_participation,
                        })
                        .collect();
                    if !new_rules.is_empty() {
                        diesel::insert_into(rr_dsl::reward_rules)
                            .values(&new_rules)
                            .execute(transaction_conn)?;
                    }
                }

                Ok(inserted_game_id)
            })
        })
        .await?;

    let game_id = creation_result?;
    info!("Successfully created game {}", game_id);
    Ok(ApiResponse::ok(game_id))
}

/// Modifies an existing game with a sparse patch.
///
/// Request Body: `ModifyGamePayload`
///
/// Only fields present in the payload are written (`None` means "not sent").
/// Setting `status` to `published` additionally stamps `published_at`. A
/// supplied `rewards` array replaces all existing rules; a supplied
/// `questions` array replaces all existing questions when the effective game
/// type is quiz. All writes share one transaction.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true if the update was applied (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the game doesn't exist.
/// * `422 Unprocessable Entity`: If an enum value or question shape is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn modify_game(
    State(pool): State<Pool>,
    Json(payload): Json<ModifyGamePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    let admin_id = payload.admin_id;
    let game_id = payload.game_id;
    info!(
        "Administrator {} modifying game {}",
        admin_id, game_id
    );
    debug!("Modify game payload: {:?}", payload);

    helper::check_admin_role(&pool, admin_id).await?;

    if let Some(ref game_type) = payload.game_type {
        ensure_known("game type", game_type, &GAME_TYPES)?;
    }
    if let Some(ref difficulty) = payload.difficulty {
        ensure_known("difficulty", difficulty, &GAME_DIFFICULTIES)?;
    }
    if let Some(ref status) = payload.status {
        ensure_known("status", status, &GAME_STATUSES)?;
    }
    if let Some(ref questions) = payload.questions {
        validate_questions(questions)?;
    }
    if let Some(ref rewards) = payload.rewards {
        validate_rewards(rewards)?;
    }

    // The patch may omit the type, so the current row decides whether a
    // supplied question set applies.
    let current_type = helper::run_query(&pool, move |conn| {
        games_dsl::games
            .find(game_id)
            .select(games_dsl::game_type)
            .first::<String>(conn)
            .optional()
    })
    .await?;

    let Some(current_type) = current_type else {
        error!("Game with ID {} not found.", game_id);
        return Err(AppError::NotFound(format!(
            "Game with ID {} not found.",
            game_id
        )));
    };

    let effective_type = payload
        .game_type
        .clone()
        .unwrap_or(current_type);
    let effective_is_quiz = effective_type == "quiz";

    if payload.questions.is_some() && !effective_is_quiz {
        warn!(
            "Questions supplied for non-quiz game {}; they will be ignored",
            game_id
        );
    }

    let now = Utc::now();
    let publishing = matches!(payload.status.as_deref(), Some("published"));
    let changeset = GameChangeset {
        title: payload.title.clone(),
        description: payload.description.clone(),
        game_type: payload.game_type.clone(),
        difficulty: payload.difficulty.clone(),
        status: payload.status.clone(),
        config: payload.config.clone(),
        expires_at: payload.expires_at,
        published_at: publishing.then_some(now),
        updated_at: Some(now),
    };

    let has_updates = changeset.title.is_some()
        || changeset.description.is_some()
        || changeset.game_type.is_some()
        || changeset.difficulty.is_some()
        || changeset.status.is_some()
        || changeset.config.is_some()
        || changeset.expires_at.is_some()
        || payload.questions.is_some()
        || payload.rewards.is_some();

    if !has_updates {
        info!(
            "No update fields provided for game {}. Returning success.",
            game_id
        );
        return Ok(ApiResponse::ok(true));
    }

    let questions_replacement = payload.questions;
    let rewards_replacement = payload.rewards;

    let conn = pool.get().await?;
    let update_result: Result<bool, AppError> = conn
        .interact(move |conn_sync| {
            conn_sync.transaction(|transaction_conn| {
                let rows_affected = diesel::update(games_dsl::games.find(game_id))
                    .set(&changeset)
                    .execute(transaction_conn)?;

                if rows_affected == 0 {
                    return Err(AppError::NotFound(format!(
                        "Game with ID {} not found during update.",
                        game_id
                    )));
                }

                if let Some(rules) = rewards_replacement {
                    diesel::delete(rr_dsl::reward_rules.filter(rr_dsl::game_id.eq(game_id)))
                        .execute(transaction_conn)?;
                    let new_rules: Vec<NewRewardRule> = rules
                        .into_iter()
                        .map(|rule| NewRewardRule {
                            game_id,
                            reward_type: rule.reward_type,
                            reward_value: rule.reward_value,
                            for_winner: rule.for_winner,
                            for_participation: rule.for_participation,
                        })
                        .collect();
                    if !new_rules.is_empty() {
                        diesel::insert_into(rr_dsl::reward_rules)
                            .values(&new_rules)
                            .execute(transaction_conn)?;
                    }
                }

                if effective_is_quiz {
                    if let Some(questions) = questions_replacement {
                        diesel::delete(q_dsl::questions.filter(q_dsl::game_id.eq(game_id)))
                            .execute(transaction_conn)?;
                        let new_questions: Vec<NewQuestion> = questions
                            .into_iter()
                            .map(|question| NewQuestion {
                                game_id,
                                question_type: question.question_type,
                                question_text: question.question_text,
                                options: question.options,
                                correct_answer: question.correct_answer,
                                points: question.points,
                                order: question.order,
                            })
                            .collect();
                        if !new_questions.is_empty() {
                            diesel::insert_into(q_dsl::questions)
                                .values(&new_questions)
                                .execute(transaction_conn)?;
                        }
                    }
                }

                Ok(true)
            })
        })
        .await?;

    let updated = update_result?;
    info!("Successfully modified game {}", game_id);
    Ok(ApiResponse::ok(updated))
}

/// Deletes a game unconditionally.
///
/// Request Body: `DeleteGamePayload`
///
/// Dependent questions, reward rules and submissions are removed by the
/// schema's ON DELETE CASCADE, not by this handler.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true if the game was deleted (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the game doesn't exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn delete_game(
    State(pool): State<Pool>,
    Json(payload): Json<DeleteGamePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    let admin_id = payload.admin_id;
    let game_id = payload.game_id;
    info!(
        "Administrator {} deleting game {}",
        admin_id, game_id
    );

    helper::check_admin_role(&pool, admin_id).await?;

    let rows_affected = helper::run_query(&pool, move |conn| {
        diesel::delete(games_dsl::games.find(game_id)).execute(conn)
    })
    .await?;

    match rows_affected {
        1 => {
            info!("Successfully deleted game {}", game_id);
            Ok(ApiResponse::ok(true))
        }
        0 => {
            error!("Game with ID {} not found.", game_id);
            Err(AppError::NotFound(format!(
                "Game with ID {} not found.",
                game_id
            )))
        }
        n => {
            error!(
                "Game {} deletion affected {} rows (unexpected state).",
                game_id, n
            );
            Err(AppError::InternalServerError(anyhow!(
                "Game deletion failed unexpectedly (multiple rows affected)."
            )))
        }
    }
}

/// Lists submissions of a game for the review/selection screen.
///
/// Query Parameters:
/// * `admin_id`: The ID of the acting administrator.
/// * `game_id`: The ID of the game.
/// * `winners_only`: If true, filter for submissions already marked winners.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<SubmissionData>`: Submissions, newest first (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the game doesn't exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_game_submissions(
    State(pool): State<Pool>,
    Query(params): Query<GetGameSubmissionsParams>,
) -> Result<ApiResponse<Vec<SubmissionData>>, AppError> {
    let admin_id = params.admin_id;
    let game_id = params.game_id;
    let winners_only = params.winners_only;
    info!(
        "Listing submissions for game {} requested by administrator {} (winners_only={})",
        game_id, admin_id, winners_only
    );

    helper::check_admin_role(&pool, admin_id).await?;

    let game_exists = helper::run_query(&pool, move |conn| {
        diesel::select(exists(games_dsl::games.find(game_id))).get_result::<bool>(conn)
    })
    .await?;

    if !game_exists {
        error!("Game with ID {} not found.", game_id);
        return Err(AppError::NotFound(format!(
            "Game with ID {} not found.",
            game_id
        )));
    }

    let submissions = helper::run_query(&pool, move |conn| {
        let mut query = sub_dsl::submissions
            .filter(sub_dsl::game_id.eq(game_id))
            .into_boxed();
        if winners_only {
            query = query.filter(sub_dsl::is_winner.eq(true));
        }
        query
            .order(sub_dsl::submitted_at.desc())
            .load::<SubmissionData>(conn)
    })
    .await?;

    info!(
        "Successfully fetched {} submissions for game {}",
        submissions.len(),
        game_id
    );
    Ok(ApiResponse::ok(submissions))
}

/// Records review metadata on a submission.
///
/// Request Body: `ReviewSubmissionPayload`
///
/// Writes `score` and/or `feedback` when present and always stamps the
/// reviewing administrator and timestamp.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true if the review was recorded (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the submission doesn't exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn review_submission(
    State(pool): State<Pool>,
    Json(payload): Json<ReviewSubmissionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    let admin_id = payload.admin_id;
    let submission_id = payload.submission_id;
    info!(
        "Administrator {} reviewing submission {}",
        admin_id, submission_id
    );
    debug!("Review submission payload: {:?}", payload);

    helper::check_admin_role(&pool, admin_id).await?;

    let changeset = SubmissionReviewChangeset {
        score: payload.score,
        feedback: payload.feedback,
        reviewed_by: Some(admin_id),
        reviewed_at: Some(Utc::now()),
    };

    let rows_affected = helper::run_query(&pool, move |conn| {
        diesel::update(sub_dsl::submissions.find(submission_id))
            .set(&changeset)
            .execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        error!("Submission with ID {} not found.", submission_id);
        return Err(AppError::NotFound(format!(
            "Submission with ID {} not found.",
            submission_id
        )));
    }

    info!("Successfully reviewed submission {}", submission_id);
    Ok(ApiResponse::ok(true))
}

/// Marks submissions as winners, grants winner rewards and refreshes the
/// leaderboard in a single transaction.
///
/// Request Body: `SelectWinnersPayload`
///
/// Submissions outside the given game are ignored. Previously selected
/// winners stay winners; repeated selection of the same submissions grants
/// its rewards again (see `award_rewards`).
///
/// Returns (wrapped in `ApiResponse`)
/// * `SelectWinnersResponse`: Winners marked, rewards granted, players ranked (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the game doesn't exist.
/// * `422 Unprocessable Entity`: If `submission_ids` is empty.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(pool, payload))]
pub async fn select_winners(
    State(pool): State<Pool>,
    Json(payload): Json<SelectWinnersPayload>,
) -> Result<ApiResponse<SelectWinnersResponse>, AppError> {
    let admin_id = payload.admin_id;
    let game_id = payload.game_id;
    info!(
        "Administrator {} selecting {} winners for game {}",
        admin_id,
        payload.submission_ids.len(),
        game_id
    );
    debug!("Select winners payload: {:?}", payload);

    helper::check_admin_role(&pool, admin_id).await?;

    if payload.submission_ids.is_empty() {
        warn!("Winner selection for game {} with no submission ids", game_id);
        return Err(AppError::UnprocessableEntity(
            "submission_ids must not be empty.".to_string(),
        ));
    }

    let game_title = helper::run_query(&pool, move |conn| {
        games_dsl::games
            .find(game_id)
            .select(games_dsl::title)
            .first::<String>(conn)
            .optional()
    })
    .await?;

    let Some(game_title) = game_title else {
        error!("Game with ID {} not found.", game_id);
        return Err(AppError::NotFound(format!(
            "Game with ID {} not found.",
            game_id
        )));
    };

    let submission_ids = payload.submission_ids;
    let now = Utc::now();

    let conn = pool.get().await?;
    let selection_result: Result<SelectWinnersResponse, AppError> = conn
        .interact(move |conn_sync| {
            conn_sync.transaction(|transaction_conn| {
                let winners_marked = diesel::update(
                    sub_dsl::submissions
                        .filter(sub_dsl::id.eq_any(submission_ids.clone()))
                        .filter(sub_dsl::game_id.eq(game_id)),
                )
                .set((
                    sub_dsl::is_winner.eq(true),
                    sub_dsl::reviewed_by.eq(admin_id),
                    sub_dsl::reviewed_at.eq(now),
                ))
                .execute(transaction_conn)?;

                let outcome = rewards::grant_rewards(
                    transaction_conn,
                    game_id,
                    &game_title,
                    Some(&submission_ids),
                    false,
                )?;

                let players_ranked = leaderboard::recompute(transaction_conn)?;

                Ok(SelectWinnersResponse {
                    winners_marked: winners_marked as i64,
                    rewards_granted: outcome.rewards_granted,
                    players_ranked,
                })
            })
        })
        .await?;

    let response = selection_result?;
    info!(
        "Winner selection for game {} complete: {} marked, {} rewards, {} ranked",
        game_id, response.winners_marked, response.rewards_granted, response.players_ranked
    );
    Ok(ApiResponse::ok(response))
}

/// Grants a game's configured rewards to a set of submissions.
///
/// Request Body: `AwardRewardsPayload`
///
/// Targets every submission of the game when `submission_ids` is omitted.
/// In winner mode only submissions with `is_winner` qualify; in
/// participation mode every target qualifies. Grants are not deduplicated
/// across calls — re-running the same award duplicates ledger rows. Ends by
/// refreshing the leaderboard; the grant and the refresh share one
/// transaction.
///
/// Returns (wrapped in `ApiResponse`)
/// * `AwardRewardsResponse`: Submissions processed, rewards granted, players ranked (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the game doesn't exist.
/// * `500 Internal Server Error`: If a database error or transaction failure occurs.
#[instrument(skip(pool, payload))]
pub async fn award_rewards(
    State(pool): State<Pool>,
    Json(payload): Json<AwardRewardsPayload>,
) -> Result<ApiResponse<AwardRewardsResponse>, AppError> {
    let admin_id = payload.admin_id;
    let game_id = payload.game_id;
    let is_participation = payload.is_participation;
    info!(
        "Administrator {} dispensing rewards for game {} (participation={})",
        admin_id, game_id, is_participation
    );
    debug!("Award rewards payload: {:?}", payload);

    helper::check_admin_role(&pool, admin_id).await?;

    let game_title = helper::run_query(&pool, move |conn| {
        games_dsl::games
            .find(game_id)
            .select(games_dsl::title)
            .first::<String>(conn)
            .optional()
    })
    .await?;

    let Some(game_title) = game_title else {
        error!("Game with ID {} not found.", game_id);
        return Err(AppError::NotFound(format!(
            "Game with ID {} not found.",
            game_id
        )));
    };

    let submission_ids = payload.submission_ids;

    let conn = pool.get().await?;
    let award_result: Result<AwardRewardsResponse, AppError> = conn
        .interact(move |conn_sync| {
            conn_sync.transaction(|transaction_conn| {
                let outcome = rewards::grant_rewards(
                    transaction_conn,
                    game_id,
                    &game_title,
                    submission_ids.as_deref(),
                    is_participation,
                )?;

                let players_ranked = leaderboard::recompute(transaction_conn)?;

                Ok(AwardRewardsResponse {
                    submissions_processed: outcome.submissions_processed,
                    rewards_granted: outcome.rewards_granted,
                    players_ranked,
                })
            })
        })
        .await?;

    let response = award_result?;
    info!(
        "Reward dispensing for game {} complete: {} submissions, {} rewards, {} ranked",
        game_id, response.submissions_processed, response.rewards_granted, response.players_ranked
    );
    Ok(ApiResponse::ok(response))
}

/// Recomputes the leaderboard snapshot on demand.
///
/// Request Body: `RefreshLeaderboardPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `RefreshLeaderboardResponse`: Number of ranked players (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn refresh_leaderboard(
    State(pool): State<Pool>,
    Json(payload): Json<RefreshLeaderboardPayload>,
) -> Result<ApiResponse<RefreshLeaderboardResponse>, AppError> {
    let admin_id = payload.admin_id;
    info!("Administrator {} refreshing the leaderboard", admin_id);

    helper::check_admin_role(&pool, admin_id).await?;

    let conn = pool.get().await?;
    let refresh_result: Result<i64, AppError> = conn
        .interact(|conn_sync| conn_sync.transaction(leaderboard::recompute))
        .await?;

    let players_ranked = refresh_result?;
    Ok(ApiResponse::ok(RefreshLeaderboardResponse { players_ranked }))
}

/// Retrieves a page of badges for the admin dashboard.
///
/// Query Parameters:
/// * `admin_id`: The ID of the acting administrator.
/// * `page` / `limit`: Pagination (1-based page, capped at 100 per page).
/// * `badge_type` / `rarity`: Optional equality filters.
/// * `search`: Optional case-insensitive substring match on name or description.
///
/// Returns (wrapped in `ApiResponse`)
/// * `BadgesPageResponse`: Badge summaries annotated with live usage counts,
///   plus the total row count (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `422 Unprocessable Entity`: If a filter value is not a known enum value.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_badges(
    State(pool): State<Pool>,
    Query(params): Query<GetBadgesParams>,
) -> Result<ApiResponse<BadgesPageResponse>, AppError> {
    let admin_id = params.admin_id;
    info!("Listing badges for administrator {}", admin_id);
    debug!("Get badges params: {:?}", params);

    helper::check_admin_role(&pool, admin_id).await?;

    if let Some(ref badge_type) = params.badge_type {
        ensure_known("badge type filter", badge_type, &BADGE_TYPES)?;
    }
    if let Some(ref rarity) = params.rarity {
        ensure_known("rarity filter", rarity, &BADGE_RARITIES)?;
    }

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let type_filter = params.badge_type.clone();
    let rarity_filter = params.rarity.clone();
    let search_filter = params.search.clone();

    let (total, badges, usage_counts) = helper::run_query(&pool, move |conn| {
        let mut count_query = badges_dsl::badges.into_boxed();
        let mut page_query = badges_dsl::badges.into_boxed();

        if let Some(badge_type) = type_filter {
            count_query = count_query.filter(badges_dsl::badge_type.eq(badge_type.clone()));
            page_query = page_query.filter(badges_dsl::badge_type.eq(badge_type));
        }
        if let Some(rarity) = rarity_filter {
            count_query = count_query.filter(badges_dsl::rarity.eq(rarity.clone()));
            page_query = page_query.filter(badges_dsl::rarity.eq(rarity));
        }
        if let Some(search) = search_filter {
            let pattern = format!("%{}%", search);
            count_query = count_query.filter(
                badges_dsl::name
                    .ilike(pattern.clone())
                    .or(badges_dsl::description.ilike(pattern.clone())),
            );
            page_query = page_query.filter(
                badges_dsl::name
                    .ilike(pattern.clone())
                    .or(badges_dsl::description.ilike(pattern)),
            );
        }

        let total = count_query.count().get_result::<i64>(conn)?;

        let badges = page_query
            .order(badges_dsl::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<BadgeData>(conn)?;

        let page_ids: Vec<i64> = badges.iter().map(|badge| badge.id).collect();

        let usage_counts: Vec<(i64, i64)> = ub_dsl::user_badges
            .filter(ub_dsl::badge_id.eq_any(page_ids))
            .group_by(ub_dsl::badge_id)
            .select((ub_dsl::badge_id, count_star()))
            .load(conn)?;

        Ok((total, badges, usage_counts))
    })
    .await?;

    let usage_counts: HashMap<i64, i64> = usage_counts.into_iter().collect();

    let summaries: Vec<BadgeSummary> = badges
        .into_iter()
        .map(|badge| BadgeSummary {
            usage_count: usage_counts.get(&badge.id).copied().unwrap_or(0),
            id: badge.id,
            name: badge.name,
            description: badge.description,
            icon: badge.icon,
            badge_type: badge.badge_type,
            rarity: badge.rarity,
            criteria: badge.criteria,
            created_at: badge.created_at,
            updated_at: badge.updated_at,
        })
        .collect();

    info!(
        "Returning {} of {} badges for administrator {}",
        summaries.len(),
        total,
        admin_id
    );
    Ok(ApiResponse::ok(BadgesPageResponse {
        badges: summaries,
        total,
        page,
        limit,
    }))
}

/// Creates a new badge definition.
///
/// Request Body: `CreateBadgePayload`
///
/// `criteria` is stored as given and surfaced to the dashboard; nothing in
/// this service evaluates it.
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The ID of the newly created badge (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `422 Unprocessable Entity`: If the badge type or rarity is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn create_badge(
    State(pool): State<Pool>,
    Json(payload): Json<CreateBadgePayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!(
        "Administrator {} creating badge '{}'",
        payload.admin_id, payload.name
    );
    debug!("Create badge payload: {:?}", payload);

    helper::check_admin_role(&pool, payload.admin_id).await?;

    ensure_known("badge type", &payload.badge_type, &BADGE_TYPES)?;
    ensure_known("rarity", &payload.rarity, &BADGE_RARITIES)?;

    let badge_id = helper::run_query(&pool, move |conn| {
        let new_badge = NewBadge {
            name: payload.name,
            description: payload.description,
            icon: payload.icon,
            badge_type: payload.badge_type,
            rarity: payload.rarity,
            criteria: payload.criteria,
        };
        diesel::insert_into(badges_dsl::badges)
            .values(&new_badge)
            .returning(badges_dsl::id)
            .get_result::<i64>(conn)
    })
    .await?;

    info!("Successfully created badge {}", badge_id);
    Ok(ApiResponse::ok(badge_id))
}

/// Modifies an existing badge with a sparse patch.
///
/// Request Body: `ModifyBadgePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true if the update was applied (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the badge doesn't exist.
/// * `422 Unprocessable Entity`: If the badge type or rarity is invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn modify_badge(
    State(pool): State<Pool>,
    Json(payload): Json<ModifyBadgePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    let admin_id = payload.admin_id;
    let badge_id = payload.badge_id;
    info!(
        "Administrator {} modifying badge {}",
        admin_id, badge_id
    );
    debug!("Modify badge payload: {:?}", payload);

    helper::check_admin_role(&pool, admin_id).await?;

    if let Some(ref badge_type) = payload.badge_type {
        ensure_known("badge type", badge_type, &BADGE_TYPES)?;
    }
    if let Some(ref rarity) = payload.rarity {
        ensure_known("rarity", rarity, &BADGE_RARITIES)?;
    }

    let changeset = BadgeChangeset {
        name: payload.name,
        description: payload.description,
        icon: payload.icon,
        badge_type: payload.badge_type,
        rarity: payload.rarity,
        criteria: payload.criteria,
        updated_at: Some(Utc::now()),
    };

    let has_updates = changeset.name.is_some()
        || changeset.description.is_some()
        || changeset.icon.is_some()
        || changeset.badge_type.is_some()
        || changeset.rarity.is_some()
        || changeset.criteria.is_some();

    if !has_updates {
        info!(
            "No update fields provided for badge {}. Returning success.",
            badge_id
        );
        return Ok(ApiResponse::ok(true));
    }

    let rows_affected = helper::run_query(&pool, move |conn| {
        diesel::update(badges_dsl::badges.find(badge_id))
            .set(&changeset)
            .execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        error!("Badge with ID {} not found.", badge_id);
        return Err(AppError::NotFound(format!(
            "Badge with ID {} not found.",
            badge_id
        )));
    }

    info!("Successfully modified badge {}", badge_id);
    Ok(ApiResponse::ok(true))
}

/// Deletes a badge unconditionally.
///
/// Request Body: `DeleteBadgePayload`
///
/// Existing user grants of the badge are removed by the schema's
/// ON DELETE CASCADE.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true if the badge was deleted (200 OK).
/// * `401 Unauthorized`: If the principal is not an administrator.
/// * `404 Not Found`: If the badge doesn't exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn delete_badge(
    State(pool): State<Pool>,
    Json(payload): Json<DeleteBadgePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    let admin_id = payload.admin_id;
    let badge_id = payload.badge_id;
    info!(
        "Administrator {} deleting badge {}",
        admin_id, badge_id
    );

    helper::check_admin_role(&pool, admin_id).await?;

    let rows_affected = helper::run_query(&pool, move |conn| {
        diesel::delete(badges_dsl::badges.find(badge_id)).execute(conn)
    })
    .await?;

    if rows_affected == 0 {
        error!("Badge with ID {} not found.", badge_id);
        return Err(AppError::NotFound(format!(
            "Badge with ID {} not found.",
            badge_id
        )));
    }

    info!("Successfully deleted badge {}", badge_id);
    Ok(ApiResponse::ok(true))
}
