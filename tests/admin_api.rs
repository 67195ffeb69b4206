use axum::http::StatusCode;
use community_games_server::model::admin::{
    AwardRewardsResponse, BadgesPageResponse, GameDetailResponse, GamesPageResponse,
    RefreshLeaderboardResponse, SelectWinnersResponse, SubmissionData,
};
use community_games_server::response::ApiResponse;
use serde_json::{Value, json};

mod helpers;
use helpers::{
    count_games, count_questions_for_game, count_reward_rules_for_game, count_user_badges_for_badge,
    count_user_badges_for_player, count_user_points_rows, create_test_admin, create_test_badge,
    create_test_game, create_test_player, create_test_question, create_test_reward_rule,
    create_test_submission, create_test_user_badge, create_test_user_points, days_until,
    get_leaderboard_row, load_book_credits, load_discount_codes, setup_test_environment,
    sum_user_points,
};

// create_game

#[tokio::test]
async fn test_create_game_quiz_with_questions_and_rewards() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 1001, "admin1@test.com", "Admin One").await;

    let response = server
        .post("/admin/create_game")
        .json(&json!({
            "admin_id": admin_id,
            "title": "Capital Cities Quiz",
            "description": "Guess the capitals",
            "game_type": "quiz",
            "difficulty": "medium",
            "config": {"time_limit_seconds": 300},
            "questions": [
                {
                    "question_type": "multiple_choice",
                    "question_text": "Capital of France?",
                    "options": ["Paris", "Rome", "Madrid"],
                    "correct_answer": "Paris",
                    "points": 5,
                    "order": 1
                },
                {
                    "question_type": "true_false",
                    "question_text": "Oslo is the capital of Norway.",
                    "correct_answer": "true",
                    "points": 3,
                    "order": 2
                }
            ],
            "rewards": [
                {
                    "reward_type": "points",
                    "reward_value": {"points": 50},
                    "for_winner": true
                }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<i64> = response.json();
    assert_eq!(body.status_code, 200);
    let game_id = body.data.expect("created game id");

    assert_eq!(count_questions_for_game(&pool, game_id).await, 2);
    assert_eq!(count_reward_rules_for_game(&pool, game_id).await, 1);

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<GameDetailResponse> = response.json();
    let detail = body.data.expect("game detail");

    assert_eq!(detail.title, "Capital Cities Quiz");
    assert_eq!(detail.status, "draft");
    assert_eq!(detail.config, json!({"time_limit_seconds": 300}));
    assert_eq!(detail.rewards.len(), 1);

    let questions = detail.questions.expect("quiz questions");
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].order, 1);
    assert_eq!(questions[0].correct_answer, json!("Paris"));
    assert_eq!(questions[1].order, 2);
    assert_eq!(questions[1].points, 3);
}

#[tokio::test]
async fn test_create_game_preserves_question_order_and_array_answers() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 1002, "admin2@test.com", "Admin Two").await;

    let response = server
        .post("/admin/create_game")
        .json(&json!({
            "admin_id": admin_id,
            "title": "Synonyms Quiz",
            "game_type": "quiz",
            "difficulty": "easy",
            "questions": [
                {
                    "question_type": "short_answer",
                    "question_text": "A word for happy?",
                    "correct_answer": ["glad", "joyful", "cheerful"],
                    "points": 4,
                    "order": 2
                },
                {
                    "question_type": "short_answer",
                    "question_text": "A word for big?",
                    "correct_answer": "large",
                    "points": 2,
                    "order": 1
                }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<i64> = response.json();
    let game_id = body.data.expect("created game id");

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<GameDetailResponse> = response.json();
    let questions = body.data.expect("game detail").questions.expect("questions");

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].order, 1);
    assert_eq!(questions[0].correct_answer, json!("large"));
    assert_eq!(questions[1].order, 2);
    assert_eq!(
        questions[1].correct_answer,
        json!(["glad", "joyful", "cheerful"])
    );
}

#[tokio::test]
async fn test_create_game_unauthorized_creates_nothing() {
    let (server, pool) = setup_test_environment().await;

    let response = server
        .post("/admin/create_game")
        .json(&json!({
            "admin_id": 9999,
            "title": "Rogue Game",
            "game_type": "puzzle",
            "difficulty": "hard"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_code, 401);
    assert!(body.status_message.contains("Unauthorized"));
    assert!(body.data.is_none());

    assert_eq!(count_games(&pool).await, 0);
}

#[tokio::test]
async fn test_create_game_invalid_type() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 1003, "admin3@test.com", "Admin Three").await;

    let response = server
        .post("/admin/create_game")
        .json(&json!({
            "admin_id": admin_id,
            "title": "Mystery Game",
            "game_type": "scavenger_hunt",
            "difficulty": "easy"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(count_games(&pool).await, 0);
}

#[tokio::test]
async fn test_create_game_rejects_malformed_correct_answer() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 1004, "admin4@test.com", "Admin Four").await;

    let response = server
        .post("/admin/create_game")
        .json(&json!({
            "admin_id": admin_id,
            "title": "Numbers Quiz",
            "game_type": "quiz",
            "difficulty": "easy",
            "questions": [
                {
                    "question_type": "short_answer",
                    "question_text": "2 + 2?",
                    "correct_answer": 4,
                    "points": 1,
                    "order": 1
                }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(count_games(&pool).await, 0);
}

// modify_game

#[tokio::test]
async fn test_modify_game_replaces_question_set() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 2001, "admin5@test.com", "Admin Five").await;

    let response = server
        .post("/admin/create_game")
        .json(&json!({
            "admin_id": admin_id,
            "title": "History Quiz",
            "game_type": "quiz",
            "difficulty": "hard",
            "questions": [
                {
                    "question_type": "short_answer",
                    "question_text": "Old question one",
                    "correct_answer": "a",
                    "points": 1,
                    "order": 1
                },
                {
                    "question_type": "short_answer",
                    "question_text": "Old question two",
                    "correct_answer": "b",
                    "points": 1,
                    "order": 2
                }
            ]
        }))
        .await;
    let body: ApiResponse<i64> = response.json();
    let game_id = body.data.expect("created game id");
    assert_eq!(count_questions_for_game(&pool, game_id).await, 2);

    let response = server
        .post("/admin/modify_game")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "questions": [
                {
                    "question_type": "true_false",
                    "question_text": "New question",
                    "correct_answer": "false",
                    "points": 7,
                    "order": 1
                }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    assert_eq!(count_questions_for_game(&pool, game_id).await, 1);

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<GameDetailResponse> = response.json();
    let questions = body.data.expect("game detail").questions.expect("questions");
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question_text, "New question");
    assert_eq!(questions[0].points, 7);
}

#[tokio::test]
async fn test_modify_game_publish_stamps_published_at() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 2002, "admin6@test.com", "Admin Six").await;
    let game_id = create_test_game(&pool, admin_id, "Puzzle Night", "puzzle", "draft").await;

    let response = server
        .post("/admin/modify_game")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "status": "published"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<GameDetailResponse> = response.json();
    let detail = body.data.expect("game detail");
    assert_eq!(detail.status, "published");
    assert!(detail.published_at.is_some());
}

#[tokio::test]
async fn test_modify_game_replaces_reward_rules() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 2003, "admin7@test.com", "Admin Seven").await;
    let game_id = create_test_game(&pool, admin_id, "Writing Jam", "writing_challenge", "draft").await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 10}), true, false).await;
    create_test_reward_rule(&pool, game_id, "badge", json!({"badge_id": 1}), true, false).await;
    assert_eq!(count_reward_rules_for_game(&pool, game_id).await, 2);

    let response = server
        .post("/admin/modify_game")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "rewards": [
                {
                    "reward_type": "book_credit",
                    "reward_value": {"book_credit_amount": 2},
                    "for_participation": true
                }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    assert_eq!(count_reward_rules_for_game(&pool, game_id).await, 1);

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<GameDetailResponse> = response.json();
    let detail = body.data.expect("game detail");
    assert_eq!(detail.rewards.len(), 1);
    assert_eq!(detail.rewards[0].reward_type, "book_credit");
    assert!(detail.rewards[0].for_participation);
}

#[tokio::test]
async fn test_modify_game_sparse_patch_keeps_other_fields() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 2004, "admin8@test.com", "Admin Eight").await;
    let game_id = create_test_game(&pool, admin_id, "Puzzle Rush", "puzzle", "draft").await;

    let response = server
        .post("/admin/modify_game")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "difficulty": "hard"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<GameDetailResponse> = response.json();
    let detail = body.data.expect("game detail");
    assert_eq!(detail.title, "Puzzle Rush");
    assert_eq!(detail.difficulty, "hard");
    assert_eq!(detail.status, "draft");
}

#[tokio::test]
async fn test_modify_game_not_found() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 2005, "admin9@test.com", "Admin Nine").await;

    let response = server
        .post("/admin/modify_game")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": 424242,
            "title": "Ghost Game"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: ApiResponse<Value> = response.json();
    assert!(body.status_message.contains("not found"));
}

#[tokio::test]
async fn test_modify_game_unauthorized() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 2006, "admin10@test.com", "Admin Ten").await;
    let game_id = create_test_game(&pool, admin_id, "Locked Game", "puzzle", "draft").await;

    let response = server
        .post("/admin/modify_game")
        .json(&json!({
            "admin_id": 8888,
            "game_id": game_id,
            "title": "Hijacked"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// delete_game

#[tokio::test]
async fn test_delete_game_removes_dependents() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 3001, "admin11@test.com", "Admin Eleven").await;
    let game_id = create_test_game(&pool, admin_id, "Doomed Quiz", "quiz", "draft").await;
    create_test_question(&pool, game_id, "short_answer", json!("x"), 1, 1).await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 5}), true, false).await;

    let response = server
        .post("/admin/delete_game")
        .json(&json!({"admin_id": admin_id, "game_id": game_id}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    assert_eq!(count_games(&pool).await, 0);
    assert_eq!(count_questions_for_game(&pool, game_id).await, 0);
    assert_eq!(count_reward_rules_for_game(&pool, game_id).await, 0);

    let response = server
        .get(&format!(
            "/admin/get_game?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_game_not_found() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 3002, "admin12@test.com", "Admin Twelve").await;

    let response = server
        .post("/admin/delete_game")
        .json(&json!({"admin_id": admin_id, "game_id": 424242}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// get_games

#[tokio::test]
async fn test_get_games_pagination_and_live_counts() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 4001, "admin13@test.com", "Admin Thirteen").await;
    let player1_id = create_test_player(&pool, 4101, "p1@test.com", "Player One").await;
    let player2_id = create_test_player(&pool, 4102, "p2@test.com", "Player Two").await;

    let game_a = create_test_game(&pool, admin_id, "Game A", "quiz", "published").await;
    let _game_b = create_test_game(&pool, admin_id, "Game B", "puzzle", "draft").await;
    let _game_c = create_test_game(&pool, admin_id, "Game C", "writing_challenge", "draft").await;

    create_test_submission(&pool, game_a, player1_id, true).await;
    create_test_submission(&pool, game_a, player2_id, false).await;

    let response = server
        .get(&format!(
            "/admin/get_games?admin_id={}&page=1&limit=2",
            admin_id
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<GamesPageResponse> = response.json();
    let page = body.data.expect("games page");

    assert_eq!(page.total, 3);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 2);
    assert_eq!(page.games.len(), 2);
    // Newest-created first.
    assert_eq!(page.games[0].title, "Game C");
    assert_eq!(page.games[1].title, "Game B");

    let response = server
        .get(&format!(
            "/admin/get_games?admin_id={}&page=2&limit=2",
            admin_id
        ))
        .await;
    let body: ApiResponse<GamesPageResponse> = response.json();
    let page = body.data.expect("games page");
    assert_eq!(page.games.len(), 1);
    assert_eq!(page.games[0].title, "Game A");
    assert_eq!(page.games[0].submission_count, 2);
    assert_eq!(page.games[0].winner_count, 1);
}

#[tokio::test]
async fn test_get_games_filters_and_search() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 4002, "admin14@test.com", "Admin Fourteen").await;
    create_test_game(&pool, admin_id, "Space Trivia", "quiz", "published").await;
    create_test_game(&pool, admin_id, "Word Sprint", "writing_challenge", "published").await;
    create_test_game(&pool, admin_id, "Trivia Archive", "quiz", "archived").await;

    let response = server
        .get(&format!(
            "/admin/get_games?admin_id={}&status=published&game_type=quiz",
            admin_id
        ))
        .await;
    let body: ApiResponse<GamesPageResponse> = response.json();
    let page = body.data.expect("games page");
    assert_eq!(page.total, 1);
    assert_eq!(page.games[0].title, "Space Trivia");

    let response = server
        .get(&format!("/admin/get_games?admin_id={}&search=TRIVIA", admin_id))
        .await;
    let body: ApiResponse<GamesPageResponse> = response.json();
    let page = body.data.expect("games page");
    assert_eq!(page.total, 2);

    let response = server
        .get(&format!(
            "/admin/get_games?admin_id={}&status=bogus",
            admin_id
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_games_bad_request_missing_param() {
    let (server, _pool) = setup_test_environment().await;

    let response = server.get("/admin/get_games").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// review_submission

#[tokio::test]
async fn test_review_submission_records_score_and_feedback() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 5001, "admin15@test.com", "Admin Fifteen").await;
    let player_id = create_test_player(&pool, 5101, "p3@test.com", "Player Three").await;
    let game_id =
        create_test_game(&pool, admin_id, "Essay Challenge", "writing_challenge", "published")
            .await;
    let submission_id = create_test_submission(&pool, game_id, player_id, false).await;

    let response = server
        .post("/admin/review_submission")
        .json(&json!({
            "admin_id": admin_id,
            "submission_id": submission_id,
            "score": 87,
            "feedback": "Strong opening, weak ending."
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!(
            "/admin/get_game_submissions?admin_id={}&game_id={}",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<Vec<SubmissionData>> = response.json();
    let submissions = body.data.expect("submissions");
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].score, Some(87));
    assert_eq!(
        submissions[0].feedback.as_deref(),
        Some("Strong opening, weak ending.")
    );
    assert_eq!(submissions[0].reviewed_by, Some(admin_id));
    assert!(submissions[0].reviewed_at.is_some());
}

#[tokio::test]
async fn test_review_submission_not_found() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 5002, "admin16@test.com", "Admin Sixteen").await;

    let response = server
        .post("/admin/review_submission")
        .json(&json!({
            "admin_id": admin_id,
            "submission_id": 424242,
            "score": 10
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// select_winners

#[tokio::test]
async fn test_select_winners_marks_stamps_and_rewards() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 6001, "admin17@test.com", "Admin Seventeen").await;
    let player1_id = create_test_player(&pool, 6101, "p4@test.com", "Player Four").await;
    let player2_id = create_test_player(&pool, 6102, "p5@test.com", "Player Five").await;
    let game_id = create_test_game(&pool, admin_id, "Grand Quiz", "quiz", "published").await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 50}), true, false).await;

    let _loser = create_test_submission(&pool, game_id, player1_id, false).await;
    let winner = create_test_submission(&pool, game_id, player2_id, false).await;

    let response = server
        .post("/admin/select_winners")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [winner]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<SelectWinnersResponse> = response.json();
    let outcome = body.data.expect("selection outcome");
    assert_eq!(outcome.winners_marked, 1);
    assert_eq!(outcome.rewards_granted, 1);
    assert_eq!(outcome.players_ranked, 2);

    let response = server
        .get(&format!(
            "/admin/get_game_submissions?admin_id={}&game_id={}&winners_only=true",
            admin_id, game_id
        ))
        .await;
    let body: ApiResponse<Vec<SubmissionData>> = response.json();
    let winners = body.data.expect("winner submissions");
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].id, winner);
    assert!(winners[0].is_winner);
    assert_eq!(winners[0].reviewed_by, Some(admin_id));
    assert!(winners[0].reviewed_at.is_some());

    assert_eq!(count_user_points_rows(&pool, player2_id).await, 1);
    assert_eq!(sum_user_points(&pool, player2_id).await, 50);
    assert_eq!(count_user_points_rows(&pool, player1_id).await, 0);
}

#[tokio::test]
async fn test_select_winners_end_to_end_ranks_winner_above_loser() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 6002, "admin18@test.com", "Admin Eighteen").await;
    let player1_id = create_test_player(&pool, 6103, "p6@test.com", "Player Six").await;
    let player2_id = create_test_player(&pool, 6104, "p7@test.com", "Player Seven").await;
    let game_id = create_test_game(&pool, admin_id, "Final Quiz", "quiz", "published").await;
    create_test_question(&pool, game_id, "short_answer", json!("a"), 1, 1).await;
    create_test_question(&pool, game_id, "short_answer", json!("b"), 1, 2).await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 50}), true, false).await;

    create_test_submission(&pool, game_id, player1_id, false).await;
    let winner = create_test_submission(&pool, game_id, player2_id, false).await;

    let response = server
        .post("/admin/select_winners")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [winner]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    assert_eq!(count_user_points_rows(&pool, player2_id).await, 1);
    assert_eq!(sum_user_points(&pool, player2_id).await, 50);
    assert_eq!(count_user_points_rows(&pool, player1_id).await, 0);

    let winner_row = get_leaderboard_row(&pool, player2_id)
        .await
        .expect("winner leaderboard row");
    let loser_row = get_leaderboard_row(&pool, player1_id)
        .await
        .expect("loser leaderboard row");

    assert!(winner_row.total_points >= 50);
    assert_eq!(winner_row.total_wins, 1);
    assert_eq!(winner_row.total_participation, 1);
    assert!(winner_row.last_activity_at.is_some());
    assert!(winner_row.rank < loser_row.rank);
    assert_eq!(winner_row.rank, 1);
    assert_eq!(loser_row.rank, 2);
}

#[tokio::test]
async fn test_select_winners_ignores_submissions_of_other_games() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 6003, "admin19@test.com", "Admin Nineteen").await;
    let player_id = create_test_player(&pool, 6105, "p8@test.com", "Player Eight").await;
    let game_id = create_test_game(&pool, admin_id, "Target Game", "quiz", "published").await;
    let other_game_id = create_test_game(&pool, admin_id, "Other Game", "quiz", "published").await;

    let foreign = create_test_submission(&pool, other_game_id, player_id, false).await;

    let response = server
        .post("/admin/select_winners")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [foreign]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<SelectWinnersResponse> = response.json();
    assert_eq!(body.data.expect("selection outcome").winners_marked, 0);

    let response = server
        .get(&format!(
            "/admin/get_game_submissions?admin_id={}&game_id={}&winners_only=true",
            admin_id, other_game_id
        ))
        .await;
    let body: ApiResponse<Vec<SubmissionData>> = response.json();
    assert!(body.data.expect("submissions").is_empty());
}

#[tokio::test]
async fn test_select_winners_empty_ids_rejected() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 6004, "admin20@test.com", "Admin Twenty").await;
    let game_id = create_test_game(&pool, admin_id, "Empty Game", "quiz", "published").await;

    let response = server
        .post("/admin/select_winners")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": []
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_select_winners_game_not_found() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 6005, "admin21@test.com", "Admin TwentyOne").await;

    let response = server
        .post("/admin/select_winners")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": 424242,
            "submission_ids": [1]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// award_rewards

#[tokio::test]
async fn test_award_rewards_winner_rule_skips_non_winner() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7001, "admin22@test.com", "Admin TwentyTwo").await;
    let player_id = create_test_player(&pool, 7101, "p9@test.com", "Player Nine").await;
    let game_id = create_test_game(&pool, admin_id, "Quiet Quiz", "quiz", "published").await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 50}), true, false).await;

    let submission = create_test_submission(&pool, game_id, player_id, false).await;

    let response = server
        .post("/admin/award_rewards")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [submission]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<AwardRewardsResponse> = response.json();
    let outcome = body.data.expect("award outcome");
    assert_eq!(outcome.submissions_processed, 1);
    assert_eq!(outcome.rewards_granted, 0);

    assert_eq!(count_user_points_rows(&pool, player_id).await, 0);
    assert_eq!(count_user_badges_for_player(&pool, player_id).await, 0);
    assert!(load_discount_codes(&pool, player_id).await.is_empty());
    assert!(load_book_credits(&pool, player_id).await.is_empty());
}

#[tokio::test]
async fn test_award_rewards_duplicates_grants_on_reinvoke() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7002, "admin23@test.com", "Admin TwentyThree").await;
    let player_id = create_test_player(&pool, 7102, "p10@test.com", "Player Ten").await;
    let game_id = create_test_game(&pool, admin_id, "Repeat Quiz", "quiz", "published").await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 25}), true, false).await;

    let submission = create_test_submission(&pool, game_id, player_id, true).await;

    for _ in 0..2 {
        let response = server
            .post("/admin/award_rewards")
            .json(&json!({
                "admin_id": admin_id,
                "game_id": game_id,
                "submission_ids": [submission]
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    // Grants accumulate across calls; deduplication is the caller's job.
    assert_eq!(count_user_points_rows(&pool, player_id).await, 2);
    assert_eq!(sum_user_points(&pool, player_id).await, 50);
}

#[tokio::test]
async fn test_award_rewards_participation_mode_covers_everyone() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7003, "admin24@test.com", "Admin TwentyFour").await;
    let player1_id = create_test_player(&pool, 7103, "p11@test.com", "Player Eleven").await;
    let player2_id = create_test_player(&pool, 7104, "p12@test.com", "Player Twelve").await;
    let game_id = create_test_game(&pool, admin_id, "Everyone Wins", "quiz", "published").await;
    create_test_reward_rule(&pool, game_id, "points", json!({"points": 5}), false, true).await;

    create_test_submission(&pool, game_id, player1_id, false).await;
    create_test_submission(&pool, game_id, player2_id, false).await;

    // No submission_ids: every submission of the game is targeted.
    let response = server
        .post("/admin/award_rewards")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "is_participation": true
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<AwardRewardsResponse> = response.json();
    let outcome = body.data.expect("award outcome");
    assert_eq!(outcome.submissions_processed, 2);
    assert_eq!(outcome.rewards_granted, 2);

    assert_eq!(sum_user_points(&pool, player1_id).await, 5);
    assert_eq!(sum_user_points(&pool, player2_id).await, 5);
}

#[tokio::test]
async fn test_award_rewards_discount_code_shape_and_default_percentage() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7004, "admin25@test.com", "Admin TwentyFive").await;
    let player_id = create_test_player(&pool, 7105, "p13@test.com", "Player Thirteen").await;
    let game_id = create_test_game(&pool, admin_id, "Discount Quiz", "quiz", "published").await;
    create_test_reward_rule(&pool, game_id, "discount_code", json!({}), true, false).await;

    let submission = create_test_submission(&pool, game_id, player_id, true).await;

    let response = server
        .post("/admin/award_rewards")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [submission]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let codes = load_discount_codes(&pool, player_id).await;
    assert_eq!(codes.len(), 1);
    let (code, percentage, expires_at) = &codes[0];
    assert!(code.starts_with("DISCOUNT"));
    assert!(code.len() > "DISCOUNT".len() + 5);
    assert_eq!(*percentage, 10);
    let days = days_until(*expires_at);
    assert!((29..=30).contains(&days), "expected ~30 days, got {}", days);
}

#[tokio::test]
async fn test_award_rewards_book_credit_amount_and_expiry() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7005, "admin26@test.com", "Admin TwentySix").await;
    let player_id = create_test_player(&pool, 7106, "p14@test.com", "Player Fourteen").await;
    let game_id = create_test_game(&pool, admin_id, "Bookworm Quiz", "quiz", "published").await;
    create_test_reward_rule(
        &pool,
        game_id,
        "book_credit",
        json!({"book_credit_amount": 3}),
        true,
        false,
    )
    .await;

    let submission = create_test_submission(&pool, game_id, player_id, true).await;

    let response = server
        .post("/admin/award_rewards")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [submission]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let credits = load_book_credits(&pool, player_id).await;
    assert_eq!(credits.len(), 1);
    let (amount, expires_at) = &credits[0];
    assert_eq!(*amount, 3);
    let days = days_until(*expires_at);
    assert!((89..=90).contains(&days), "expected ~90 days, got {}", days);
}

#[tokio::test]
async fn test_award_rewards_badge_rule_grants_and_noops_without_id() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7006, "admin27@test.com", "Admin TwentySeven").await;
    let player_id = create_test_player(&pool, 7107, "p15@test.com", "Player Fifteen").await;
    let badge_id = create_test_badge(&pool, "First Win", "game_winner", "rare").await;
    let game_id = create_test_game(&pool, admin_id, "Badge Quiz", "quiz", "published").await;
    create_test_reward_rule(
        &pool,
        game_id,
        "badge",
        json!({"badge_id": badge_id}),
        true,
        false,
    )
    .await;
    // A badge rule without a badge id grants nothing.
    create_test_reward_rule(&pool, game_id, "badge", json!({}), true, false).await;

    let submission = create_test_submission(&pool, game_id, player_id, true).await;

    let response = server
        .post("/admin/award_rewards")
        .json(&json!({
            "admin_id": admin_id,
            "game_id": game_id,
            "submission_ids": [submission]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<AwardRewardsResponse> = response.json();
    assert_eq!(body.data.expect("award outcome").rewards_granted, 1);

    assert_eq!(count_user_badges_for_badge(&pool, badge_id).await, 1);
    assert_eq!(count_user_badges_for_player(&pool, player_id).await, 1);
}

#[tokio::test]
async fn test_award_rewards_game_not_found() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 7007, "admin28@test.com", "Admin TwentyEight").await;

    let response = server
        .post("/admin/award_rewards")
        .json(&json!({"admin_id": admin_id, "game_id": 424242}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_award_rewards_unauthorized() {
    let (server, _pool) = setup_test_environment().await;

    let response = server
        .post("/admin/award_rewards")
        .json(&json!({"admin_id": 9999, "game_id": 1}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// refresh_leaderboard

#[tokio::test]
async fn test_refresh_leaderboard_totals_match_ledgers_and_ranks_are_dense() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 8001, "admin29@test.com", "Admin TwentyNine").await;
    let player1_id = create_test_player(&pool, 8101, "p16@test.com", "Player Sixteen").await;
    let player2_id = create_test_player(&pool, 8102, "p17@test.com", "Player Seventeen").await;
    let player3_id = create_test_player(&pool, 8103, "p18@test.com", "Player Eighteen").await;
    let game_id = create_test_game(&pool, admin_id, "Rank Game", "quiz", "published").await;

    create_test_user_points(&pool, player1_id, 30, "First win").await;
    create_test_user_points(&pool, player1_id, 20, "Second win").await;
    create_test_user_points(&pool, player2_id, 10, "Consolation").await;

    create_test_submission(&pool, game_id, player1_id, true).await;
    create_test_submission(&pool, game_id, player2_id, false).await;
    create_test_submission(&pool, game_id, player2_id, false).await;
    create_test_submission(&pool, game_id, player3_id, false).await;

    let response = server
        .post("/admin/refresh_leaderboard")
        .json(&json!({"admin_id": admin_id}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<RefreshLeaderboardResponse> = response.json();
    assert_eq!(body.data.expect("refresh outcome").players_ranked, 3);

    let row1 = get_leaderboard_row(&pool, player1_id).await.expect("row 1");
    assert_eq!(row1.total_points, sum_user_points(&pool, player1_id).await);
    assert_eq!(row1.total_points, 50);
    assert_eq!(row1.total_wins, 1);
    assert_eq!(row1.total_participation, 1);
    assert_eq!(row1.rank, 1);

    let row2 = get_leaderboard_row(&pool, player2_id).await.expect("row 2");
    assert_eq!(row2.total_points, 10);
    assert_eq!(row2.total_wins, 0);
    assert_eq!(row2.total_participation, 2);
    assert_eq!(row2.rank, 2);

    // A player with history but no points still appears, ranked last.
    let row3 = get_leaderboard_row(&pool, player3_id).await.expect("row 3");
    assert_eq!(row3.total_points, 0);
    assert_eq!(row3.total_participation, 1);
    assert_eq!(row3.rank, 3);
}

#[tokio::test]
async fn test_refresh_leaderboard_is_idempotent() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 8002, "admin30@test.com", "Admin Thirty").await;
    let player_id = create_test_player(&pool, 8104, "p19@test.com", "Player Nineteen").await;
    create_test_user_points(&pool, player_id, 15, "Win").await;

    for _ in 0..2 {
        let response = server
            .post("/admin/refresh_leaderboard")
            .json(&json!({"admin_id": admin_id}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let row = get_leaderboard_row(&pool, player_id).await.expect("row");
    assert_eq!(row.total_points, 15);
    assert_eq!(row.rank, 1);
}

#[tokio::test]
async fn test_refresh_leaderboard_unauthorized() {
    let (server, _pool) = setup_test_environment().await;

    let response = server
        .post("/admin/refresh_leaderboard")
        .json(&json!({"admin_id": 9999}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// badge catalog

#[tokio::test]
async fn test_create_badge_and_live_usage_count() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 9001, "admin31@test.com", "Admin ThirtyOne").await;
    let player_id = create_test_player(&pool, 9101, "p20@test.com", "Player Twenty").await;

    let response = server
        .post("/admin/create_badge")
        .json(&json!({
            "admin_id": admin_id,
            "name": "First Win",
            "description": "Awarded for a first game win",
            "icon": "medal",
            "badge_type": "game_winner",
            "rarity": "rare"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<i64> = response.json();
    let badge_id = body.data.expect("badge id");

    let response = server
        .get(&format!("/admin/get_badges?admin_id={}", admin_id))
        .await;
    let body: ApiResponse<BadgesPageResponse> = response.json();
    let page = body.data.expect("badges page");
    assert_eq!(page.total, 1);
    assert_eq!(page.badges[0].name, "First Win");
    assert_eq!(page.badges[0].usage_count, 0);

    create_test_user_badge(&pool, player_id, badge_id, None).await;
    create_test_user_badge(&pool, player_id, badge_id, None).await;

    let response = server
        .get(&format!("/admin/get_badges?admin_id={}", admin_id))
        .await;
    let body: ApiResponse<BadgesPageResponse> = response.json();
    let page = body.data.expect("badges page");
    assert_eq!(page.badges[0].usage_count, 2);
}

#[tokio::test]
async fn test_create_badge_invalid_rarity() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 9002, "admin32@test.com", "Admin ThirtyTwo").await;

    let response = server
        .post("/admin/create_badge")
        .json(&json!({
            "admin_id": admin_id,
            "name": "Broken Badge",
            "badge_type": "milestone",
            "rarity": "mythical"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_modify_badge_sparse_patch() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 9003, "admin33@test.com", "Admin ThirtyThree").await;
    let badge_id = create_test_badge(&pool, "Steady Streak", "streak", "common").await;

    let response = server
        .post("/admin/modify_badge")
        .json(&json!({
            "admin_id": admin_id,
            "badge_id": badge_id,
            "rarity": "epic"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/admin/get_badges?admin_id={}", admin_id))
        .await;
    let body: ApiResponse<BadgesPageResponse> = response.json();
    let page = body.data.expect("badges page");
    assert_eq!(page.badges[0].name, "Steady Streak");
    assert_eq!(page.badges[0].rarity, "epic");
}

#[tokio::test]
async fn test_modify_badge_not_found() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 9004, "admin34@test.com", "Admin ThirtyFour").await;

    let response = server
        .post("/admin/modify_badge")
        .json(&json!({
            "admin_id": admin_id,
            "badge_id": 424242,
            "name": "Ghost Badge"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_badge() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 9005, "admin35@test.com", "Admin ThirtyFive").await;
    let badge_id = create_test_badge(&pool, "Disposable", "milestone", "common").await;

    let response = server
        .post("/admin/delete_badge")
        .json(&json!({"admin_id": admin_id, "badge_id": badge_id}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/admin/get_badges?admin_id={}", admin_id))
        .await;
    let body: ApiResponse<BadgesPageResponse> = response.json();
    assert_eq!(body.data.expect("badges page").total, 0);
}

#[tokio::test]
async fn test_get_badges_filters_and_search() {
    let (server, pool) = setup_test_environment().await;

    let admin_id = create_test_admin(&pool, 9006, "admin36@test.com", "Admin ThirtySix").await;
    create_test_badge(&pool, "Marathon Writer", "milestone", "epic").await;
    create_test_badge(&pool, "Week Streak", "streak", "common").await;
    create_test_badge(&pool, "Month Streak", "streak", "rare").await;

    let response = server
        .get(&format!(
            "/admin/get_badges?admin_id={}&badge_type=streak",
            admin_id
        ))
        .await;
    let body: ApiResponse<BadgesPageResponse> = response.json();
    assert_eq!(body.data.expect("badges page").total, 2);

    let response = server
        .get(&format!(
            "/admin/get_badges?admin_id={}&search=marathon",
            admin_id
        ))
        .await;
    let body: ApiResponse<BadgesPageResponse> = response.json();
    let page = body.data.expect("badges page");
    assert_eq!(page.total, 1);
    assert_eq!(page.badges[0].name, "Marathon Writer");

    let response = server
        .get(&format!(
            "/admin/get_badges?admin_id={}&rarity=mythical",
            admin_id
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_badges_unauthorized() {
    let (server, _pool) = setup_test_environment().await;

    let response = server.get("/admin/get_badges?admin_id=9999").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}
