mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json, seed_user};
use creaition_db::models::story::{CreateStory, GeneratedStory};
use creaition_db::repositories::StoryRepo;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_is_idempotent(pool: PgPool) {
    let app = build_test_app(pool);
    let body = json!({"username": "ada", "email": "ada@example.com"});

    let response = post_json(&app.router, "/api/users/create", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["user"]["credits"], 999);
    assert!(created.get("message").is_none());

    let response = post_json(
        &app.router,
        "/api/users/create",
        json!({"username": "someone else", "email": "ada@example.com", "credits": 5}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let again = body_json(response).await;
    assert_eq!(again["message"], "User already exists");
    assert_eq!(again["user"]["id"], created["user"]["id"]);
    assert_eq!(again["user"]["username"], "ada");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_validates_input(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(
        &app.router,
        "/api/users/create",
        json!({"username": "ada", "email": "not-an-email"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let response = post_json(
        &app.router,
        "/api/users/create",
        json!({"username": "", "email": "ada@example.com"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_user_by_email(pool: PgPool) {
    seed_user(&pool, "grace@example.com").await;
    let app = build_test_app(pool);

    let response = get(&app.router, "/api/users/email/grace@example.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["email"], "grace@example.com");
    assert_eq!(json["user"]["username"], "grace");

    let response = get(&app.router, "/api/users/email/nobody@example.com").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_credits(pool: PgPool) {
    seed_user(&pool, "grace@example.com").await;
    let app = build_test_app(pool);

    let response = post_json(
        &app.router,
        "/api/users/email/grace@example.com/credits",
        json!({"credits": 12}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Credits updated successfully");

    let json = body_json(get(&app.router, "/api/users/email/grace@example.com").await).await;
    assert_eq!(json["user"]["credits"], 12);

    let response = post_json(
        &app.router,
        "/api/users/email/grace@example.com/credits",
        json!({"credits": -3}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app.router,
        "/api/users/email/nobody@example.com/credits",
        json!({"credits": 3}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_stories_report_written_status(pool: PgPool) {
    let user = seed_user(&pool, "grace@example.com").await;
    let other = seed_user(&pool, "other@example.com").await;

    let new_story = |user_id, title: &str| CreateStory {
        user_id: Some(user_id),
        title: title.to_string(),
        nb_scenes: 3,
        nb_chars: 1,
        story_mode: "adventure".to_string(),
        cover_image_url: None,
        cover_image_name: None,
        background_story: None,
    };
    let draft = StoryRepo::create(&pool, &new_story(user.id, "Draft")).await.unwrap();
    let written = StoryRepo::create(&pool, &new_story(user.id, "Written")).await.unwrap();
    StoryRepo::create(&pool, &new_story(other.id, "Not mine")).await.unwrap();
    StoryRepo::set_generated_story(
        &pool,
        written.id,
        &GeneratedStory {
            background_story: "Premise".to_string(),
            future_story: "It happened.".to_string(),
            scenes_paragraph: "It happened.".to_string(),
        },
    )
    .await
    .unwrap();

    let app = build_test_app(pool);

    let json = body_json(get(&app.router, "/api/user/stories?user_email=grace@example.com").await).await;
    let stories = json["stories"].as_array().unwrap();
    assert_eq!(stories.len(), 2);
    let status_of = |id: uuid::Uuid| {
        stories
            .iter()
            .find(|s| s["id"] == id.to_string())
            .map(|s| s["status"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(status_of(draft.id), "created");
    assert_eq!(status_of(written.id), "completed");

    let by_id = body_json(get(&app.router, &format!("/api/user/stories?user_id={}", other.id)).await).await;
    assert_eq!(by_id["stories"].as_array().unwrap().len(), 1);
    assert_eq!(by_id["stories"][0]["title"], "Not mine");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_stories_requires_a_user(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app.router, "/api/user/stories").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&app.router, "/api/user/stories?user_email=ghost@example.com").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
