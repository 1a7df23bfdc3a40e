//! 講座のライフサイクルと所有者キャッシュの結合テスト
//!
//! HTTP → ユースケース → ガード → モックのキャッシュ・データベースまでを通しで検証する。

use axum::http::{Method, StatusCode};
use courseworker_api::test_utils::TestApp;
use courseworker_domain::user::UserId;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_講座の作成から削除までキャッシュが追従する() {
    // Arrange
    let app = TestApp::new();
    app.db.set_next_course_id(42);
    let owner = UserId::new();

    // Act: 作成
    let course_id = app.create_course(&owner, "Algorithms").await;

    // Assert: 作成時に所有者が書き込まれる
    assert_eq!(course_id, 42);
    assert_eq!(app.cache.entry("course:42"), Some(owner.to_string()));

    // Act: 削除
    let (status, _) = app
        .send(Method::DELETE, "/courses/42", Some(&owner), None)
        .await;

    // Assert: キャッシュから消え、正本にも存在しない
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.cache.entry("course:42"), None);
    assert_eq!(app.db.course_count(), 0);

    // Act: 再削除はキャッシュミス → 正本 → NotExist
    let lookups_before = app.db.owner_lookups();
    let (status, body) = app
        .send(Method::DELETE, "/courses/42", Some(&owner), None)
        .await;

    // Assert
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "resource_not_found");
    assert_eq!(app.db.owner_lookups(), lookups_before + 1);
}

#[tokio::test]
async fn test_キャッシュヒット時は正本に問い合わせない() {
    // Arrange
    let app = TestApp::new();
    let owner = UserId::new();
    let course_id = app.create_course(&owner, "Algorithms").await;
    let path = format!("/courses/{course_id}");

    // Act
    app.send(Method::GET, &path, Some(&owner), None).await;
    app.send(Method::GET, &path, Some(&owner), None).await;

    // Assert: 作成時に書き込まれたキャッシュだけで解決される
    assert_eq!(app.db.owner_lookups(), 0);
}

#[tokio::test]
async fn test_キャッシュ全面障害でも所有者判定は正しく動く() {
    // Arrange
    let app = TestApp::new();
    let owner = UserId::new();
    let course_id = app.create_course(&owner, "Algorithms").await;
    app.cache.set_failing(true);
    let path = format!("/courses/{course_id}");

    // Act
    let (owner_status, _) = app.send(Method::GET, &path, Some(&owner), None).await;
    let (other_status, _) = app
        .send(Method::GET, &path, Some(&UserId::new()), None)
        .await;

    // Assert
    assert_eq!(owner_status, StatusCode::OK);
    assert_eq!(other_status, StatusCode::FORBIDDEN);
    assert_eq!(app.db.owner_lookups(), 2);
}

#[tokio::test]
async fn test_正本の障害は500で内部メッセージを返さない() {
    // Arrange
    let app = TestApp::new();
    app.db.set_failing(true);

    // Act
    let (status, body) = app
        .send(Method::GET, "/courses/1", Some(&UserId::new()), None)
        .await;

    // Assert
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "database_error");
    assert_eq!(
        body["error"]["detail"],
        "Internal server error has occurred - please contact support"
    );
    assert!(!body.to_string().contains("pool timed out"));
    assert!(body["error"]["request_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_講座の削除で所属タスクも参照できなくなる() {
    // Arrange
    let app = TestApp::new();
    let owner = UserId::new();
    let course_id = app.create_course(&owner, "Algorithms").await;
    let (_, task) = app
        .send(
            Method::POST,
            &format!("/courses/{course_id}/tasks"),
            Some(&owner),
            Some(json!({ "title": "Homework", "type": "assignment" })),
        )
        .await;
    let task_id = task["data"]["id"].as_str().unwrap().to_string();

    // Act
    app.send(Method::DELETE, &format!("/courses/{course_id}"), Some(&owner), None)
        .await;
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/courses/{course_id}/tasks/{task_id}"),
            Some(&owner),
            None,
        )
        .await;

    // Assert
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.cache.entry(&format!("task:{task_id}")), None);
    assert_eq!(app.db.task_count(), 0);
}
