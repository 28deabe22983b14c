mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{todo_path, TestServer};
use todo_api::database::TodoRepository;

#[tokio::test]
async fn create_sets_defaults_and_audit_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let res = server
        .post("/api/todos/", &token)
        .json(&json!({ "title": "Buy milk", "description": "2 liters", "completed": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let todo: Value = res.json().await?;
    assert_eq!(todo["title"], "Buy milk");
    assert_eq!(todo["description"], "2 liters");
    assert_eq!(todo["completed"], false);
    assert_eq!(todo["is_deleted"], false);
    assert!(Uuid::parse_str(todo["id"].as_str().unwrap_or_default()).is_ok());
    assert_eq!(todo["created_by"], todo["owner"]);
    assert_eq!(todo["created_at"], todo["updated_at"]);
    Ok(())
}

#[tokio::test]
async fn list_returns_only_own_visible_todos_in_creation_order() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user_token("alice").await?;
    let bob = server.user_token("bob").await?;

    let first = server.create_todo(&alice, "first", "a").await?;
    let second = server.create_todo(&alice, "second", "b").await?;
    server.create_todo(&bob, "bobs", "c").await?;

    let list: Vec<Value> = server.get("/api/todos/", &alice).send().await?.json().await?;
    let ids: Vec<&Value> = list.iter().map(|t| &t["id"]).collect();
    assert_eq!(ids, vec![&first["id"], &second["id"]]);

    let list: Vec<Value> = server.get("/api/todos/", &bob).send().await?.json().await?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "bobs");
    Ok(())
}

#[tokio::test]
async fn empty_list_is_an_empty_array() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let res = server.get("/api/todos/", &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn other_users_todos_are_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user_token("alice").await?;
    let bob = server.user_token("bob").await?;
    let todo = server.create_todo(&alice, "private", "mine").await?;
    let path = todo_path(&todo["id"]);

    let res = server.get(&path, &bob).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .patch(&path, &bob)
        .json(&json!({ "title": "stolen" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.delete(&path, &bob).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .patch(&format!("{}mark_done/", path), &bob)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let unchanged: Value = server.get(&path, &alice).send().await?.json().await?;
    assert_eq!(unchanged, todo);
    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_but_keeps_the_record() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;
    let todo = server.create_todo(&token, "temp", "to delete").await?;
    let path = todo_path(&todo["id"]);

    let res = server.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await?.is_empty());

    let res = server.get(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let list: Vec<Value> = server.get("/api/todos/", &token).send().await?.json().await?;
    assert!(list.is_empty());

    let res = server.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let id = Uuid::parse_str(todo["id"].as_str().unwrap_or_default())?;
    let stored = server
        .state
        .store
        .todo_by_id(id)
        .await?
        .expect("soft-deleted todo is still stored");
    assert!(stored.is_deleted);
    assert_eq!(stored.title, "temp");
    Ok(())
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;
    let todo = server.create_todo(&token, "draft", "keep me").await?;
    let path = todo_path(&todo["id"]);

    tokio::time::sleep(Duration::from_millis(10)).await;

    let res = server
        .patch(&path, &token)
        .json(&json!({ "title": "final" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let updated: Value = res.json().await?;
    assert_eq!(updated["title"], "final");
    assert_eq!(updated["description"], "keep me");
    assert_eq!(updated["completed"], false);
    assert_eq!(updated["created_at"], todo["created_at"]);
    assert_ne!(updated["updated_at"], todo["updated_at"]);
    assert_eq!(updated["updated_by"], todo["owner"]);
    Ok(())
}

#[tokio::test]
async fn full_update_replaces_all_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;
    let todo = server.create_todo(&token, "old", "old desc").await?;
    let path = todo_path(&todo["id"]);

    let res = server
        .put(&path, &token)
        .json(&json!({ "title": "new", "description": "new desc", "completed": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["title"], "new");
    assert_eq!(updated["description"], "new desc");
    assert_eq!(updated["completed"], true);

    let res = server
        .put(&path, &token)
        .json(&json!({ "title": "only title" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["description"], "This field is required.");
    assert_eq!(body["field_errors"]["completed"], "This field is required.");
    Ok(())
}

#[tokio::test]
async fn mark_done_is_idempotent() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;
    let todo = server.create_todo(&token, "chore", "do it").await?;
    let path = todo_path(&todo["id"]);
    let done_path = format!("{}mark_done/", path);

    for _ in 0..2 {
        let res = server.patch(&done_path, &token).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "status": "Task marked as done" })
        );
    }

    let fetched: Value = server.get(&path, &token).send().await?.json().await?;
    assert_eq!(fetched["completed"], true);
    assert_eq!(fetched["updated_by"], todo["owner"]);
    Ok(())
}

#[tokio::test]
async fn mark_done_on_missing_todo() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let res = server
        .patch(&format!("/api/todos/{}/mark_done/", Uuid::new_v4()), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Todo not found" }));

    let res = server
        .patch("/api/todos/not-a-uuid/mark_done/", &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_id_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let res = server.get("/api/todos/12345/", &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn create_validation_errors() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let res = server
        .post("/api/todos/", &token)
        .json(&json!({ "title": "   ", "description": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["field_errors"]["title"], "This field may not be blank.");
    assert_eq!(body["field_errors"]["description"], "This field may not be null.");

    let res = server
        .post("/api/todos/", &token)
        .json(&json!({ "title": "x".repeat(201), "description": "long" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(
        body["field_errors"]["title"],
        "Ensure this field has no more than 200 characters."
    );

    let res = server
        .post("/api/todos/", &token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let list: Vec<Value> = server.get("/api/todos/", &token).send().await?.json().await?;
    assert!(list.is_empty());
    Ok(())
}

#[tokio::test]
async fn title_at_limit_is_accepted() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let todo = server.create_todo(&token, &"x".repeat(200), "fits").await?;
    assert_eq!(todo["title"].as_str().map(|s| s.len()), Some(200));
    Ok(())
}

#[tokio::test]
async fn walkthrough_create_complete_delete() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;

    let todo = server.create_todo(&token, "Write report", "Q3 numbers").await?;
    let path = todo_path(&todo["id"]);

    let res = server
        .patch(&format!("{}mark_done/", path), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let list: Vec<Value> = server.get("/api/todos/", &token).send().await?.json().await?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["completed"], true);

    let res = server.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let list: Vec<Value> = server.get("/api/todos/", &token).send().await?.json().await?;
    assert!(list.is_empty());
    Ok(())
}

#[tokio::test]
async fn sample_task_lifecycle() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("user1").await?;

    let res = server
        .post("/api/todos/", &token)
        .json(&json!({ "title": "Sample Task", "description": "This is a test task" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let sample: Value = res.json().await?;
    assert_eq!(sample["completed"], false);
    assert_eq!(sample["is_deleted"], false);
    let path = todo_path(&sample["id"]);

    let res = server.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let other = server.create_todo(&token, "Another Task", "Still here").await?;
    let res = server
        .patch(&todo_path(&other["id"]), &token)
        .json(&json!({ "completed": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let patched: Value = res.json().await?;
    assert_eq!(patched["completed"], true);
    assert_eq!(patched["title"], "Another Task");
    Ok(())
}

#[tokio::test]
async fn read_only_fields_in_payload_are_ignored() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.user_token("alice").await?;
    let todo = server.create_todo(&token, "keep", "flags").await?;

    let res = server
        .patch(&todo_path(&todo["id"]), &token)
        .json(&json!({
            "id": Uuid::new_v4(),
            "owner": Uuid::new_v4(),
            "is_deleted": true,
            "color": "blue"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["id"], todo["id"]);
    assert_eq!(updated["owner"], todo["owner"]);
    assert_eq!(updated["is_deleted"], false);
    assert!(updated.get("color").is_none());
    Ok(())
}
