mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::TestServer;
use jobly_api::auth::TokenService;

fn new_user() -> serde_json::Value {
    json!({
        "username": "rudolph",
        "password": "rednose",
        "first_name": "Rudolph",
        "last_name": "Reindeer",
        "email": "rudolph@north.pole",
    })
}

#[tokio::test]
async fn register_returns_a_working_token() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };

    let (status, body) = server.send(Method::POST, "/users", None, Some(new_user())).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let principal = TokenService::new(&server.config.security).verify(&token)?;
    assert_eq!(principal.subject_id, "rudolph");
    assert!(!principal.is_privileged);

    let (status, body) = server.get("/users/rudolph", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "rudolph@north.pole");
    assert!(body["user"].get("password").is_none());
    assert_eq!(body["user"]["jobs"], json!([]));
    Ok(())
}

#[tokio::test]
async fn stored_password_is_a_bcrypt_hash() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };

    let (status, _) = server.send(Method::POST, "/users", None, Some(new_user())).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (stored,): (String,) = sqlx::query_as("SELECT password FROM users WHERE username = 'rudolph'")
        .fetch_one(&server.pool)
        .await?;
    assert_ne!(stored, "rednose");
    // cost comes from configuration
    assert!(stored.starts_with("$2b$04$"), "unexpected hash: {}", stored);
    assert!(jobly_api::auth::password::verify_password("rednose", &stored).await?);
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_400() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };
    let mut body = new_user();
    body["username"] = json!("santa");

    let (status, payload) = server.send(Method::POST, "/users", None, Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["message"], "There is already a user with the username santa");
    Ok(())
}

#[tokio::test]
async fn login_with_correct_and_wrong_password() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };

    let (status, body) = server
        .send(Method::POST, "/login", None, Some(json!({"username": "santa", "password": "merry"})))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let token = body["token"].as_str().unwrap_or_default();
    let principal = TokenService::new(&server.config.security).verify(token)?;
    assert_eq!(principal.subject_id, "santa");
    assert!(principal.is_privileged);

    for creds in [
        json!({"username": "santa", "password": "naughty"}),
        json!({"username": "grinch", "password": "merry"}),
    ] {
        let (status, body) = server.send(Method::POST, "/login", None, Some(creds)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid username/password");
    }
    Ok(())
}

#[tokio::test]
async fn list_and_detail() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };
    let token = server.user_token();

    let (status, body) = server.get("/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["users"],
        json!([
            {"username": "elf", "first_name": "Buddy", "last_name": "Elf", "email": "buddy@north.pole"},
            {"username": "santa", "first_name": "Santa", "last_name": "Claus", "email": "santa@north.pole"},
        ])
    );

    let (_, body) = server.get("/users/elf", Some(&token)).await?;
    assert_eq!(
        body["user"]["jobs"],
        json!([{"title": "Software Engineer", "company_handle": "apple", "state": "interested"}])
    );

    let (status, body) = server.get("/users/grinch", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No such username: grinch");
    Ok(())
}

#[tokio::test]
async fn owner_updates_own_profile_and_password() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };
    let token = server.user_token();

    let (status, body) = server
        .send(
            Method::PATCH,
            "/users/elf",
            Some(&token),
            Some(json!({"last_name": "Hobbs", "password": "cotton-headed"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["last_name"], "Hobbs");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("is_admin").is_none());

    let (status, _) = server
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "elf", "password": "cotton-headed"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn owner_deletes_own_account() -> Result<()> {
    let Some(server) = TestServer::with_database(false).await? else {
        return Ok(());
    };
    let token = server.user_token();

    let (status, body) = server.send(Method::DELETE, "/users/elf", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "User deleted"}));

    let (status, _) = server.get("/users/elf", Some(&server.admin_token())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
