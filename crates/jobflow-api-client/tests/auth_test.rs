mod helpers;

use helpers::{api_path, setup_anonymous_client, setup_test_client, test_user, TEST_TOKEN};
use jobflow_api_client::{ApiError, Credentials, Session};
use jobflow_core::find_api_error;
use mockito::Matcher;
use serde_json::json;

fn auth_body(token: &str) -> String {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "user": { "id": 1, "email": "recruiter@example.com", "created_at": "2025-01-05T09:00:00" }
    })
    .to_string()
}

#[tokio::test]
async fn test_login_persists_session() {
    let mut test = setup_anonymous_client().await;

    let mock = test
        .server
        .mock("POST", api_path("/auth/login").as_str())
        .match_body(Matcher::Json(json!({
            "email": "recruiter@example.com",
            "password": "hunter2"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(auth_body("fresh-token"))
        .expect(1)
        .create_async()
        .await;

    let response = test
        .client
        .login(&Credentials::new("recruiter@example.com", "hunter2"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.access_token, "fresh-token");
    assert!(test.client.session().is_authenticated().await);

    let store = test.store();
    assert_eq!(store.load_token().unwrap().as_deref(), Some("fresh-token"));
    assert_eq!(store.load_user().unwrap(), Some(test_user()));
}

#[tokio::test]
async fn test_login_failure_surfaces_server_message() {
    let mut test = setup_anonymous_client().await;

    test.server
        .mock("POST", api_path("/auth/login").as_str())
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Incorrect email or password"}"#)
        .create_async()
        .await;

    let err = test
        .client
        .login(&Credentials::new("recruiter@example.com", "wrong"))
        .await
        .unwrap_err();

    match find_api_error(&err) {
        Some(ApiError::Unauthorized(message)) => {
            assert_eq!(message, "Incorrect email or password")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!test.client.session().is_authenticated().await);
}

#[tokio::test]
async fn test_register_persists_session() {
    let mut test = setup_anonymous_client().await;

    test.server
        .mock("POST", api_path("/auth/register").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(auth_body("new-account-token"))
        .create_async()
        .await;

    test.client
        .register(&Credentials::new("recruiter@example.com", "hunter2"))
        .await
        .unwrap();

    assert_eq!(
        test.client.session().token().await.as_deref(),
        Some("new-account-token")
    );
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let mut test = setup_test_client().await;

    let mock = test
        .server
        .mock("GET", api_path("/auth/me").as_str())
        .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!(test_user()).to_string())
        .expect(1)
        .create_async()
        .await;

    let user = test.client.current_user().await.unwrap();
    mock.assert_async().await;
    assert_eq!(user.email, "recruiter@example.com");
}

#[tokio::test]
async fn test_401_clears_stored_session() {
    let mut test = setup_test_client().await;

    test.server
        .mock("GET", api_path("/workflows").as_str())
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Could not validate credentials"}"#)
        .create_async()
        .await;

    let err = test.client.list_workflows().await.unwrap_err();
    assert!(find_api_error(&err).is_some_and(ApiError::is_auth_failure));

    assert_eq!(test.client.session().token().await, None);
    assert_eq!(test.client.session().user().await, None);

    let store = test.store();
    assert_eq!(store.load_token().unwrap(), None);
    assert_eq!(store.load_user().unwrap(), None);

    // A fresh process starts logged out.
    let rehydrated = Session::hydrate(test.store()).unwrap();
    assert!(!rehydrated.is_authenticated().await);
}

#[tokio::test]
async fn test_revalidate_refreshes_cached_user() {
    let mut test = setup_test_client().await;

    test.server
        .mock("GET", api_path("/auth/me").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":1,"email":"renamed@example.com","created_at":""}"#)
        .create_async()
        .await;

    let user = test.client.revalidate_session().await.unwrap().unwrap();
    assert_eq!(user.email, "renamed@example.com");
    assert_eq!(
        test.store().load_user().unwrap().map(|u| u.email),
        Some("renamed@example.com".to_string())
    );
}

#[tokio::test]
async fn test_revalidate_failure_clears_session() {
    let mut test = setup_test_client().await;

    test.server
        .mock("GET", api_path("/auth/me").as_str())
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    assert_eq!(test.client.revalidate_session().await.unwrap(), None);
    assert!(!test.client.session().is_authenticated().await);
    assert_eq!(test.store().load_token().unwrap(), None);
}

#[tokio::test]
async fn test_revalidate_without_token_skips_request() {
    let mut test = setup_anonymous_client().await;

    let mock = test
        .server
        .mock("GET", api_path("/auth/me").as_str())
        .expect(0)
        .create_async()
        .await;

    assert_eq!(test.client.revalidate_session().await.unwrap(), None);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_logout_clears_session() {
    let test = setup_test_client().await;

    test.client.logout().await.unwrap();

    assert!(!test.client.session().is_authenticated().await);
    assert_eq!(test.store().load_token().unwrap(), None);
}
