//! Auth client tests
//!
//! Sign-in, session lookup, role resolution and administrator creation
//! against a mocked identity service.

use mockito::{Matcher, Server};

use stillpoint::api::IdentityProvider;
use stillpoint::api::{AuthClient, AuthError, Role};

#[tokio::test]
async fn test_sign_in_returns_session() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_header("apikey", "anon")
        .match_body(Matcher::PartialJsonString(
            r#"{"email":"admin@example.com","password":"secret"}"#.into(),
        ))
        .with_status(200)
        .with_body(r#"{"access_token":"jwt-1","token_type":"bearer","user":{"id":"u-1","email":"admin@example.com"}}"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon");
    let session = client.sign_in("admin@example.com", "secret").await.unwrap();

    mock.assert_async().await;
    assert_eq!(session.access_token, "jwt-1");
    assert_eq!(session.user.id, "u-1");
    assert_eq!(session.user.email.as_deref(), Some("admin@example.com"));
}

#[tokio::test]
async fn test_sign_in_bad_password() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon");
    let err = client.sign_in("admin@example.com", "wrong").await.unwrap_err();

    match err {
        AuthError::InvalidCredentials(message) => {
            assert_eq!(message, "Invalid login credentials")
        }
        other => panic!("Expected InvalidCredentials, got {:?}", other),
    }
}

#[tokio::test]
async fn test_current_user_with_token() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/auth/v1/user")
        .match_header("authorization", "Bearer jwt-1")
        .with_status(200)
        .with_body(r#"{"id":"u-1","email":"admin@example.com"}"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon").with_access_token("jwt-1");
    let user = client.current_user().await.unwrap().unwrap();

    mock.assert_async().await;
    assert_eq!(user.id, "u-1");
}

#[tokio::test]
async fn test_expired_session_means_signed_out() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/auth/v1/user")
        .with_status(401)
        .with_body(r#"{"msg":"JWT expired"}"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon").with_access_token("stale");
    assert!(client.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_role_reads_profile_row() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "role".into()),
            Matcher::UrlEncoded("id".into(), "eq.u-1".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"role":"super_admin"}]"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon").with_access_token("jwt-1");
    assert_eq!(client.fetch_role("u-1").await.unwrap(), Some(Role::SuperAdmin));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_profile_defaults_to_admin() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon").with_access_token("jwt-1");
    assert_eq!(client.fetch_role("u-2").await.unwrap(), None);
    assert_eq!(client.role_or_default("u-2").await, Role::Admin);
}

#[tokio::test]
async fn test_role_lookup_error_defaults_to_admin() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"db down"}"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon").with_access_token("jwt-1");
    assert!(client.fetch_role("u-1").await.is_err());
    assert_eq!(client.role_or_default("u-1").await, Role::Admin);
}

#[tokio::test]
async fn test_create_sub_admin_calls_function() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/functions/v1/create-user")
        .match_header("authorization", "Bearer jwt-1")
        .match_body(Matcher::PartialJsonString(
            r#"{"email":"helper@example.com","role":"admin"}"#.into(),
        ))
        .with_status(200)
        .with_body(r#"{"user":{"id":"u-9","email":"helper@example.com"}}"#)
        .create_async()
        .await;

    let client = AuthClient::new(server.url(), "anon").with_access_token("jwt-1");
    let user = client
        .create_sub_admin(Role::SuperAdmin, "helper@example.com", "pw", Role::Admin)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(user.id, "u-9");
}

#[tokio::test]
async fn test_create_sub_admin_needs_session() {
    let client = AuthClient::new("http://127.0.0.1:9", "anon");
    let err = client
        .create_sub_admin(Role::SuperAdmin, "a@b.c", "pw", Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotSignedIn));
}

#[tokio::test]
async fn test_sign_out_without_session() {
    let client = AuthClient::new("http://127.0.0.1:9", "anon");
    assert!(matches!(
        client.sign_out().await.unwrap_err(),
        AuthError::NotSignedIn
    ));
}
