use std::time::Duration;

use chrono::{TimeZone, Utc};
use parsekit_core::{ParseTypes, Value};
use parsekit_rest::{ErrorDomain, ParseClient, ParseError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ParseClient {
    ParseClient::builder()
        .application_id("app-id")
        .api_key("rest-key")
        .base_url(format!("{}/1/", server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn save_creates_new_object_with_tagged_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .and(header("X-Parse-Application-Id", "app-id"))
        .and(header("X-Parse-REST-API-Key", "rest-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "score": 1337,
            "playerName": "Sean Plott",
            "playedAt": {"__type": "Date", "iso": "2013-01-02T03:04:05.000Z"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "createdAt": "2013-01-02T03:04:06.789Z",
            "objectId": "Ed1nuqPvcm"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    object.set("score", 1337);
    object.set("playerName", "Sean Plott");
    object.set(
        "playedAt",
        Utc.with_ymd_and_hms(2013, 1, 2, 3, 4, 5).unwrap(),
    );

    object.save().await.unwrap();

    assert_eq!(object.object_id().as_deref(), Some("Ed1nuqPvcm"));
    assert_eq!(
        object.created_at(),
        Some(Utc.with_ymd_and_hms(2013, 1, 2, 3, 4, 6).unwrap() + chrono::Duration::milliseconds(789))
    );
    assert_eq!(object.get("score"), Some(Value::Integer(1337)));
    assert!(!object.busy());
}

#[tokio::test]
async fn second_save_sends_only_changed_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "createdAt": "2013-01-02T03:04:06.789Z",
            "objectId": "abc"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/1/classes/GameScore/abc"))
        .and(body_json(json!({"score": 2000, "cheat": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updatedAt": "2013-01-03T00:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    object.set("score", 1337);
    object.set("playerName", "Sean Plott");
    object.save().await.unwrap();

    object.set("score", 2000);
    object.set("cheat", true);
    object.save().await.unwrap();

    assert_eq!(object.object_id().as_deref(), Some("abc"));
    assert_eq!(
        object.updated_at(),
        Some(Utc.with_ymd_and_hms(2013, 1, 3, 0, 0, 0).unwrap())
    );
    assert_eq!(object.get("score"), Some(Value::Integer(2000)));
}

#[tokio::test]
async fn erase_deletes_and_drops_object_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "createdAt": "2013-01-02T03:04:06.789Z",
            "objectId": "abc"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/1/classes/GameScore/abc"))
        .and(header("X-Parse-REST-API-Key", "rest-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    object.set("score", 1);
    object.save().await.unwrap();
    object.erase().await.unwrap();

    assert_eq!(object.object_id(), None);
    assert_eq!(object.created_at(), None);
    assert_eq!(object.get("score"), Some(Value::Integer(1)));
}

#[tokio::test]
async fn erase_without_id_is_rejected_locally() {
    let server = MockServer::start().await;
    let object = client(&server).object("GameScore");
    let err = object.erase().await.unwrap_err();
    assert!(matches!(err, ParseError::MissingObjectId));
    assert_eq!(err.domain(), ErrorDomain::Client);
}

#[tokio::test]
async fn api_errors_carry_status_and_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 111,
            "error": "invalid type for key score"
        })))
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    object.set("score", "high");
    let err = object.save().await.unwrap_err();

    assert!(matches!(
        err,
        ParseError::Api { status: 400, code: 111, ref message } if message == "invalid type for key score"
    ));
    assert_eq!(err.domain(), ErrorDomain::Parse);
    assert_eq!(err.code(), Some(111));
    assert_eq!(object.object_id(), None);
    assert!(!object.busy());
}

#[tokio::test]
async fn unexpected_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objectId": "abc"})))
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    let err = object.save().await.unwrap_err();
    assert!(matches!(err, ParseError::Api { status: 200, .. }));
    assert_eq!(object.object_id(), None);
}

#[tokio::test]
async fn custom_values_need_a_hook_before_anything_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"objectId": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let object = client(&server).object("Comment");
    object.set("post", ParseTypes::pointer("Post", "p1"));
    let err = object.save().await.unwrap_err();
    assert!(matches!(err, ParseError::Tag(_)));
}

#[tokio::test]
async fn pointers_are_tagged_with_parse_types_hook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/Comment"))
        .and(body_json(json!({
            "post": {"__type": "Pointer", "className": "Post", "objectId": "p1"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "createdAt": "2013-01-02T03:04:06.789Z",
            "objectId": "c1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ParseClient::builder()
        .application_id("app-id")
        .api_key("rest-key")
        .base_url(format!("{}/1/", server.uri()))
        .tag_hook(ParseTypes)
        .build()
        .unwrap();
    let object = client.object("Comment");
    object.set("post", ParseTypes::pointer("Post", "p1"));
    object.save().await.unwrap();

    assert_eq!(object.get("post"), Some(ParseTypes::pointer("Post", "p1")));
}

#[tokio::test]
async fn concurrent_save_is_rejected_while_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"objectId": "abc", "createdAt": "2013-01-02T03:04:06.789Z"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    object.set("score", 1);

    let (first, second) = tokio::join!(object.save(), object.save());
    first.unwrap();
    assert!(matches!(second, Err(ParseError::Busy("object"))));
    assert!(!object.busy());
}

#[tokio::test]
async fn edits_made_during_save_are_kept_and_sent_next_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .and(body_json(json!({"score": 1})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"objectId": "abc", "createdAt": "2013-01-02T03:04:06.789Z"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/1/classes/GameScore/abc"))
        .and(body_json(json!({"score": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updatedAt": "2013-01-03T00:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let object = client(&server).object("GameScore");
    object.set("score", 1);

    let (saved, ()) = tokio::join!(object.save(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        object.set("score", 2);
    });
    saved.unwrap();

    assert_eq!(object.object_id().as_deref(), Some("abc"));
    assert_eq!(object.get("score"), Some(Value::Integer(2)));

    object.save().await.unwrap();
    assert_eq!(object.get("score"), Some(Value::Integer(2)));
}
