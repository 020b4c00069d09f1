use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use rested::schema::{integer, object, string};
use rested::{ApiError, Config, Endpoint, Json, Request, Response, Router, Schemas};
use serde_json::{Value, json};

fn request(method: &str, uri: &str, body: Option<Value>) -> http::Request<Bytes> {
    let builder = http::Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Bytes::from(body.to_string()))
            .unwrap(),
        None => builder.body(Bytes::new()).unwrap(),
    }
}

async fn send(app: &Router, req: http::Request<Bytes>) -> (u16, http::HeaderMap, Bytes) {
    let res: http::Response<Full<Bytes>> = app.handle(req).await;
    let status = res.status().as_u16();
    let headers = res.headers().clone();
    let body = res.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

fn json_of(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

type Logged = Arc<Mutex<Vec<u16>>>;

fn app() -> (Router, Logged) {
    let logged: Logged = Arc::default();
    let sink = Arc::clone(&logged);
    let config = Config::new().log_error(move |err| sink.lock().unwrap().push(err.status_code()));

    let things = Endpoint::builder()
        .get(|_req: Request, _res: Response| async { Ok::<_, ApiError>(json!({ "message": "success" })) })
        .post(
            Schemas::new()
                .body(object().key("foo", string().max(200).required()))
                .query(object().key("page", integer().default(1)))
                .wrap(|req: Request, _res: Response| async move {
                    Ok::<_, ApiError>(json!({ "body": req.body(), "query": req.query() }))
                }),
        )
        .delete(|_req: Request, _res: Response| async {
            Err::<(), _>(std::io::Error::other("Foo"))
        })
        .config(config)
        .build()
        .unwrap();

    let nothing = Endpoint::builder()
        .get(|_req: Request, _res: Response| async { Ok::<_, ApiError>(Json(None::<Value>)) })
        .put(|_req: Request, res: Response| async move {
            res.json(&json!({ "foo": "bar" }))?;
            Ok::<_, ApiError>(json!({ "foo": "bar" }))
        })
        .build()
        .unwrap();

    let router = Router::new()
        .route("/things", things)
        .unwrap()
        .route("/nothing", nothing)
        .unwrap();
    (router, logged)
}

#[tokio::test]
async fn test_should_answer_get_with_handler_value() {
    let (app, _) = app();
    let (status, headers, body) = send(&app, request("GET", "/things", None)).await;

    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "application/json; charset=utf-8");
    assert_eq!(json_of(&body), json!({ "message": "success" }));
}

#[tokio::test]
async fn test_should_send_null_body() {
    let (app, _) = app();
    let (status, headers, body) = send(&app, request("GET", "/nothing", None)).await;

    assert_eq!(status, 200);
    assert_eq!(body.as_ref(), b"null");
    assert_eq!(headers["content-length"], "4");
}

#[tokio::test]
async fn test_should_reject_unsupported_method() {
    let (app, logged) = app();
    let (status, headers, body) = send(&app, request("PATCH", "/things", None)).await;

    assert_eq!(status, 405);
    assert_eq!(headers["allow"], "GET, POST, DELETE");
    assert_eq!(
        json_of(&body),
        json!({
            "statusCode": 405,
            "error": "Method Not Allowed",
            "message": "Method PATCH is not supported for this endpoint",
        })
    );
    assert_eq!(*logged.lock().unwrap(), vec![405]);
}

#[tokio::test]
async fn test_should_hide_unexpected_errors() {
    let (app, logged) = app();
    let (status, _, body) = send(&app, request("DELETE", "/things", None)).await;

    assert_eq!(status, 500);
    assert_eq!(
        json_of(&body),
        json!({
            "statusCode": 500,
            "error": "Internal Server Error",
            "message": "An internal server error occurred",
        })
    );
    assert_eq!(*logged.lock().unwrap(), vec![500]);
}

#[tokio::test]
async fn test_should_reject_invalid_body_before_handler() {
    let (app, _) = app();
    let (status, _, body) = send(&app, request("POST", "/things", Some(json!({ "bar": "foo" })))).await;

    assert_eq!(status, 400);
    assert_eq!(
        json_of(&body),
        json!({
            "statusCode": 400,
            "error": "Bad Request",
            "message": "\"body.foo\" is required",
        })
    );
}

#[tokio::test]
async fn test_should_hand_normalized_values_to_handler() {
    let (app, _) = app();
    let (status, _, body) =
        send(&app, request("POST", "/things?page=3", Some(json!({ "foo": "bar" })))).await;

    assert_eq!(status, 200);
    assert_eq!(json_of(&body), json!({ "body": { "foo": "bar" }, "query": { "page": 3 } }));
}

#[tokio::test]
async fn test_should_keep_first_response_when_handler_sends_and_returns() {
    let (app, _) = app();
    let (status, _, body) = send(&app, request("PUT", "/nothing", None)).await;

    assert_eq!(status, 200);
    assert_eq!(json_of(&body), json!({ "foo": "bar" }));
}

#[tokio::test]
async fn test_should_answer_unknown_path_with_404() {
    let (app, logged) = app();
    let (status, _, body) = send(&app, request("GET", "/missing", None)).await;

    assert_eq!(status, 404);
    assert_eq!(json_of(&body), json!({ "statusCode": 404, "error": "Not Found" }));
    assert!(logged.lock().unwrap().is_empty());
}
