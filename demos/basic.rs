//! Minimal rested example: a validated users resource.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users?page=2
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice","age":"30"}'
//!   curl -X POST http://localhost:3000/users -d '{}' -H 'content-type: application/json'   # 400
//!   curl -X PUT http://localhost:3000/users                                                # 405
//!   curl -X DELETE http://localhost:3000/users/0                                           # 500, logged

use rested::schema::{integer, object, string};
use rested::{ApiError, Endpoint, Json, Request, Response, Router, Schemas, Server, Status};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct User {
    id: u64,
    name: String,
    age: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), rested::Error> {
    tracing_subscriber::fmt::init();

    let list = Schemas::new().query(
        object()
            .key("page", integer().min(1).default(1))
            .key("per_page", integer().min(1).max(100).default(20)),
    );
    let create = Schemas::new().body(
        object()
            .key("name", string().min(1).max(200).required())
            .key("age", integer().min(0)),
    );

    let users = Endpoint::builder()
        .get(list.wrap(list_users))
        .post(create.wrap(create_user))
        .build()?;
    let user = Endpoint::builder()
        .get(get_user)
        .delete(delete_user)
        .build()?;

    let app = Router::new()
        .route("/users", users)?
        .route("/users/{id}", user)?;

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// GET /users: query is already normalized, so `page` is a number.
async fn list_users(req: Request, _res: Response) -> Result<Value, ApiError> {
    Ok(json!({
        "page": req.query()["page"],
        "per_page": req.query()["per_page"],
        "users": [{ "id": 42, "name": "alice" }],
    }))
}

// GET /users/{id}: `null` when the user does not exist.
async fn get_user(req: Request, _res: Response) -> Result<Json<Option<User>>, ApiError> {
    let id: u64 = req
        .param("id")
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::bad_request("id must be a number"))?;

    Ok(Json((id == 42).then(|| User { id, name: "alice".to_owned(), age: None })))
}

// POST /users → 201 with a location header.
async fn create_user(req: Request, res: Response) -> Result<Json<User>, ApiError> {
    let name = req.body()["name"].as_str().unwrap_or_default().to_owned();
    let age = req.body()["age"].as_u64();

    res.status(Status::Created).set_header("location", "/users/99");
    Ok(Json(User { id: 99, name, age }))
}

// DELETE /users/{id}: the I/O error becomes a 500 whose cause is only logged.
async fn delete_user(req: Request, res: Response) -> Result<(), ApiError> {
    if req.param("id") == Some("0") {
        return Err(std::io::Error::other("user store unreachable").into());
    }
    res.status(Status::NoContent);
    Ok(())
}
