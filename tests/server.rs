#![cfg(feature = "adapter")]

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use switchyard::adapter::{HyperServer, RouteTable};
use switchyard::health::Health;
use switchyard::{
    BoxContext, CancellationToken, Config, Context, ContextExt, Error, Handler, Router, RouterExt,
    Server, ServerState, ShutdownError, StartError, Status, WriteError,
};
use tokio::time::Instant;

struct TestServer {
    server: HyperServer,
    base_url: String,
}

impl TestServer {
    /// Starts a server on an ephemeral localhost port.
    async fn spawn(mount: impl FnOnce(&mut RouteTable)) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let mut routes = RouteTable::new();
        mount(&mut routes);
        let server = HyperServer::new(Config::new("127.0.0.1", 0), routes);
        server.start(CancellationToken::new()).await.expect("server failed to start");
        let base_url = format!("http://{}", server.addr());
        Self { server, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_for_in_flight(&self, n: usize) {
        for _ in 0..200 {
            if self.server.in_flight() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("in-flight count never reached {n}");
    }
}

#[derive(Debug, Deserialize, PartialEq, Serialize)]
struct Item {
    name: String,
    qty: u32,
}

async fn list_users(mut ctx: BoxContext) -> Result<(), Error> {
    ctx.json(Status::Ok, &json!(["ada", "grace"]))
}

async fn echo(mut ctx: BoxContext) -> Result<(), Error> {
    let reply = json!({
        "id": ctx.param("id"),
        "sort": ctx.query_or("sort", "asc"),
        "agent": ctx.header("x-agent"),
    });
    ctx.set_header("x-echo", "1")?;
    ctx.json(Status::Ok, &reply)
}

async fn create_item(mut ctx: BoxContext) -> Result<(), Error> {
    let item: Item = ctx.bind()?;
    ctx.json(Status::Created, &item)
}

async fn slow(mut ctx: BoxContext) -> Result<(), Error> {
    tokio::time::sleep(Duration::from_millis(300)).await;
    ctx.string(Status::Ok, "done")
}

async fn hang(mut ctx: BoxContext) -> Result<(), Error> {
    let scope = ctx.cancellation().clone();
    scope.cancelled().await;
    ctx.string(Status::ServiceUnavailable, "cancelled")
}

#[tokio::test]
async fn group_routes_are_served_under_prefix() {
    let srv = TestServer::spawn(|routes| {
        routes.group("/api").get("/users", list_users);
        Health.register_routes(routes);
    })
    .await;

    let res = reqwest::get(srv.url("/api/users")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Vec<String>>().await.unwrap(), ["ada", "grace"]);

    let res = reqwest::get(srv.url("/users")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = reqwest::get(srv.url("/healthz")).await.unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn context_exposes_params_query_and_headers() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/things/{id}", echo);
    })
    .await;

    let res = reqwest::Client::new()
        .get(srv.url("/things/9?sort=desc"))
        .header("x-agent", "probe")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-echo"], "1");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": "9", "sort": "desc", "agent": "probe" }));
}

#[tokio::test]
async fn start_returns_before_serving_and_probe_succeeds() {
    let srv = TestServer::spawn(|routes| Health.register_routes(routes)).await;

    // Control is back here; the very next request must still be answered.
    assert_eq!(srv.server.state().await, ServerState::Running);
    let res = reqwest::get(srv.url("/readyz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ready");
}

#[tokio::test]
async fn second_json_write_fails_without_altering_response() {
    let second_rejected = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&second_rejected);
    let srv = TestServer::spawn(move |routes| {
        routes.get("/twice", move |mut ctx: BoxContext| {
            let flag = Arc::clone(&flag);
            async move {
                ctx.json(Status::Accepted, &json!({ "write": 1 }))?;
                let second = ctx.json(Status::Ok, &json!({ "write": 2 }));
                flag.store(matches!(second, Err(Error::Write(WriteError::Committed))), Ordering::SeqCst);
                second
            }
        });
    })
    .await;

    let res = reqwest::get(srv.url("/twice")).await.unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(res.json::<serde_json::Value>().await.unwrap(), json!({ "write": 1 }));
    assert!(second_rejected.load(Ordering::SeqCst));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let srv = TestServer::spawn(|routes| {
        routes.post("/items", create_item);
    })
    .await;
    let client = reqwest::Client::new();

    let res = client.post(srv.url("/items")).json(&json!({ "name": "bolt", "qty": 3 })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.json::<Item>().await.unwrap(), Item { name: "bolt".into(), qty: 3 });

    let res = client
        .post(srv.url("/items"))
        .header("content-type", "application/json")
        .body(r#"{"name":"bolt","qty":"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/items"))
        .header("content-type", "text/csv")
        .body("bolt,3")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn handler_errors_follow_translation_policy() {
    let srv = TestServer::spawn(|routes| {
        routes
            .get("/conflict", |_ctx: BoxContext| async {
                Err::<(), _>(Error::with_status(Status::Conflict, "already exists"))
            })
            .get("/boom", |_ctx: BoxContext| async {
                Err::<(), _>(Error::handler("database unreachable"))
            })
            .delete("/gone", |mut ctx: BoxContext| async move {
                ctx.status(Status::NoContent);
                Ok::<(), Error>(())
            });
    })
    .await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/conflict")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(res.text().await.unwrap(), "already exists");

    let res = client.get(srv.url("/boom")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "Internal Server Error");

    let res = client.delete(srv.url("/gone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn wrong_method_is_405_with_allow() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/items", list_users).post("/items", create_item);
    })
    .await;

    let res = reqwest::Client::new().put(srv.url("/items")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "GET, POST");
}

#[tokio::test]
async fn unrecognized_method_on_known_path_lists_allowed() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/users/{id}", echo).delete("/users/{id}", echo);
    })
    .await;
    let client = reqwest::Client::new();
    let propfind = reqwest::Method::from_bytes(b"PROPFIND").unwrap();

    let res = client.request(propfind.clone(), srv.url("/users/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "DELETE, GET");

    let res = client.request(propfind, srv.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn path_params_are_percent_decoded() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/users/{id}", echo);
    })
    .await;

    let res = reqwest::get(srv.url("/users/john%20doe")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], "john doe");

    let res = reqwest::get(srv.url("/users/%FF%FE")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lifecycle_is_one_directional() {
    let server = HyperServer::new(Config::new("127.0.0.1", 0), RouteTable::new());

    let err = server.stop(Instant::now() + Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, Error::Shutdown(ShutdownError::InvalidState(ServerState::Unstarted))));

    server.start(CancellationToken::new()).await.unwrap();
    let err = server.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Start(StartError::InvalidState(ServerState::Running))));

    server.stop(Instant::now() + Duration::from_secs(5)).await.unwrap();
    assert_eq!(server.state().await, ServerState::Stopped);

    let err = server.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Start(StartError::InvalidState(ServerState::Stopped))));
    let err = server.stop(Instant::now() + Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, Error::Shutdown(ShutdownError::InvalidState(ServerState::Stopped))));
}

#[tokio::test]
async fn start_fails_when_address_is_taken() {
    let first = TestServer::spawn(|_| {}).await;
    let port: u16 = first.server.addr().rsplit(':').next().unwrap().parse().unwrap();

    let second = HyperServer::new(Config::new("127.0.0.1", port), RouteTable::new());
    let err = second.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Start(StartError::Bind { .. })));
    assert_eq!(second.state().await, ServerState::Unstarted);
}

#[tokio::test]
async fn cancelled_start_token_fails_start() {
    let server = HyperServer::new(Config::new("127.0.0.1", 0), RouteTable::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = server.start(cancel).await.unwrap_err();
    assert!(matches!(err, Error::Start(StartError::Cancelled)));
}

#[tokio::test]
async fn stop_with_expired_deadline_times_out_immediately() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/hang", hang);
    })
    .await;

    let url = srv.url("/hang");
    let request = tokio::spawn(async move { reqwest::get(url).await });
    srv.wait_for_in_flight(1).await;

    let started = std::time::Instant::now();
    let err = srv.server.stop(Instant::now()).await.unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(matches!(err, Error::Shutdown(ShutdownError::Timeout { in_flight: 1 })));
    assert!(started.elapsed() < Duration::from_millis(250));

    // The connection was torn down rather than answered.
    let _ = request.await.unwrap();
}

#[tokio::test]
async fn stop_waits_for_in_flight_requests() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/slow", slow);
    })
    .await;

    let url = srv.url("/slow");
    let request = tokio::spawn(async move { reqwest::get(url).await });
    srv.wait_for_in_flight(1).await;

    srv.server.stop(Instant::now() + Duration::from_secs(5)).await.unwrap();
    assert_eq!(srv.server.in_flight(), 0);

    let res = request.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "done");

    // No longer accepting.
    assert!(reqwest::get(srv.url("/slow")).await.is_err());
}

#[tokio::test]
async fn writer_streams_raw_bytes() {
    let srv = TestServer::spawn(|routes| {
        routes.get("/raw", |mut ctx: BoxContext| async move {
            ctx.set_header("content-type", "text/csv")?;
            ctx.status(Status::Created);
            let out = ctx.writer();
            out.write_all(b"a,b\n").map_err(Error::handler)?;
            out.write_all(b"1,2\n").map_err(Error::handler)?;
            Ok::<(), Error>(())
        });
    })
    .await;

    let res = reqwest::get(srv.url("/raw")).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["content-type"], "text/csv");
    assert_eq!(res.text().await.unwrap(), "a,b\n1,2\n");
}
