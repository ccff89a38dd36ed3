//! Minimal switchyard example: a user store mounted under `/api`, plus health checks.
//!
//! Run with:
//!   RUST_LOG=info HTTP_PORT=3000 cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/users/1
//!   curl -X POST http://localhost:3000/api/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/api/users/1
//!   curl 'http://localhost:3000/api/users?limit=5'
//!   curl http://localhost:3000/healthz

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchyard::adapter::{HyperServer, RouteTable, shutdown_signal};
use switchyard::health::Health;
use switchyard::{
    BoxContext, CancellationToken, Config, Context, ContextExt, Error, Handler, Router, RouterExt,
    Server, Status,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Deserialize, Serialize)]
struct User {
    #[serde(default)]
    id: u64,
    name: String,
}

#[derive(Default)]
struct Store {
    users: Mutex<BTreeMap<u64, User>>,
}

impl Store {
    fn with<R>(&self, f: impl FnOnce(&mut BTreeMap<u64, User>) -> R) -> R {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut users)
    }
}

/// Owns every `/users` route.
struct Users {
    store: Arc<Store>,
}

impl Handler for Users {
    fn register_routes(&self, router: &mut dyn Router) {
        let mut users = router.group("/users");

        let store = Arc::clone(&self.store);
        users.get("", move |ctx: BoxContext| list(Arc::clone(&store), ctx));
        let store = Arc::clone(&self.store);
        users.get("/{id}", move |ctx: BoxContext| show(Arc::clone(&store), ctx));
        let store = Arc::clone(&self.store);
        users.post("", move |ctx: BoxContext| create(Arc::clone(&store), ctx));
        let store = Arc::clone(&self.store);
        users.delete("/{id}", move |ctx: BoxContext| remove(Arc::clone(&store), ctx));
    }
}

fn user_id(ctx: &BoxContext) -> Result<u64, Error> {
    ctx.param("id")
        .parse()
        .map_err(|_| Error::with_status(Status::BadRequest, "user id must be numeric"))
}

// GET /api/users?limit=N
async fn list(store: Arc<Store>, mut ctx: BoxContext) -> Result<(), Error> {
    let limit: usize = ctx.query_or("limit", "100").parse().unwrap_or(100);
    let users: Vec<User> = store.with(|u| u.values().take(limit).cloned().collect());
    ctx.json(Status::Ok, &users)
}

// GET /api/users/{id}
async fn show(store: Arc<Store>, mut ctx: BoxContext) -> Result<(), Error> {
    let id = user_id(&ctx)?;
    match store.with(|u| u.get(&id).cloned()) {
        Some(user) => ctx.json(Status::Ok, &user),
        None => Err(Error::with_status(Status::NotFound, format!("no user {id}"))),
    }
}

// POST /api/users
async fn create(store: Arc<Store>, mut ctx: BoxContext) -> Result<(), Error> {
    let mut user: User = ctx.bind()?;
    store.with(|u| {
        user.id = u.keys().next_back().map_or(1, |last| last + 1);
        u.insert(user.id, user.clone());
    });
    ctx.set_header("location", &format!("/api/users/{}", user.id))?;
    ctx.json(Status::Created, &user)
}

// DELETE /api/users/{id} → 204 No Content
async fn remove(store: Arc<Store>, mut ctx: BoxContext) -> Result<(), Error> {
    let id = user_id(&ctx)?;
    store.with(|u| u.remove(&id));
    ctx.status(Status::NoContent);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let handlers: Vec<Box<dyn Handler>> = vec![
        Box::new(Health),
        Box::new(ApiMount(Users { store: Arc::default() })),
    ];
    let mut routes = RouteTable::new();
    for handler in &handlers {
        handler.register_routes(&mut routes);
    }

    let server = HyperServer::new(Config::from_env()?, routes);
    server.start(CancellationToken::new()).await?;
    tracing::info!(addr = %server.addr(), "demo ready");

    shutdown_signal().await;
    server.stop(tokio::time::Instant::now() + Duration::from_secs(25)).await
}

/// Mounts a handler under `/api`.
struct ApiMount<H>(H);

impl<H: Handler> Handler for ApiMount<H> {
    fn register_routes(&self, router: &mut dyn Router) {
        self.0.register_routes(&mut *router.group("/api"));
    }
}
