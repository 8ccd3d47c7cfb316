//! In-process fake of the FishOn REST API for tests.
//!
//! Binds to an ephemeral port on 127.0.0.1 and keeps everything in memory.
//! Every request is recorded (method, path, `Authorization` header) so tests
//! can assert on what the gateway actually sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::sync::{Notify, Semaphore};

type Shared = Arc<Mutex<MockState>>;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub(crate) struct MockState {
    users: Vec<Value>,
    tokens: HashMap<String, String>,
    posts: Vec<Value>,
    next_id: u64,
    next_token: u64,
    reject_logins: bool,
    requests: Vec<RecordedRequest>,
    holds: HashMap<String, Arc<Hold>>,
}

/// Parks every request to one path until released, so tests can act while a
/// call is in flight.
pub(crate) struct Hold {
    arrived: Notify,
    released: Semaphore,
}

impl Hold {
    /// Wait until a request has reached the server and is parked.
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    /// Let parked and future requests through.
    pub fn release(&self) {
        self.released.close();
    }

    async fn park(&self) {
        self.arrived.notify_one();
        // Closing the semaphore wakes every waiter with an error.
        let _ = self.released.acquire().await;
    }
}

impl MockState {
    fn find_user(&self, id: &str) -> Option<&Value> {
        self.users
            .iter()
            .find(|u| u["userName"] == id || u["email"] == id)
    }

    fn issue_token(&mut self, user_name: &str) -> String {
        self.next_token += 1;
        let token = format!("token-{}-{}", user_name, self.next_token);
        self.tokens.insert(token.clone(), user_name.to_string());
        token
    }

    fn authenticated(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .cloned()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Handle to a running fake API.
pub(crate) struct MockApi {
    pub origin: String,
    state: Shared,
}

impl MockApi {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::default();

        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/users/profile", put(update_profile))
            .route("/api/users/{user_name}", get(user_profile))
            .route("/api/posts", get(feed).post(create_post))
            .route("/api/posts/user/{user_name}", get(user_posts))
            .route("/api/posts/{id}", put(update_post).delete(delete_post))
            .route("/api/posts/{id}/comments", post(create_comment))
            .route("/api/comments/{id}", put(update_comment).delete(delete_comment))
            .route("/api/broken", get(broken))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().expect("mock api address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            origin: format!("http://{}", addr),
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    pub fn seed_user(&self, user_name: &str, email: &str, password: &str) {
        self.lock().users.push(json!({
            "userName": user_name,
            "email": email,
            "password": password,
            "createdAt": "2024-05-01T10:00:00"
        }));
    }

    pub fn user_exists(&self, user_name: &str) -> bool {
        self.lock().find_user(user_name).is_some()
    }

    pub fn issue_token(&self, user_name: &str) -> String {
        self.lock().issue_token(user_name)
    }

    pub fn token_owner(&self, token: &str) -> Option<String> {
        self.lock().tokens.get(token).cloned()
    }

    /// Invalidate every issued token, as if they all expired.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    pub fn reject_logins(&self, reject: bool) {
        self.lock().reject_logins = reject;
    }

    /// Park requests to `path` (full path, e.g. `/api/auth/me`) until the
    /// returned hold is released.
    pub fn hold(&self, path: &str) -> Arc<Hold> {
        let hold = Arc::new(Hold {
            arrived: Notify::new(),
            released: Semaphore::new(0),
        });
        self.lock()
            .holds
            .insert(path.to_string(), Arc::clone(&hold));
        hold
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// `Authorization` header of the most recent request, `None` if there
    /// was no request at all.
    pub fn last_authorization(&self) -> Option<Option<String>> {
        self.lock()
            .requests
            .last()
            .map(|r| r.authorization.clone())
    }
}

/// An origin nothing is listening on.
pub(crate) fn unreachable_origin() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let port = listener.local_addr().expect("probe address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "Invalid or expired token")
}

fn public(user: &Value) -> Value {
    let mut user = user.clone();
    if let Some(fields) = user.as_object_mut() {
        fields.remove("password");
    }
    user
}

fn merge(target: &mut Value, changes: &Value, protected: &[&str]) {
    if let (Some(target), Some(changes)) = (target.as_object_mut(), changes.as_object()) {
        for (key, value) in changes {
            if !protected.contains(&key.as_str()) {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

async fn record_request(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let path = req.uri().path().to_string();
    let hold = {
        let mut st = lock(&state);
        st.requests.push(RecordedRequest {
            method: req.method().to_string(),
            path: path.clone(),
            authorization,
        });
        st.holds.get(&path).cloned()
    };
    if let Some(hold) = hold {
        hold.park().await;
    }
    next.run(req).await
}

// ============================================================================
// Auth
// ============================================================================

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut st = lock(&state);
    let user_name = body["userName"].as_str().unwrap_or_default().to_string();
    if user_name.is_empty() {
        return error(StatusCode::BAD_REQUEST, "userName is required");
    }
    if st.find_user(&user_name).is_some() {
        return error(StatusCode::CONFLICT, "Username already taken");
    }

    let mut user = body;
    user["createdAt"] = json!("2024-05-01T10:00:00");
    st.users.push(user.clone());
    (StatusCode::CREATED, Json(public(&user))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut st = lock(&state);
    if st.reject_logins {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Login temporarily disabled");
    }

    let id = body["email"].as_str().unwrap_or_default();
    let user = match st.find_user(id) {
        Some(user) if user["password"] == body["password"] => public(user),
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    };

    let user_name = user["userName"].as_str().unwrap_or_default().to_string();
    let token = st.issue_token(&user_name);
    let mut response = user;
    response["token"] = json!(token);
    Json(response).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    match st.find_user(&user_name) {
        Some(user) => Json(public(user)).into_response(),
        None => unauthorized(),
    }
}

// ============================================================================
// Users
// ============================================================================

async fn user_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_name): Path<String>,
) -> Response {
    let st = lock(&state);
    if st.authenticated(&headers).is_none() {
        return unauthorized();
    }
    match st.find_user(&user_name) {
        Some(user) => Json(public(user)).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(changes): Json<Value>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    match st.users.iter_mut().find(|u| u["userName"] == user_name.as_str()) {
        Some(user) => {
            merge(user, &changes, &["userName", "password", "createdAt"]);
            Json(public(user)).into_response()
        }
        None => unauthorized(),
    }
}

// ============================================================================
// Posts
// ============================================================================

async fn feed(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let st = lock(&state);
    if st.authenticated(&headers).is_none() {
        return unauthorized();
    }
    let posts: Vec<Value> = st.posts.iter().rev().cloned().collect();
    Json(Value::Array(posts)).into_response()
}

async fn user_posts(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_name): Path<String>,
) -> Response {
    let st = lock(&state);
    if st.authenticated(&headers).is_none() {
        return unauthorized();
    }
    let posts: Vec<Value> = st
        .posts
        .iter()
        .rev()
        .filter(|p| p["userName"] == user_name.as_str())
        .cloned()
        .collect();
    Json(Value::Array(posts)).into_response()
}

async fn create_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    let mut post = Value::Object(Map::new());
    merge(&mut post, &body, &["id", "userName", "comments"]);
    post["id"] = json!(st.next_id());
    post["userName"] = json!(user_name);
    post["createdAt"] = json!("2024-05-02T08:00:00");
    post["comments"] = json!([]);
    st.posts.push(post.clone());
    (StatusCode::CREATED, Json(post)).into_response()
}

async fn update_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    let Some(post) = st.posts.iter_mut().find(|p| p["id"] == id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    if post["userName"] != user_name.as_str() {
        return error(StatusCode::FORBIDDEN, "Not your post");
    }
    merge(post, &body, &["id", "userName", "comments", "createdAt"]);
    Json(post.clone()).into_response()
}

async fn delete_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    let Some(index) = st.posts.iter().position(|p| p["id"] == id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    if st.posts[index]["userName"] != user_name.as_str() {
        return error(StatusCode::FORBIDDEN, "Not your post");
    }
    st.posts.remove(index);
    StatusCode::NO_CONTENT.into_response()
}

// ============================================================================
// Comments
// ============================================================================

async fn create_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(post_id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    let id = st.next_id();
    let Some(post) = st.posts.iter_mut().find(|p| p["id"] == post_id) else {
        return error(StatusCode::NOT_FOUND, "Post not found");
    };
    let comment = json!({
        "id": id,
        "userName": user_name,
        "content": body["content"],
        "createdAt": "2024-05-02T09:00:00"
    });
    if let Some(comments) = post["comments"].as_array_mut() {
        comments.push(comment.clone());
    }
    (StatusCode::CREATED, Json(comment)).into_response()
}

fn find_comment<'a>(posts: &'a mut [Value], id: u64) -> Option<(&'a mut Vec<Value>, usize)> {
    posts.iter_mut().find_map(|post| {
        let comments = post["comments"].as_array_mut()?;
        let index = comments.iter().position(|c| c["id"] == id)?;
        Some((comments, index))
    })
}

async fn update_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    let Some((comments, index)) = find_comment(&mut st.posts, id) else {
        return error(StatusCode::NOT_FOUND, "Comment not found");
    };
    let comment = &mut comments[index];
    if comment["userName"] != user_name.as_str() {
        return error(StatusCode::FORBIDDEN, "Not your comment");
    }
    comment["content"] = body["content"].clone();
    Json(comment.clone()).into_response()
}

async fn delete_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let mut st = lock(&state);
    let Some(user_name) = st.authenticated(&headers) else {
        return unauthorized();
    };
    let Some((comments, index)) = find_comment(&mut st.posts, id) else {
        return error(StatusCode::NOT_FOUND, "Comment not found");
    };
    if comments[index]["userName"] != user_name.as_str() {
        return error(StatusCode::FORBIDDEN, "Not your comment");
    }
    comments.remove(index);
    Json(json!({ "message": "Comment deleted" })).into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}
