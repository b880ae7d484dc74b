//! In-memory mock of the document service API
//!
//! Serves the documented contract with the real deployment's quirks kept
//! intact: most routes wrap payloads in `{"message", "data"}` while login,
//! refresh and the AI routes answer at the JSON root, registration answers
//! 201, document creation answers 200. Backs the `mock-api` binary and the
//! integration tests; every request is logged so tests can assert which
//! calls were (or were not) made.

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the mock's state
#[derive(Clone, Default)]
pub struct MockApi(Arc<Mutex<MockState>>);

#[derive(Default)]
struct MockState {
    users: HashMap<String, UserRecord>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    documents: BTreeMap<u64, DocRecord>,
    comments: BTreeMap<u64, CommentRecord>,
    next_id: u64,
    requests: Vec<(String, String)>,
}

#[derive(Clone)]
struct UserRecord {
    id: u64,
    username: String,
    email: String,
    fullname: String,
    phone: String,
    avatar_url: Option<String>,
}

#[derive(Clone)]
struct DocRecord {
    id: u64,
    owner: String,
    title: String,
    content: String,
    tags: Vec<String>,
    is_public: bool,
    like_count: u64,
}

#[derive(Clone)]
struct CommentRecord {
    id: u64,
    doc_id: u64,
    author: String,
    content: String,
    replies: Vec<Value>,
}

impl UserRecord {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "fullname": self.fullname,
            "phone": self.phone,
            "avatarUrl": self.avatar_url,
        })
    }
}

impl DocRecord {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "content": self.content,
            "tags": self.tags,
            "isPublic": self.is_public,
            "likeCount": self.like_count,
            "owner": self.owner,
        })
    }
}

impl CommentRecord {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "documentId": self.doc_id,
            "author": self.author,
            "content": self.content,
            "replies": self.replies,
        })
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request seen so far, as (method, path) pairs
    pub fn requests(&self) -> Vec<(String, String)> {
        self.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn issue_tokens(&mut self, username: &str) -> (String, String) {
        let access = mock_token("acc");
        let refresh = mock_token("ref");
        self.access_tokens.insert(access.clone(), username.to_string());
        self.refresh_tokens.insert(refresh.clone(), username.to_string());
        (access, refresh)
    }

    /// Username behind the bearer token, if the header is valid
    fn authed(&self, headers: &HeaderMap) -> Option<String> {
        let header = headers.get("authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        self.access_tokens.get(token).cloned()
    }
}

fn mock_token(prefix: &str) -> String {
    let tag: u64 = rand::thread_rng().gen();
    format!("{prefix}_{tag:016x}")
}

/// Build the mock's router, mounted under `/api` like the real service
pub fn router(api: MockApi) -> Router {
    let routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/users/me", get(profile).put(update_profile))
        .route("/users/me/avatar", post(upload_avatar))
        .route("/documents", post(create_document).get(list_documents))
        .route(
            "/documents/{id}",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route("/documents/{id}/like", post(like_document).delete(unlike_document))
        .route(
            "/documents/{id}/comments",
            post(add_comment).get(list_comments),
        )
        .route("/documents/{id}/refine", post(refine_document))
        .route("/comments/{id}/replies", post(add_reply))
        .route("/view-doc", get(view_doc))
        .route("/view-all-docs", get(view_all_docs))
        .route("/ai/chat", post(ai_chat))
        .route("/ai/tags", post(ai_tags))
        .route("/ai/generate", post(ai_generate))
        .with_state(api.clone());

    Router::new()
        .nest("/api", routes)
        .layer(middleware::from_fn_with_state(api, record_request))
}

async fn record_request(State(api): State<MockApi>, request: Request, next: Next) -> Response {
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "mock api request");
    api.lock().requests.push((
        request.method().to_string(),
        request.uri().path().to_string(),
    ));
    next.run(request).await
}

type Reply = (StatusCode, Json<Value>);

/// The service's usual response wrapper
fn wrap(data: Value) -> Json<Value> {
    Json(json!({"message": "success", "data": data}))
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"error": message})))
}

fn unauthorized() -> Reply {
    error(StatusCode::UNAUTHORIZED, "Unauthorized")
}

fn field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name).and_then(Value::as_str)
}

// === Auth ===

async fn register(State(api): State<MockApi>, Json(body): Json<Value>) -> Reply {
    let mut state = api.lock();
    let Some(username) = field(&body, "username").map(str::to_string) else {
        return error(StatusCode::BAD_REQUEST, "username is required");
    };
    if state.users.contains_key(&username) {
        return error(StatusCode::CONFLICT, "Username already exists");
    }
    let id = state.next_id();
    let user = UserRecord {
        id,
        username: username.clone(),
        email: field(&body, "email").unwrap_or_default().to_string(),
        fullname: field(&body, "fullname").unwrap_or_default().to_string(),
        phone: field(&body, "phone").unwrap_or_default().to_string(),
        avatar_url: None,
    };
    state.users.insert(username, user);
    (
        StatusCode::CREATED,
        Json(json!({"message": "Account created"})),
    )
}

async fn login(State(api): State<MockApi>, Json(body): Json<Value>) -> Reply {
    let mut state = api.lock();
    let Some(username) = field(&body, "username") else {
        return error(StatusCode::BAD_REQUEST, "username is required");
    };
    if !state.users.contains_key(username) {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let username = username.to_string();
    let (access, refresh) = state.issue_tokens(&username);
    // Tokens at the root, not under the data wrapper
    (
        StatusCode::OK,
        Json(json!({"accessToken": access, "refreshToken": refresh})),
    )
}

async fn refresh(State(api): State<MockApi>, Json(body): Json<Value>) -> Reply {
    let mut state = api.lock();
    let Some(username) = field(&body, "refreshToken")
        .and_then(|token| state.refresh_tokens.get(token).cloned())
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    };
    let access = mock_token("acc");
    state.access_tokens.insert(access.clone(), username);
    (StatusCode::OK, Json(json!({"accessToken": access})))
}

async fn logout(State(api): State<MockApi>, Json(body): Json<Value>) -> Reply {
    let mut state = api.lock();
    let Some(token) = field(&body, "refreshToken") else {
        return error(StatusCode::BAD_REQUEST, "refreshToken is required");
    };
    if state.refresh_tokens.remove(token).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }
    (StatusCode::OK, Json(json!({"message": "Logged out"})))
}

// === Users ===

async fn profile(State(api): State<MockApi>, headers: HeaderMap) -> Reply {
    let state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    match state.users.get(&username) {
        Some(user) => (StatusCode::OK, wrap(user.to_json())),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_profile(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    let Some(user) = state.users.get_mut(&username) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    if let Some(fullname) = field(&body, "fullname") {
        user.fullname = fullname.to_string();
    }
    if let Some(phone) = field(&body, "phone") {
        user.phone = phone.to_string();
    }
    let json = user.to_json();
    (StatusCode::OK, wrap(json))
}

async fn upload_avatar(
    State(api): State<MockApi>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Reply {
    let username = {
        let state = api.lock();
        match state.authed(&headers) {
            Some(username) => username,
            None => return unauthorized(),
        }
    };

    let mut received = 0usize;
    while let Ok(Some(part)) = multipart.next_field().await {
        match part.bytes().await {
            Ok(bytes) => received += bytes.len(),
            Err(_) => return error(StatusCode::BAD_REQUEST, "Malformed multipart body"),
        }
    }
    if received == 0 {
        return error(StatusCode::BAD_REQUEST, "No file supplied");
    }

    let mut state = api.lock();
    let url = format!("/uploads/avatars/{username}.png");
    if let Some(user) = state.users.get_mut(&username) {
        user.avatar_url = Some(url.clone());
    }
    (StatusCode::OK, wrap(json!({"avatarUrl": url})))
}

// === Documents ===

async fn create_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    let id = state.next_id();
    let doc = DocRecord {
        id,
        owner: username,
        title: field(&body, "title").unwrap_or("Untitled").to_string(),
        content: field(&body, "content").unwrap_or_default().to_string(),
        tags: body
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        is_public: body.get("isPublic").and_then(Value::as_bool).unwrap_or(false),
        like_count: 0,
    };
    let json = doc.to_json();
    state.documents.insert(id, doc);
    // The real service answers 200 here, not 201
    (StatusCode::OK, wrap(json))
}

async fn list_documents(State(api): State<MockApi>, headers: HeaderMap) -> Reply {
    let state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    let docs: Vec<Value> = state
        .documents
        .values()
        .filter(|doc| doc.owner == username)
        .map(DocRecord::to_json)
        .collect();
    (StatusCode::OK, wrap(Value::Array(docs)))
}

async fn get_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Reply {
    let state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    match state.documents.get(&id) {
        Some(doc) if doc.owner == username || doc.is_public => {
            (StatusCode::OK, wrap(doc.to_json()))
        }
        Some(_) => error(StatusCode::FORBIDDEN, "Not your document"),
        None => error(StatusCode::NOT_FOUND, "Document not found"),
    }
}

async fn update_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    let Some(doc) = state.documents.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    if doc.owner != username {
        return error(StatusCode::FORBIDDEN, "Not your document");
    }
    if let Some(title) = field(&body, "title") {
        doc.title = title.to_string();
    }
    if let Some(content) = field(&body, "content") {
        doc.content = content.to_string();
    }
    if let Some(is_public) = body.get("isPublic").and_then(Value::as_bool) {
        doc.is_public = is_public;
    }
    let json = doc.to_json();
    (StatusCode::OK, wrap(json))
}

async fn delete_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Reply {
    let mut state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    match state.documents.get(&id).map(|doc| doc.owner == username) {
        None => error(StatusCode::NOT_FOUND, "Document not found"),
        Some(false) => error(StatusCode::FORBIDDEN, "Not your document"),
        Some(true) => {
            state.documents.remove(&id);
            state.comments.retain(|_, comment| comment.doc_id != id);
            (StatusCode::OK, wrap(Value::Null))
        }
    }
}

async fn like_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Reply {
    adjust_likes(&api, &headers, id, 1)
}

async fn unlike_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Reply {
    adjust_likes(&api, &headers, id, -1)
}

fn adjust_likes(api: &MockApi, headers: &HeaderMap, id: u64, delta: i64) -> Reply {
    let mut state = api.lock();
    if state.authed(headers).is_none() {
        return unauthorized();
    }
    let Some(doc) = state.documents.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    doc.like_count = doc.like_count.saturating_add_signed(delta);
    (StatusCode::OK, wrap(json!({"likeCount": doc.like_count})))
}

async fn refine_document(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    let Some(doc) = state.documents.get(&id) else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    let action = field(&body, "action").unwrap_or("improve");
    let refined = format!("[{action}] {}", doc.content);
    (StatusCode::OK, wrap(json!({"content": refined})))
}

// === Comments ===

async fn add_comment(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(doc_id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    if !state.documents.contains_key(&doc_id) {
        return error(StatusCode::NOT_FOUND, "Document not found");
    }
    let id = state.next_id();
    let comment = CommentRecord {
        id,
        doc_id,
        author: username,
        content: field(&body, "content").unwrap_or_default().to_string(),
        replies: Vec::new(),
    };
    let json = comment.to_json();
    state.comments.insert(id, comment);
    (StatusCode::CREATED, wrap(json))
}

async fn list_comments(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(doc_id): Path<u64>,
) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    if !state.documents.contains_key(&doc_id) {
        return error(StatusCode::NOT_FOUND, "Document not found");
    }
    let comments: Vec<Value> = state
        .comments
        .values()
        .filter(|comment| comment.doc_id == doc_id)
        .map(CommentRecord::to_json)
        .collect();
    (StatusCode::OK, wrap(Value::Array(comments)))
}

async fn add_reply(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(comment_id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = api.lock();
    let Some(username) = state.authed(&headers) else {
        return unauthorized();
    };
    let reply_id = state.next_id();
    let Some(comment) = state.comments.get_mut(&comment_id) else {
        return error(StatusCode::NOT_FOUND, "Comment not found");
    };
    let reply = json!({
        "id": reply_id,
        "author": username,
        "content": field(&body, "content").unwrap_or_default(),
    });
    comment.replies.push(reply.clone());
    (StatusCode::CREATED, wrap(reply))
}

// === Community ===

async fn view_doc(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    let Some(id) = params.get("docid").and_then(|raw| raw.parse::<u64>().ok()) else {
        return error(StatusCode::BAD_REQUEST, "docid is required");
    };
    match state.documents.get(&id) {
        Some(doc) => (StatusCode::OK, wrap(doc.to_json())),
        None => error(StatusCode::NOT_FOUND, "Document not found"),
    }
}

async fn view_all_docs(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    let page = params
        .get("page")
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(1);
    let items: Vec<Value> = state
        .documents
        .values()
        .filter(|doc| doc.is_public)
        .map(DocRecord::to_json)
        .collect();
    (StatusCode::OK, wrap(json!({"items": items, "page": page})))
}

// === AI ===

async fn ai_chat(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    let message = field(&body, "message").unwrap_or_default();
    // AI routes answer at the root
    (
        StatusCode::OK,
        Json(json!({"reply": format!("Mock reply to: {message}")})),
    )
}

async fn ai_tags(State(api): State<MockApi>, headers: HeaderMap, Json(_body): Json<Value>) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({"tags": ["backend", "planning", "notes"]})),
    )
}

async fn ai_generate(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let state = api.lock();
    if state.authed(&headers).is_none() {
        return unauthorized();
    }
    let kind = field(&body, "type").unwrap_or("text");
    (
        StatusCode::OK,
        Json(json!({"content": format!("Mock generated {kind}")})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_check_tokens() {
        let api = MockApi::new();
        let (access, _refresh) = api.lock().issue_tokens("alice");

        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {access}").parse().unwrap());
        assert_eq!(api.lock().authed(&headers), Some("alice".to_string()));

        headers.insert("authorization", "Bearer bogus".parse().unwrap());
        assert_eq!(api.lock().authed(&headers), None);
    }

    #[test]
    fn test_request_log_records_and_clears() {
        let api = MockApi::new();
        api.lock()
            .requests
            .push(("GET".to_string(), "/users/me".to_string()));
        assert_eq!(api.requests().len(), 1);
        api.clear_requests();
        assert!(api.requests().is_empty());
    }
}
