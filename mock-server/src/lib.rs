use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_ACCOUNT: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "secret";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub account: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct CreatePet {
    pub name: String,
    #[serde(default = "unknown_species")]
    pub species: String,
    pub birthday: Option<String>,
}

fn unknown_species() -> String {
    "unknown".to_string()
}

#[derive(Deserialize)]
pub struct UpdatePet {
    pub name: Option<String>,
    pub species: Option<String>,
    pub birthday: Option<String>,
}

/// Success body wrapper: every 2xx answer with content is `{"data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

fn data<T>(data: T) -> Json<Envelope<T>> {
    Json(Envelope { data })
}

/// Failure answered with the `{"error": {"type", "description"}}` envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    description: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, description: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            description: description.into(),
        }
    }

    fn unauthorized(description: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", description)
    }

    fn pet_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", "pet does not exist")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({"error": {"type": self.kind, "description": self.description}});
        (self.status, Json(body)).into_response()
    }
}

#[derive(Default)]
pub struct Store {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, Uuid>,
    pets: HashMap<Uuid, Pet>,
}

pub type Db = Arc<RwLock<Store>>;

fn seeded_store() -> Store {
    let demo = User {
        id: Uuid::new_v4(),
        email: DEMO_ACCOUNT.to_string(),
        name: "Demo Owner".to_string(),
    };
    let mut store = Store::default();
    store.users.insert(demo.id, demo);
    store
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seeded_store()));
    Router::new()
        .route("/auth/login", post(login))
        .route("/users/profile", get(profile))
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/{pet_id}", get(get_pet).patch(update_pet).delete(delete_pet))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn authorize(db: &Db, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let store = db.read().await;
    store
        .sessions
        .get(token)
        .and_then(|id| store.users.get(id))
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("session expired"))
}

fn parse_pet_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::pet_not_found())
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Envelope<LoginResponse>>, ApiError> {
    let mut store = db.write().await;
    let user_id = store
        .users
        .values()
        .find(|u| u.email == input.account)
        .map(|u| u.id)
        .filter(|_| input.password == DEMO_PASSWORD)
        .ok_or_else(|| ApiError::unauthorized("invalid account or password"))?;
    let token = Uuid::new_v4().simple().to_string();
    store.sessions.insert(token.clone(), user_id);
    tracing::info!(account = %input.account, "login");
    Ok(data(LoginResponse { token }))
}

async fn profile(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Envelope<User>>, ApiError> {
    authorize(&db, &headers).await.map(data)
}

async fn list_pets(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Pet>>>, ApiError> {
    authorize(&db, &headers).await?;
    let store = db.read().await;
    Ok(data(store.pets.values().cloned().collect()))
}

async fn create_pet(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePet>,
) -> Result<(StatusCode, Json<Envelope<Pet>>), ApiError> {
    authorize(&db, &headers).await?;
    if input.name.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "ValidationError",
            "name must not be empty",
        ));
    }
    let pet = Pet {
        id: Uuid::new_v4(),
        name: input.name,
        species: input.species,
        birthday: input.birthday,
    };
    db.write().await.pets.insert(pet.id, pet.clone());
    Ok((StatusCode::CREATED, data(pet)))
}

async fn get_pet(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(pet_id): Path<String>,
) -> Result<Json<Envelope<Pet>>, ApiError> {
    authorize(&db, &headers).await?;
    let id = parse_pet_id(&pet_id)?;
    let store = db.read().await;
    store.pets.get(&id).cloned().map(data).ok_or_else(ApiError::pet_not_found)
}

async fn update_pet(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(pet_id): Path<String>,
    Json(input): Json<UpdatePet>,
) -> Result<Json<Envelope<Pet>>, ApiError> {
    authorize(&db, &headers).await?;
    let id = parse_pet_id(&pet_id)?;
    let mut store = db.write().await;
    let pet = store.pets.get_mut(&id).ok_or_else(ApiError::pet_not_found)?;
    if let Some(name) = input.name {
        pet.name = name;
    }
    if let Some(species) = input.species {
        pet.species = species;
    }
    if let Some(birthday) = input.birthday {
        pet.birthday = Some(birthday);
    }
    Ok(data(pet.clone()))
}

async fn delete_pet(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(pet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&db, &headers).await?;
    let id = parse_pet_id(&pet_id)?;
    let mut store = db.write().await;
    store
        .pets
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(ApiError::pet_not_found)
}
