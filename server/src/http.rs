use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        FromRequestParts, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{self, HeaderName, HeaderValue, Method, StatusCode, request::Parts},
    response::IntoResponse,
    routing::get,
};
use platform_api::{ApiError, ApiResult};
use platform_authn::{authenticate, bearer_token};
use platform_authz::Viewer;
use platform_db::DbPool;
use products_hr::{
    EmployeeTransformer, EmployeeView, InputMode, Page, TrainingEntry, find_employee,
    list_employees, list_training,
};
use sea_orm::{ConnectionTrait, Statement};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Transformer for the `view` query parameter, falling back to the
    /// configured default.
    fn transformer(&self, view: Option<&str>) -> ApiResult<EmployeeTransformer> {
        let variant = match view {
            Some(raw) => raw.parse().map_err(ApiError::InvalidInput)?,
            None => self.config.manager_view,
        };
        Ok(EmployeeTransformer::for_variant(variant))
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/employees", get(list_handler).post(create_handler))
        .route(
            "/employees/{employee_id}",
            get(retrieve_handler).patch(update_handler),
        )
        .route("/training-list", get(training_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// The viewer behind the request's bearer token.
pub struct Authenticated(pub Viewer);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = bearer_token(header).ok_or(ApiError::Unauthorized)?;
        let viewer = authenticate(token, &state.config.auth).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            ApiError::Unauthorized
        })?;
        Ok(Self(viewer))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    view: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    view: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TrainingQuery {
    hired: Option<bool>,
}

fn query<T>(extracted: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    extracted
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))
}

fn employee_path(extracted: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    extracted
        .map(|Path(id)| id)
        .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))
}

fn json_body(extracted: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    extracted
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))
}

async fn list_handler(
    State(state): State<AppState>,
    Authenticated(viewer): Authenticated,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EmployeeView>>> {
    let params = query(params)?;
    let transformer = state.transformer(params.view.as_deref())?;
    let page = Page::new(params.limit, params.offset)?;
    let records = list_employees(&state.pool, &viewer, page).await?;
    Ok(Json(
        transformer
            .serialize_many(&state.pool, &viewer, &records)
            .await,
    ))
}

async fn retrieve_handler(
    State(state): State<AppState>,
    Authenticated(viewer): Authenticated,
    employee_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<ViewQuery>, QueryRejection>,
) -> ApiResult<Json<EmployeeView>> {
    let employee_id = employee_path(employee_id)?;
    let transformer = state.transformer(query(params)?.view.as_deref())?;
    let record = find_employee(&state.pool, &viewer, employee_id).await?;
    Ok(Json(transformer.serialize(&state.pool, &viewer, &record).await))
}

async fn create_handler(
    State(state): State<AppState>,
    Authenticated(viewer): Authenticated,
    params: Result<Query<ViewQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmployeeView>)> {
    let transformer = state.transformer(query(params)?.view.as_deref())?;
    let input = transformer.deserialize(&json_body(body)?, InputMode::Create)?;
    let record = transformer.create(&state.pool, &viewer, input).await?;
    let view = transformer.serialize(&state.pool, &viewer, &record).await;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_handler(
    State(state): State<AppState>,
    Authenticated(viewer): Authenticated,
    employee_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<ViewQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<EmployeeView>> {
    let employee_id = employee_path(employee_id)?;
    let transformer = state.transformer(query(params)?.view.as_deref())?;
    let input = transformer.deserialize(&json_body(body)?, InputMode::Update)?;
    let record = transformer
        .update(&state.pool, &viewer, employee_id, input)
        .await?;
    Ok(Json(transformer.serialize(&state.pool, &viewer, &record).await))
}

async fn training_handler(
    State(state): State<AppState>,
    Authenticated(viewer): Authenticated,
    params: Result<Query<TrainingQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TrainingEntry>>> {
    let params = query(params)?;
    let entries = list_training(&state.pool, &viewer, params.hired).await?;
    Ok(Json(entries))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.pool.get_database_backend();
    let db_ok = state
        .pool
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}
