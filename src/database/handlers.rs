//! HTTP handlers for database administration.
//!
//! Every handler follows the same shape: bind and validate the input, resolve
//! the engine's backend, run the operation, emit one envelope.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        Path, State,
    },
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};

use crate::database::backend::{Backends, DatabaseAdmin, Engine};
use crate::database::credentials::Credentials;
use crate::database::types::{
    CreateDatabaseRequest, DatabaseSelector, DatabaseStats, DeletedDatabase, ProvisionedDatabase,
    QueryActivityReport, RenameDatabaseRequest, RenamedDatabase,
};
use crate::http::envelope::{emit_error_with_status, emit_success};
use crate::http::error::ApiError;
use crate::http::request::RequestStart;

/// Per-engine handler state.
#[derive(Clone)]
pub struct EngineState {
    engine: Engine,
    admin: Option<Arc<dyn DatabaseAdmin>>,
}

impl EngineState {
    fn action(&self, operation: &str) -> String {
        format!("{}-{}", self.engine, operation)
    }

    fn admin(&self) -> Result<&Arc<dyn DatabaseAdmin>, ApiError> {
        self.admin.as_ref().ok_or(ApiError::NotConfigured(self.engine))
    }

    fn respond<T: serde::Serialize>(
        &self,
        result: Result<T, ApiError>,
        start: RequestStart,
        operation: &str,
        message: &str,
    ) -> Response {
        match result {
            Ok(data) => emit_success(data, start, &self.action(operation), message),
            Err(err) => {
                let action = self.action(err.stage().unwrap_or(operation));
                emit_error_with_status(err.status(), &err, start, &action)
            }
        }
    }
}

/// Routes for every engine, nested under `/{engine}`.
pub fn routes(backends: &Backends) -> Router {
    Engine::ALL
        .into_iter()
        .fold(Router::new(), |router, engine| {
            router.nest(&format!("/{engine}"), engine_routes(engine, backends))
        })
}

fn engine_routes(engine: Engine, backends: &Backends) -> Router {
    let state = EngineState {
        engine,
        admin: backends.get(engine),
    };

    let mut router = Router::new()
        .route("/databases", post(create_database))
        .route(
            "/databases/{db_name}",
            patch(rename_database).delete(delete_database),
        )
        .route("/databases/{db_name}/credentials", patch(reset_credentials))
        .route("/databases/{db_name}/stats", get(database_stats));

    if engine == Engine::Postgres {
        router = router.route("/databases/queries", get(query_activity));
    }

    router.with_state(state)
}

async fn create_database(
    start: RequestStart,
    State(state): State<EngineState>,
    body: Result<Json<CreateDatabaseRequest>, JsonRejection>,
) -> Response {
    let result = provision(&state, body).await;
    state.respond(result, start, "create-database", "Database Created")
}

async fn provision(
    state: &EngineState,
    body: Result<Json<CreateDatabaseRequest>, JsonRejection>,
) -> Result<ProvisionedDatabase, ApiError> {
    let Json(request) = body?;
    let name = request.validate()?;
    let admin = state.admin()?;
    let credentials = Credentials::generate()?;

    admin.create_database(&name, &credentials).await?;
    tracing::info!(
        engine = %state.engine,
        database = %name,
        username = %credentials.username,
        "Database created"
    );

    Ok(ProvisionedDatabase {
        username: credentials.username,
        password: credentials.password,
        database_name: name,
    })
}

/// Body of the credentials, delete and stats routes. An empty body selects
/// nothing; anything else must be a JSON object.
fn selector(body: Result<Bytes, BytesRejection>) -> Result<DatabaseSelector, ApiError> {
    let body = body?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DatabaseSelector::default());
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::Body(e.to_string()))
}

async fn reset_credentials(
    start: RequestStart,
    State(state): State<EngineState>,
    Path(db_name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = reissue(&state, &db_name, body).await;
    state.respond(result, start, "reset-credentials", "Database Credentials Reset")
}

async fn reissue(
    state: &EngineState,
    db_name: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<ProvisionedDatabase, ApiError> {
    let name = selector(body)?.validate(db_name)?;
    let admin = state.admin()?;
    let credentials = Credentials::generate()?;

    admin.reset_credentials(&name, &credentials).await?;

    Ok(ProvisionedDatabase {
        username: credentials.username,
        password: credentials.password,
        database_name: name,
    })
}

async fn rename_database(
    start: RequestStart,
    State(state): State<EngineState>,
    Path(db_name): Path<String>,
    body: Result<Json<RenameDatabaseRequest>, JsonRejection>,
) -> Response {
    let result = rename(&state, &db_name, body).await;
    state.respond(result, start, "rename-database", "Database Renamed")
}

async fn rename(
    state: &EngineState,
    db_name: &str,
    body: Result<Json<RenameDatabaseRequest>, JsonRejection>,
) -> Result<RenamedDatabase, ApiError> {
    let Json(request) = body?;
    let (old_name, new_name) = request.validate(db_name)?;
    let admin = state.admin()?;

    admin.rename_database(&old_name, &new_name).await?;

    Ok(RenamedDatabase {
        old_database_name: old_name,
        new_database_name: new_name,
    })
}

async fn delete_database(
    start: RequestStart,
    State(state): State<EngineState>,
    Path(db_name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = delete(&state, &db_name, body).await;
    state.respond(result, start, "delete-database", "Database Deleted")
}

async fn delete(
    state: &EngineState,
    db_name: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<DeletedDatabase, ApiError> {
    let name = selector(body)?.validate(db_name)?;
    state.admin()?.delete_database(&name).await?;
    Ok(DeletedDatabase { database_name: name })
}

async fn database_stats(
    start: RequestStart,
    State(state): State<EngineState>,
    Path(db_name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = stats(&state, &db_name, body).await;
    state.respond(
        result,
        start,
        "view-database-stats",
        "Database Statistics Retrieved",
    )
}

async fn stats(
    state: &EngineState,
    db_name: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<DatabaseStats, ApiError> {
    let name = selector(body)?.validate(db_name)?;
    let stats = state.admin()?.database_stats(&name).await?;
    Ok(DatabaseStats {
        database_name: name,
        stats,
    })
}

async fn query_activity(start: RequestStart, State(state): State<EngineState>) -> Response {
    let result = activity(&state).await;
    state.respond(
        result,
        start,
        "get-total-queries",
        "Database Query retrieved successfully",
    )
}

async fn activity(state: &EngineState) -> Result<QueryActivityReport, ApiError> {
    let user_activities = state.admin()?.query_activity().await?;
    Ok(QueryActivityReport { user_activities })
}
