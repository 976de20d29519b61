//! Entity CRUD handlers: list, create, show, update, delete. One generic set serves every entity.

use crate::entities::Entity;
use crate::error::AppError;
use crate::extractors::ListParams;
use crate::response::{paginated, success_created, success_ok, PageLocation};
use crate::service::{parse_list_params, CrudService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};

/// Ids are positive integers; anything else cannot name a row.
fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::NotFound(id_str.to_string()))
}

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

pub async fn list<E: Entity>(
    State(state): State<AppState>,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let request = parse_list_params(E::DEF, &params.query)?;
    let per_page = state.settings.page_size;
    let page = CrudService::<E>::list(&state.pool, &request.conditions, request.page, per_page).await?;
    let location = PageLocation::new(&state.settings.app_url, &params.path, params.query)?;
    let data: Vec<Value> = page.items.iter().map(E::to_resource).collect();
    Ok((
        StatusCode::OK,
        Json(paginated(data, page.total, request.page, per_page, &location)),
    ))
}

pub async fn create<E: Entity>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    let fields = RequestValidator::validate(&state.pool, E::DEF, E::DEF.create_rules, &body, None).await?;
    let resource = CrudService::<E>::create(&state.pool, &fields).await?.to_resource();
    tracing::info!(entity = E::DEF.name, id = %resource["id"], "created");
    Ok(success_created(resource))
}

pub async fn show<E: Entity>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = CrudService::<E>::find(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound(id_str))?;
    Ok(success_ok(row.to_resource()))
}

/// PUT and PATCH: only fields present in the body are validated and written.
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if CrudService::<E>::find(&state.pool, id).await?.is_none() {
        return Err(AppError::NotFound(id_str));
    }
    let body = body_to_map(body)?;
    let fields = RequestValidator::validate(&state.pool, E::DEF, E::DEF.update_rules, &body, Some(id)).await?;
    let row = CrudService::<E>::update(&state.pool, id, &fields)
        .await?
        .ok_or(AppError::NotFound(id_str))?;
    tracing::info!(entity = E::DEF.name, id, "updated");
    Ok(success_ok(row.to_resource()))
}

pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id_str)?;
    if !CrudService::<E>::delete(&state.pool, id).await? {
        return Err(AppError::NotFound(id_str));
    }
    tracing::info!(entity = E::DEF.name, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for bad in ["abc", "0", "-1", "1.5", ""] {
            assert!(matches!(parse_id(bad), Err(AppError::NotFound(_))), "{}", bad);
        }
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(body_to_map(Ok(Json(serde_json::json!({"name": "x"})))).is_ok());
        let err = body_to_map(Ok(Json(serde_json::json!([1, 2])))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
