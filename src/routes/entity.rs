//! Entity CRUD routes: one resource (collection + member) per entity, mounted by the caller under `/api`.

use crate::entities::{Customer, Entity, Partner, Supplier};
use crate::error::AppError;
use crate::handlers::entity::{create, delete, list, show, update};
use crate::state::AppState;
use axum::{routing::get, Router};

/// `/{segment}` (list, create) and `/{segment}/:id` (show, update, delete).
fn resource<E: Entity>() -> Router<AppState> {
    let collection = format!("/{}", E::DEF.path_segment);
    let member = format!("/{}/:id", E::DEF.path_segment);
    Router::new()
        .route(&collection, get(list::<E>).post(create::<E>))
        .route(
            &member,
            get(show::<E>)
                .put(update::<E>)
                .patch(update::<E>)
                .delete(delete::<E>),
        )
}

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .merge(resource::<Partner>())
        .merge(resource::<Customer>())
        .merge(resource::<Supplier>())
        .with_state(state)
}

/// Unknown routes answer like a missing record.
pub async fn not_found() -> AppError {
    AppError::NotFound("route".into())
}
