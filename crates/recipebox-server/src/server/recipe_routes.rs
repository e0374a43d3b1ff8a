//! Recipe CRUD, search and PDF download.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use recipebox_core::api::{self, Envelope, RecipePayload};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::auth::AccessClaims;
use crate::pdf;
use crate::storage::{DatabaseError, RecipeParams};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

/// Store errors as the recipe endpoints report them.
fn recipe_error(e: DatabaseError) -> ApiError {
    match e {
        DatabaseError::NotFound(_) => ApiError::NotFound("Recipe not found".to_string()),
        DatabaseError::Duplicate(_) => {
            ApiError::Duplicate("Recipe name already exists".to_string())
        }
        other => other.into(),
    }
}

/// Trimmed name plus the two text blocks, or a validation error when any
/// is blank.
fn validated<'a>(payload: &'a RecipePayload, message: &str) -> ApiResult<RecipeParams<'a>> {
    let name = payload.name.trim();
    if name.is_empty()
        || payload.ingredients.trim().is_empty()
        || payload.instructions.trim().is_empty()
    {
        return Err(ApiError::validation(message));
    }
    Ok(RecipeParams {
        name,
        ingredients: &payload.ingredients,
        instructions: &payload.instructions,
    })
}

/// `GET /recipes/names`
pub async fn list_names(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<api::RecipeName>>>> {
    let names = state.db.list_recipe_names().await?;
    Ok(Json(Envelope::ok(
        names.into_iter().map(Into::into).collect(),
        "Recipe names retrieved successfully",
    )))
}

/// `GET /recipes/search?name=`
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Envelope<Vec<api::Recipe>>>> {
    let term = query.name.trim();
    if term.is_empty() {
        return Err(ApiError::validation("Search term is required"));
    }

    let recipes = state.db.search_recipes(term).await.map_err(|e| match e {
        DatabaseError::NotFound(_) => {
            ApiError::NotFound("No recipes found matching your search".to_string())
        }
        other => other.into(),
    })?;
    debug!(matches = recipes.len(), "Recipe search");

    Ok(Json(Envelope::ok(
        recipes.into_iter().map(Into::into).collect(),
        "Recipes found",
    )))
}

/// `GET /recipes/{id}`
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<api::Recipe>>> {
    let recipe = state.db.get_recipe(&id).await.map_err(recipe_error)?;
    Ok(Json(Envelope::ok(
        recipe.into(),
        "Recipe retrieved successfully!",
    )))
}

/// `GET /recipes/{id}/download`
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let recipe: api::Recipe = state.db.get_recipe(&id).await.map_err(recipe_error)?.into();

    let bytes = pdf::render_recipe(&recipe.fields());
    let disposition = pdf::content_disposition(&pdf::file_name(&recipe.name));
    info!(recipe_id = %recipe.id, size = bytes.len(), "Recipe PDF rendered");

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// `POST /recipes`
#[instrument(skip(state, claims, payload), fields(user = %claims.username))]
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<api::Recipe>>)> {
    let Json(payload) = payload?;
    let params = validated(&payload, "Please provide name, ingredients, and instructions")?;
    let created_by = payload.created_by.as_deref().unwrap_or(&claims.sub);

    let id = uuid::Uuid::new_v4().to_string();
    let recipe = state
        .db
        .create_recipe(&id, &params, Some(created_by))
        .await
        .map_err(recipe_error)?;

    info!(recipe_id = %recipe.id, name = %recipe.name, "Recipe created");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(recipe.into(), "Recipe created successfully")),
    ))
}

/// `PUT /recipes/{id}`
#[instrument(skip(state, claims, payload), fields(user = %claims.username))]
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> ApiResult<Json<Envelope<api::Recipe>>> {
    let Json(payload) = payload?;
    let params = validated(&payload, "Please provide all required fields")?;

    let recipe = state
        .db
        .update_recipe(&id, &params)
        .await
        .map_err(recipe_error)?;

    info!(recipe_id = %recipe.id, "Recipe updated");
    Ok(Json(Envelope::ok(
        recipe.into(),
        "Recipe updated successfully",
    )))
}

/// `DELETE /recipes/{id}`
#[instrument(skip(state, claims), fields(user = %claims.username))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    state.db.delete_recipe(&id).await.map_err(recipe_error)?;

    info!(recipe_id = %id, "Recipe deleted");
    Ok(Json(Envelope::message(true, "Recipe deleted successfully")))
}
