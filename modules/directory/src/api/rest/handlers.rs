//! Handlers for the directory REST surface.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use orggate_security::Identity;

use crate::domain::error::DomainError;
use crate::domain::service::DirectoryService;

use super::dto::{
    AddMemberRequest, ContainerDto, CreateContainerRequest, LevelFilter, LookupQuery,
    MembershipDto,
};
use super::error::ApiError;

pub async fn create_container(
    State(svc): State<Arc<DirectoryService>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateContainerRequest>,
) -> Result<Response, ApiError> {
    let container = svc.create_container(&identity, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ContainerDto::from(container))).into_response())
}

pub async fn get_container(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContainerDto>, ApiError> {
    let container = svc.get_container(id).await?;
    Ok(Json(container.into()))
}

pub async fn lookup_container(
    State(svc): State<Arc<DirectoryService>>,
    Query(q): Query<LookupQuery>,
) -> Result<Json<ContainerDto>, ApiError> {
    let container = svc
        .get_by_slug(&q.level, &q.slug, q.parent_id)
        .await?
        .ok_or(DomainError::ContainerNotFound { id: Uuid::nil() })?;
    Ok(Json(container.into()))
}

pub async fn list_children(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
    Query(filter): Query<LevelFilter>,
) -> Result<Json<Vec<ContainerDto>>, ApiError> {
    // 404 before an empty listing for unknown parents.
    svc.get_container(id).await?;
    let children = svc.list_children(id, filter.level.as_deref()).await?;
    Ok(Json(children.into_iter().map(ContainerDto::from).collect()))
}

pub async fn list_ancestors(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ContainerDto>>, ApiError> {
    let ancestors = svc.ancestors(id).await?;
    Ok(Json(
        ancestors.into_iter().map(ContainerDto::from).collect(),
    ))
}

pub async fn delete_container(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    svc.delete_container(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate_container(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    svc.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Response, ApiError> {
    let membership = svc.add_member(req.user_id, id, req.role).await?;
    Ok((StatusCode::CREATED, Json(MembershipDto::from(membership))).into_response())
}

pub async fn list_members(
    State(svc): State<Arc<DirectoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MembershipDto>>, ApiError> {
    svc.get_container(id).await?;
    let members = svc.list_members(id).await?;
    Ok(Json(members.into_iter().map(MembershipDto::from).collect()))
}

pub async fn remove_member(
    State(svc): State<Arc<DirectoryService>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    svc.remove_member(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
