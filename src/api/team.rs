//! Team directory endpoints.

use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Serialize;

use super::pagination::{PageLinks, PageNumberPagination, Paginated};
use crate::directory::{self, parse_flag, DirectoryOptions, MemberQuery};
use crate::errors::AppError;
use crate::models::{Department, TeamStats};
use crate::projection::{DepartmentGroupView, TeamMemberView};
use crate::AppState;

const MEMBER_PAGINATION: PageNumberPagination = PageNumberPagination {
    page_size: 12,
    max_page_size: 50,
};

/// GET /api/team/members/ - Filtered, searched, ordered and paginated members.
pub async fn list_team_members(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Paginated<TeamMemberView>>, AppError> {
    let Query(params) = query?;

    let departments = state.repo.list_departments().await?;
    let member_query = MemberQuery::from_params(&params, &departments)?;

    let members = member_query.apply(state.repo.list_team_members().await?);
    let page_size = MEMBER_PAGINATION.page_size(member_query.page_size.as_deref());
    let links = PageLinks::new(
        format!("{}/api/team/members/", state.config.base_url),
        &params,
    );
    let page = MEMBER_PAGINATION.paginate(members, member_query.page.as_deref(), page_size, &links)?;

    let results = state.projector.team_members(&page.results).await?;
    Ok(Json(page.with_results(results)))
}

/// GET /api/team/members/{id}/
pub async fn get_team_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TeamMemberView>, AppError> {
    let member = state
        .repo
        .get_team_member(id)
        .await?
        .ok_or_else(|| AppError::not_found("Team member", id))?;

    Ok(Json(state.projector.team_member(&member).await?))
}

/// GET /api/team/departments/
pub async fn list_departments(State(state): State<AppState>) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(state.repo.list_departments().await?))
}

/// GET /api/team/departments/{id}/
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Department>, AppError> {
    state
        .repo
        .get_department(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Department", id))
}

/// GET /api/team/stats/
pub async fn team_stats(State(state): State<AppState>) -> Result<Json<TeamStats>, AppError> {
    Ok(Json(state.repo.team_stats().await?))
}

/// Directory body: a flat member list or department groups.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DirectoryResponse {
    Members(Vec<TeamMemberView>),
    Departments(Vec<DepartmentGroupView>),
}

const DIRECTORY_PARAMS: [&str; 3] = ["only_active", "only_featured", "grouped"];

/// GET /api/team/directory/ - Directory view as shown on a team page.
pub async fn team_directory(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<DirectoryResponse>, AppError> {
    let Query(params) = query?;
    if let Some(unknown) = params.keys().find(|k| !DIRECTORY_PARAMS.contains(&k.as_str())) {
        return Err(AppError::BadRequest(format!(
            "Unknown query parameter '{}'",
            unknown
        )));
    }

    let flag = |name: &str| parse_flag(name, params.get(name).map(String::as_str));
    let opts = DirectoryOptions {
        only_active: flag("only_active")?.unwrap_or(true),
        only_featured: flag("only_featured")?.unwrap_or(false),
    };
    let grouped = flag("grouped")?.unwrap_or(false);

    let all = state.repo.list_team_members().await?;
    let body = if grouped {
        let departments = state.repo.list_departments().await?;
        let groups = directory::departments(opts, &departments, &all);
        DirectoryResponse::Departments(state.projector.department_groups(groups).await?)
    } else {
        let members = directory::members(opts, &all);
        DirectoryResponse::Members(state.projector.team_members(&members).await?)
    };

    Ok(Json(body))
}
