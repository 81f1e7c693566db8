//! One function per endpoint. Each returns a complete proxy response.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use super::helpers::{failure, ok, ok_message};
use super::parsing::HttpRequest;
use super::validation::{validate_contact, validate_view};
use crate::core::catalog::{PROJECTS, SKILLS, find_project};
use crate::core::features::{analytics, contact, views};
use crate::errors::PortfolioError;
use crate::state::AppState;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn root(state: &AppState) -> Value {
    ok(&json!({
        "message": "Portfolio API",
        "version": API_VERSION,
        "storage": state.storage.mode(),
        "endpoints": {
            "projects": "/api/projects",
            "skills": "/api/skills",
            "contact": "/api/contact",
            "analytics": "/api/analytics"
        }
    }))
}

pub fn list_projects() -> Value {
    ok(&PROJECTS)
}

pub fn get_project(raw_id: &str) -> Value {
    match lookup_project(raw_id) {
        Ok(project) => ok(project),
        Err(e) => failure(&e, "Failed to fetch project"),
    }
}

pub fn list_skills() -> Value {
    ok(&SKILLS)
}

/// `POST /api/projects/{id}/view`. The project must exist before the body is
/// even looked at, so unknown ids never have side effects.
pub async fn track_project_view(state: &AppState, raw_id: &str, request: &HttpRequest<'_>) -> Value {
    let result: Result<String, PortfolioError> = async {
        let project = lookup_project(raw_id)?;
        let view = validate_view(&request.json_body()?)?;
        let user_ip = view.user_ip.or_else(|| request.source_ip.map(ToString::to_string));
        views::track_view(&state.storage, project, user_ip).await
    }
    .await;

    match result {
        Ok(_) => ok_message("View tracked successfully"),
        Err(e) => failure(&e, "Failed to track view"),
    }
}

pub async fn submit_contact(state: &AppState, request: &HttpRequest<'_>) -> Value {
    let result: Result<String, PortfolioError> = async {
        let new_contact = validate_contact(&request.json_body()?)?;
        contact::submit_contact(&state.storage, state.notifier.clone(), new_contact).await
    }
    .await;

    match result {
        Ok(_) => ok_message("Contact message submitted successfully"),
        Err(e) => {
            if let PortfolioError::Validation(details) = &e {
                warn!(?details, "Rejected contact submission");
            }
            failure(&e, "Failed to submit contact message")
        }
    }
}

pub async fn view_analytics(state: &AppState) -> Value {
    match analytics::view_analytics(&state.storage).await {
        Ok(data) => ok(&data),
        Err(e) => failure(&e, "Failed to fetch analytics"),
    }
}

pub async fn contact_analytics(state: &AppState) -> Value {
    match analytics::contact_analytics(&state.storage).await {
        Ok(data) => ok(&data),
        Err(e) => failure(&e, "Failed to fetch contact analytics"),
    }
}

/// Process status plus reachability of the selected store. The fallback
/// store is reported as such rather than as connected.
pub async fn health(state: &AppState) -> Value {
    let mode = state.storage.mode();
    let database = if mode.is_fallback() {
        "fallback"
    } else if state.storage.ping().await {
        "connected"
    } else {
        "unreachable"
    };

    ok(&json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "database": database,
        "storage": mode
    }))
}

fn lookup_project(raw_id: &str) -> Result<&'static crate::core::models::Project, PortfolioError> {
    raw_id
        .parse::<u32>()
        .ok()
        .and_then(find_project)
        .ok_or_else(|| PortfolioError::NotFound("Project".to_string()))
}
