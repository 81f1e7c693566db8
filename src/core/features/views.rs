use tracing::info;

use crate::core::models::{NewProjectView, Project};
use crate::errors::PortfolioError;
use crate::infrastructure::persistence::Storage;

/// Records one view of a catalog project. The stored name is the catalog
/// title, not whatever the client sent.
///
/// # Errors
///
/// Returns an error if the view could not be stored.
pub async fn track_view(
    storage: &Storage,
    project: &Project,
    user_ip: Option<String>,
) -> Result<String, PortfolioError> {
    let id = storage
        .record_view(NewProjectView {
            project_name: project.title.to_string(),
            user_ip,
        })
        .await?;
    info!(project_id = project.id, view_id = %id, "Project view tracked");
    Ok(id)
}
