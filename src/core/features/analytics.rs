use std::collections::BTreeMap;

use chrono::Duration;

use crate::core::models::{ContactAnalytics, ViewAnalytics};
use crate::errors::PortfolioError;
use crate::infrastructure::persistence::Storage;

/// Window used for the `recent_*` analytics counters.
#[must_use]
pub fn recent_window() -> Duration {
    Duration::days(7)
}

/// Total, per-project and recent view counts.
///
/// # Errors
///
/// Returns an error if either storage read fails.
pub async fn view_analytics(storage: &Storage) -> Result<ViewAnalytics, PortfolioError> {
    let views = storage.project_views().await?;
    let recent = storage.recent_project_views(recent_window()).await?;

    let mut project_views = BTreeMap::new();
    for view in &views {
        *project_views.entry(view.project_name.clone()).or_insert(0) += 1;
    }

    Ok(ViewAnalytics {
        total_views: views.len(),
        project_views,
        recent_views: recent.len(),
    })
}

/// Total, unread and recent contact counts.
///
/// # Errors
///
/// Returns an error if either storage read fails.
pub async fn contact_analytics(storage: &Storage) -> Result<ContactAnalytics, PortfolioError> {
    let contacts = storage.contacts().await?;
    let recent = storage.recent_contacts(recent_window()).await?;

    Ok(ContactAnalytics {
        total_contacts: contacts.len(),
        unread_contacts: contacts.iter().filter(|c| !c.is_read).count(),
        recent_contacts: recent.len(),
    })
}
