//! # API Resource Discovery
//!
//! Lists the resources the server offers (core `v1` plus each group's preferred version),
//! including sub-resources such as `pods/log`, together with their verbs.
//!
//! Some resources are served by more than one group; as kubectl does, the first group
//! returned by discovery wins.

use crate::audit::DiscoveredResource;
use crate::error::AuditError;
use crate::runtime::RequestBudget;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::Client;
use std::collections::HashSet;
use tracing::{debug, info};

/// Discover every preferred API resource on the server
///
/// Any failure is a [`AuditError::Discovery`]; without a resource list there is nothing to query.
#[tracing::instrument(name = "audit.discovery", skip_all)]
pub async fn discover_resources(
    client: &Client,
    budget: &RequestBudget,
) -> Result<Vec<DiscoveredResource>, AuditError> {
    let mut lists = Vec::new();

    budget.acquire().await;
    let core = client
        .list_core_api_versions()
        .await
        .map_err(|e| AuditError::Discovery(format!("listing core API versions: {e}")))?;
    for version in &core.versions {
        budget.acquire().await;
        let list = client
            .list_core_api_resources(version)
            .await
            .map_err(|e| AuditError::Discovery(format!("listing resources for {version}: {e}")))?;
        lists.push(list);
    }

    budget.acquire().await;
    let groups = client
        .list_api_groups()
        .await
        .map_err(|e| AuditError::Discovery(format!("listing API groups: {e}")))?;
    for group in &groups.groups {
        let Some(preferred) = group.preferred_version.as_ref().or(group.versions.first()) else {
            debug!(group = %group.name, "API group has no versions, skipping");
            continue;
        };
        budget.acquire().await;
        let list = client
            .list_api_group_resources(&preferred.group_version)
            .await
            .map_err(|e| {
                AuditError::Discovery(format!(
                    "listing resources for {}: {e}",
                    preferred.group_version
                ))
            })?;
        lists.push(list);
    }

    let resources = merge_resource_lists(lists);
    info!("Discovered {} API resources", resources.len());
    Ok(resources)
}

/// Flatten resource lists, keeping the first occurrence of each resource name
pub fn merge_resource_lists(
    lists: impl IntoIterator<Item = APIResourceList>,
) -> Vec<DiscoveredResource> {
    let mut seen = HashSet::new();
    let mut resources = Vec::new();

    for list in lists {
        for resource in list.resources {
            if !seen.insert(resource.name.clone()) {
                debug!(
                    resource = %resource.name,
                    group_version = %list.group_version,
                    "Resource already discovered in an earlier group, skipping"
                );
                continue;
            }
            resources.push(DiscoveredResource {
                name: resource.name,
                verbs: resource.verbs,
            });
        }
    }

    resources
}
