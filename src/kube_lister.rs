//! # Cluster Binding Lister
//!
//! [`BindingLister`] over the live cluster: namespaces, RoleBindings and ClusterRoleBindings.

use crate::audit::BindingLister;
use crate::error::AuditError;
use crate::model::GrantingBinding;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding};
use kube::api::{Api, ListParams};
use kube::Client;

/// Lists bindings through the Kubernetes API
#[derive(Clone)]
pub struct KubeBindingLister {
    client: Client,
}

impl std::fmt::Debug for KubeBindingLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBindingLister").finish_non_exhaustive()
    }
}

impl KubeBindingLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BindingLister for KubeBindingLister {
    async fn list_namespaces(&self) -> Result<Vec<String>, AuditError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| AuditError::Listing {
                scope: "namespaces".to_string(),
                message: e.to_string(),
            })?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<GrantingBinding>, AuditError> {
        let api: Api<RoleBinding> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| AuditError::Listing {
                scope: namespace.to_string(),
                message: e.to_string(),
            })?;
        Ok(list
            .items
            .iter()
            .map(GrantingBinding::from_role_binding)
            .collect())
    }

    async fn list_cluster_role_bindings(&self) -> Result<Vec<GrantingBinding>, AuditError> {
        let api: Api<ClusterRoleBinding> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| AuditError::Listing {
                scope: "cluster".to_string(),
                message: e.to_string(),
            })?;
        Ok(list
            .items
            .iter()
            .map(GrantingBinding::from_cluster_role_binding)
            .collect())
    }
}
