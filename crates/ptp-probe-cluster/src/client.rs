//! Cluster client construction and pod listing.

use std::path::Path;

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, ResourceExt};
use tracing::debug;

use ptp_probe_core::{Error, Result};

use crate::resolver;

/// Handle to the cluster API.
///
/// Wraps a [`kube::Client`], which is an Arc-backed handle; cloning this
/// type shares the same underlying connection pool.
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
}

impl ClusterClient {
    /// Build a client from a kubeconfig file.
    pub async fn from_kubeconfig<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            Error::transport(format!("failed to read kubeconfig {}", path.display()), e)
        })?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| Error::transport("failed to build client config from kubeconfig", e))?;
        Self::from_config(config)
    }

    /// Build a client from the ambient environment: in-cluster service
    /// account when present, otherwise the default kubeconfig.
    pub async fn infer() -> Result<Self> {
        let config = Config::infer()
            .await
            .map_err(|e| Error::transport("failed to infer cluster configuration", e))?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self> {
        let client = Client::try_from(config)
            .map_err(|e| Error::transport("failed to create cluster client", e))?;
        Ok(Self { client })
    }

    /// Pod API scoped to `namespace`.
    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Resolve the single non-debug pod whose name starts with `prefix`.
    ///
    /// Lists all pods in `namespace` and applies [`resolver::select_pod`].
    /// List failures are wrapped and surfaced, never retried here.
    pub async fn find_pod_by_prefix(&self, namespace: &str, prefix: &str) -> Result<String> {
        let pods = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| {
                Error::transport(format!("failed to list pods in namespace {namespace:?}"), e)
            })?;

        debug!(
            "listed {} pods in namespace {namespace:?}",
            pods.items.len()
        );
        resolver::select_pod(pods.iter().map(|pod| pod.name_any()), namespace, prefix)
    }
}
