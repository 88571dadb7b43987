//! Container target descriptor.

use std::fmt;

use tracing::debug;

use ptp_probe_core::Result;

use crate::ClusterClient;

/// The namespace, pod, and container a command runs in.
///
/// The pod name is resolved once at construction and then cached. If the
/// underlying pod is replaced, the cached name goes stale; [`refresh`] is
/// the explicit re-resolution operation callers invoke before retrying a
/// failed stream open. Nothing refreshes implicitly.
///
/// [`refresh`]: ContainerTarget::refresh
#[derive(Clone)]
pub struct ContainerTarget {
    client: ClusterClient,
    namespace: String,
    pod_name: String,
    container: String,
    pod_prefix: String,
}

impl ContainerTarget {
    /// Resolve a target from a pod name prefix.
    ///
    /// Runs pod resolution immediately; construction fails the same way
    /// resolution fails (not found, ambiguous, or a transport error).
    pub async fn resolve(
        client: ClusterClient,
        namespace: impl Into<String>,
        pod_prefix: impl Into<String>,
        container: impl Into<String>,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let pod_prefix = pod_prefix.into();
        let pod_name = client.find_pod_by_prefix(&namespace, &pod_prefix).await?;

        Ok(Self {
            client,
            namespace,
            pod_name,
            container: container.into(),
            pod_prefix,
        })
    }

    /// Get the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get the resolved pod name.
    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    /// Get the container name.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Get the pod name prefix this target resolves against.
    pub fn pod_prefix(&self) -> &str {
        &self.pod_prefix
    }

    /// Re-run resolution and replace the cached pod name.
    ///
    /// Fails the same way construction fails; on failure the cached name is
    /// left unchanged.
    pub async fn refresh(&mut self) -> Result<()> {
        let pod_name = self
            .client
            .find_pod_by_prefix(&self.namespace, &self.pod_prefix)
            .await?;
        debug!(
            "refreshed target pod: {} -> {} (ns={})",
            self.pod_name, pod_name, self.namespace
        );
        self.pod_name = pod_name;
        Ok(())
    }

    pub(crate) fn client(&self) -> &ClusterClient {
        &self.client
    }
}

impl fmt::Debug for ContainerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerTarget")
            .field("namespace", &self.namespace)
            .field("pod_name", &self.pod_name)
            .field("container", &self.container)
            .field("pod_prefix", &self.pod_prefix)
            .finish_non_exhaustive()
    }
}
