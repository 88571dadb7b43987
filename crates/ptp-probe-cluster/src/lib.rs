//! # ptp-probe-cluster
//!
//! Cluster access for the PTP daemon probe.
//!
//! This crate provides:
//! - Kubernetes client construction from a kubeconfig
//! - Pod resolution by name prefix, excluding debug-copy pods
//! - Container targets that can re-resolve a replaced pod
//! - Remote shell sessions over the pod exec subresource
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on ptp-probe-core
//! and keeps all cluster I/O behind a small surface the automation layer
//! drives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod exec;
pub mod resolver;
pub mod target;

// Re-export commonly used types
pub use client::ClusterClient;
pub use exec::{SessionHandle, ShellSession, SHELL_COMMAND};
pub use resolver::{select_pod, DEBUG_POD_SUFFIX};
pub use target::ContainerTarget;
