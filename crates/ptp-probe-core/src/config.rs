//! Configuration types for the PTP daemon probe.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Probe configuration loaded from a YAML file.
///
/// Defaults hold the operational constants for the linuxptp daemon
/// deployment, so a configuration file is only needed to target something
/// else.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProbeConfig {
    /// Which pod and container to exec into
    pub target: TargetSettings,
    /// Remote shell command, prompt, and probe commands
    pub shell: ShellSettings,
    /// Step and session timeouts
    pub timeouts: TimeoutSettings,
}

impl ProbeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ProbeConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        fn required(name: &str, value: &str) -> Result<()> {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} cannot be empty")));
            }
            Ok(())
        }

        required("target.namespace", &self.target.namespace)?;
        required("target.pod_prefix", &self.target.pod_prefix)?;
        required("target.container", &self.target.container)?;
        required("target.gps_container", &self.target.gps_container)?;
        required("shell.command", &self.shell.command)?;
        required("shell.prompt", &self.shell.prompt)?;
        required("shell.list_command", &self.shell.list_command)?;
        required("shell.probe_command", &self.shell.probe_command)?;
        required("shell.probe_marker", &self.shell.probe_marker)?;

        if self.timeouts.step_secs == 0 {
            return Err(Error::Config("timeouts.step_secs must be > 0".to_string()));
        }
        if self.timeouts.session_secs == Some(0) {
            return Err(Error::Config(
                "timeouts.session_secs must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Which pod and container the probe execs into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSettings {
    /// Namespace the daemon pods run in
    pub namespace: String,
    /// Pod name prefix identifying the daemon pod
    pub pod_prefix: String,
    /// Daemon container name
    pub container: String,
    /// GNSS receiver container name
    pub gps_container: String,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            namespace: "openshift-ptp".to_string(),
            pod_prefix: "linuxptp-daemon-".to_string(),
            container: "linuxptp-daemon-container".to_string(),
            gps_container: "gpsd".to_string(),
        }
    }
}

/// Remote shell command, prompt, and the diagnostic commands driven over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Command executed inside the container to get a shell
    pub command: String,
    /// Text the remote shell emits when ready for the next command
    pub prompt: String,
    /// Listing command sent once the prompt appears
    pub list_command: String,
    /// Diagnostic probe command interrogating the GNSS receiver
    pub probe_command: String,
    /// Substring of the probe output proving the receiver answered
    pub probe_marker: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            command: "/usr/bin/sh".to_string(),
            prompt: "sh-4.4#".to_string(),
            list_command: "ls -ltr".to_string(),
            probe_command: "ubxtool -t -p MON-VER -P 29.20".to_string(),
            probe_marker: "extension FWVER=TIM".to_string(),
        }
    }
}

/// Step and session timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Per-step timeout in seconds for expect steps
    pub step_secs: u64,
    /// Optional bound on the whole script run, in seconds
    pub session_secs: Option<u64>,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            step_secs: 120,
            session_secs: None,
        }
    }
}

impl TimeoutSettings {
    /// Per-step timeout as a [`Duration`].
    pub fn step(&self) -> Duration {
        Duration::from_secs(self.step_secs)
    }

    /// Whole-session deadline as a [`Duration`], if configured.
    pub fn session(&self) -> Option<Duration> {
        self.session_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProbeConfig::default();
        assert_eq!(config.target.namespace, "openshift-ptp");
        assert_eq!(config.target.pod_prefix, "linuxptp-daemon-");
        assert_eq!(config.target.container, "linuxptp-daemon-container");
        assert_eq!(config.target.gps_container, "gpsd");
        assert_eq!(config.shell.command, "/usr/bin/sh");
        assert_eq!(config.shell.prompt, "sh-4.4#");
        assert_eq!(config.timeouts.step_secs, 120);
        assert_eq!(config.timeouts.session_secs, None);
    }

    #[test]
    fn test_config_validation() {
        let config = ProbeConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_conversions() {
        let timeouts = TimeoutSettings {
            step_secs: 30,
            session_secs: Some(600),
        };
        assert_eq!(timeouts.step(), Duration::from_secs(30));
        assert_eq!(timeouts.session(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_invalid_step_timeout() {
        let mut config = ProbeConfig::default();
        config.timeouts.step_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_session_timeout() {
        let mut config = ProbeConfig::default();
        config.timeouts.session_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let mut config = ProbeConfig::default();
        config.shell.prompt = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let mut config = ProbeConfig::default();
        config.target.namespace = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
target:
  namespace: openshift-ptp
  pod_prefix: linuxptp-daemon-
  container: linuxptp-daemon-container
  gps_container: gpsd

shell:
  command: /usr/bin/sh
  prompt: "sh-4.4#"
  list_command: ls -ltr
  probe_command: ubxtool -t -p MON-VER -P 29.20
  probe_marker: extension FWVER=TIM

timeouts:
  step_secs: 60
  session_secs: 600
"#;

        let config = ProbeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.timeouts.step_secs, 60);
        assert_eq!(config.timeouts.session_secs, Some(600));
        assert_eq!(config.shell.probe_marker, "extension FWVER=TIM");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
timeouts:
  step_secs: 15
"#;

        let config = ProbeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.timeouts.step_secs, 15);
        assert_eq!(config.target.namespace, "openshift-ptp");
        assert_eq!(config.shell.prompt, "sh-4.4#");
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = ProbeConfig::from_yaml("timeouts: [not, a, map]");
        assert!(result.is_err());
    }
}
