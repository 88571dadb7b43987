//! Pod resolution by name prefix.

use ptp_probe_core::{Error, Result};

/// Name suffix marking ephemeral debug-copy pods.
///
/// `oc debug` spawns a copy of the daemon pod with this suffix; such copies
/// must never be targeted by automation.
pub const DEBUG_POD_SUFFIX: &str = "-debug";

/// Select exactly one pod name matching `prefix` from a listing.
///
/// Names ending in [`DEBUG_POD_SUFFIX`] are excluded before counting. Zero
/// matches and more than one match are both hard failures; acting on the
/// wrong pod is unsafe, so ambiguity is never resolved heuristically.
pub fn select_pod<I, S>(names: I, namespace: &str, prefix: &str) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut matches: Vec<String> = names
        .into_iter()
        .map(Into::into)
        .filter(|name| name.starts_with(prefix) && !name.ends_with(DEBUG_POD_SUFFIX))
        .collect();

    match matches.len() {
        0 => Err(Error::PodNotFound {
            namespace: namespace.to_string(),
            prefix: prefix.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(Error::AmbiguousPods {
            count,
            namespace: namespace.to_string(),
            prefix: prefix.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_match_selected() {
        let names = vec![
            "linuxptp-daemon-abcde",
            "ptp-operator-7f9d4",
            "node-exporter-x2v8k",
        ];
        let pod = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap();
        assert_eq!(pod, "linuxptp-daemon-abcde");
    }

    #[test]
    fn test_zero_matches_is_not_found() {
        let names = vec!["ptp-operator-7f9d4"];
        let err = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap_err();
        assert!(matches!(err, Error::PodNotFound { .. }));
    }

    #[test]
    fn test_empty_listing_is_not_found() {
        let names: Vec<String> = vec![];
        let err = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap_err();
        assert!(matches!(err, Error::PodNotFound { .. }));
    }

    #[test]
    fn test_two_matches_are_ambiguous() {
        let names = vec!["linuxptp-daemon-abcde", "linuxptp-daemon-fghij"];
        let err = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap_err();
        match err {
            Error::AmbiguousPods { count, .. } => assert_eq!(count, 2),
            other => panic!("expected AmbiguousPods, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_pod_never_matches() {
        // A debug copy alongside the real daemon must not make the
        // resolution ambiguous.
        let names = vec!["linuxptp-daemon-abcde", "linuxptp-daemon-1-debug"];
        let pod = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap();
        assert_eq!(pod, "linuxptp-daemon-abcde");
    }

    #[test]
    fn test_only_debug_pods_is_not_found() {
        let names = vec!["linuxptp-daemon-1-debug"];
        let err = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap_err();
        assert!(matches!(err, Error::PodNotFound { .. }));
    }

    #[test]
    fn test_error_names_namespace_and_prefix() {
        let names: Vec<String> = vec![];
        let err = select_pod(names, "openshift-ptp", "linuxptp-daemon-").unwrap_err();
        let display = err.to_string();
        assert!(display.contains("openshift-ptp"));
        assert!(display.contains("linuxptp-daemon-"));
    }
}
