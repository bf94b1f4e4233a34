//! # Input Backends
//!
//! Capability interface shared by every controller input library, and the
//! candidates the sampler tries at startup.
//!
//! A backend is *opened* on the sampler's worker thread (some libraries are
//! not `Send`), then *polled* repeatedly and asked to *normalize* its raw state
//! into a [`ControllerState`]. Once one candidate opens, it is used for the
//! rest of the process lifetime.

use serde::Deserialize;

use super::calibration::Calibration;
use super::sample::ControllerState;
use crate::config::ControllerConfig;
use crate::error::Result;

/// Capability interface implemented by each input library adapter.
pub trait InputBackend {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Drains whatever the device has reported since the last call.
    ///
    /// Must not block. Returns `Ok(true)` when the raw state changed.
    /// Returns an error when the device stopped answering; the backend
    /// resets itself to neutral before doing so.
    fn poll(&mut self) -> Result<bool>;

    /// Current raw state, normalized and clamped into sample ranges.
    fn normalize(&self, calibration: &Calibration) -> ControllerState;
}

/// Opens a backend. Runs on the sampler worker thread.
pub type BackendOpener = Box<dyn FnOnce() -> Result<Box<dyn InputBackend>> + Send>;

/// Backends selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Cross-platform gamepad library (requires the `gilrs` feature)
    Gilrs,
    /// Linux event devices under `/dev/input`
    Evdev,
    /// Software-fed state, neutral unless driven by code
    Synthetic,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Gilrs => "gilrs",
            BackendKind::Evdev => "evdev",
            BackendKind::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gilrs" => Ok(BackendKind::Gilrs),
            "evdev" => Ok(BackendKind::Evdev),
            "synthetic" => Ok(BackendKind::Synthetic),
            other => Err(format!(
                "unknown backend '{}' (expected gilrs, evdev or synthetic)",
                other
            )),
        }
    }
}

/// One backend the sampler may try, in priority order.
pub struct BackendCandidate {
    name: &'static str,
    opener: BackendOpener,
}

impl std::fmt::Debug for BackendCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCandidate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl BackendCandidate {
    /// Wraps an arbitrary opener.
    pub fn new<F>(name: &'static str, opener: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn InputBackend>> + Send + 'static,
    {
        Self {
            name,
            opener: Box::new(opener),
        }
    }

    /// Candidate for a configured backend kind.
    #[must_use]
    pub fn for_kind(kind: BackendKind, config: &ControllerConfig) -> Self {
        match kind {
            BackendKind::Gilrs => gilrs_candidate(),
            BackendKind::Evdev => {
                let device_path = config.device_path.clone();
                Self::new("evdev", move || {
                    let backend = if device_path.is_empty() {
                        super::evdev_backend::EvdevBackend::open()?
                    } else {
                        super::evdev_backend::EvdevBackend::open_path(&device_path)?
                    };
                    Ok(Box::new(backend) as Box<dyn InputBackend>)
                })
            }
            BackendKind::Synthetic => {
                super::synthetic::SyntheticBackend::default().into_candidate()
            }
        }
    }

    /// Candidates for every configured backend, in configured order.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Vec<Self> {
        config
            .backends
            .iter()
            .map(|&kind| Self::for_kind(kind, config))
            .collect()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the opener. Call on the thread that will own the backend.
    pub fn open(self) -> Result<Box<dyn InputBackend>> {
        (self.opener)()
    }
}

#[cfg(feature = "gilrs")]
fn gilrs_candidate() -> BackendCandidate {
    BackendCandidate::new("gilrs", || {
        let backend = super::gilrs_backend::GilrsBackend::open()?;
        Ok(Box::new(backend) as Box<dyn InputBackend>)
    })
}

#[cfg(not(feature = "gilrs"))]
fn gilrs_candidate() -> BackendCandidate {
    BackendCandidate::new("gilrs", || {
        Err(crate::error::PadlinkError::Backend {
            backend: "gilrs",
            reason: "support not compiled in (enable the `gilrs` feature)".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PadlinkError;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("gilrs".parse::<BackendKind>(), Ok(BackendKind::Gilrs));
        assert_eq!("EVDEV".parse::<BackendKind>(), Ok(BackendKind::Evdev));
        assert_eq!("synthetic".parse::<BackendKind>(), Ok(BackendKind::Synthetic));
        assert!("pygame".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            backends: Vec<BackendKind>,
        }

        let parsed: Wrapper = toml::from_str(r#"backends = ["evdev", "gilrs"]"#).unwrap();
        assert_eq!(parsed.backends, vec![BackendKind::Evdev, BackendKind::Gilrs]);
    }

    #[test]
    fn test_candidate_open_runs_opener() {
        let candidate = BackendCandidate::new("broken", || {
            Err(PadlinkError::Backend {
                backend: "broken",
                reason: "no device".to_string(),
            })
        });
        assert_eq!(candidate.name(), "broken");

        let err = candidate.open().err().expect("opener should fail");
        assert!(err.to_string().contains("no device"));
    }

    #[test]
    fn test_from_config_preserves_order() {
        let mut config = ControllerConfig::default();
        config.backends = vec![BackendKind::Synthetic, BackendKind::Evdev];

        let names: Vec<_> = BackendCandidate::from_config(&config)
            .iter()
            .map(BackendCandidate::name)
            .collect();
        assert_eq!(names, vec!["synthetic", "evdev"]);
    }

    #[test]
    fn test_synthetic_candidate_opens() {
        let candidate =
            BackendCandidate::for_kind(BackendKind::Synthetic, &ControllerConfig::default());
        let backend = candidate.open().expect("synthetic always opens");
        assert_eq!(backend.name(), "synthetic");
    }
}
