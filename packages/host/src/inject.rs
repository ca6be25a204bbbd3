//! Build-time injection contract for the preview bundler.
//!
//! When design mode is requested for a development build, the bundler must
//! inject the overlay script and a runtime style-generation shim into the
//! preview. Production builds get neither, unconditionally.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

/// One asset the bundler must add to the preview document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectedAsset {
    pub name: &'static str,
    /// Mount path inside the preview sandbox.
    pub path: &'static str,
}

const OVERLAY_SCRIPT: InjectedAsset = InjectedAsset {
    name: "design-mode-overlay",
    path: "/__pagelift/overlay.js",
};

const STYLE_RUNTIME: InjectedAsset = InjectedAsset {
    name: "runtime-style-generation",
    path: "/__pagelift/styles.js",
};

/// Assets to inject for a build. Empty unless this is a development build
/// with design mode enabled.
pub fn injection_assets(mode: BuildMode, design_mode: bool) -> Vec<InjectedAsset> {
    match (mode, design_mode) {
        (BuildMode::Development, true) => vec![STYLE_RUNTIME, OVERLAY_SCRIPT],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_with_design_mode_injects_both() {
        let assets = injection_assets(BuildMode::Development, true);
        assert_eq!(assets.len(), 2);
        assert!(assets.iter().any(|a| a.name == "design-mode-overlay"));
    }

    #[test]
    fn test_production_never_injects() {
        assert!(injection_assets(BuildMode::Production, true).is_empty());
        assert!(injection_assets(BuildMode::Production, false).is_empty());
    }

    #[test]
    fn test_development_without_design_mode_injects_nothing() {
        assert!(injection_assets(BuildMode::Development, false).is_empty());
    }
}
