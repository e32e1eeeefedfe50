//! Static plugin descriptors handed to the host: identity, settings template
//! and the software-update record.

use std::collections::BTreeMap;

use serde::Serialize;

pub const PLUGIN_IDENTIFIER: &str = "psucontrol_raspberrymatic";
pub const PLUGIN_NAME: &str = "PSU Control - Raspberrymatic";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

const GITHUB_USER: &str = "usr577";
const GITHUB_REPO: &str = "OctoPrint-PSUControl-RPiGPIO";

/// Kind of UI template the plugin contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateConfig {
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub custom_bindings: bool,
}

/// One settings page, no custom view-model bindings.
pub fn template_configs() -> Vec<TemplateConfig> {
    vec![TemplateConfig {
        kind: TemplateKind::Settings,
        custom_bindings: false,
    }]
}

/// Self-update descriptor, serialized with the host's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInformation {
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "displayVersion")]
    pub display_version: String,
    #[serde(rename = "type")]
    pub check_type: String,
    pub user: String,
    pub repo: String,
    pub current: String,
    /// Archive URL with a `{target_version}` placeholder filled in by the host.
    pub pip: String,
}

impl UpdateInformation {
    pub fn for_version(version: &str) -> Self {
        Self {
            display_name: PLUGIN_NAME.to_string(),
            display_version: version.to_string(),
            check_type: "github_release".to_string(),
            user: GITHUB_USER.to_string(),
            repo: GITHUB_REPO.to_string(),
            current: version.to_string(),
            pip: format!(
                "https://github.com/{GITHUB_USER}/{GITHUB_REPO}/archive/{{target_version}}.zip"
            ),
        }
    }

    /// Archive URL for a concrete release tag.
    pub fn archive_url(&self, target_version: &str) -> String {
        self.pip.replace("{target_version}", target_version)
    }
}

/// The software-update hook result: one record keyed by plugin identifier.
pub fn update_information() -> BTreeMap<String, UpdateInformation> {
    let mut map = BTreeMap::new();
    map.insert(
        PLUGIN_IDENTIFIER.to_string(),
        UpdateInformation::for_version(PLUGIN_VERSION),
    );
    map
}
