use serde::{Deserialize, Serialize};

use crate::endpoint::endpoints;

/// The `/.well-known/terraform.json` document.
///
/// Clients read it to find the base path of each registry protocol. A
/// protocol that is switched off is left out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscovery {
    #[serde(rename = "modules.v1", default, skip_serializing_if = "Option::is_none")]
    pub modules_v1: Option<String>,
    #[serde(rename = "providers.v1", default, skip_serializing_if = "Option::is_none")]
    pub providers_v1: Option<String>,
}

impl ServiceDiscovery {
    /// Build the document for a server reachable at `base_url`. An empty base
    /// URL advertises host-relative paths.
    pub fn new(base_url: &str, modules: bool, providers: bool) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            modules_v1: modules.then(|| format!("{base}{}", endpoints::MODULES_V1)),
            providers_v1: providers.then(|| format!("{base}{}", endpoints::PROVIDERS_V1)),
        }
    }
}
