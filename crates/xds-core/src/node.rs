//! Node identification for discovery requests.
//!
//! [`NodeIdentity`] is the `envoy.api.v2.core.Node` block a proxy sends with
//! each request. The gateway treats it as opaque and looks snapshots up by the
//! exact node id. The remaining fields are decoded so that a present field
//! with the wrong JSON type is rejected, and are otherwise only logged.

use serde::{Deserialize, Deserializer};

use crate::request::null_as_default;

/// JSON object payload (`google.protobuf.Struct` or `Any`).
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Identity of the requesting proxy, as carried in the request's `node` field.
///
/// Fields beyond `id` are kept only for logging; lookups never depend on them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeIdentity {
    /// Opaque node id, unique per proxy instance.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Service cluster the proxy belongs to.
    #[serde(deserialize_with = "null_as_default")]
    pub cluster: String,
    /// Free-form metadata supplied by the proxy.
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: JsonObject,
    /// Where the proxy runs.
    pub locality: Option<Locality>,
    /// Proxy build version string.
    #[serde(alias = "buildVersion", deserialize_with = "null_as_default")]
    pub build_version: String,
    /// Name of the proxy binary, e.g. `envoy`.
    #[serde(alias = "userAgentName", deserialize_with = "null_as_default")]
    pub user_agent_name: String,
    /// Free-form version of the proxy binary.
    #[serde(alias = "userAgentVersion", deserialize_with = "null_as_default")]
    pub user_agent_version: String,
    /// Structured version of the proxy binary.
    #[serde(alias = "userAgentBuildVersion")]
    pub user_agent_build_version: Option<BuildVersion>,
    /// Extensions compiled into the proxy.
    #[serde(deserialize_with = "null_as_default")]
    pub extensions: Vec<Extension>,
    /// Client feature flags the proxy supports.
    #[serde(alias = "clientFeatures", deserialize_with = "null_as_default")]
    pub client_features: Vec<String>,
    /// Addresses the proxy listens on.
    #[serde(alias = "listeningAddresses", deserialize_with = "null_as_default")]
    pub listening_addresses: Vec<JsonObject>,
}

impl NodeIdentity {
    /// Create an identity with only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Location of a proxy (`envoy.api.v2.core.Locality`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Locality {
    /// Region.
    #[serde(deserialize_with = "null_as_default")]
    pub region: String,
    /// Zone within the region.
    #[serde(deserialize_with = "null_as_default")]
    pub zone: String,
    /// Sub-zone within the zone.
    #[serde(alias = "subZone", deserialize_with = "null_as_default")]
    pub sub_zone: String,
}

/// Structured build version (`envoy.api.v2.core.BuildVersion`).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildVersion {
    /// Semantic version.
    pub version: Option<SemanticVersion>,
    /// Free-form build information.
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: JsonObject,
}

/// `envoy.type.SemanticVersion`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SemanticVersion {
    /// Major number.
    #[serde(alias = "majorNumber", deserialize_with = "proto_u32")]
    pub major_number: u32,
    /// Minor number.
    #[serde(alias = "minorNumber", deserialize_with = "proto_u32")]
    pub minor_number: u32,
    /// Patch number.
    #[serde(deserialize_with = "proto_u32")]
    pub patch: u32,
}

/// An extension compiled into the proxy (`envoy.api.v2.core.Extension`).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Extension {
    /// Extension name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Extension category.
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    /// Type descriptor of the extension configuration.
    #[serde(alias = "typeDescriptor", deserialize_with = "null_as_default")]
    pub type_descriptor: String,
    /// Extension version.
    pub version: Option<BuildVersion>,
    /// Whether the extension is disabled.
    #[serde(deserialize_with = "null_as_default")]
    pub disabled: bool,
}

/// Protobuf JSON `uint32`: a number or a decimal string.
fn proto_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u32),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Repr::Number(n)) => Ok(n),
        Some(Repr::Text(s)) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(json: &str) -> serde_json::Result<NodeIdentity> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_new_sets_only_id() {
        let node = NodeIdentity::new("sidecar-1");
        assert_eq!(node.id, "sidecar-1");
        assert!(node.cluster.is_empty());
        assert!(node.locality.is_none());
    }

    #[test]
    fn test_full_node_decodes() {
        let node = node(
            r#"{
                "id": "sidecar-1",
                "cluster": "payments",
                "locality": {"region": "eu-west-1", "zone": "a", "subZone": "rack-3"},
                "userAgentName": "envoy",
                "userAgentBuildVersion": {
                    "version": {"majorNumber": 1, "minorNumber": "14", "patch": 2}
                },
                "extensions": [{"name": "envoy.router", "category": "filters", "disabled": false}],
                "clientFeatures": ["envoy.lb.does_not_support_overprovisioning"],
                "listeningAddresses": [{"socketAddress": {"address": "0.0.0.0", "portValue": 15001}}]
            }"#,
        )
        .unwrap();

        assert_eq!(node.locality.as_ref().unwrap().sub_zone, "rack-3");
        assert_eq!(node.user_agent_name, "envoy");
        let version = node.user_agent_build_version.unwrap().version.unwrap();
        assert_eq!(
            (version.major_number, version.minor_number, version.patch),
            (1, 14, 2)
        );
        assert_eq!(node.extensions[0].name, "envoy.router");
        assert_eq!(node.client_features.len(), 1);
        assert_eq!(node.listening_addresses.len(), 1);
    }

    #[test]
    fn test_wrong_typed_fields_fail() {
        for json in [
            r#"{"locality": 7}"#,
            r#"{"locality": {"zone": 1}}"#,
            r#"{"user_agent_name": [1]}"#,
            r#"{"userAgentVersion": {}}"#,
            r#"{"userAgentBuildVersion": {"version": {"patch": "x"}}}"#,
            r#"{"extensions": {"name": "a"}}"#,
            r#"{"extensions": [{"disabled": "no"}]}"#,
            r#"{"client_features": "a"}"#,
            r#"{"listening_addresses": ["0.0.0.0:80"]}"#,
        ] {
            assert!(node(json).is_err(), "accepted {json}");
        }
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let node = node(r#"{"id": "n", "locality": null, "extensions": null, "userAgentName": null}"#)
            .unwrap();
        assert!(node.locality.is_none());
        assert!(node.extensions.is_empty());
        assert!(node.user_agent_name.is_empty());
    }
}
