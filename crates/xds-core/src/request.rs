//! Decoding of discovery request bodies.
//!
//! Requests arrive as the protobuf-canonical JSON encoding of
//! `envoy.api.v2.DiscoveryRequest`. Both the lowerCamelCase JSON names and the
//! original proto field names are accepted, `null` means "field default",
//! and unknown fields are ignored so newer proxies keep working.

use serde::{Deserialize, Deserializer};

use crate::{DiscoveryKind, JsonObject, NodeIdentity, XdsError, XdsResult};

/// A decoded discovery request.
///
/// # Example
///
/// ```rust
/// use xds_core::{DiscoveryKind, DiscoveryRequest};
///
/// let body = br#"{"node": {"id": "sidecar-1"}, "resourceNames": ["svc-a"]}"#;
/// let request = DiscoveryRequest::decode(DiscoveryKind::Endpoints, body).unwrap();
///
/// assert_eq!(request.node_id(), Some("sidecar-1"));
/// assert_eq!(request.resource_names, vec!["svc-a".to_string()]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiscoveryRequest {
    /// Version of the last response the proxy accepted.
    #[serde(alias = "versionInfo", deserialize_with = "null_as_default")]
    pub version_info: String,
    /// Identity of the requesting proxy.
    pub node: Option<NodeIdentity>,
    /// Requested resource names.
    #[serde(alias = "resourceNames", deserialize_with = "null_as_default")]
    pub resource_names: Vec<String>,
    /// Type URL the proxy is asking for.
    #[serde(alias = "typeUrl", deserialize_with = "null_as_default")]
    pub type_url: String,
    /// Nonce of the response being acknowledged.
    #[serde(alias = "responseNonce", deserialize_with = "null_as_default")]
    pub response_nonce: String,
    /// Set when the proxy rejected the previous response.
    #[serde(alias = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
}

/// Rejection details a proxy attaches to a NACK.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    /// gRPC status code.
    #[serde(deserialize_with = "null_as_default")]
    pub code: i32,
    /// Human readable reason.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Typed error payloads (`google.protobuf.Any`).
    #[serde(deserialize_with = "null_as_default")]
    pub details: Vec<JsonObject>,
}

impl DiscoveryRequest {
    /// Decode a request body for the given discovery kind.
    ///
    /// # Errors
    ///
    /// Returns [`XdsError::DecodingError`] carrying the decoder's message when
    /// the body is not valid JSON or a known field has the wrong type.
    pub fn decode(kind: DiscoveryKind, body: &[u8]) -> XdsResult<Self> {
        serde_json::from_slice(body).map_err(|e| XdsError::decoding(kind.type_url(), e.to_string()))
    }

    /// Id of the requesting node, if the request carries one.
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        self.node.as_ref().map(|n| n.id.as_str())
    }

    /// Whether this request is a NACK of a previous response.
    #[must_use]
    pub fn is_nack(&self) -> bool {
        self.error_detail.is_some()
    }
}

/// Deserialize `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
