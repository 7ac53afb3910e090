//! Wire types for the Yggdrasil JSON surface.
//!
//! Field names follow the protocol exactly (camelCase, and the odd
//! lowercase `signaturePublickey`). Optional fields are omitted from
//! the emitted JSON rather than serialized as null.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A profile property as transmitted: for the `textures` property,
/// `value` is base64 of the canonical payload JSON and `signature`
/// (when present) is base64 of the RSA signature over those exact
/// `value` bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A full profile document (profile endpoint, hasJoined response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub id: String,
    pub name: String,
    pub properties: Vec<ProfileProperty>,
}

/// The `{id, name}` shape used by name lookup and authentication
/// responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub id: String,
    pub name: String,
}

/// Client agent info sent with authenticate. Accepted and recorded,
/// never acted on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub client_token: Option<String>,
    #[serde(default)]
    pub request_user: bool,
    #[serde(default)]
    pub agent: Option<Agent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub access_token: String,
    pub client_token: String,
    pub available_profiles: Vec<ProfileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_profile: Option<ProfileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub access_token: String,
    #[serde(default)]
    pub client_token: Option<String>,
    #[serde(default)]
    pub request_user: bool,
    #[serde(default)]
    pub selected_profile: Option<ProfileRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub client_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_profile: Option<ProfileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub access_token: String,
    #[serde(default)]
    pub client_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    pub access_token: String,
    #[serde(default)]
    pub client_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignoutRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub access_token: String,
    pub selected_profile: String,
    pub server_id: String,
}

/// Minimal user info returned when `requestUser` is set.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub properties: Vec<ProfileProperty>,
}

/// The `GET /` API descriptor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetadata {
    pub meta: MetaInfo,
    pub skin_domains: Vec<String>,
    #[serde(rename = "signaturePublickey")]
    pub signature_public_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    pub server_name: String,
    pub implementation_name: String,
    pub implementation_version: String,
    pub links: BTreeMap<String, String>,
    #[serde(rename = "feature.non_email_login")]
    pub feature_non_email_login: bool,
}

/// The Yggdrasil error wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_omitted_when_absent() {
        let prop = ProfileProperty {
            name: "textures".into(),
            value: "abc".into(),
            signature: None,
        };
        let json = serde_json::to_string(&prop).unwrap();
        assert!(!json.contains("signature"));
    }

    #[test]
    fn authenticate_request_tolerates_missing_optionals() {
        let req: AuthenticateRequest = serde_json::from_str(
            r#"{"username":"test1@example.com","password":"password123"}"#,
        )
        .unwrap();
        assert!(req.client_token.is_none());
        assert!(!req.request_user);
        assert!(req.agent.is_none());
    }

    #[test]
    fn metadata_uses_protocol_field_names() {
        let meta = ApiMetadata {
            meta: MetaInfo {
                server_name: "askr".into(),
                implementation_name: "askr".into(),
                implementation_version: "0.3.0".into(),
                links: BTreeMap::new(),
                feature_non_email_login: true,
            },
            skin_domains: vec![".example.com".into()],
            signature_public_key: "-----BEGIN PUBLIC KEY-----".into(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"signaturePublickey\""));
        assert!(json.contains("\"feature.non_email_login\":true"));
        assert!(json.contains("\"skinDomains\""));
    }
}
