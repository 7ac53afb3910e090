//! Signed texture payload assembly.
//!
//! Builds the `textures` profile property: a canonical JSON payload,
//! base64-encoded into `value`, optionally signed with the server RSA
//! key. The signature covers the emitted `value` bytes exactly; the
//! payload is never re-serialized after encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::keys::{KeyError, SignatureKeys};
use crate::models::profile::{Profile, SkinModel};
use crate::models::wire::{ProfileDocument, ProfileProperty};

#[derive(Debug, Error)]
pub enum TexturesError {
    #[error("payload serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Key(#[from] KeyError),
}

// Field order is part of the canonical form; serde emits struct fields
// in declaration order.
#[derive(Debug, Serialize)]
struct TexturesPayload<'a> {
    timestamp: i64,
    #[serde(rename = "profileId")]
    profile_id: &'a str,
    #[serde(rename = "profileName")]
    profile_name: &'a str,
    textures: TextureSet<'a>,
}

#[derive(Debug, Serialize)]
struct TextureSet<'a> {
    #[serde(rename = "SKIN", skip_serializing_if = "Option::is_none")]
    skin: Option<TextureEntry<'a>>,
    #[serde(rename = "CAPE", skip_serializing_if = "Option::is_none")]
    cape: Option<TextureEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct TextureEntry<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<TextureMetadata>,
}

#[derive(Debug, Serialize)]
struct TextureMetadata {
    model: &'static str,
}

/// Assemble the transmitted profile document for `profile`, carrying
/// exactly one `textures` property. With `signed`, the property gains
/// a base64 RSA-SHA1 signature over the `value` string.
pub fn assemble_profile(
    profile: &Profile,
    keys: &SignatureKeys,
    signed: bool,
) -> Result<ProfileDocument, TexturesError> {
    let payload = TexturesPayload {
        timestamp: Utc::now().timestamp_millis(),
        profile_id: &profile.id,
        profile_name: &profile.name,
        textures: TextureSet {
            skin: profile.skin_url.as_deref().map(|url| TextureEntry {
                url,
                metadata: match profile.skin_model {
                    SkinModel::Slim => Some(TextureMetadata { model: "slim" }),
                    SkinModel::Classic => None,
                },
            }),
            cape: profile.cape_url.as_deref().map(|url| TextureEntry {
                url,
                metadata: None,
            }),
        },
    };

    let value = BASE64.encode(serde_json::to_vec(&payload)?);
    let signature = if signed {
        Some(BASE64.encode(keys.sign(value.as_bytes())?))
    } else {
        None
    };

    Ok(ProfileDocument {
        id: profile.id.clone(),
        name: profile.name.clone(),
        properties: vec![ProfileProperty {
            name: "textures".into(),
            value,
            signature,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::new_simple_id;

    fn keys() -> SignatureKeys {
        SignatureKeys::generate(1024).unwrap()
    }

    fn textured_profile() -> Profile {
        Profile {
            id: new_simple_id(),
            name: "Tester".into(),
            skin_url: Some("http://textures.example.com/skin/tester.png".into()),
            cape_url: Some("http://textures.example.com/cape/tester.png".into()),
            skin_model: SkinModel::Slim,
        }
    }

    #[test]
    fn payload_field_order_is_canonical() {
        let keys = keys();
        let doc = assemble_profile(&textured_profile(), &keys, false).unwrap();
        let raw = BASE64.decode(&doc.properties[0].value).unwrap();
        let text = String::from_utf8(raw).unwrap();

        let ts = text.find("\"timestamp\"").unwrap();
        let pid = text.find("\"profileId\"").unwrap();
        let pname = text.find("\"profileName\"").unwrap();
        let tex = text.find("\"textures\"").unwrap();
        assert!(ts < pid && pid < pname && pname < tex);
        assert!(text.contains("\"SKIN\""));
        assert!(text.contains("\"CAPE\""));
        assert!(text.contains("\"model\":\"slim\""));
    }

    #[test]
    fn signature_verifies_over_value_bytes() {
        let keys = keys();
        let doc = assemble_profile(&textured_profile(), &keys, true).unwrap();
        let prop = &doc.properties[0];
        let sig = BASE64.decode(prop.signature.as_ref().unwrap()).unwrap();
        assert!(keys.verify(prop.value.as_bytes(), &sig));
    }

    #[test]
    fn unsigned_omits_signature() {
        let keys = keys();
        let doc = assemble_profile(&textured_profile(), &keys, false).unwrap();
        assert!(doc.properties[0].signature.is_none());
    }

    #[test]
    fn untextured_profile_has_empty_texture_set() {
        let keys = keys();
        let profile = Profile::named(new_simple_id(), "Bare");
        let doc = assemble_profile(&profile, &keys, false).unwrap();
        let raw = BASE64.decode(&doc.properties[0].value).unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("\"textures\":{}"));
        assert!(!text.contains("SKIN"));
    }

    #[test]
    fn successive_signatures_differ_but_both_verify() {
        let keys = keys();
        let profile = textured_profile();
        let a = assemble_profile(&profile, &keys, true).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = assemble_profile(&profile, &keys, true).unwrap();
        for doc in [&a, &b] {
            let prop = &doc.properties[0];
            let sig = BASE64.decode(prop.signature.as_ref().unwrap()).unwrap();
            assert!(keys.verify(prop.value.as_bytes(), &sig));
        }
        assert_ne!(a.properties[0].value, b.properties[0].value);
    }
}
