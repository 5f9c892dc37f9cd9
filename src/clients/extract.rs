//! Tolerant readers for the provider's loosely shaped JSON.
//!
//! Each reader is an ordered list of strategies; the first one that yields a
//! value wins.

use base64::{
    Engine as _,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;

use super::provider::ProviderProfile;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

type TokenStrategy = fn(&Value) -> Option<&str>;

fn top_level_token(v: &Value) -> Option<&str> {
    v.get("token")?.as_str()
}

fn nested_auth_token(v: &Value) -> Option<&str> {
    v.get("auth")?.get("token")?.as_str()
}

fn ticket(v: &Value) -> Option<&str> {
    v.get("ticket")?.as_str()
}

const TOKEN_STRATEGIES: &[(&str, TokenStrategy)] = &[
    ("auth.token", nested_auth_token),
    ("token", top_level_token),
    ("ticket", ticket),
];

/// Pulls the provider session token out of a login response.
#[must_use]
pub fn extract_token(response: &Value) -> Option<String> {
    TOKEN_STRATEGIES.iter().find_map(|(name, strategy)| {
        let token = strategy(response).filter(|t| !t.trim().is_empty())?;
        tracing::debug!(source = *name, "Provider token located");
        Some(token.to_string())
    })
}

/// Ids arrive as numbers or strings depending on the endpoint.
#[must_use]
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads a user object (`id`, `nickname`, `avatar_url`, `description`).
#[must_use]
pub fn profile_from_object(user: &Value) -> Option<ProviderProfile> {
    let external_id = user.get("id").and_then(id_to_string)?;
    Some(ProviderProfile {
        external_id,
        nickname: non_empty_str(user, "nickname"),
        avatar_url: non_empty_str(user, "avatar_url"),
        description: non_empty_str(user, "description"),
    })
}

/// The user object some login responses embed next to the token.
#[must_use]
pub fn embedded_profile(response: &Value) -> Option<ProviderProfile> {
    response.get("user_info").and_then(profile_from_object)
}

/// Decodes the payload segment of a JWT without checking its signature.
#[must_use]
pub fn unverified_token_payload(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_LENIENT.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// External id claimed by the provider token's unverified payload.
#[must_use]
pub fn token_subject(token: &str) -> Option<String> {
    unverified_token_payload(token)?
        .get("user_id")
        .and_then(id_to_string)
}
