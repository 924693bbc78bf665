//! Tool name synthesis for Composio actions.
//!
//! Agent runtimes cap function names at 64 characters, while Composio action
//! identifiers are long upper-case strings (`GMAIL_SEND_EMAIL`,
//! `GOOGLECALENDAR_FIND_FREE_SLOTS`, ...). Names are slugged and prefixed; when
//! the result would exceed the cap it is truncated and suffixed with a short
//! digest of the original inputs so distinct pairs stay distinct.

use sha1::{Digest, Sha1};

/// Maximum length of a synthesized tool name.
pub const MAX_TOOL_NAME_LEN: usize = 64;

const PREFIX: &str = "composio_";
const DIGEST_LEN: usize = 8;

/// Normalize an identifier into `[a-z0-9_]+`.
///
/// Runs of other characters (and runs of underscores) collapse to a single
/// `_`, edges are trimmed, and an empty result becomes `x`.
pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;

    for ch in value.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    if out.is_empty() {
        "x".to_string()
    } else {
        out
    }
}

/// Synthesize the tool name for a (service, action) pair.
///
/// Pure function of its inputs: the same pair always yields the same name,
/// in this process and any other.
pub fn tool_name(service: &str, action: &str) -> String {
    let base = format!("{PREFIX}{}_{}", slug(service), slug(action));
    if base.len() <= MAX_TOOL_NAME_LEN {
        return base;
    }

    let digest = Sha1::digest(format!("{service}:{action}").as_bytes());
    let suffix = format!("_{}", &hex::encode(digest)[..DIGEST_LEN]);
    let keep = MAX_TOOL_NAME_LEN - suffix.len();
    // `slug` only emits ASCII, so byte slicing is on a char boundary.
    format!("{}{}", &base[..keep], suffix)
}

/// Whether a registry name could have been produced for this service.
pub fn belongs_to_service(name: &str, service: &str) -> bool {
    let prefix = format!("{PREFIX}{}_", slug(service));
    name.starts_with(&prefix)
}
