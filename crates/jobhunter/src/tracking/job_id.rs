//! Stable job identifiers derived from posting URLs.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

// https://www.zhipin.com/job_detail/<id>.html
static RE_DETAIL_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"job_detail/([^./?#]+)\.html").unwrap());
// https://www.zhipin.com/web/geek/job?jid=<id>
static RE_JID_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]jid=([^&#]+)").unwrap());

const HASH_ID_LEN: usize = 16;

/// Derives the tracking key for a posting URL.
///
/// Both known URL shapes yield the embedded posting id, so the same posting
/// reached through either shape dedups to one key. Anything else falls back
/// to a truncated SHA-256 of the full URL, which is stable across runs.
pub fn derive_job_id(url: &str) -> String {
    if let Some(caps) = RE_DETAIL_PATH.captures(url) {
        return caps[1].to_string();
    }
    if let Some(caps) = RE_JID_PARAM.captures(url) {
        return caps[1].to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(HASH_ID_LEN);
    digest
}
