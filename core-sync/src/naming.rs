//! Deterministic names shared by uploads and the existing-asset index.
//!
//! The upload filename and the index key come from the same transform, so a
//! name found in the destination album means the item was already synced.

use bridge_traits::destination::DestinationAsset;
use std::collections::HashMap;

/// Prefix marking assets created by this service
pub const BASENAME_PREFIX: &str = "gp_";

/// Stable basename map: basename without extension -> destination asset id
pub type AssetIndex = HashMap<String, String>;

/// `gp_` + item id with `/` and `:` replaced by `_`.
pub fn basename(item_id: &str) -> String {
    let safe: String = item_id
        .chars()
        .map(|c| if c == '/' || c == ':' { '_' } else { c })
        .collect();
    format!("{}{}", BASENAME_PREFIX, safe)
}

/// Strip everything from the last `.` onward.
pub fn index_key(original_file_name: &str) -> &str {
    match original_file_name.rfind('.') {
        Some(dot) => &original_file_name[..dot],
        None => original_file_name,
    }
}

/// Build the index from the destination album's current members.
pub fn build_index(assets: &[DestinationAsset]) -> AssetIndex {
    assets
        .iter()
        .map(|asset| (index_key(&asset.original_file_name).to_string(), asset.id.clone()))
        .collect()
}

/// Item description, uploader credit and source album, separated by blank lines.
pub fn compose_description(
    description: Option<&str>,
    uploader_name: Option<&str>,
    album_title: &str,
    album_url: &str,
) -> String {
    let mut text = description.unwrap_or_default().to_string();

    if let Some(uploader) = uploader_name.filter(|u| !u.is_empty()) {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str("Shared by: ");
        text.push_str(uploader);
    }

    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(&format!("Source Album: {} ({})", album_title, album_url));
    text
}
