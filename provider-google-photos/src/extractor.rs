//! # Shared Album Page Extraction
//!
//! Turns the HTML of a shared album page into an [`AlbumRecord`].
//!
//! ## Overview
//!
//! The page has no API. Its items live in an inline script as a bracket-nested
//! literal registered under the `ds:1` key. The layout of that literal is
//! positional and undocumented, so extraction is hidden behind the
//! [`PageToAlbum`] trait and each known layout is a separate versioned
//! strategy.
//!
//! ## Layout handled by [`SharedAlbumPageV1`]
//!
//! ```text
//! [ header, [ item, item, ... ], token, ... ]
//!
//! item = [ id, [url, width, height], slot2, slot3, ... ]
//! ```
//!
//! - The item list is at index 1 when that is an array, otherwise index 0.
//! - Slots from index 2 hold timestamps (directly or as the first element of
//!   a nested array) mixed with unrelated numbers.
//! - The first non-empty string from index 3 is the caption.

use std::sync::{Arc, LazyLock};

use bridge_traits::album::{AlbumRecord, MediaRecord};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::error::ExtractionError;
use crate::lexer::{balanced_array_span, SpanError};
use crate::value::LooseValue;

/// Title used when the page carries no `og:title`
pub const DEFAULT_ALBUM_TITLE: &str = "Google Photos Album";

/// 2000-01-01T00:00:00Z in Unix milliseconds
const TIMESTAMP_FLOOR_MILLIS: i64 = 946_684_800_000;

/// Tolerated clock skew of the source, in milliseconds
const TIMESTAMP_SKEW_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// First item slot that may hold a timestamp
const TIMESTAMP_FIRST_SLOT: usize = 2;

/// First item slot that may hold a caption
const DESCRIPTION_FIRST_SLOT: usize = 3;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta property="og:title" content="([^"]+)">"#).expect("valid title regex")
});

static TITLE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*·.*$").expect("valid title suffix regex"));

static DATA_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"key:\s*'ds:1'.*?data:").expect("valid anchor regex"));

/// A versioned strategy that maps one shared-album page layout to records.
pub trait PageToAlbum: Send + Sync {
    /// Identifier of the page layout this strategy understands
    fn version(&self) -> &'static str;

    /// Extract the album found at `source_url` from its page HTML.
    fn extract(&self, html: &str, source_url: &str) -> Result<AlbumRecord, ExtractionError>;
}

/// Strategy for the `ds:1` inline-literal layout
pub struct SharedAlbumPageV1 {
    clock: Arc<dyn Clock>,
}

impl SharedAlbumPageV1 {
    /// `clock` bounds timestamp candidates from above.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn items_list(root: &LooseValue) -> &[LooseValue] {
        root.get(1)
            .and_then(LooseValue::as_array)
            .or_else(|| root.get(0).and_then(LooseValue::as_array))
            .unwrap_or(&[])
    }

    fn parse_item(&self, item: &LooseValue) -> Option<MediaRecord> {
        let slots = item.as_array().filter(|slots| slots.len() >= 2)?;

        let item_id = slots[0].as_str().unwrap_or_default().to_string();

        let media = slots[1].as_array().filter(|media| !media.is_empty())?;
        let source_url = media[0].as_non_empty_str()?.to_string();
        let (width, height) = if media.len() >= 3 {
            (media[1].as_dimension(), media[2].as_dimension())
        } else {
            (0, 0)
        };

        Some(MediaRecord {
            item_id,
            source_url,
            width,
            height,
            taken_at: self.earliest_timestamp(slots),
            description: slots
                .iter()
                .skip(DESCRIPTION_FIRST_SLOT)
                .find_map(LooseValue::as_non_empty_str)
                .map(str::to_string),
            uploader_name: None,
        })
    }

    /// Smallest plausible millisecond timestamp across the item's slots.
    ///
    /// Several slots carry epoch-millisecond values; the capture time is the
    /// earliest of them, the later ones are upload and edit times.
    fn earliest_timestamp(&self, slots: &[LooseValue]) -> Option<DateTime<Utc>> {
        let ceiling = self.clock.unix_timestamp_millis() + TIMESTAMP_SKEW_MILLIS;
        let plausible = |v: &i64| *v > TIMESTAMP_FLOOR_MILLIS && *v < ceiling;

        slots
            .iter()
            .skip(TIMESTAMP_FIRST_SLOT)
            .flat_map(|slot| {
                let nested = slot.get(0).and_then(LooseValue::as_epoch_millis);
                let direct = slot.as_epoch_millis();
                nested.into_iter().chain(direct)
            })
            .filter(plausible)
            .min()
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl PageToAlbum for SharedAlbumPageV1 {
    fn version(&self) -> &'static str {
        "ds1-v1"
    }

    fn extract(&self, html: &str, source_url: &str) -> Result<AlbumRecord, ExtractionError> {
        let title = extract_title(html);

        let anchor = DATA_ANCHOR_RE
            .find(html)
            .ok_or(ExtractionError::MissingAnchor)?;

        let span = balanced_array_span(html, anchor.end()).map_err(|e| match e {
            SpanError::NoStart => ExtractionError::MissingArrayStart,
            SpanError::Unbalanced => ExtractionError::UnbalancedArray,
        })?;

        let root = LooseValue::parse(span)
            .map_err(|e| ExtractionError::MalformedPayload(e.to_string()))?;
        if root.as_array().is_none() {
            return Err(ExtractionError::UnexpectedRoot);
        }

        let candidates = Self::items_list(&root);
        let items: Vec<MediaRecord> = candidates
            .iter()
            .filter_map(|item| self.parse_item(item))
            .collect();

        debug!(
            strategy = self.version(),
            candidates = candidates.len(),
            items = items.len(),
            payload_bytes = span.len(),
            "Extracted album payload"
        );

        Ok(AlbumRecord {
            source_identifier: source_url.to_string(),
            title,
            items,
        })
    }
}

/// Album title from `og:title`, cleaned of its date-range and emoji suffix.
pub fn extract_title(html: &str) -> String {
    let raw = TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_ALBUM_TITLE);

    clean_title(&decode_html_entities(raw))
}

/// Strip a `· <dates>` suffix, surrounding whitespace and a trailing camera emoji.
pub fn clean_title(title: &str) -> String {
    let without_dates = TITLE_SUFFIX_RE.replace(title, "");
    let trimmed = without_dates.trim();
    trimmed
        .strip_suffix(" 📸")
        .unwrap_or(trimmed)
        .trim_end()
        .to_string()
}

/// Decode the character references that appear in page metadata.
///
/// Handles the common named references plus decimal and hex numeric ones.
/// Unknown or malformed references are left as written.
pub fn decode_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            decode_reference(&tail[1..semi]).map(|c| (c, semi + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "middot" => Some('·'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "hellip" => Some('…'),
        _ => None,
    }
}
