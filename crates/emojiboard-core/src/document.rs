//! The board document: an immutable snapshot value holding the background
//! reference and the placed emojis, plus its canonical JSON encoding.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Identifier of an emoji within one document. Assigned once at creation,
/// monotonically increasing, never reused.
pub type EmojiId = i32;

/// Errors from the document serializer.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("corrupt document data: {0}")]
    Corrupt(String),
}

/// The document's background reference.
///
/// Equality is structural: two `Url` backgrounds with the same string are
/// the same background.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Background {
    /// No background.
    #[default]
    Blank,
    /// An external resource locator, resolved asynchronously.
    Url(String),
    /// Inline raster bytes, stored as base64 in the encoded form.
    ImageData(Vec<u8>),
}

impl Background {
    /// The url, if this is a remote reference.
    pub fn url(&self) -> Option<&str> {
        match self {
            Background::Url(url) => Some(url),
            _ => None,
        }
    }

    /// The inline bytes, if this is embedded data.
    pub fn image_data(&self) -> Option<&[u8]> {
        match self {
            Background::ImageData(data) => Some(data),
            _ => None,
        }
    }
}

// Encoded as an object carrying exactly one of its shapes: {"url": ...},
// {"imageData": <base64>}, or {} for blank.
impl Serialize for Background {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Background::Blank => serializer.serialize_map(Some(0))?.end(),
            Background::Url(url) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("url", url)?;
                map.end()
            }
            Background::ImageData(data) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("imageData", &STANDARD.encode(data))?;
                map.end()
            }
        }
    }
}

// Decode tries `url` first, falls back to `imageData`, and defaults to
// blank. Wrong-typed or undecodable payloads fall through rather than
// failing the whole document.
impl<'de> Deserialize<'de> for Background {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::deserialize(deserializer)?;
        if let Some(url) = map.get("url").and_then(|v| v.as_str()) {
            return Ok(Background::Url(url.to_string()));
        }
        if let Some(encoded) = map.get("imageData").and_then(|v| v.as_str()) {
            if let Ok(data) = STANDARD.decode(encoded) {
                return Ok(Background::ImageData(data));
            }
        }
        Ok(Background::Blank)
    }
}

/// One placed emoji. Position is in document space with the origin at the
/// center of the board; `size` is the rendered edge length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub(crate) id: EmojiId,
    pub(crate) text: String,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) size: i32,
}

impl Emoji {
    pub fn id(&self) -> EmojiId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn size(&self) -> i32 {
        self.size
    }
}

/// A complete, immutable snapshot of the board.
///
/// Snapshots are values: every edit produces a new snapshot via the
/// `with_*` primitives, and the editing engine keeps whole prior snapshots
/// as its undo entries. Emoji insertion order is the rendering z-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BoardRepr")]
pub struct BoardDocument {
    background: Background,
    emojis: Vec<Emoji>,
    /// Next id to assign. Part of the value so that undo restores the
    /// exact former counter state.
    #[serde(skip_serializing)]
    next_id: EmojiId,
}

/// Wire shape of a persisted document; the id counter is reconstructed on
/// decode rather than stored.
#[derive(Deserialize)]
struct BoardRepr {
    #[serde(default)]
    background: Background,
    #[serde(default)]
    emojis: Vec<Emoji>,
}

impl From<BoardRepr> for BoardDocument {
    fn from(repr: BoardRepr) -> Self {
        // There is no delete operation, so the highest id ever assigned is
        // still present and max + 1 reconstructs the counter exactly.
        let next_id = repr.emojis.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            background: repr.background,
            emojis: repr.emojis,
            next_id,
        }
    }
}

impl Default for BoardDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardDocument {
    /// Create a new empty document with a blank background.
    pub fn new() -> Self {
        Self {
            background: Background::Blank,
            emojis: Vec::new(),
            next_id: 1,
        }
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Emojis in z-order (back to front).
    pub fn emojis(&self) -> &[Emoji] {
        &self.emojis
    }

    /// Look up an emoji by id.
    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    /// A snapshot with `background` replaced.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// A snapshot with a new emoji appended on top, and its assigned id.
    pub fn with_emoji(mut self, text: &str, x: i32, y: i32, size: i32) -> (Self, EmojiId) {
        let id = self.next_id;
        self.next_id += 1;
        self.emojis.push(Emoji {
            id,
            text: text.to_string(),
            x,
            y,
            size,
        });
        (self, id)
    }

    /// A snapshot with the emoji `id` passed through `update`. Returns the
    /// input unchanged when no emoji has that id.
    pub fn with_emoji_updated(mut self, id: EmojiId, update: impl FnOnce(&mut Emoji)) -> Self {
        if let Some(emoji) = self.emojis.iter_mut().find(|e| e.id == id) {
            update(emoji);
        }
        self
    }

    /// Encode to the canonical JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a previously encoded document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::Corrupt(e.to_string()))
    }
}
