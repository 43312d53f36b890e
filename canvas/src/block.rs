//! Block model: content kinds, the block record, and sparse updates.
//!
//! A block's payload depends on its kind, so content is a tagged sum type
//! rather than a kind string plus a grab-bag of optional URL/text fields.
//! On the wire the tag and payload are flattened into the block object:
//!
//! ```json
//! { "id": "…", "kind": "embed", "url": "https://…", "title": "…", "x": 0.0, … }
//! ```

#[cfg(test)]
#[path = "block_test.rs"]
mod block_test;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::{Geometry, clamp_height, clamp_position, clamp_width};

/// Unique identifier for a block.
pub type BlockId = Uuid;

/// Identifier of the dashboard a block belongs to.
pub type DashboardId = Uuid;

/// The kind of content a block displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Sandboxed embed of an external page.
    Embed,
    /// Unsandboxed external page.
    Iframe,
    /// Freeform text.
    Text,
    /// Clickable link that opens in a new tab.
    Link,
    /// Remote image.
    Image,
    /// Downloadable file link.
    File,
}

impl ElementKind {
    pub const ALL: [Self; 6] = [Self::Embed, Self::Iframe, Self::Text, Self::Link, Self::Image, Self::File];

    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Embed => "embed",
            Self::Iframe => "iframe",
            Self::Text => "text",
            Self::Link => "link",
            Self::Image => "image",
            Self::File => "file",
        }
    }

    /// Parse a wire name. Returns `None` for unknown kinds.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Whether the payload of this kind must be an absolute URL.
    #[must_use]
    pub fn requires_absolute_url(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// What a block shows. Each variant carries only the field its kind uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockContent {
    Embed { url: String },
    Iframe { url: String },
    Text { text: String },
    Link { url: String },
    Image { url: String },
    File { url: String },
}

impl BlockContent {
    /// Build content from a kind and its raw payload (URL or text).
    #[must_use]
    pub fn from_parts(kind: ElementKind, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        match kind {
            ElementKind::Embed => Self::Embed { url: payload },
            ElementKind::Iframe => Self::Iframe { url: payload },
            ElementKind::Text => Self::Text { text: payload },
            ElementKind::Link => Self::Link { url: payload },
            ElementKind::Image => Self::Image { url: payload },
            ElementKind::File => Self::File { url: payload },
        }
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Embed { .. } => ElementKind::Embed,
            Self::Iframe { .. } => ElementKind::Iframe,
            Self::Text { .. } => ElementKind::Text,
            Self::Link { .. } => ElementKind::Link,
            Self::Image { .. } => ElementKind::Image,
            Self::File { .. } => ElementKind::File,
        }
    }

    /// The URL or text carried by this content.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Embed { url }
            | Self::Iframe { url }
            | Self::Link { url }
            | Self::Image { url }
            | Self::File { url } => url,
            Self::Text { text } => text,
        }
    }
}

/// A block as stored in the canvas and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique identifier for this block.
    pub id: BlockId,
    /// The dashboard this block belongs to.
    pub dashboard_id: DashboardId,
    /// Kind tag and payload, flattened into the block object.
    #[serde(flatten)]
    pub content: BlockContent,
    /// Display title.
    pub title: String,
    /// Left edge in canvas coordinates.
    pub x: f64,
    /// Top edge in canvas coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Stacking order; higher values paint above lower ones.
    pub z_index: i64,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Block {
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.x = geometry.x;
        self.y = geometry.y;
        self.width = geometry.width;
        self.height = geometry.height;
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Stacking order: `z_index`, then `created_at`, then `id`, ascending.
    /// Lower blocks paint first.
    #[must_use]
    pub fn cmp_stacking(&self, other: &Self) -> Ordering {
        self.z_index
            .cmp(&other.z_index)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Apply the present fields of `partial`.
    pub fn apply(&mut self, partial: &PartialBlock) {
        if let Some(x) = partial.x {
            self.x = x;
        }
        if let Some(y) = partial.y {
            self.y = y;
        }
        if let Some(w) = partial.width {
            self.width = w;
        }
        if let Some(h) = partial.height {
            self.height = h;
        }
        if let Some(z) = partial.z_index {
            self.z_index = z;
        }
        if let Some(ref title) = partial.title {
            self.title.clone_from(title);
        }
        if let Some(ref content) = partial.content {
            self.content = content.clone();
        }
    }
}

/// Sparse update for a block. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement content, nested as `{"kind": …, …}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BlockContent>,
}

impl PartialBlock {
    /// A position-only update.
    #[must_use]
    pub fn moved(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// A size-only update.
    #[must_use]
    pub fn resized(width: f64, height: f64) -> Self {
        Self { width: Some(width), height: Some(height), ..Default::default() }
    }

    /// Combine with a later update; fields present in `later` win.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            x: later.x.or(self.x),
            y: later.y.or(self.y),
            width: later.width.or(self.width),
            height: later.height.or(self.height),
            z_index: later.z_index.or(self.z_index),
            title: later.title.or(self.title),
            content: later.content.or(self.content),
        }
    }

    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.z_index.is_none()
            && self.title.is_none()
            && self.content.is_none()
    }

    /// Whether every present geometry field is a finite number.
    #[must_use]
    pub fn has_finite_geometry(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .into_iter()
            .flatten()
            .all(f64::is_finite)
    }

    /// Clamp present geometry fields to the block bounds.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.x = self.x.map(clamp_position);
        self.y = self.y.map(clamp_position);
        self.width = self.width.map(clamp_width);
        self.height = self.height.map(clamp_height);
        self
    }
}
