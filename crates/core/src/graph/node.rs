#![forbid(unsafe_code)]

/// Number of squares on the per-node progress scale.
pub const PROGRESS_STEPS: usize = 12;

/// Fallback node colour when stored or entered colour is absent/invalid.
pub const DEFAULT_NODE_COLOR: &str = "#3c4385";

/// Rendered node dimensions, used for the drag clamp.
pub const NODE_WIDTH: f64 = 212.0;
pub const NODE_HEIGHT: f64 = 50.0;

/// Ensures a leading `#` and exactly six hex digits; anything else
/// falls back to [`DEFAULT_NODE_COLOR`]. Total, never fails.
pub fn normalize_color(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DEFAULT_NODE_COLOR.to_string();
    }
    let with_hash = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    };
    let digits = &with_hash[1..];
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        with_hash
    } else {
        DEFAULT_NODE_COLOR.to_string()
    }
}

pub fn default_progress() -> [u8; PROGRESS_STEPS] {
    [0; PROGRESS_STEPS]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub description: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub progress: [u8; PROGRESS_STEPS],
    pub locked: bool,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        x: f64,
        y: f64,
        color: &str,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            x,
            y,
            color: normalize_color(color),
            progress: default_progress(),
            locked: false,
        }
    }

    /// Count of filled squares; the filled region is always a prefix.
    pub fn progress_level(&self) -> usize {
        self.progress.iter().filter(|v| **v == 1).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
}

impl Connection {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        let from_id = from_id.into();
        let to_id = to_id.into();
        Self {
            id: connection_id(&from_id, &to_id),
            from_id,
            to_id,
        }
    }

    /// True when the connection touches either endpoint of the pair,
    /// regardless of direction.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.from_id == a && self.to_id == b) || (self.from_id == b && self.to_id == a)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.from_id == node_id || self.to_id == node_id
    }
}

pub fn connection_id(from_id: &str, to_id: &str) -> String {
    format!("{from_id}_{to_id}")
}

/// Generates `node_<unix_ms>` ids with a monotonic floor, so two nodes
/// created within the same millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    last_ms: i64,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now_ms: i64) -> String {
        let ms = if now_ms > self.last_ms {
            now_ms
        } else {
            self.last_ms + 1
        };
        self.last_ms = ms;
        format!("node_{ms}")
    }
}
