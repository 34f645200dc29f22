//! Renderer status codes.
//!
//! The renderer reports asynchronous progress through a single integer
//! callback. Codes are decoded into a closed set so every consumer matches
//! exhaustively.

/// Renderer finished creating its canvas.
pub const STATUS_CREATED: i32 = 0;
/// Emitted by existing renderers without a defined meaning; kept inert.
pub const STATUS_RESERVED: i32 = 1;
/// Renderer finished reconfiguring for the last requested size.
pub const STATUS_RESIZE_ACKNOWLEDGED: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererStatus {
    Created,
    /// Recognized, no effect.
    Reserved,
    ResizeAcknowledged,
    Unrecognized(i32),
}

impl RendererStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            STATUS_CREATED => Self::Created,
            STATUS_RESERVED => Self::Reserved,
            STATUS_RESIZE_ACKNOWLEDGED => Self::ResizeAcknowledged,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Created => STATUS_CREATED,
            Self::Reserved => STATUS_RESERVED,
            Self::ResizeAcknowledged => STATUS_RESIZE_ACKNOWLEDGED,
            Self::Unrecognized(code) => code,
        }
    }
}

impl From<i32> for RendererStatus {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}
