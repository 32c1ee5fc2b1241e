//! ripcomp-preview: Turns match results into completion items with
//! highlighted context previews.

pub mod highlight;
pub mod item;
pub mod preview;

pub use highlight::{Highlighter, StyledLine, StyledSegment};
pub use item::{present, CompletionItem};
pub use preview::{Preview, PreviewLine};
