pub mod document;
pub mod item;
pub mod position;
pub mod relation;
pub mod span;

pub use document::Document;
pub use item::Item;
pub use position::{compare_positions, Position, Scope};
pub use relation::{SpanRelation, SPAN_COMPARE_GE, SPAN_COMPARE_LE};
pub use span::{Change, Direction, SearchDirection, Span, SpanSpec};
