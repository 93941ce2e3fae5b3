pub mod locate;
pub mod markers;

pub use locate::{locate, MatchContext};
pub use markers::{LineMarkerIndex, LineMarkers, Marker, MarkerKind, SpanMarker};
