//! Wire formats.
//!
//! Board-update deltas, the layout notation for whole positions, broadcast
//! events, and the line command parser used by the driver binary.

pub mod delta;
pub mod event;
pub mod layout;
pub mod parser;

pub use delta::{format_deltas, parse_deltas, DeltaAction, DeltaParseError, SquareDelta};
pub use event::{Event, Outbound};
pub use layout::{encode_layout, parse_layout, LayoutError, STANDARD_LAYOUT};
pub use parser::{parse_command, Action, Command};
