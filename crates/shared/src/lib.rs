pub mod domain;
pub mod error;
pub mod protocol;

pub use domain::{Identifier, Record, SelectionSet, StateKey};
pub use error::{Result, SelectionError};
pub use protocol::{CheckMarker, Coverage, SelectionEvent, ViewEvent};
