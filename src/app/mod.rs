//! Application edge: the hexagonal boundary between the two front-panel
//! services and the outside world.
//!
//! Services never touch a socket, UART or display directly.  Output goes
//! through the port traits in [`ports`]; [`transport`] adapts any
//! byte-oriented channel into a frame sink and a frame source.

pub mod ports;
pub mod transport;
