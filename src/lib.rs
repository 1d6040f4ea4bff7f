//! Microwave oven front-panel library.
//!
//! Two hierarchical state machines talk over a fixed 24-byte frame
//! protocol: the oven ([`oven::OvenService`]) owns every value and decides
//! every transition, the panel ([`panel::PanelService`]) forwards button
//! presses and mirrors whatever the oven announces.  Both are pure logic;
//! I/O happens through the ports in [`app::ports`].

#![deny(unused_must_use)]

pub mod app;
pub mod codec;
pub mod config;
pub mod error;
pub mod hfsm;
pub mod oven;
pub mod panel;
pub mod time;
pub mod timers;

pub use error::{Error, Result};
