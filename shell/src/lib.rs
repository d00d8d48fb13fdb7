//! Shell side of the BL602 uLisp demo firmware.
//!
//! - [repl]: accumulates `a ...` console lines, with `\` continuation, into one uLisp command
//! - [backtrace]: best-effort stack dump from the frame pointer
//! - [fatal]: assert-and-halt with the SDK's assertion message format
//! - [cmd] and [args]: decoding and dispatch of console lines
//! - [led]: the blinky demo
//!
//! Nothing here touches the hardware directly, the firmware crate provides the SDK glue.
#![cfg_attr(not(test), no_std)]

// must go first, the logging macros are used by the other modules
mod fmt;

pub mod args;
pub mod backtrace;
pub mod cmd;
pub mod config;
pub mod fatal;
pub mod led;
pub mod repl;
