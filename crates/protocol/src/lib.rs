#![forbid(unsafe_code)]

mod command;
mod parse;
pub mod wire;

pub use command::{Command, Method, Route};
pub use parse::Parse;
pub use wire::{Reply, Role};
