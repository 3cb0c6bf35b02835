//! Dot-command ("metaquery") interpreter.
//!
//! A line such as `.inspect aws.ec2_instance` is recognized with
//! [`Interpreter::is_metaquery`], checked with [`Interpreter::validate`],
//! and run with [`Interpreter::handle`]. [`Interpreter::complete`] serves
//! the completion dropdown and never has side effects.

pub mod complete;
pub mod dispatch;
pub mod handlers;
pub mod registry;
pub mod session;
pub mod validate;

pub use complete::Suggestion;
pub use dispatch::{Interpreter, trim_terminator};
pub use registry::{CommandSpec, Registry};
pub use session::{Console, Session, SessionControl, TableRenderer};
pub use validate::{ValidationResult, Validator};
