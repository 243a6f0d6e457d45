//! Typed model of the declarative command schema.
//!
//! A command declaration maps one-to-one onto a YAML file in the surface
//! tree: release-track applicability, help text, argument specs, the request
//! mapping onto an API collection, optional operation-polling metadata, and
//! output directives. Types here deserialize documents *after* `!REF`
//! resolution and track selection (see [`crate::loader`]).

pub mod arguments;
pub mod command;
pub mod hook;
pub mod request;

pub use arguments::{
    ActionSpec, ArgDictSpec, ArgTypeSpec, Argument, ArgumentGroup, Arguments, Choice, Labels,
    Param, ResourceParam, SpecField,
};
pub use command::{CommandSpec, CommandType, Deprecate, GroupSpec, HelpText};
pub use hook::HookPath;
pub use request::{AsyncSpec, AsyncState, Output, Request};
