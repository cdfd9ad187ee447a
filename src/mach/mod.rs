/*!
## Rust Machine Module

This Rust module is a compiler and virtual machine for BASIC.
Source is compiled in a single pass to a flat list of operations
which the runtime executes in quanta against a set of bindings.

*/

pub type Address = usize;

mod alloc;
mod bindings;
mod compile;
mod config;
mod expr;
mod function;
mod link;
mod memory;
mod opcode;
mod operation;
mod program;
mod runtime;
mod stack;
mod using;
mod val;

#[cfg(test)]
mod tests;

pub use alloc::{Dims, Place, SimpleType, VarType, CELL};
pub use bindings::{Bindings, Headless, LineFill, Mouse, ScreenMode};
pub use compile::{compile, split_data};
pub use config::Config;
pub use function::Function;
pub use link::Link;
pub use memory::Memory;
pub use opcode::{Binding, Handler, Opcode, Resume, Slot};
pub use operation::Operation;
pub use program::{Program, Routine};
pub use runtime::{RunState, Runtime};
pub use stack::Stack;
pub use using::{format_field, Using};
pub use val::Val;
