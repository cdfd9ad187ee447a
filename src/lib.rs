//! # BASIC Machine
//!
//! A compiler and virtual machine for a structured dialect of BASIC
//! in the style of QBasic: labels and line numbers, SUB and FUNCTION
//! routines with local frames, user defined TYPE records, multi
//! dimensional arrays, SELECT CASE, error trapping and PRINT USING.
//!
//! Programs are compiled in one pass into a flat list of operations
//! and executed in quanta so a host can stay responsive. All input and
//! output goes through the [`mach::Bindings`](mach/trait.Bindings.html)
//! trait.
//!
//! ```
//! use basic::mach::{compile, Config, Headless, Runtime};
//!
//! let program = compile("FOR i = 1 TO 3\nPRINT i\nNEXT i\n").unwrap();
//! let mut runtime = Runtime::new(program, &Config::default()).unwrap();
//! let mut screen = Headless::new();
//! runtime.run(&mut screen).unwrap();
//! assert_eq!(screen.transcript(), "1\n2\n3\n");
//! ```
//!
//! The `basic` executable runs a program file in the terminal.
//! ```text
//! basic hello.bas
//! ```

pub mod lang;
pub mod mach;
pub mod term;
