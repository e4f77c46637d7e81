//! Terminal I/O streams for the Forge command-line client.
//!
//! Every command talks to the terminal through one injectable
//! [`IoStreams`] bundle, carried in the command's options struct:
//!
//! - TTY detection per stream, with explicit overrides for tests and
//!   forced-terminal mode
//! - color capability state and the derived [`ColorScheme`]
//! - pager subprocess lifecycle (`start_pager` / `stop_pager`)
//! - progress-indicator lifecycle on the error stream
//! - terminal width queries with a never-failing fallback chain
//!
//! Production code builds the bundle once with [`IoStreams::system`];
//! tests use [`IoStreams::test`] and get hermetic in-memory streams with
//! no TTYs and an empty environment snapshot.

pub mod color;
pub mod env;
pub mod iostreams;
pub mod pager;
mod progress;
pub mod text;

pub use color::{ColorFn, ColorScheme, NamedColor};
pub use env::TermEnv;
pub use iostreams::{DEFAULT_WIDTH, Input, IoStreams, TestStreams, Theme};
pub use pager::{ClosedPagerPipe, PagerError};
