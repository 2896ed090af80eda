//! Circuit components.

mod linear_line;
mod vsource;
mod terminator;

pub use linear_line::LinearLine;
pub use terminator::ResistiveTerminator;
pub use vsource::HarmonicVSource;
