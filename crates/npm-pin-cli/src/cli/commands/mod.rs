//! Output modes: print the block, or rewrite a .bzl file.

mod print;
mod update;

pub use print::run_print;
pub use update::run_update;
