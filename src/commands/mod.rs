//! CLI command implementations.
//!
//! Each command is in its own submodule: an options struct plus an
//! `execute_*` function the binary dispatches to.

pub mod check;
pub mod describe;
pub mod index;
pub mod lint;
pub mod list;
pub mod resolve;

pub use check::{execute_check, CheckOptions};
pub use describe::{execute_describe, DescribeOptions};
pub use index::{execute_index, IndexOptions};
pub use lint::{execute_lint, LintOptions};
pub use list::{execute_list, ListOptions};
pub use resolve::{execute_resolve, ResolveOptions};
