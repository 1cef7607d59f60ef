//! Subcommands: `run` dispatches events, `validate` and `info` only read config.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;
