//! Command implementations.

mod run;
mod validate;

pub use run::run_eventer;
pub use validate::run_validate;
