//! Command implementations for sdkshim-cli

pub mod init;
pub mod patch;
pub mod plan;
pub mod show;
pub mod wrap;

pub use init::run_init;
pub use patch::run_patch;
pub use plan::run_plan;
pub use show::run_show;
pub use wrap::run_wrapped;
