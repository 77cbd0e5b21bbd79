// Platform-specific code module

pub mod nvidia_smi;
pub mod subprocess;
pub mod user;

pub use nvidia_smi::NvidiaSmiSource;
pub use subprocess::run_with_timeout;
pub use user::current_username;
