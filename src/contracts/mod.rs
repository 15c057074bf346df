pub mod artifacts;
pub mod resolver;
pub mod sourcify;

pub use artifacts::load_artifacts;
pub use resolver::ContractResolver;
pub use sourcify::{SourcifyClient, VerificationSource};
