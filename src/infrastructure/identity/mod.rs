//! Identity - 本地所有者标识

mod file_identity;

pub use file_identity::FileIdentityStore;
