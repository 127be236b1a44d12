//! Login helper for Kwikset Halo locks: walks through the two-step account
//! login, lists the homes on the account and hands out a refresh token other
//! tools can reuse.

pub mod client;
pub mod cognito;
pub mod config;
pub mod console;
pub mod home;
pub mod setup;
pub mod srp;

pub use client::{Account, Api, PreAuth};
pub use config::Config;
pub use home::{Home, HomeId};
