//! Infrastructure layer.

pub mod auth;
pub mod billing;
pub mod language;
pub mod storage;

pub use self::{
    auth::Auth, billing::Billing, language::Language, storage::Storage,
};
