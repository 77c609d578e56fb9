//! Domain definitions.

pub mod message;
pub mod subscription;
pub mod text;
pub mod tier;
pub mod user;

pub use self::{
    message::Message,
    subscription::Subscription,
    text::Text,
    tier::Tier,
    user::{Session, User},
};
