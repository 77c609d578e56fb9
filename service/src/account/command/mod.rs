//! [`Command`]s of an [`Account`].
//!
//! [`Account`]: super::Account

pub mod apply_auth_event;
pub mod cancel_subscription;
pub mod initialize;
pub mod load_subscription;
pub mod refresh_session;
pub mod resend_verification;
pub mod reset_password;
pub mod sign_in;
pub mod sign_in_with_provider;
pub mod sign_out;
pub mod sign_up;
pub mod update_password;
pub mod update_preferences;
pub mod update_profile;
pub mod upgrade_subscription;
pub mod verify;

pub use crate::command::Command;

pub use self::{
    apply_auth_event::ApplyAuthEvent, cancel_subscription::CancelSubscription,
    initialize::Initialize, load_subscription::LoadSubscription,
    refresh_session::RefreshSession, resend_verification::ResendVerification,
    reset_password::ResetPassword,
    sign_in::SignIn, sign_in_with_provider::SignInWithProvider,
    sign_out::SignOut, sign_up::SignUp, update_password::UpdatePassword,
    update_preferences::UpdatePreferences, update_profile::UpdateProfile,
    upgrade_subscription::UpgradeSubscription, verify::Verify,
};
