//! [`Command`] for updating the profile of the signed-in [`User`].

use derive_more::{Display, Error, From};
use tracerr::Traced;
use url::Url;

use crate::{
    account::Account,
    domain::{user, User},
    error::{Categorize, Category},
    infra::{auth, Auth},
};

use super::Command;

/// [`Command`] for updating the profile of the signed-in [`User`].
///
/// Omitted fields are left intact.
#[derive(Clone, Debug, Default)]
pub struct UpdateProfile {
    /// New display name.
    pub name: Option<String>,

    /// New avatar URL.
    pub avatar_url: Option<Url>,

    /// [`user::Metadata`] to merge into the existing one.
    pub metadata: user::Metadata,
}

impl<A, B, S> Command<UpdateProfile> for Account<A, B, S>
where
    A: Auth<auth::UpdateUser, Ok = User, Err = Traced<auth::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateProfile) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let UpdateProfile {
                name,
                avatar_url,
                mut metadata,
            } = cmd;

            if self.session().is_none() {
                return Err(tracerr::new!(E::Unauthorized));
            }
            if let Some(name) = name {
                let name = user::Name::new(name.trim())
                    .ok_or(E::InvalidName)
                    .map_err(tracerr::wrap!())?;
                _ = metadata
                    .insert(user::Metadata::FULL_NAME, name.to_string());
            }
            if let Some(url) = avatar_url {
                _ = metadata.insert(user::Metadata::AVATAR_URL, url.as_str());
            }

            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let user = self
                .auth()
                .execute(auth::UpdateUser {
                    metadata,
                    password: None,
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.set_user(user.clone());

            self.succeeded("Profile updated successfully");
            Ok(user)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`UpdateProfile`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// No [`User`] is signed in.
    #[display("User not authenticated")]
    Unauthorized,

    /// Name is malformed.
    #[display("Please enter a valid name")]
    InvalidName,

    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`Auth`] error.
    #[display("{_0}")]
    #[from]
    Auth(auth::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Unauthorized => Category::Unauthorized,
            Self::InvalidName => Category::Validation,
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
        }
    }
}
