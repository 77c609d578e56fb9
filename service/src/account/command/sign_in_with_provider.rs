//! [`Command`] for starting a sign-in with a third-party identity provider.

use derive_more::{Display, Error, From};
use tracerr::Traced;
use url::Url;

use crate::{
    account::{Account, CALLBACK_PATH},
    error::{Categorize, Category},
    infra::{auth, Auth},
};

use super::Command;

/// [`Command`] for starting a sign-in with a third-party identity provider.
///
/// Returns the URL to redirect the client to. The resulting [`Session`]
/// arrives later as an [`AuthEvent`].
///
/// [`AuthEvent`]: auth::AuthEvent
/// [`Session`]: crate::domain::Session
#[derive(Clone, Copy, Debug)]
pub struct SignInWithProvider(pub auth::OAuthProvider);

impl<A, B, S> Command<SignInWithProvider> for Account<A, B, S>
where
    A: Auth<auth::AuthorizeUrl, Ok = Url, Err = Traced<auth::Error>>,
{
    type Ok = Url;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        SignInWithProvider(provider): SignInWithProvider,
    ) -> Result<Self::Ok, Self::Err> {
        let res = self
            .auth()
            .execute(auth::AuthorizeUrl {
                provider,
                redirect_to: self.config().redirect_to(CALLBACK_PATH),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError));

        self.report(res)
    }
}

/// Error of [`SignInWithProvider`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Auth`] error.
    #[display("{_0}")]
    Auth(auth::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Auth(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{account::spec::account, infra::auth::OAuthProvider};

    use super::SignInWithProvider;

    #[tokio::test]
    async fn redirects_back_to_callback() {
        let account = account(false);

        let url = account
            .execute(SignInWithProvider(OAuthProvider::Github))
            .await
            .unwrap();

        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert!(pairs.contains(&("provider".into(), "github".into())));
        assert!(pairs.contains(&(
            "redirect_to".into(),
            "https://notecraft.test/auth/callback".into(),
        )));
    }
}
