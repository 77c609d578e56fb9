//! [`Command`] for updating preferences of the signed-in [`User`].

use derive_more::{Display, Error, From};
use serde_json::{Map, Value};
use tracerr::Traced;

use crate::{
    account::Account,
    domain::{user, User},
    error::{Categorize, Category},
    infra::{auth, Auth},
};

use super::Command;

/// [`Command`] for updating preferences of the signed-in [`User`].
///
/// Provided preferences are merged key by key into the stored ones.
#[derive(Clone, Debug, Default)]
pub struct UpdatePreferences(pub Map<String, Value>);

impl<A, B, S> Command<UpdatePreferences> for Account<A, B, S>
where
    A: Auth<auth::UpdateUser, Ok = User, Err = Traced<auth::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        UpdatePreferences(preferences): UpdatePreferences,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let current = self
                .user()
                .ok_or(E::Unauthorized)
                .map_err(tracerr::wrap!())?;
            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            // Provider replaces top-level keys, so the nested object is
            // merged here.
            let mut merged = user::Metadata::default();
            if let Some(existing) = current
                .metadata
                .get(user::Metadata::PREFERENCES)
                .and_then(Value::as_object)
            {
                merged.merge_preferences(existing.clone());
            }
            merged.merge_preferences(preferences);

            let user = self
                .auth()
                .execute(auth::UpdateUser {
                    metadata: merged,
                    password: None,
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.set_user(user.clone());

            self.succeeded("Preferences updated");
            Ok(user)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`UpdatePreferences`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// No [`User`] is signed in.
    #[display("User not authenticated")]
    Unauthorized,

    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`Auth`] error.
    #[display("Failed to update preferences: {_0}")]
    #[from]
    Auth(auth::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Unauthorized => Category::Unauthorized,
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretString;
    use serde_json::{json, Map, Value};

    use crate::{
        account::{command::SignUp, spec::account},
        domain::user,
        error::{Categorize as _, Category},
    };

    use super::UpdatePreferences;

    fn prefs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn merges_key_by_key() {
        let account = account(false);
        _ = account
            .execute(SignUp {
                email: "writer@example.com".into(),
                password: SecretString::from("secret1".to_owned()),
                name: "Ada".into(),
                metadata: Default::default(),
            })
            .await
            .unwrap();

        _ = account
            .execute(UpdatePreferences(prefs(
                json!({"theme": "dark", "emailNotifications": true}),
            )))
            .await
            .unwrap();
        let user = account
            .execute(UpdatePreferences(prefs(json!({"theme": "light"}))))
            .await
            .unwrap();

        assert_eq!(
            user.metadata.get(user::Metadata::PREFERENCES),
            Some(&json!({"theme": "light", "emailNotifications": true})),
        );
        assert_eq!(
            user.metadata.get_str(user::Metadata::FULL_NAME),
            Some("Ada"),
        );
    }

    #[tokio::test]
    async fn requires_user() {
        let account = account(false);

        let err = account
            .execute(UpdatePreferences::default())
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Unauthorized);
    }
}
