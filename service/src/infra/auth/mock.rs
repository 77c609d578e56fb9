//! In-memory [`Auth`] implementation.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use common::DateTime;
use derive_more::Debug;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret as _, SecretString};
use tokio::sync::broadcast;
use tracerr::Traced;
use tracing as log;
use url::Url;
use uuid::Uuid;

use crate::domain::{
    user::{self, session, Session},
    User,
};

use super::{
    Auth, AuthEvent, AuthorizeUrl, Error, Events, GetSession,
    ResendConfirmation, ResetPassword, SignIn, SignOut, SignUp, SignedUp,
    Subscribe, UpdateUser, VerificationKind, Verify, EVENTS_CAPACITY,
};

/// [`Mock`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Indicator whether new [`User`]s must confirm their email before
    /// signing in.
    pub require_confirmation: bool,

    /// Lifetime of an issued [`Session`].
    pub session_ttl: Duration,

    /// Secret to sign [`session::Token`]s with.
    #[debug(skip)]
    pub jwt_secret: SecretString,

    /// URL OAuth sign-ins are started at.
    pub authorize_url: Url,
}

/// Email "sent" by the [`Mock`] provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mail {
    /// [`VerificationKind`] of the link in this [`Mail`].
    pub kind: VerificationKind,

    /// Token hash of the link in this [`Mail`].
    pub token_hash: String,

    /// URL the link leads to, if any.
    pub redirect_to: Option<Url>,
}

/// [`Auth`] keeping accounts in memory and issuing signed [JWT]s.
///
/// Clones share the same state.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(Clone, Debug)]
pub struct Mock(Arc<Inner>);

/// Shared state of a [`Mock`].
#[derive(Debug)]
struct Inner {
    /// [`Config`] of the [`Mock`].
    config: Config,

    /// Key to sign [`session::Token`]s with.
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key to verify [`session::Token`]s with.
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// Registered accounts.
    accounts: RwLock<HashMap<user::Email, Record>>,

    /// Sent [`Mail`]s by recipient.
    mailbox: RwLock<HashMap<user::Email, Vec<Mail>>>,

    /// Current [`Session`].
    session: RwLock<Option<Session>>,

    /// Sender of [`AuthEvent`]s.
    events: broadcast::Sender<AuthEvent>,
}

/// Account registered in the [`Mock`] provider.
#[derive(Clone, Debug)]
struct Record {
    /// [`User`] owning this [`Record`].
    user: User,

    /// [`user::PasswordHash`] of the [`User`].
    password_hash: user::PasswordHash,
}

impl Mock {
    /// Creates a new [`Mock`] provider with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        let (events, _) = broadcast::channel(EVENTS_CAPACITY);
        Self(Arc::new(Inner {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
            accounts: RwLock::default(),
            mailbox: RwLock::default(),
            session: RwLock::default(),
            events,
        }))
    }

    /// Returns the [`Mail`]s sent to the provided [`user::Email`].
    #[must_use]
    pub fn mails(&self, email: &user::Email) -> Vec<Mail> {
        self.0
            .mailbox
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Issues a new [`Session`] for the provided [`User`].
    fn issue(&self, user: User) -> Result<Session, Error> {
        let expires_at =
            (DateTime::now() + self.0.config.session_ttl).coerce();
        let claims = session::Claims {
            user_id: user.id,
            expires_at,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.0.encoding_key,
        )?;
        Ok(Session {
            user,
            access_token: session::Token::new(token),
            refresh_token: Some(session::Token::new(
                Uuid::new_v4().simple().to_string(),
            )),
            expires_at,
        })
    }

    /// Verifies the provided [`session::Token`] and returns its claims.
    fn verify_token(
        &self,
        token: &session::Token,
    ) -> Result<session::Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        jsonwebtoken::decode::<session::Claims>(
            token.as_ref(),
            &self.0.decoding_key,
            &validation,
        )
        .map(|data| data.claims)
    }

    /// Replaces the current [`Session`] and reports the transition.
    fn set_session(&self, session: Option<Session>, event: AuthEvent) {
        *self
            .0
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
        // No subscribers is fine.
        _ = self.0.events.send(event);
    }

    /// Records a [`Mail`] sent to the provided [`user::Email`].
    fn send_mail(
        &self,
        email: &user::Email,
        kind: VerificationKind,
        redirect_to: Option<Url>,
    ) {
        let mail = Mail {
            kind,
            token_hash: Uuid::new_v4().simple().to_string(),
            redirect_to,
        };
        log::debug!(%email, %kind, "sending mail");
        self.0
            .mailbox
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(email.clone())
            .or_default()
            .push(mail);
    }

    /// Returns a copy of the [`Record`] registered with the provided
    /// [`user::Email`], if any.
    fn account(&self, email: &user::Email) -> Option<Record> {
        self.0
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
            .cloned()
    }
}

impl Auth<SignUp> for Mock {
    type Ok = SignedUp;
    type Err = Traced<Error>;

    async fn execute(&self, op: SignUp) -> Result<Self::Ok, Self::Err> {
        let SignUp {
            email,
            password,
            metadata,
            redirect_to,
        } = op;

        let confirmed = !self.0.config.require_confirmation;
        let user = User {
            id: user::Id::new(),
            email: email.clone(),
            name: metadata.name(),
            email_verified: confirmed,
            avatar_url: metadata.avatar_url(),
            metadata,
            created_at: DateTime::now().coerce(),
        };
        {
            let mut accounts = self
                .0
                .accounts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(&email) {
                return Err(tracerr::new!(Error::rejected(
                    "User already registered",
                )));
            }
            drop(accounts.insert(
                email.clone(),
                Record {
                    user: user.clone(),
                    password_hash: user::PasswordHash::new(
                        &email,
                        password.expose_secret(),
                    ),
                },
            ));
        }

        if !confirmed {
            self.send_mail(&email, VerificationKind::Signup, redirect_to);
            return Ok(SignedUp::ConfirmationRequired(user));
        }

        let session = self.issue(user).map_err(tracerr::wrap!())?;
        self.set_session(
            Some(session.clone()),
            AuthEvent::SignedIn(session.clone()),
        );
        Ok(SignedUp::SignedIn(session))
    }
}

impl Auth<SignIn> for Mock {
    type Ok = Session;
    type Err = Traced<Error>;

    async fn execute(&self, op: SignIn) -> Result<Self::Ok, Self::Err> {
        let SignIn { email, password } = op;

        let account = self
            .account(&email)
            .filter(|a| {
                a.password_hash
                    == user::PasswordHash::new(&email, password.expose_secret())
            })
            .ok_or_else(|| Error::rejected("Invalid login credentials"))
            .map_err(tracerr::wrap!())?;
        if !account.user.email_verified {
            return Err(tracerr::new!(Error::rejected("Email not confirmed")));
        }

        let session = self.issue(account.user).map_err(tracerr::wrap!())?;
        self.set_session(
            Some(session.clone()),
            AuthEvent::SignedIn(session.clone()),
        );
        Ok(session)
    }
}

impl Auth<SignOut> for Mock {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, _: SignOut) -> Result<Self::Ok, Self::Err> {
        let had_session = self
            .0
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if had_session {
            self.set_session(None, AuthEvent::SignedOut);
        }
        Ok(())
    }
}

impl Auth<GetSession> for Mock {
    type Ok = Option<Session>;
    type Err = Traced<Error>;

    async fn execute(&self, _: GetSession) -> Result<Self::Ok, Self::Err> {
        let Some(session) = self
            .0
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        else {
            return Ok(None);
        };

        match self.verify_token(&session.access_token) {
            Ok(_) => Ok(Some(session)),
            Err(e)
                if *e.kind()
                    == jsonwebtoken::errors::ErrorKind::ExpiredSignature =>
            {
                log::debug!(user_id = %session.user.id, "refreshing session");
                let refreshed =
                    self.issue(session.user).map_err(tracerr::wrap!())?;
                self.set_session(
                    Some(refreshed.clone()),
                    AuthEvent::TokenRefreshed(refreshed.clone()),
                );
                Ok(Some(refreshed))
            }
            Err(e) => Err(tracerr::new!(Error::from(e))),
        }
    }
}

impl Auth<UpdateUser> for Mock {
    type Ok = User;
    type Err = Traced<Error>;

    async fn execute(&self, op: UpdateUser) -> Result<Self::Ok, Self::Err> {
        let UpdateUser { metadata, password } = op;

        let mut session = self
            .0
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::Unauthenticated)
            .map_err(tracerr::wrap!())?;

        let user = {
            let mut accounts = self
                .0
                .accounts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .get_mut(&session.user.email)
                .ok_or(Error::Unauthenticated)
                .map_err(tracerr::wrap!())?;

            account.user.metadata.merge(metadata);
            account.user.name = account.user.metadata.name();
            account.user.avatar_url = account.user.metadata.avatar_url();
            if let Some(password) = password {
                account.password_hash = user::PasswordHash::new(
                    &account.user.email,
                    password.expose_secret(),
                );
            }
            account.user.clone()
        };

        session.user = user.clone();
        self.set_session(
            Some(session.clone()),
            AuthEvent::UserUpdated(session),
        );
        Ok(user)
    }
}

impl Auth<ResetPassword> for Mock {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, op: ResetPassword) -> Result<Self::Ok, Self::Err> {
        let ResetPassword { email, redirect_to } = op;

        // Unknown emails are not revealed.
        if self.account(&email).is_some() {
            self.send_mail(
                &email,
                VerificationKind::Recovery,
                Some(redirect_to),
            );
        }
        Ok(())
    }
}

impl Auth<ResendConfirmation> for Mock {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        op: ResendConfirmation,
    ) -> Result<Self::Ok, Self::Err> {
        let ResendConfirmation { email } = op;

        if self.account(&email).is_some_and(|a| !a.user.email_verified) {
            self.send_mail(&email, VerificationKind::Signup, None);
        }
        Ok(())
    }
}

impl Auth<Verify> for Mock {
    type Ok = Session;
    type Err = Traced<Error>;

    async fn execute(&self, op: Verify) -> Result<Self::Ok, Self::Err> {
        let Verify { kind, token_hash } = op;

        let email = {
            let mut mailbox = self
                .0
                .mailbox
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let email = mailbox.iter_mut().find_map(|(email, mails)| {
                let pos = mails.iter().position(|m| {
                    m.kind == kind && m.token_hash == token_hash
                })?;
                drop(mails.remove(pos));
                Some(email.clone())
            });
            email
        }
        .ok_or_else(|| Error::rejected("Token has expired or is invalid"))
        .map_err(tracerr::wrap!())?;

        let user = {
            let mut accounts = self
                .0
                .accounts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .get_mut(&email)
                .ok_or_else(|| Error::rejected("User not found"))
                .map_err(tracerr::wrap!())?;
            account.user.email_verified = true;
            account.user.clone()
        };

        let session = self.issue(user).map_err(tracerr::wrap!())?;
        let event = match kind {
            VerificationKind::Signup => AuthEvent::SignedIn(session.clone()),
            VerificationKind::Recovery => {
                AuthEvent::PasswordRecovery(session.clone())
            }
        };
        self.set_session(Some(session.clone()), event);
        Ok(session)
    }
}

impl Auth<AuthorizeUrl> for Mock {
    type Ok = Url;
    type Err = Traced<Error>;

    async fn execute(&self, op: AuthorizeUrl) -> Result<Self::Ok, Self::Err> {
        let AuthorizeUrl {
            provider,
            redirect_to,
        } = op;

        let mut url = self.0.config.authorize_url.clone();
        _ = url
            .query_pairs_mut()
            .append_pair("provider", &provider.to_string())
            .append_pair("redirect_to", redirect_to.as_str());
        Ok(url)
    }
}

impl Auth<Subscribe> for Mock {
    type Ok = Events;
    type Err = Traced<Error>;

    async fn execute(&self, _: Subscribe) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.events.subscribe())
    }
}
