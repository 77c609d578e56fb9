//! [Supabase Auth] (GoTrue) [`Auth`] implementation.
//!
//! [Supabase Auth]: https://supabase.com/docs/guides/auth

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use common::DateTime;
use derive_more::Debug;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tokio::sync::broadcast;
use tracerr::Traced;
use tracing as log;
use url::Url;

use crate::domain::{
    user::{self, session, Session},
    User,
};

use super::{
    Auth, AuthEvent, AuthorizeUrl, Error, Events, GetSession,
    ResendConfirmation, ResetPassword, SignIn, SignOut, SignUp, SignedUp,
    Subscribe, UpdateUser, VerificationKind, Verify, EVENTS_CAPACITY,
};

/// [`Supabase`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// URL of the Supabase project.
    pub url: Url,

    /// Anonymous (public) API key of the Supabase project.
    #[debug(skip)]
    pub anon_key: SecretString,

    /// Timeout of a single request.
    pub timeout: Duration,
}

/// [`Auth`] backed by a remote Supabase project.
///
/// Keeps the current [`Session`] in memory. Clones share it.
#[derive(Clone, Debug)]
pub struct Supabase(Arc<Inner>);

/// Shared state of a [`Supabase`].
#[derive(Debug)]
struct Inner {
    /// HTTP client performing the requests.
    client: Client,

    /// Base URL of the auth API, ending with a slash.
    base: Url,

    /// Anonymous API key.
    #[debug(skip)]
    anon_key: SecretString,

    /// Current [`Session`].
    session: RwLock<Option<Session>>,

    /// Sender of [`AuthEvent`]s.
    events: broadcast::Sender<AuthEvent>,
}

impl Supabase {
    /// Creates a new [`Supabase`] provider with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the HTTP client cannot be built or the project URL is unusable.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let Config {
            url,
            anon_key,
            timeout,
        } = config;

        let base = url
            .join("auth/v1/")
            .map_err(|e| Error::Malformed(format!("invalid project URL: {e}")))
            .map_err(tracerr::wrap!())?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let (events, _) = broadcast::channel(EVENTS_CAPACITY);

        Ok(Self(Arc::new(Inner {
            client,
            base,
            anon_key,
            session: RwLock::default(),
            events,
        })))
    }

    /// Starts a request to the provided auth API `path`, authorized with the
    /// provided access `token`, or the anonymous key if [`None`].
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&session::Token>,
    ) -> Result<RequestBuilder, Error> {
        let url = self
            .0
            .base
            .join(path)
            .map_err(|e| Error::Malformed(format!("invalid path: {e}")))?;
        let anon_key = self.0.anon_key.expose_secret();
        Ok(self
            .0
            .client
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(token.map_or(anon_key, AsRef::as_ref)))
    }

    /// Sends the provided request and decodes its JSON response.
    async fn fetch<T: DeserializeOwned>(
        req: RequestBuilder,
    ) -> Result<T, Error> {
        Ok(Self::send(req).await?.json().await?)
    }

    /// Sends the provided request, turning error responses into [`Error`]s.
    async fn send(req: RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorDto>(&body)
            .ok()
            .and_then(ErrorDto::reason)
            .unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Unknown error").into()
            });
        log::debug!(%status, %reason, "request refused");
        Err(if status.is_client_error() {
            Error::Rejected(reason)
        } else {
            Error::Malformed(format!("{status}: {reason}"))
        })
    }

    /// Returns the current [`Session`], if any.
    fn current(&self) -> Option<Session> {
        self.0
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current [`Session`] and reports the transition.
    fn set_session(&self, session: Option<Session>, event: AuthEvent) {
        *self
            .0
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
        _ = self.0.events.send(event);
    }

    /// Stores the provided [`Session`] reporting it with the `event` built
    /// from it.
    fn start(
        &self,
        session: Session,
        event: fn(Session) -> AuthEvent,
    ) -> Session {
        self.set_session(Some(session.clone()), event(session.clone()));
        session
    }
}

impl Auth<SignUp> for Supabase {
    type Ok = SignedUp;
    type Err = Traced<Error>;

    async fn execute(&self, op: SignUp) -> Result<Self::Ok, Self::Err> {
        let SignUp {
            email,
            password,
            metadata,
            redirect_to,
        } = op;

        let mut req = self
            .request(Method::POST, "signup", None)
            .map_err(tracerr::wrap!())?
            .json(&json!({
                "email": email.as_ref(),
                "password": password.expose_secret().as_ref(),
                "data": metadata,
            }));
        if let Some(to) = &redirect_to {
            req = req.query(&[("redirect_to", to.as_str())]);
        }

        match Self::fetch::<SignUpDto>(req).await.map_err(tracerr::wrap!())? {
            SignUpDto::Session(dto) => {
                let session = dto.try_into().map_err(tracerr::wrap!())?;
                Ok(SignedUp::SignedIn(
                    self.start(session, AuthEvent::SignedIn),
                ))
            }
            SignUpDto::User(dto) => Ok(SignedUp::ConfirmationRequired(
                dto.try_into().map_err(tracerr::wrap!())?,
            )),
        }
    }
}

impl Auth<SignIn> for Supabase {
    type Ok = Session;
    type Err = Traced<Error>;

    async fn execute(&self, op: SignIn) -> Result<Self::Ok, Self::Err> {
        let SignIn { email, password } = op;

        let req = self
            .request(Method::POST, "token", None)
            .map_err(tracerr::wrap!())?
            .query(&[("grant_type", "password")])
            .json(&json!({
                "email": email.as_ref(),
                "password": password.expose_secret().as_ref(),
            }));
        let session = Self::fetch::<SessionDto>(req)
            .await
            .and_then(TryInto::try_into)
            .map_err(tracerr::wrap!())?;

        Ok(self.start(session, AuthEvent::SignedIn))
    }
}

impl Auth<SignOut> for Supabase {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, _: SignOut) -> Result<Self::Ok, Self::Err> {
        let Some(session) = self.current() else {
            return Ok(());
        };
        self.set_session(None, AuthEvent::SignedOut);

        let req = self
            .request(Method::POST, "logout", Some(&session.access_token))
            .map_err(tracerr::wrap!())?;
        match Self::send(req).await {
            // Already revoked remotely.
            Ok(_) | Err(Error::Rejected(_)) => Ok(()),
            Err(e) => Err(tracerr::new!(e)),
        }
    }
}

impl Auth<GetSession> for Supabase {
    type Ok = Option<Session>;
    type Err = Traced<Error>;

    async fn execute(&self, _: GetSession) -> Result<Self::Ok, Self::Err> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token else {
            self.set_session(None, AuthEvent::SignedOut);
            return Ok(None);
        };

        log::debug!(user_id = %session.user.id, "refreshing session");
        let req = self
            .request(Method::POST, "token", None)
            .map_err(tracerr::wrap!())?
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({"refresh_token": refresh_token.as_ref()}));
        match Self::fetch::<SessionDto>(req).await.and_then(TryInto::try_into)
        {
            Ok(s) => Ok(Some(self.start(s, AuthEvent::TokenRefreshed))),
            Err(Error::Rejected(reason)) => {
                log::info!(%reason, "session cannot be refreshed");
                self.set_session(None, AuthEvent::SignedOut);
                Ok(None)
            }
            Err(e) => Err(tracerr::new!(e)),
        }
    }
}

impl Auth<UpdateUser> for Supabase {
    type Ok = User;
    type Err = Traced<Error>;

    async fn execute(&self, op: UpdateUser) -> Result<Self::Ok, Self::Err> {
        let UpdateUser { metadata, password } = op;

        let mut session = self
            .current()
            .ok_or(Error::Unauthenticated)
            .map_err(tracerr::wrap!())?;

        let mut body = json!({"data": metadata});
        if let Some(password) = &password {
            body["password"] = password.expose_secret().as_ref().into();
        }
        let req = self
            .request(Method::PUT, "user", Some(&session.access_token))
            .map_err(tracerr::wrap!())?
            .json(&body);
        let user: User = Self::fetch::<UserDto>(req)
            .await
            .and_then(TryInto::try_into)
            .map_err(tracerr::wrap!())?;

        session.user = user.clone();
        _ = self.start(session, AuthEvent::UserUpdated);
        Ok(user)
    }
}

impl Auth<ResetPassword> for Supabase {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, op: ResetPassword) -> Result<Self::Ok, Self::Err> {
        let ResetPassword { email, redirect_to } = op;

        let req = self
            .request(Method::POST, "recover", None)
            .map_err(tracerr::wrap!())?
            .query(&[("redirect_to", redirect_to.as_str())])
            .json(&json!({"email": email.as_ref()}));
        Self::send(req).await.map(drop).map_err(tracerr::wrap!())
    }
}

impl Auth<ResendConfirmation> for Supabase {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        op: ResendConfirmation,
    ) -> Result<Self::Ok, Self::Err> {
        let ResendConfirmation { email } = op;

        let req = self
            .request(Method::POST, "resend", None)
            .map_err(tracerr::wrap!())?
            .json(&json!({"type": "signup", "email": email.as_ref()}));
        Self::send(req).await.map(drop).map_err(tracerr::wrap!())
    }
}

impl Auth<Verify> for Supabase {
    type Ok = Session;
    type Err = Traced<Error>;

    async fn execute(&self, op: Verify) -> Result<Self::Ok, Self::Err> {
        let Verify { kind, token_hash } = op;

        let req = self
            .request(Method::POST, "verify", None)
            .map_err(tracerr::wrap!())?
            .json(&json!({"type": kind, "token_hash": token_hash}));
        let session = Self::fetch::<SessionDto>(req)
            .await
            .and_then(TryInto::try_into)
            .map_err(tracerr::wrap!())?;

        Ok(self.start(
            session,
            match kind {
                VerificationKind::Signup => AuthEvent::SignedIn,
                VerificationKind::Recovery => AuthEvent::PasswordRecovery,
            },
        ))
    }
}

impl Auth<AuthorizeUrl> for Supabase {
    type Ok = Url;
    type Err = Traced<Error>;

    async fn execute(&self, op: AuthorizeUrl) -> Result<Self::Ok, Self::Err> {
        let AuthorizeUrl {
            provider,
            redirect_to,
        } = op;

        let mut url = self
            .0
            .base
            .join("authorize")
            .map_err(|e| Error::Malformed(format!("invalid path: {e}")))
            .map_err(tracerr::wrap!())?;
        _ = url
            .query_pairs_mut()
            .append_pair("provider", &provider.to_string())
            .append_pair("redirect_to", redirect_to.as_str());
        Ok(url)
    }
}

impl Auth<Subscribe> for Supabase {
    type Ok = Events;
    type Err = Traced<Error>;

    async fn execute(&self, _: Subscribe) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.events.subscribe())
    }
}

/// User object of the auth API.
#[derive(Deserialize)]
struct UserDto {
    id: user::Id,
    email: Option<String>,
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: user::Metadata,
    created_at: Option<String>,
}

impl TryFrom<UserDto> for User {
    type Error = Error;

    fn try_from(dto: UserDto) -> Result<Self, Self::Error> {
        let UserDto {
            id,
            email,
            email_confirmed_at,
            user_metadata,
            created_at,
        } = dto;

        let email = email
            .and_then(user::Email::new)
            .ok_or_else(|| Error::Malformed("`User` has no email".into()))?;
        let created_at = created_at
            .and_then(|at| DateTime::from_rfc3339(&at).ok())
            .unwrap_or_else(DateTime::now)
            .coerce();

        Ok(Self {
            id,
            email,
            name: user_metadata.name(),
            email_verified: email_confirmed_at.is_some(),
            avatar_url: user_metadata.avatar_url(),
            metadata: user_metadata,
            created_at,
        })
    }
}

/// Session object of the auth API.
#[derive(Deserialize)]
struct SessionDto {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    expires_at: Option<i64>,
    user: UserDto,
}

impl TryFrom<SessionDto> for Session {
    type Error = Error;

    fn try_from(dto: SessionDto) -> Result<Self, Self::Error> {
        let SessionDto {
            access_token,
            refresh_token,
            expires_in,
            expires_at,
            user,
        } = dto;

        let expires_at = expires_at
            .and_then(DateTime::from_unix_timestamp)
            .or_else(|| {
                expires_in.map(|s| DateTime::now() + Duration::from_secs(s))
            })
            .ok_or_else(|| {
                Error::Malformed("`Session` has no expiration".into())
            })?
            .coerce();

        Ok(Self {
            user: user.try_into()?,
            access_token: session::Token::new(access_token),
            refresh_token: refresh_token.map(session::Token::new),
            expires_at,
        })
    }
}

/// Response of a sign-up: a [`SessionDto`] if no confirmation is required,
/// or a bare [`UserDto`] otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpDto {
    Session(SessionDto),
    User(UserDto),
}

/// Error body of the auth API, in any of its historical shapes.
#[derive(Deserialize)]
struct ErrorDto {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorDto {
    /// Returns the most descriptive reason in this [`ErrorDto`].
    fn reason(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use crate::domain::{user::Session, User};

    use super::{ErrorDto, SessionDto, SignUpDto};

    #[test]
    fn decodes_session() {
        let dto: SessionDto = serde_json::from_value(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 4_102_444_800_i64,
            "refresh_token": "refresh",
            "user": {
                "id": "8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e",
                "aud": "authenticated",
                "email": "writer@example.com",
                "email_confirmed_at": "2024-05-01T10:00:00.123456Z",
                "user_metadata": {"full_name": "Ada"},
                "created_at": "2024-05-01T09:00:00Z",
            },
        }))
        .unwrap();

        let session = Session::try_from(dto).unwrap();

        assert_eq!(session.access_token.as_ref(), "jwt");
        assert_eq!(session.expires_at.unix_timestamp(), 4_102_444_800);
        assert!(session.user.email_verified);
        assert_eq!(session.user.name.unwrap().as_ref(), "Ada");
    }

    #[test]
    fn distinguishes_sign_up_outcomes() {
        let pending: SignUpDto = serde_json::from_value(json!({
            "id": "8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e",
            "email": "writer@example.com",
            "email_confirmed_at": null,
            "confirmation_sent_at": "2024-05-01T10:00:00Z",
        }))
        .unwrap();
        let SignUpDto::User(user) = pending else {
            panic!("expected a bare user");
        };
        assert!(!User::try_from(user).unwrap().email_verified);

        let active: SignUpDto = serde_json::from_value(json!({
            "access_token": "jwt",
            "expires_in": 3600,
            "user": {
                "id": "8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e",
                "email": "writer@example.com",
            },
        }))
        .unwrap();
        assert!(matches!(active, SignUpDto::Session(_)));
    }

    #[test]
    fn rejects_user_without_email() {
        let dto: SessionDto = serde_json::from_value(json!({
            "access_token": "jwt",
            "expires_in": 3600,
            "user": {"id": "8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e"},
        }))
        .unwrap();

        assert!(Session::try_from(dto).is_err());
    }

    #[test]
    fn picks_error_reason() {
        for (body, reason) in [
            (
                json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials",
                }),
                "Invalid login credentials",
            ),
            (
                json!({"code": 422, "msg": "User already registered"}),
                "User already registered",
            ),
            (json!({"message": "Invalid API key"}), "Invalid API key"),
        ] {
            let dto: ErrorDto = serde_json::from_value(body).unwrap();
            assert_eq!(dto.reason().as_deref(), Some(reason));
        }
    }
}
