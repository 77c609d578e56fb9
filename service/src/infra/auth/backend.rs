//! [`Auth`] implementation selected by configuration.

use tracerr::Traced;
use url::Url;

use crate::domain::{user::Session, User};

use super::{
    mock, supabase, Auth, AuthorizeUrl, Error, Events, GetSession, Mock,
    ResendConfirmation, ResetPassword, SignIn, SignOut, SignUp, SignedUp,
    Subscribe, Supabase, UpdateUser, Verify,
};

/// [`Backend`] configuration.
#[derive(Clone, Debug)]
pub enum Config {
    /// Use the in-memory [`Mock`] provider.
    Mock(mock::Config),

    /// Use a remote [`Supabase`] project.
    Supabase(supabase::Config),
}

/// Authentication provider chosen at runtime.
#[derive(Clone, Debug)]
pub enum Backend {
    /// In-memory [`Mock`] provider.
    Mock(Mock),

    /// Remote [`Supabase`] provider.
    Supabase(Supabase),
}

impl Backend {
    /// Creates a new [`Backend`] out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the [`Supabase`] provider cannot be initialized.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        Ok(match config {
            Config::Mock(c) => Self::Mock(Mock::new(c)),
            Config::Supabase(c) => {
                Self::Supabase(Supabase::new(c).map_err(tracerr::wrap!())?)
            }
        })
    }
}

/// Implements [`Auth`] operations for [`Backend`] by delegating them to the
/// selected provider.
macro_rules! delegate {
    ($($op:ty => $ok:ty),* $(,)?) => {$(
        impl Auth<$op> for Backend {
            type Ok = $ok;
            type Err = Traced<Error>;

            async fn execute(&self, op: $op) -> Result<Self::Ok, Self::Err> {
                match self {
                    Self::Mock(p) => p.execute(op).await,
                    Self::Supabase(p) => p.execute(op).await,
                }
            }
        }
    )*};
}

delegate! {
    SignUp => SignedUp,
    SignIn => Session,
    SignOut => (),
    GetSession => Option<Session>,
    UpdateUser => User,
    ResetPassword => (),
    ResendConfirmation => (),
    Verify => Session,
    AuthorizeUrl => Url,
    Subscribe => Events,
}
