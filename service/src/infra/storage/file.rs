//! JSON file [`Storage`] implementation.

use std::{io, path::PathBuf, time::Duration};

use common::{
    operations::{By, Delete, Insert, Select},
    unit, DateTime, DateTimeOf,
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracerr::Traced;
use tracing as log;

use crate::domain::{user, Subscription};

use super::{Error, Storage};

/// [`File`] storage configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to keep records in.
    pub dir: PathBuf,

    /// Time a record stays valid after being written.
    pub ttl: Duration,
}

impl Config {
    /// Default [`Config::ttl`], same as the lifetime of a billing period.
    pub const DEFAULT_TTL: Duration = Subscription::PERIOD;
}

/// [`Storage`] keeping every [`Subscription`] as a JSON file, stamped with an
/// expiration like a browser cookie.
#[derive(Clone, Debug)]
pub struct File {
    /// [`Config`] of this [`File`] storage.
    config: Config,
}

impl File {
    /// Creates a new [`File`] storage, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// If the directory cannot be created.
    pub async fn new(config: Config) -> Result<Self, Traced<Error>> {
        fs::create_dir_all(&config.dir)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self { config })
    }

    /// Returns the path of the record belonging to the provided
    /// [`user::Id`].
    fn path(&self, user_id: user::Id) -> PathBuf {
        self.config.dir.join(format!("{user_id}.json"))
    }
}

/// Stored [`Subscription`] along with its expiration.
#[derive(Deserialize, Serialize)]
struct Record {
    subscription: Subscription,

    #[serde(with = "common::datetime::serde::rfc3339")]
    expires_at: ExpirationDateTime,
}

/// [`DateTime`] when a [`Record`] expires.
type ExpirationDateTime = DateTimeOf<(Record, unit::Expiration)>;

impl Storage<Select<By<Option<Subscription>, user::Id>>> for File {
    type Ok = Option<Subscription>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Subscription>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let path = self.path(by.into_inner());
        let bytes = match fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(tracerr::new!(Error::from(e))),
        };
        let record: Record = serde_json::from_slice(&bytes)
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        if record.expires_at <= DateTime::now().coerce() {
            log::debug!(path = %path.display(), "removing expired record");
            remove(path).await.map_err(tracerr::wrap!())?;
            return Ok(None);
        }
        Ok(Some(record.subscription))
    }
}

impl Storage<Insert<Subscription>> for File {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(subscription): Insert<Subscription>,
    ) -> Result<Self::Ok, Self::Err> {
        let path = self.path(subscription.user_id);
        let record = Record {
            subscription,
            expires_at: (DateTime::now() + self.config.ttl).coerce(),
        };
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        // Renaming is atomic, so readers never observe a partial record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}

impl Storage<Delete<By<Subscription, user::Id>>> for File {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Subscription, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        remove(self.path(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Removes the file at the provided `path`, if it exists.
async fn remove(path: PathBuf) -> Result<(), Error> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Delete, Insert, Select},
        Handler as _,
    };

    use crate::domain::{user, Subscription, Tier};

    use super::{Config, File};

    async fn storage(dir: &tempfile::TempDir, ttl: Duration) -> File {
        File::new(Config {
            dir: dir.path().join("subscriptions"),
            ttl,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let user_id = user::Id::new();
        let sub = Subscription::new(user_id, Tier::Ultra, Some("ref".into()));

        storage(&dir, Config::DEFAULT_TTL)
            .await
            .execute(Insert(sub.clone()))
            .await
            .unwrap();

        let reopened = storage(&dir, Config::DEFAULT_TTL).await;
        assert_eq!(
            reopened.execute(Select(By::new(user_id))).await.unwrap(),
            Some(sub),
        );
        assert_eq!(
            reopened.execute(Select(By::new(user::Id::new()))).await.unwrap(),
            None,
        );
    }

    #[tokio::test]
    async fn expired_records_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, Duration::ZERO).await;
        let user_id = user::Id::new();

        storage
            .execute(Insert(Subscription::basic(user_id)))
            .await
            .unwrap();

        assert_eq!(
            storage.execute(Select(By::new(user_id))).await.unwrap(),
            None,
        );
        assert!(!storage.path(user_id).exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, Config::DEFAULT_TTL).await;
        let user_id = user::Id::new();

        storage
            .execute(Insert(Subscription::basic(user_id)))
            .await
            .unwrap();
        for _ in 0..2 {
            storage
                .execute(Delete(By::<Subscription, _>::new(user_id)))
                .await
                .unwrap();
        }

        assert_eq!(
            storage.execute(Select(By::new(user_id))).await.unwrap(),
            None,
        );
    }

    #[tokio::test]
    async fn malformed_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir, Config::DEFAULT_TTL).await;
        let user_id = user::Id::new();

        std::fs::write(storage.path(user_id), b"{not json").unwrap();

        assert!(storage.execute(Select(By::new(user_id))).await.is_err());
    }
}
