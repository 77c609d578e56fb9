//! In-memory [`Storage`] implementation.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::domain::{user, Subscription};

use super::{Error, Storage};

/// [`Storage`] keeping [`Subscription`]s in memory.
///
/// Clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<RwLock<HashMap<user::Id, Subscription>>>);

impl Storage<Select<By<Option<Subscription>, user::Id>>> for Memory {
    type Ok = Option<Subscription>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Subscription>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let records = self.0.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&by.into_inner()).cloned())
    }
}

impl Storage<Insert<Subscription>> for Memory {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(sub): Insert<Subscription>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut records =
            self.0.write().unwrap_or_else(PoisonError::into_inner);
        drop(records.insert(sub.user_id, sub));
        Ok(())
    }
}

impl Storage<Delete<By<Subscription, user::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Subscription, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut records =
            self.0.write().unwrap_or_else(PoisonError::into_inner);
        drop(records.remove(&by.into_inner()));
        Ok(())
    }
}
