//! [`Subscription`] definitions.

use std::time::Duration;

use common::{define_kind, unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{user, Tier};

/// Subscription of a [`User`] to some [`Tier`].
///
/// [`User`]: crate::domain::User
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Subscription {
    /// ID of this [`Subscription`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Subscription`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`Tier`] this [`Subscription`] grants.
    pub plan: Tier,

    /// [`Status`] of this [`Subscription`].
    pub status: Status,

    /// [`BillingCycle`] of this [`Subscription`].
    pub billing_cycle: BillingCycle,

    /// [`DateTime`] when this [`Subscription`] started.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub started_at: StartDateTime,

    /// [`DateTime`] when this [`Subscription`] ends.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub ends_at: EndDateTime,

    /// [`DateTime`] when this [`Subscription`] was cancelled, if it was.
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub cancelled_at: Option<CancellationDateTime>,

    /// [`PaymentReference`] of the charge this [`Subscription`] was paid
    /// with, if any.
    #[serde(default)]
    pub payment_reference: Option<PaymentReference>,
}

impl Subscription {
    /// Length of a single billing period.
    pub const PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    /// Creates a new active [`Subscription`] starting now and lasting for a
    /// single [`Subscription::PERIOD`].
    #[must_use]
    pub fn new(
        user_id: user::Id,
        plan: Tier,
        payment_reference: Option<PaymentReference>,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: Id::new(),
            user_id,
            plan,
            status: Status::Active,
            billing_cycle: BillingCycle::Monthly,
            started_at: now.coerce(),
            ends_at: (now + Self::PERIOD).coerce(),
            cancelled_at: None,
            payment_reference,
        }
    }

    /// Creates the default [`Tier::Basic`] [`Subscription`] of a newly
    /// observed [`User`].
    ///
    /// [`User`]: crate::domain::User
    #[must_use]
    pub fn basic(user_id: user::Id) -> Self {
        Self::new(user_id, Tier::Basic, None)
    }

    /// Indicates whether this [`Subscription`] is [`Status::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Returns the features granted by this [`Subscription`].
    ///
    /// Always derived from the [`Subscription::plan`].
    #[must_use]
    pub fn features(&self) -> &'static [&'static str] {
        self.plan.features()
    }

    /// Marks this [`Subscription`] as [`Status::Cancelled`].
    ///
    /// Does nothing if it's cancelled already.
    pub fn cancel(&mut self) {
        if self.is_active() {
            self.status = Status::Cancelled;
            self.cancelled_at = Some(DateTime::now().coerce());
        }
    }

    /// Returns the number of whole days left until this [`Subscription`]
    /// ends, rounding any started day up.
    ///
    /// Zero if this [`Subscription`] is not active or has ended already.
    #[must_use]
    pub fn days_remaining(&self) -> u32 {
        self.days_remaining_at(DateTime::now())
    }

    /// Same as [`Subscription::days_remaining()`], but relative to the
    /// provided `now`.
    #[must_use]
    pub fn days_remaining_at<Of: ?Sized>(&self, now: DateTimeOf<Of>) -> u32 {
        const DAY: i64 = 24 * 60 * 60;

        if !self.is_active() {
            return 0;
        }
        let left = self.ends_at.since(now).whole_seconds();
        if left <= 0 {
            return 0;
        }
        u32::try_from((left + DAY - 1) / DAY).unwrap_or(u32::MAX)
    }
}

/// ID of a [`Subscription`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference of a charge issued by a payment gateway.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str)]
#[from(String, &str)]
#[serde(transparent)]
pub struct PaymentReference(String);

define_kind! {
    #[doc = "Status of a [`Subscription`]."]
    enum Status {
        #[doc = "[`Subscription`] grants its [`Tier`]."]
        Active = 1,

        #[doc = "[`Subscription`] was cancelled and grants nothing."]
        Cancelled = 2,
    }
}

define_kind! {
    #[doc = "Billing cycle of a [`Subscription`]."]
    enum BillingCycle {
        #[doc = "Charged every [`Subscription::PERIOD`]."]
        Monthly = 1,
    }
}

/// [`DateTime`] when a [`Subscription`] started.
pub type StartDateTime = DateTimeOf<(Subscription, unit::Start)>;

/// [`DateTime`] when a [`Subscription`] ends.
pub type EndDateTime = DateTimeOf<(Subscription, unit::End)>;

/// [`DateTime`] when a [`Subscription`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Subscription, unit::Cancellation)>;
