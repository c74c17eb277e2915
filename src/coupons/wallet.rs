//! Coupon Wallet

use jiff::Timestamp;
use rusty_money::iso::Currency;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::warn;

use crate::coupons::{
    Coupon, CouponError, CouponId, UserId, records::CouponRecord, values::CouponValueError,
};

/// Why a stored coupon row was left out of a wallet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkippedRecord {
    /// The row's value could not be parsed.
    #[error(transparent)]
    Malformed(#[from] CouponValueError),

    /// An earlier row already used this coupon id.
    #[error("duplicate coupon id")]
    Duplicate,
}

/// All coupons issued to a single user.
#[derive(Debug, Clone)]
pub struct CouponWallet<'a> {
    owner: UserId,
    coupons: Vec<Coupon<'a>>,
}

impl<'a> CouponWallet<'a> {
    /// Create an empty wallet.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            coupons: Vec::new(),
        }
    }

    /// Add an issued coupon.
    ///
    /// # Errors
    ///
    /// - [`CouponError::WrongOwner`] if the coupon belongs to another account.
    /// - [`CouponError::Duplicate`] if the wallet already holds a coupon with the same id.
    pub fn insert(&mut self, coupon: Coupon<'a>) -> Result<(), CouponError> {
        if coupon.owner() != &self.owner {
            return Err(CouponError::WrongOwner(coupon.id().clone()));
        }

        if self.get(coupon.id()).is_some() {
            return Err(CouponError::Duplicate(coupon.id().clone()));
        }

        self.coupons.push(coupon);

        Ok(())
    }

    /// Owning account
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Look up a coupon by id.
    pub fn get(&self, id: &CouponId) -> Option<&Coupon<'a>> {
        self.coupons.iter().find(|coupon| coupon.id() == id)
    }

    /// Iterate over every coupon in issue order.
    pub fn iter(&self) -> impl Iterator<Item = &Coupon<'a>> {
        self.coupons.iter()
    }

    /// Iterate over coupons that can still be used at `now`.
    pub fn available(&self, now: Timestamp) -> impl Iterator<Item = &Coupon<'a>> {
        self.coupons
            .iter()
            .filter(move |coupon| coupon.is_available(now))
    }

    /// Number of coupons held
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Whether the wallet holds no coupons
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// Mark every coupon in `ids` as used.
    ///
    /// Either all coupons are consumed or none are: availability of every id
    /// is checked before any flag is flipped. Repeated ids count as a reuse.
    ///
    /// # Errors
    ///
    /// - [`CouponError::NotFound`] if an id is not in the wallet.
    /// - [`CouponError::AlreadyUsed`] / [`CouponError::Expired`] if a coupon is unavailable.
    pub fn consume(&mut self, ids: &[CouponId], now: Timestamp) -> Result<(), CouponError> {
        let mut positions: SmallVec<[usize; 2]> = SmallVec::new();

        for id in ids {
            let position = self
                .coupons
                .iter()
                .position(|coupon| coupon.id() == id)
                .ok_or_else(|| CouponError::NotFound(id.clone()))?;

            if positions.contains(&position) {
                return Err(CouponError::AlreadyUsed(id.clone()));
            }

            self.coupons
                .get(position)
                .ok_or_else(|| CouponError::NotFound(id.clone()))?
                .ensure_available(now)?;

            positions.push(position);
        }

        for position in positions {
            if let Some(coupon) = self.coupons.get_mut(position) {
                coupon.mark_used()?;
            }
        }

        Ok(())
    }
}

impl CouponWallet<'static> {
    /// Build a wallet from stored coupon rows.
    ///
    /// Rows owned by another account are ignored. Rows whose value cannot be
    /// parsed, and rows repeating an id already loaded, are skipped and
    /// returned alongside the wallet so the caller can surface them.
    pub fn from_records<'r>(
        owner: UserId,
        records: impl IntoIterator<Item = &'r CouponRecord>,
        currency: &'static Currency,
    ) -> (Self, Vec<(CouponId, SkippedRecord)>) {
        let mut wallet = Self::new(owner);
        let mut skipped = Vec::new();

        for record in records {
            if record.owner != wallet.owner.as_str() {
                continue;
            }

            let id = CouponId::new(record.id.as_str());

            if wallet.get(&id).is_some() {
                warn!(coupon = %id, "skipping duplicate coupon record");
                skipped.push((id, SkippedRecord::Duplicate));
                continue;
            }

            match record.to_coupon(currency) {
                Ok(coupon) => wallet.coupons.push(coupon),
                Err(err) => {
                    warn!(coupon = %id, error = %err, "skipping malformed coupon record");
                    skipped.push((id, SkippedRecord::Malformed(err)));
                }
            }
        }

        (wallet, skipped)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::KRW;
    use testresult::TestResult;

    use crate::coupons::{CouponKind, CouponStatus};

    use super::*;

    fn record(id: &str, owner: &str, value: &str) -> TestResult<CouponRecord> {
        Ok(CouponRecord {
            id: id.to_string(),
            owner: owner.to_string(),
            kind: "랜덤박스 쿠폰".to_string(),
            value: value.to_string(),
            used: false,
            expires_at: "2030-01-01T00:00:00Z".parse()?,
        })
    }

    fn now() -> TestResult<Timestamp> {
        Ok("2029-01-01T00:00:00Z".parse()?)
    }

    #[test]
    fn from_records_filters_owner_and_reports_malformed() -> TestResult {
        let records = [
            record("a", "user-1", "무료배송")?,
            record("b", "user-2", "10%")?,
            record("c", "user-1", "oops")?,
            record("d", "user-1", "3000")?,
        ];

        let (wallet, malformed) = CouponWallet::from_records(UserId::new("user-1"), &records, KRW);

        assert_eq!(wallet.len(), 2);
        assert!(wallet.get(&CouponId::new("b")).is_none());
        assert_eq!(malformed.len(), 1);
        assert!(matches!(
            malformed.first(),
            Some((id, SkippedRecord::Malformed(CouponValueError::Unrecognised(_)))) if id.as_str() == "c"
        ));

        Ok(())
    }

    #[test]
    fn from_records_keeps_first_of_duplicate_ids() -> TestResult {
        let records = [
            record("a", "user-1", "10%")?,
            record("a", "user-1", "3000")?,
        ];

        let (wallet, skipped) = CouponWallet::from_records(UserId::new("user-1"), &records, KRW);

        assert_eq!(wallet.len(), 1);
        assert_eq!(wallet.available(now()?).count(), 1);
        assert_eq!(skipped, [(CouponId::new("a"), SkippedRecord::Duplicate)]);
        assert!(matches!(
            wallet.get(&CouponId::new("a")).map(Coupon::kind),
            Some(CouponKind::PercentageDiscount(_))
        ));

        Ok(())
    }

    #[test]
    fn insert_rejects_duplicate_id() -> TestResult {
        let mut wallet = CouponWallet::new(UserId::new("user-1"));
        let expires_at: Timestamp = "2030-01-01T00:00:00Z".parse()?;
        let issue = || {
            Coupon::new(
                CouponId::new("x"),
                UserId::new("user-1"),
                "x",
                CouponKind::FreeShipping,
                expires_at,
            )
        };

        wallet.insert(issue())?;

        assert_eq!(
            wallet.insert(issue()),
            Err(CouponError::Duplicate(CouponId::new("x")))
        );
        assert_eq!(wallet.len(), 1);

        Ok(())
    }

    #[test]
    fn insert_rejects_other_owner() -> TestResult {
        let mut wallet = CouponWallet::new(UserId::new("user-1"));
        let coupon = Coupon::new(
            CouponId::new("x"),
            UserId::new("user-2"),
            "x",
            CouponKind::FreeShipping,
            "2030-01-01T00:00:00Z".parse()?,
        );

        assert_eq!(
            wallet.insert(coupon),
            Err(CouponError::WrongOwner(CouponId::new("x")))
        );
        assert!(wallet.is_empty());

        Ok(())
    }

    #[test]
    fn consume_marks_all_coupons_used() -> TestResult {
        let records = [record("a", "user-1", "무료배송")?, record("b", "user-1", "10%")?];
        let (mut wallet, _) = CouponWallet::from_records(UserId::new("user-1"), &records, KRW);

        wallet.consume(&[CouponId::new("a"), CouponId::new("b")], now()?)?;

        assert!(wallet.iter().all(Coupon::is_used));
        assert_eq!(wallet.available(now()?).count(), 0);

        Ok(())
    }

    #[test]
    fn consume_is_all_or_nothing() -> TestResult {
        let records = [record("a", "user-1", "무료배송")?, record("b", "user-1", "10%")?];
        let (mut wallet, _) = CouponWallet::from_records(UserId::new("user-1"), &records, KRW);

        let result = wallet.consume(&[CouponId::new("a"), CouponId::new("missing")], now()?);

        assert_eq!(result, Err(CouponError::NotFound(CouponId::new("missing"))));
        assert!(wallet.iter().all(|coupon| !coupon.is_used()));

        Ok(())
    }

    #[test]
    fn consume_rejects_repeated_ids() -> TestResult {
        let records = [record("a", "user-1", "무료배송")?];
        let (mut wallet, _) = CouponWallet::from_records(UserId::new("user-1"), &records, KRW);

        let result = wallet.consume(&[CouponId::new("a"), CouponId::new("a")], now()?);

        assert_eq!(result, Err(CouponError::AlreadyUsed(CouponId::new("a"))));
        assert_eq!(
            wallet.get(&CouponId::new("a")).map(|coupon| coupon.status(Timestamp::UNIX_EPOCH)),
            Some(CouponStatus::Available)
        );

        Ok(())
    }

    #[test]
    fn consume_rejects_expired() -> TestResult {
        let records = [record("a", "user-1", "무료배송")?];
        let (mut wallet, _) = CouponWallet::from_records(UserId::new("user-1"), &records, KRW);
        let later: Timestamp = "2031-01-01T00:00:00Z".parse()?;

        assert_eq!(
            wallet.consume(&[CouponId::new("a")], later),
            Err(CouponError::Expired(CouponId::new("a")))
        );

        Ok(())
    }
}
