use crate::domain::book::{LoanBook, LoanStats, StatusFilter};
use crate::domain::loan::{Loan, LoanId, LoanStatus, NewLoan, PaymentOutcome};
use crate::domain::money::Balance;
use crate::domain::ports::{LoanStoreBox, PreferenceStoreBox};
use crate::error::{LoanError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// The entry point the front end talks to.
///
/// `LoanTracker` owns the loan collection and the stores it is persisted to.
/// Every mutation is applied to a copy of the collection, saved, and only then
/// made current, so a failed validation or a failed write leaves both the
/// in-memory and the stored state as they were.
pub struct LoanTracker {
    book: LoanBook,
    loan_store: LoanStoreBox,
    preferences: PreferenceStoreBox,
}

impl LoanTracker {
    /// Loads the saved collection, starting empty when nothing was saved yet.
    ///
    /// # Arguments
    ///
    /// * `loan_store` - Where the loan collection is persisted.
    /// * `preferences` - Where the dark-mode flag is persisted.
    pub async fn open(loan_store: LoanStoreBox, preferences: PreferenceStoreBox) -> Result<Self> {
        let book = loan_store.load().await?.unwrap_or_default();
        debug!(loans = book.len(), "opened loan tracker");
        Ok(Self {
            book,
            loan_store,
            preferences,
        })
    }

    async fn commit(&mut self, next: LoanBook) -> Result<()> {
        self.loan_store.save(&next).await?;
        self.book = next;
        Ok(())
    }

    pub async fn add_loan(&mut self, new_loan: NewLoan) -> Result<Loan> {
        let mut next = self.book.clone();
        let loan = next.add_loan(new_loan)?.clone();
        self.commit(next).await?;
        info!(id = %loan.id, name = %loan.name, balance = %loan.remaining_balance.value(), "added loan");
        Ok(loan)
    }

    /// Records a payment against loan `id`.
    ///
    /// An unknown `id` (for example a loan deleted in the meantime) fails with
    /// `NotFound` and changes nothing.
    pub async fn make_payment(
        &mut self,
        id: LoanId,
        amount: Decimal,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<PaymentOutcome> {
        let mut next = self.book.clone();
        let outcome = next.record_payment(id, amount, date, note)?;
        self.commit(next).await?;

        if outcome.absorbed > Balance::ZERO {
            warn!(id = %id, absorbed = %outcome.absorbed.value(), "payment exceeded the outstanding balance");
        }
        if outcome.status == LoanStatus::Paid {
            info!(id = %id, "loan paid off");
        } else {
            debug!(id = %id, remaining = %outcome.remaining_balance.value(), "payment recorded");
        }
        Ok(outcome)
    }

    pub async fn delete_loan(&mut self, id: LoanId) -> Result<Loan> {
        let mut next = self.book.clone();
        let removed = next.delete_loan(id)?;
        self.commit(next).await?;
        info!(id = %id, name = %removed.name, "deleted loan");
        Ok(removed)
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan> {
        self.book
            .get(id)
            .ok_or_else(|| LoanError::NotFound(id.to_string()))
    }

    pub fn loans(&self, query: &str, filter: StatusFilter) -> Vec<&Loan> {
        self.book.search(query, filter)
    }

    pub fn stats(&self, today: NaiveDate) -> LoanStats {
        self.book.stats(today)
    }

    pub async fn dark_mode(&self) -> Result<bool> {
        self.preferences.dark_mode().await
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.preferences.set_dark_mode(enabled).await
    }

    pub fn book(&self) -> &LoanBook {
        &self.book
    }

    /// Consumes the tracker and returns the current collection.
    pub fn into_book(self) -> LoanBook {
        self.book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::LoanStore;
    use crate::domain::schedule::{Cadence, InterestModel, LoanTerms};
    use crate::infrastructure::in_memory::InMemoryStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn car_loan() -> NewLoan {
        NewLoan {
            name: "Car".to_string(),
            terms: LoanTerms {
                principal: dec!(1200),
                rate_percent: dec!(12),
                periods: 12,
                start_date: date(2025, 1, 1),
                model: InterestModel::Amortizing,
                cadence: Cadence::Monthly,
            },
        }
    }

    async fn tracker(store: &InMemoryStore) -> LoanTracker {
        LoanTracker::open(Box::new(store.clone()), Box::new(store.clone()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let store = InMemoryStore::new();
        let mut tracker = tracker(&store).await;

        let loan = tracker.add_loan(car_loan()).await.unwrap();
        tracker
            .make_payment(loan.id, dec!(106.62), date(2025, 2, 1), None)
            .await
            .unwrap();

        let saved = store.load().await.unwrap().unwrap();
        assert_eq!(&saved, tracker.book());
        assert_eq!(saved.loans()[0].payments.len(), 1);

        // A second tracker over the same store sees the same state.
        let reopened = LoanTracker::open(Box::new(store.clone()), Box::new(store.clone()))
            .await
            .unwrap();
        assert_eq!(reopened.into_book(), saved);
    }

    #[tokio::test]
    async fn test_invalid_loan_creates_nothing() {
        let store = InMemoryStore::new();
        let mut tracker = tracker(&store).await;

        let mut bad = car_loan();
        bad.terms.rate_percent = dec!(-1);
        assert!(matches!(
            tracker.add_loan(bad).await,
            Err(LoanError::InvalidInput(_))
        ));
        assert!(tracker.book().is_empty());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payment_after_delete_is_not_found() {
        let store = InMemoryStore::new();
        let mut tracker = tracker(&store).await;

        let loan = tracker.add_loan(car_loan()).await.unwrap();
        tracker.delete_loan(loan.id).await.unwrap();
        let saved = store.load().await.unwrap();

        let result = tracker
            .make_payment(loan.id, dec!(10), date(2025, 2, 1), None)
            .await;
        assert!(matches!(result, Err(LoanError::NotFound(_))));
        assert!(matches!(
            tracker.delete_loan(loan.id).await,
            Err(LoanError::NotFound(_))
        ));
        assert_eq!(store.load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_payoff() {
        let store = InMemoryStore::new();
        let mut tracker = tracker(&store).await;

        let loan = tracker.add_loan(car_loan()).await.unwrap();
        let outcome = tracker
            .make_payment(loan.id, dec!(5000), date(2025, 2, 1), Some("lump sum".into()))
            .await
            .unwrap();

        assert_eq!(outcome.status, LoanStatus::Paid);
        assert_eq!(outcome.remaining_balance, Balance::ZERO);
        assert!(outcome.absorbed > Balance::ZERO);
        assert!(tracker.loan(loan.id).unwrap().is_paid());
        assert_eq!(tracker.loans("", StatusFilter::Paid).len(), 1);
        assert_eq!(tracker.stats(date(2025, 2, 1)).active_loans, 0);
    }

    #[tokio::test]
    async fn test_dark_mode_preference() {
        let store = InMemoryStore::new();
        let tracker = tracker(&store).await;

        assert!(!tracker.dark_mode().await.unwrap());
        tracker.set_dark_mode(true).await.unwrap();
        assert!(tracker.dark_mode().await.unwrap());
    }

    struct FailingStore;

    #[async_trait]
    impl LoanStore for FailingStore {
        async fn load(&self) -> Result<Option<LoanBook>> {
            Ok(None)
        }

        async fn save(&self, _book: &LoanBook) -> Result<()> {
            Err(LoanError::StorageError("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_state() {
        let mut tracker = LoanTracker::open(Box::new(FailingStore), Box::new(InMemoryStore::new()))
            .await
            .unwrap();

        assert!(matches!(
            tracker.add_loan(car_loan()).await,
            Err(LoanError::StorageError(_))
        ));
        assert!(tracker.book().is_empty());
    }
}
