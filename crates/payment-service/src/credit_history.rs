use common::{CustomerId, Money};

/// A customer's running ledger of credits and debits. Invariant: total
/// credits must never fall below total debits; a `debit` that would break
/// that is rejected rather than applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditHistory {
    pub customer_id: CustomerId,
    pub total_credits: Money,
    pub total_debits: Money,
}

impl CreditHistory {
    /// A customer not yet seen starts with no credit line at all, so their
    /// first debit fails until they have been credited.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            total_credits: Money::ZERO,
            total_debits: Money::ZERO,
        }
    }

    pub fn available(&self) -> Money {
        self.total_credits - self.total_debits
    }

    /// Applies a forward payment debit. Rejected in place (the history is
    /// left unchanged) if it would push debits past credits.
    pub fn debit(&mut self, amount: Money) -> Result<(), InsufficientCredit> {
        if self.available() < amount {
            return Err(InsufficientCredit);
        }
        self.total_debits = self.total_debits + amount;
        Ok(())
    }

    /// Applies a compensating credit (reversing a prior debit on
    /// cancellation). Always succeeds.
    pub fn credit(&mut self, amount: Money) {
        self.total_credits = self.total_credits + amount;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientCredit;

impl std::fmt::Display for InsufficientCredit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Customer has no enough credit")
    }
}

impl std::error::Error for InsufficientCredit {}
