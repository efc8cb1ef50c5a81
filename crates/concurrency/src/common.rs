//! Steps shared by every strategy

use crate::cancel::CancellationToken;
use lockbench_core::error::{Error, Result};
use lockbench_core::traits::StoreTransaction;
use lockbench_core::types::CounterId;

/// Reject non-positive quantities before touching the store
pub(crate) fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity <= 0 {
        return Err(Error::InvalidInput(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

/// `stock - quantity`; negative results are allowed, overflow is not
pub(crate) fn decremented(id: CounterId, stock: i64, quantity: i64) -> Result<i64> {
    stock.checked_sub(quantity).ok_or_else(|| {
        Error::InvalidInput(format!(
            "decrementing counter {} by {} overflows stock {}",
            id, quantity, stock
        ))
    })
}

/// Commit `txn`, or roll it back if cancellation arrived first
pub(crate) fn commit_unless_cancelled(
    txn: Box<dyn StoreTransaction + '_>,
    cancel: &CancellationToken,
) -> Result<()> {
    if let Err(e) = cancel.check() {
        txn.rollback();
        return Err(e);
    }
    txn.commit()
}
