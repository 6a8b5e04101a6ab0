use super::{SegmentId, TransactionId};
use crate::error::Result;
use crate::traits::{ISegmentTracer, ITransactionTracer};

/// A transaction that ends when dropped.
///
/// Use [`TransactionScope::finish`] to observe the result of ending it; a
/// failure on drop is only logged.
pub struct TransactionScope<'a, T: ITransactionTracer + ?Sized> {
    tracer: &'a T,
    id: TransactionId,
    ended: bool,
}

impl<'a, T: ITransactionTracer + ?Sized> TransactionScope<'a, T> {
    pub fn begin(tracer: &'a T) -> Self {
        let id = tracer.begin_transaction();
        TransactionScope { tracer, id, ended: false }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn finish(mut self) -> Result<()> {
        self.ended = true;
        self.tracer.end_transaction(self.id)
    }
}

impl<'a, T: ITransactionTracer + ISegmentTracer + ?Sized> TransactionScope<'a, T> {
    /// Begins a generic segment of this transaction.
    pub fn segment(&self, parent: SegmentId, name: &str) -> Result<SegmentScope<'a, T>> {
        SegmentScope::generic(self.tracer, self.id, parent, name)
    }
}

impl<T: ITransactionTracer + ?Sized> Drop for TransactionScope<'_, T> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(e) = self.tracer.end_transaction(self.id) {
            log::warn!("newrelic: dropping transaction {}: {}", self.id, e);
        }
    }
}

/// A segment that ends when dropped.
pub struct SegmentScope<'a, T: ISegmentTracer + ?Sized> {
    tracer: &'a T,
    transaction: TransactionId,
    id: SegmentId,
    ended: bool,
}

impl<'a, T: ISegmentTracer + ?Sized> SegmentScope<'a, T> {
    pub fn generic(
        tracer: &'a T,
        transaction: TransactionId,
        parent: SegmentId,
        name: &str,
    ) -> Result<Self> {
        let id = tracer.begin_generic_segment(transaction, parent, name)?;
        Ok(Self::adopt(tracer, transaction, id))
    }

    /// Takes ownership of a segment begun elsewhere.
    pub fn adopt(tracer: &'a T, transaction: TransactionId, id: SegmentId) -> Self {
        SegmentScope { tracer, transaction, id, ended: false }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Begins a generic segment nested under this one.
    pub fn child(&self, name: &str) -> Result<SegmentScope<'a, T>> {
        SegmentScope::generic(self.tracer, self.transaction, self.id, name)
    }

    pub fn finish(mut self) -> Result<()> {
        self.ended = true;
        self.tracer.end_segment(self.transaction, self.id)
    }
}

impl<T: ISegmentTracer + ?Sized> Drop for SegmentScope<'_, T> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(e) = self.tracer.end_segment(self.transaction, self.id) {
            log::warn!(
                "newrelic: dropping segment {} of transaction {}: {}",
                self.id,
                self.transaction,
                e
            );
        }
    }
}
