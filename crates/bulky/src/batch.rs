use std::ops::Deref;
use std::sync::Arc;
use uuid::Uuid;

/// # Batch
///
/// An ordered, immutable group of items dispatched together to a single
/// [`EventSink::on_process`](crate::EventSink::on_process) invocation.
///
/// Items live behind an [`Arc`], so cloning a batch is cheap. The worker keeps
/// a clone while the callback runs so a timed-out batch can still be reported
/// to the sink.
///
/// Each batch carries a random identifier that tags every log record emitted
/// for it.
#[derive(Debug)]
pub struct Batch<T> {
    id: Uuid,
    items: Arc<Vec<T>>,
}

impl<T> Batch<T> {
    /// Freezes `items` into a new batch with a fresh identifier.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            id: Uuid::new_v4(),
            items: Arc::new(items),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the owned items, cloning them only if the batch is still shared.
    pub fn into_vec(self) -> Vec<T>
    where T: Clone
    {
        Arc::unwrap_or_clone(self.items)
    }
}

impl<T> Clone for Batch<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Deref for Batch<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T> AsRef<[T]> for Batch<T> {
    fn as_ref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a Batch<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_item_order() {
        let batch = Batch::new(vec![3, 1, 2]);
        assert_eq!(batch.items(), &[3, 1, 2]);
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
        assert_eq!(batch.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn test_clone_shares_identity_and_items() {
        let batch = Batch::new(vec![String::from("a"), String::from("b")]);
        let clone = batch.clone();

        assert_eq!(batch.id(), clone.id());
        assert!(Arc::ptr_eq(&batch.items, &clone.items));
    }

    #[test]
    fn test_fresh_batches_get_distinct_ids() {
        let first = Batch::new(vec![1]);
        let second = Batch::new(vec![1]);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_into_vec_while_shared() {
        let batch = Batch::new(vec![1, 2, 3]);
        let held = batch.clone();

        assert_eq!(batch.into_vec(), vec![1, 2, 3]);
        // the other handle is untouched
        assert_eq!(&*held, &[1, 2, 3]);
    }
}
