use async_trait::async_trait;

use crate::types::Batch;

/// Per-batch user callback.
///
/// The batch processor calls `handle` exactly once per sealed batch, in
/// sequence order, never concurrently. Returning an error (or panicking) marks
/// that batch failed; the next batch is still delivered.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, batch: &Batch) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// Adapter turning a plain synchronous closure into a [`BatchHandler`].
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

/// Wrap a closure as a named batch handler.
///
/// ```
/// use the_microbatch::traits::handler_fn;
///
/// let handler = handler_fn("counter", |batch| {
///     println!("batch {} has {} records", batch.sequence, batch.len());
///     Ok(())
/// });
/// ```
pub fn handler_fn<F>(name: &'static str, f: F) -> FnHandler<F>
where
    F: Fn(&Batch) -> anyhow::Result<()> + Send + Sync,
{
    FnHandler { name, f }
}

#[async_trait]
impl<F> BatchHandler for FnHandler<F>
where
    F: Fn(&Batch) -> anyhow::Result<()> + Send + Sync,
{
    async fn handle(&self, batch: &Batch) -> anyhow::Result<()> {
        (self.f)(batch)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
