//! Mutation port: notified after every committed device write.

use std::future::Future;

use homepilot_domain::mutation::DeviceMutation;

/// Receives committed device mutations, tagged with their origin.
///
/// Called while the writer still holds the device's lock, so observers see
/// mutations of one device in commit order. Observers must not fail the
/// write: errors are theirs to log.
pub trait MutationObserver: Send + Sync {
    fn on_device_mutation(&self, mutation: &DeviceMutation) -> impl Future<Output = ()> + Send;
}

impl<T: MutationObserver> MutationObserver for std::sync::Arc<T> {
    fn on_device_mutation(&self, mutation: &DeviceMutation) -> impl Future<Output = ()> + Send {
        (**self).on_device_mutation(mutation)
    }
}

/// Observer that ignores every mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MutationObserver for NoopObserver {
    async fn on_device_mutation(&self, _mutation: &DeviceMutation) {}
}
