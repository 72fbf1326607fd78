//! Miscellaneous utility structs and functions.

mod subscriptions;

use std::time::Duration;

use derive_more::From;
use futures::{
    future::{self, AbortHandle},
    Future, Stream, StreamExt as _,
};

#[doc(inline)]
pub use self::subscriptions::{SubscriptionKey, Subscriptions};

/// Generates [`Debug`] implementation for a provided structure with name of
/// this structure.
///
/// Handy for structures holding trait objects of external collaborators.
///
/// # Example
///
/// ```
/// # use medea_room_client::impl_debug_by_struct_name;
/// struct Foo;
///
/// impl_debug_by_struct_name!(Foo);
///
/// assert_eq!(format!("{:?}", Foo), "Foo")
/// ```
///
/// [`Debug`]: std::fmt::Debug
#[macro_export]
macro_rules! impl_debug_by_struct_name {
    ($ty:ty) => {
        impl ::std::fmt::Debug for $ty {
            fn fmt(
                &self,
                f: &mut ::std::fmt::Formatter<'_>,
            ) -> ::std::result::Result<(), ::std::fmt::Error> {
                f.debug_struct(stringify!($ty)).finish()
            }
        }
    };
}

/// Upgrades provided [`Weak`] reference, mapping it to a [`Result`] with
/// [`RoomError::Detached`] wrapped into [`tracerr::Traced`].
///
/// [`RoomError::Detached`]: crate::room::RoomError::Detached
/// [`Weak`]: std::rc::Weak
macro_rules! upgrade_or_detached {
    ($v:expr) => {
        $v.upgrade()
            .ok_or_else(|| tracerr::new!($crate::room::RoomError::Detached))
    };
}

/// Runs a [`Future`] on the current thread.
///
/// # Panics
///
/// If called outside of a [`tokio::task::LocalSet`] context.
#[inline]
pub fn spawn<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    drop(tokio::task::spawn_local(task));
}

/// [`Future`] which resolves after the provided [`Duration`].
#[inline]
pub async fn delay_for(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// Wrapper around [`AbortHandle`] which aborts [`Future`] on [`Drop`].
#[derive(Debug, From)]
pub struct TaskHandle(AbortHandle);

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawns a watcher feeding every item of the provided [`Stream`] into the
/// `handle` function until the [`Stream`] ends or the returned [`TaskHandle`]
/// is dropped.
pub fn spawn_watcher<S, F>(mut stream: S, mut handle: F) -> TaskHandle
where
    S: Stream + Unpin + 'static,
    F: FnMut(S::Item) + 'static,
{
    let (fut, abort) = future::abortable(async move {
        while let Some(item) = stream.next().await {
            handle(item);
        }
    });
    spawn(async move {
        let _ = fut.await;
    });
    TaskHandle(abort)
}
