//! Arena of engine event subscriptions.

use std::{cell::RefCell, collections::HashMap};

use derive_more::Display;

use crate::{
    engine::{ConsumerId, ProducerId, TransportDirection},
    media::MediaSource,
};

use super::TaskHandle;

/// Key of a single engine entity whose events are being watched.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub enum SubscriptionKey {
    /// Room-level events of the [`MediaEngine`].
    ///
    /// [`MediaEngine`]: crate::engine::MediaEngine
    #[display(fmt = "engine")]
    Engine,

    /// Events of the [`Transport`] with the given direction.
    ///
    /// [`Transport`]: crate::engine::Transport
    #[display(fmt = "transport:{}", _0)]
    Transport(TransportDirection),

    /// Events of the [`Producer`] occupying the given slot.
    ///
    /// [`Producer`]: crate::engine::Producer
    #[display(fmt = "producer:{}:{}", _0, _1)]
    Producer(MediaSource, ProducerId),

    /// Events of a [`Consumer`].
    ///
    /// [`Consumer`]: crate::engine::Consumer
    #[display(fmt = "consumer:{}", _0)]
    Consumer(ConsumerId),

    /// Events of a [`RemotePeer`] with the given name.
    ///
    /// [`RemotePeer`]: crate::engine::RemotePeer
    #[display(fmt = "peer:{}", _0)]
    Peer(String),
}

/// Entity-keyed storage of watcher [`TaskHandle`]s.
///
/// Every entity has at most one live watcher: inserting a new one under an
/// occupied key aborts the previous watcher, so re-subscribing never doubles
/// event handlers.
#[derive(Debug, Default)]
pub struct Subscriptions(RefCell<HashMap<SubscriptionKey, TaskHandle>>);

impl Subscriptions {
    /// Stores the provided watcher under the provided [`SubscriptionKey`],
    /// aborting the watcher previously stored there (if any).
    pub fn insert(&self, key: SubscriptionKey, handle: TaskHandle) {
        let prev = self.0.borrow_mut().insert(key, handle);
        drop(prev);
    }

    /// Aborts and forgets the watcher of the provided [`SubscriptionKey`].
    pub fn remove(&self, key: &SubscriptionKey) {
        let removed = self.0.borrow_mut().remove(key);
        drop(removed);
    }

    /// Aborts and forgets every watcher matching the provided predicate.
    pub fn remove_where<F>(&self, mut predicate: F)
    where
        F: FnMut(&SubscriptionKey) -> bool,
    {
        let removed: Vec<_> = {
            let mut subs = self.0.borrow_mut();
            let keys: Vec<_> =
                subs.keys().filter(|k| predicate(k)).cloned().collect();
            keys.into_iter().filter_map(|k| subs.remove(&k)).collect()
        };
        drop(removed);
    }

    /// Indicates whether a watcher is stored under the provided
    /// [`SubscriptionKey`].
    pub fn contains(&self, key: &SubscriptionKey) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Returns count of the stored watchers.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Indicates whether there are no stored watchers.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Aborts every stored watcher.
    pub fn clear(&self) {
        let all = self.0.replace(HashMap::new());
        drop(all);
    }
}
