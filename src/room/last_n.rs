//! Window of the most recently active speakers.

/// Outcome of a [`LastN::touch()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Touch {
    /// Peer was already in the window and has been moved to its front.
    Moved,

    /// Peer has been inserted at the front of the window, pushing out the
    /// returned one (if the window was full).
    Inserted {
        /// Peer evicted from the tail of the window.
        evicted: Option<String>,
    },

    /// Window has zero capacity, so nobody is ever inserted.
    Disabled,
}

/// Bounded list of peer names ordered from the most to the least recently
/// speaking one.
///
/// Never holds more than its capacity of names.
#[derive(Clone, Debug)]
pub struct LastN {
    capacity: usize,
    peers: Vec<String>,
}

impl LastN {
    /// Creates a new empty [`LastN`] window of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            peers: Vec::with_capacity(capacity),
        }
    }

    /// Marks the provided peer as the most recently speaking one.
    pub fn touch(&mut self, peer_name: &str) -> Touch {
        if let Some(idx) = self.peers.iter().position(|p| p == peer_name) {
            let peer = self.peers.remove(idx);
            self.peers.insert(0, peer);
            return Touch::Moved;
        }
        if self.capacity == 0 {
            return Touch::Disabled;
        }

        let evicted = if self.peers.len() >= self.capacity {
            self.peers.pop()
        } else {
            None
        };
        self.peers.insert(0, peer_name.to_owned());
        Touch::Inserted { evicted }
    }

    /// Replaces the whole window with the provided names, keeping only as
    /// many leading ones as fit.
    pub fn replace(&mut self, mut peers: Vec<String>) {
        peers.truncate(self.capacity);
        self.peers = peers;
    }

    /// Forgets the provided peer.
    pub fn remove(&mut self, peer_name: &str) {
        self.peers.retain(|p| p != peer_name);
    }

    /// Indicates whether the provided peer is in the window.
    pub fn contains(&self, peer_name: &str) -> bool {
        self.peers.iter().any(|p| p == peer_name)
    }

    /// Returns peers of the window, the most recently speaking first.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Returns maximum count of peers in the window.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
