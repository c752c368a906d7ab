//! Contact tracking and event delivery.

use std::collections::BTreeSet;
use std::sync::{Mutex, RwLock};

use crossbeam_channel::{Receiver, Sender};

use crate::object::BodyId;
use crate::sync;

/// Engine-facing contact event. Uses `BodyId` only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HammerEvent {
    ContactAdded { a: BodyId, b: BodyId },
    ContactPersisted { a: BodyId, b: BodyId },
    ContactExit { a: BodyId, b: BodyId },
    /// A sprite touched tilemap geometry during the step.
    TilemapContactPersisted { body: BodyId },
}

/// Unordered pair of bodies, stored with the smaller id first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactPair {
    a: BodyId,
    b: BodyId,
}

impl ContactPair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    pub fn a(&self) -> BodyId {
        self.a
    }

    pub fn b(&self) -> BodyId {
        self.b
    }

    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }
}

/// Pairs that were touching at the end of the last completed step.
#[derive(Debug, Default)]
pub(crate) struct ContactMap {
    pairs: BTreeSet<ContactPair>,
}

impl ContactMap {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn contains(&self, pair: &ContactPair) -> bool {
        self.pairs.contains(pair)
    }

    /// Replace the map with this step's `touching` set and return the
    /// transitions: exits for pairs whose bodies are gone, then added or
    /// persisted for every touching pair, then exits for pairs that
    /// separated.
    pub fn reconcile(
        &mut self,
        touching: &BTreeSet<ContactPair>,
        is_alive: impl Fn(BodyId) -> bool,
    ) -> Vec<HammerEvent> {
        let mut events = Vec::new();

        let (stale, live): (Vec<ContactPair>, Vec<ContactPair>) = self
            .pairs
            .iter()
            .copied()
            .partition(|pair| !(is_alive(pair.a) && is_alive(pair.b)));
        for pair in &stale {
            self.pairs.remove(pair);
            events.push(HammerEvent::ContactExit { a: pair.a, b: pair.b });
        }

        for pair in touching {
            if self.pairs.insert(*pair) {
                events.push(HammerEvent::ContactAdded { a: pair.a, b: pair.b });
            } else {
                events.push(HammerEvent::ContactPersisted { a: pair.a, b: pair.b });
            }
        }

        for pair in live.into_iter().filter(|pair| !touching.contains(pair)) {
            self.pairs.remove(&pair);
            events.push(HammerEvent::ContactExit { a: pair.a, b: pair.b });
        }

        events
    }
}

type ContactCallback = Box<dyn Fn(BodyId, BodyId) + Send + Sync>;
type BodyCallback = Box<dyn Fn(BodyId) + Send + Sync>;

/// Subscribers to contact events.
///
/// Callbacks run synchronously on the thread that stepped the world, after
/// the world has released its locks. They may use the interface, but must
/// not register further listeners.
#[derive(Default)]
pub struct ContactListeners {
    added: RwLock<Vec<ContactCallback>>,
    persisted: RwLock<Vec<ContactCallback>>,
    exit: RwLock<Vec<ContactCallback>>,
    tilemap_persisted: RwLock<Vec<BodyCallback>>,
    channels: Mutex<Vec<Sender<HammerEvent>>>,
}

impl ContactListeners {
    pub fn on_contact_added<F>(&self, callback: F)
    where
        F: Fn(BodyId, BodyId) + Send + Sync + 'static,
    {
        sync::write(&self.added).push(Box::new(callback));
    }

    pub fn on_contact_persisted<F>(&self, callback: F)
    where
        F: Fn(BodyId, BodyId) + Send + Sync + 'static,
    {
        sync::write(&self.persisted).push(Box::new(callback));
    }

    pub fn on_contact_exit<F>(&self, callback: F)
    where
        F: Fn(BodyId, BodyId) + Send + Sync + 'static,
    {
        sync::write(&self.exit).push(Box::new(callback));
    }

    pub fn on_tilemap_contact_persisted<F>(&self, callback: F)
    where
        F: Fn(BodyId) + Send + Sync + 'static,
    {
        sync::write(&self.tilemap_persisted).push(Box::new(callback));
    }

    /// Open an unbounded channel that receives every event from now on.
    pub fn subscribe(&self) -> Receiver<HammerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        sync::lock(&self.channels).push(tx);
        rx
    }

    pub(crate) fn dispatch(&self, events: &[HammerEvent]) {
        if events.is_empty() {
            return;
        }

        for event in events {
            match *event {
                HammerEvent::ContactAdded { a, b } => {
                    sync::read(&self.added).iter().for_each(|cb| cb(a, b));
                }
                HammerEvent::ContactPersisted { a, b } => {
                    sync::read(&self.persisted).iter().for_each(|cb| cb(a, b));
                }
                HammerEvent::ContactExit { a, b } => {
                    sync::read(&self.exit).iter().for_each(|cb| cb(a, b));
                }
                HammerEvent::TilemapContactPersisted { body } => {
                    sync::read(&self.tilemap_persisted).iter().for_each(|cb| cb(body));
                }
            }
        }

        // Drop subscribers whose receiver has gone away.
        sync::lock(&self.channels)
            .retain(|tx| events.iter().all(|event| tx.send(*event).is_ok()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn id(raw: u64) -> BodyId {
        BodyId::from_raw(raw)
    }

    #[test]
    fn pair_is_unordered() {
        assert_eq!(ContactPair::new(id(2), id(1)), ContactPair::new(id(1), id(2)));
        assert!(ContactPair::new(id(2), id(1)).involves(id(2)));
        assert_eq!(ContactPair::new(id(9), id(3)).a(), id(3));
    }

    #[test]
    fn reconcile_walks_enter_stay_exit() {
        let mut map = ContactMap::default();
        let pair = ContactPair::new(id(1), id(2));
        let touching: BTreeSet<_> = [pair].into_iter().collect();

        let first = map.reconcile(&touching, |_| true);
        assert_eq!(first, vec![HammerEvent::ContactAdded { a: id(1), b: id(2) }]);

        let second = map.reconcile(&touching, |_| true);
        assert_eq!(second, vec![HammerEvent::ContactPersisted { a: id(1), b: id(2) }]);

        let third = map.reconcile(&BTreeSet::new(), |_| true);
        assert_eq!(third, vec![HammerEvent::ContactExit { a: id(1), b: id(2) }]);
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn reconcile_drops_pairs_with_removed_bodies() {
        let mut map = ContactMap::default();
        let pair = ContactPair::new(id(1), id(2));
        map.reconcile(&[pair].into_iter().collect(), |_| true);

        let events = map.reconcile(&BTreeSet::new(), |body| body != id(2));
        assert_eq!(events, vec![HammerEvent::ContactExit { a: id(1), b: id(2) }]);
        assert!(!map.contains(&pair));
    }

    #[test]
    fn dispatch_reaches_callbacks_and_channels() {
        let listeners = ContactListeners::default();
        let added = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&added);
        listeners.on_contact_added(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let rx = listeners.subscribe();

        let events = [
            HammerEvent::ContactAdded { a: id(1), b: id(2) },
            HammerEvent::TilemapContactPersisted { body: id(1) },
        ];
        listeners.dispatch(&events);

        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), events.to_vec());
    }

    #[test]
    fn closed_channels_are_pruned() {
        let listeners = ContactListeners::default();
        drop(listeners.subscribe());
        listeners.dispatch(&[HammerEvent::TilemapContactPersisted { body: id(1) }]);
        assert!(sync::lock(&listeners.channels).is_empty());
    }
}
