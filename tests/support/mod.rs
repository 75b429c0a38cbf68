use star_session::{PeerId, SignalingClient, SignalingError, SignalingErrorKind, SignalingEvent};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Shared in-memory rendezvous service + data channels (all peers read and
/// write through the hub), with fault knobs for the failure paths.
pub struct HubState {
    slots: HashMap<PeerId, Slot>,
    /// Dials to these ids vanish without a response (NAT-style silence).
    black_holes: BTreeSet<PeerId>,
    /// Error kind injected into the next `open` call.
    fail_next_open: Option<SignalingErrorKind>,
}

struct Slot {
    queue: VecDeque<SignalingEvent>,
    links: BTreeSet<PeerId>,
}

impl Slot {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            links: BTreeSet::new(),
        }
    }
}

/// Handle to the hub, shared between all test peers.
#[derive(Clone)]
pub struct SignalingHub {
    inner: Arc<Mutex<HubState>>,
}

impl SignalingHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubState {
                slots: HashMap::new(),
                black_holes: BTreeSet::new(),
                fail_next_open: None,
            })),
        }
    }

    /// A signaling client whose id is service-assigned (random).
    pub fn client(&self) -> HubClient {
        HubClient {
            hub: self.inner.clone(),
            local: None,
            preset: None,
            pending: VecDeque::new(),
        }
    }

    /// A signaling client that gets `id` when it opens without a desired
    /// id, so tests can control election outcomes.
    pub fn client_with_id(&self, id: &str) -> HubClient {
        HubClient {
            hub: self.inner.clone(),
            local: None,
            preset: Some(id.to_string()),
            pending: VecDeque::new(),
        }
    }

    /// Make the next `open` fail with `kind` (delivered as an event, the
    /// way a rendezvous service reports it).
    pub fn fail_next_open(&self, kind: SignalingErrorKind) {
        self.inner.lock().unwrap().fail_next_open = Some(kind);
    }

    /// Dials to `id` get no response at all.
    pub fn black_hole(&self, id: &str) {
        self.inner
            .lock()
            .unwrap()
            .black_holes
            .insert(PeerId::new(id));
    }

    /// Crash a peer: its registration disappears and every linked peer
    /// observes a close.
    pub fn kill(&self, id: &str) {
        let dead = PeerId::new(id);
        let mut hub = self.inner.lock().unwrap();
        let links = match hub.slots.remove(&dead) {
            Some(slot) => slot.links,
            None => return,
        };
        for remote in links {
            if let Some(slot) = hub.slots.get_mut(&remote) {
                slot.links.remove(&dead);
                slot.queue
                    .push_back(SignalingEvent::ConnectionClosed(dead.clone()));
            }
        }
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .slots
            .contains_key(&PeerId::new(id))
    }
}

/// One peer's view of the hub, implementing the signaling port.
pub struct HubClient {
    hub: Arc<Mutex<HubState>>,
    local: Option<PeerId>,
    preset: Option<String>,
    /// Events produced before a slot exists (registration failures).
    pending: VecDeque<SignalingEvent>,
}

impl SignalingClient for HubClient {
    fn open(&mut self, desired_id: Option<&str>) -> Result<(), SignalingError> {
        let mut hub = self.hub.lock().unwrap();

        if let Some(kind) = hub.fail_next_open.take() {
            self.pending.push_back(SignalingEvent::Error {
                peer: None,
                error: SignalingError::new(kind),
            });
            return Ok(());
        }

        let id = PeerId::new(
            desired_id
                .map(str::to_string)
                .or_else(|| self.preset.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        );

        if hub.slots.contains_key(&id) {
            self.pending.push_back(SignalingEvent::Error {
                peer: None,
                error: SignalingError::new(SignalingErrorKind::IdTaken),
            });
            return Ok(());
        }

        hub.slots.insert(id.clone(), Slot::new());
        self.local = Some(id.clone());
        self.pending.push_back(SignalingEvent::Opened(id));
        Ok(())
    }

    fn listen(&mut self) -> Result<(), SignalingError> {
        // Every registered peer accepts inbound dials here, as PeerJS-style
        // services do; nothing to flip.
        Ok(())
    }

    fn connect(&mut self, target: &PeerId) -> Result<(), SignalingError> {
        let local = match self.local.clone() {
            Some(local) => local,
            None => return Err(SignalingError::new(SignalingErrorKind::Disconnected)),
        };
        let mut hub = self.hub.lock().unwrap();

        if hub.black_holes.contains(target) {
            return Ok(());
        }

        if !hub.slots.contains_key(target) {
            self.pending.push_back(SignalingEvent::Error {
                peer: Some(target.clone()),
                error: SignalingError::new(SignalingErrorKind::RoomNotFound),
            });
            return Ok(());
        }

        {
            let remote = hub.slots.get_mut(target).unwrap();
            remote.links.insert(local.clone());
            remote
                .queue
                .push_back(SignalingEvent::IncomingConnection(local.clone()));
            remote
                .queue
                .push_back(SignalingEvent::ConnectionOpened(local.clone()));
        }
        let own = hub.slots.get_mut(&local).unwrap();
        own.links.insert(target.clone());
        own.queue
            .push_back(SignalingEvent::ConnectionOpened(target.clone()));
        Ok(())
    }

    fn send_to(&mut self, peer: &PeerId, payload: &[u8]) -> Result<(), SignalingError> {
        let local = match self.local.clone() {
            Some(local) => local,
            None => return Err(SignalingError::new(SignalingErrorKind::Disconnected)),
        };
        let mut hub = self.hub.lock().unwrap();

        let linked = hub
            .slots
            .get(&local)
            .map(|slot| slot.links.contains(peer))
            .unwrap_or(false);
        if !linked {
            return Err(SignalingError::with_detail(
                SignalingErrorKind::Network,
                format!("no link to {peer}"),
            ));
        }

        hub.slots
            .get_mut(peer)
            .expect("linked peer has a slot")
            .queue
            .push_back(SignalingEvent::Data {
                from: local,
                payload: payload.to_vec(),
            });
        Ok(())
    }

    fn close(&mut self, peer: &PeerId) {
        let local = match self.local.clone() {
            Some(local) => local,
            None => return,
        };
        let mut hub = self.hub.lock().unwrap();

        if let Some(own) = hub.slots.get_mut(&local) {
            own.links.remove(peer);
        }
        if let Some(remote) = hub.slots.get_mut(peer) {
            if remote.links.remove(&local) {
                remote
                    .queue
                    .push_back(SignalingEvent::ConnectionClosed(local));
            }
        }
    }

    fn close_session(&mut self) {
        let local = match self.local.take() {
            Some(local) => local,
            None => return,
        };
        let mut hub = self.hub.lock().unwrap();

        let links = match hub.slots.remove(&local) {
            Some(slot) => slot.links,
            None => return,
        };
        for remote in links {
            if let Some(slot) = hub.slots.get_mut(&remote) {
                slot.links.remove(&local);
                slot.queue
                    .push_back(SignalingEvent::ConnectionClosed(local.clone()));
            }
        }
    }

    fn poll_events(&mut self) -> Vec<SignalingEvent> {
        let mut events: Vec<SignalingEvent> = self.pending.drain(..).collect();
        if let Some(local) = &self.local {
            let mut hub = self.hub.lock().unwrap();
            if let Some(slot) = hub.slots.get_mut(local) {
                events.extend(slot.queue.drain(..));
            }
        }
        events
    }
}

/// Initialize test logging once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "star_session=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
