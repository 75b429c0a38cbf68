use crate::application::{JoinTimeoutGuard, SessionConfig, SessionEvent};
use crate::domain::{
    elect, Connection, ConnectionRegistry, MembershipTracker, PeerId, Role, RoleState, RoomCode,
};
use crate::error::{Result, SessionError};
use crate::infrastructure::{
    Envelope, PayloadKind, SignalingClient, SignalingError, SignalingErrorKind, SignalingEvent,
};

/// The session aggregate: role state machine, connection registry,
/// membership roster, message router, and migration orchestrator, driven
/// by polling the injected signaling transport.
///
/// Single-threaded and event-driven: every state transition happens inside
/// [`Session::poll`] or one of the explicit operations. Boundary events
/// accumulate between polls and are returned by the next one.
pub struct Session<S: SignalingClient> {
    signaling: S,
    config: SessionConfig,
    state: RoleState,
    self_id: Option<PeerId>,
    room_code: Option<RoomCode>,
    current_host: Option<PeerId>,
    registry: ConnectionRegistry,
    membership: MembershipTracker,
    join_guard: Option<JoinTimeoutGuard>,
    /// Most recently received state payload, kept only to bridge a
    /// migration gap. Never interpreted here.
    cached_state: Option<String>,
    migration_attempts: usize,
    migration_cap: Option<usize>,
    events: Vec<SessionEvent>,
}

impl<S: SignalingClient> Session<S> {
    pub fn new(signaling: S) -> Self {
        Self::with_config(signaling, SessionConfig::default())
    }

    pub fn with_config(signaling: S, config: SessionConfig) -> Self {
        Self {
            signaling,
            config,
            state: RoleState::Unbound,
            self_id: None,
            room_code: None,
            current_host: None,
            registry: ConnectionRegistry::new(),
            membership: MembershipTracker::new(),
            join_guard: None,
            cached_state: None,
            migration_attempts: 0,
            migration_cap: None,
            events: Vec::new(),
        }
    }

    /// Create a room and start acting as host.
    ///
    /// Registers with the rendezvous service under a freshly generated
    /// room code; [`SessionEvent::RoomCreated`] arrives once the service
    /// acknowledges.
    pub fn create_room(&mut self) -> Result<RoomCode> {
        self.require_unbound()?;

        let code = RoomCode::generate();
        tracing::info!("creating room {}", code);

        self.signaling.open(Some(code.as_str()))?;
        if let Err(error) = self.signaling.listen() {
            self.signaling.close_session();
            return Err(error.into());
        }

        self.state = RoleState::Host;
        self.self_id = Some(code.as_peer_id());
        self.current_host = Some(code.as_peer_id());
        self.room_code = Some(code.clone());
        Ok(code)
    }

    /// Join the room addressed by `code` and start acting as client.
    ///
    /// The connection to the host is dialed once the rendezvous service
    /// assigns us a peer id; the join timeout is armed now.
    pub fn join_room(&mut self, code: &str) -> Result<()> {
        self.require_unbound()?;

        let code = RoomCode::parse(code)?;
        tracing::info!("joining room {}", code);

        self.signaling.open(None)?;

        self.state = RoleState::Client;
        self.current_host = Some(code.as_peer_id());
        self.room_code = Some(code);
        self.join_guard = Some(JoinTimeoutGuard::arm(self.config.join_timeout));
        Ok(())
    }

    /// Leave the room and terminate the session. Idempotent.
    pub fn leave(&mut self) {
        tracing::info!("leaving room");
        self.teardown(RoleState::Terminated);
    }

    /// Drain transport events, advance timers, and return the boundary
    /// events produced since the last poll.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        for event in self.signaling.poll_events() {
            self.apply(event);
        }

        let expired = self
            .join_guard
            .as_mut()
            .map(|guard| guard.poll_expired())
            .unwrap_or(false);
        if expired {
            self.fire_join_timeout();
        }

        std::mem::take(&mut self.events)
    }

    /// Send a state payload to every client with an open link. Host only;
    /// links not yet open are silently skipped.
    pub fn broadcast(&mut self, kind: PayloadKind, data: &str) -> Result<()> {
        self.require_role(Role::Host)?;
        if kind != PayloadKind::State {
            return Err(SessionError::WrongPayloadKind {
                kind,
                role: Role::Host,
            });
        }

        let bytes = Envelope::new(kind, data).encode()?;
        for peer in self.registry.open_peers() {
            if let Err(error) = self.signaling.send_to(&peer, &bytes) {
                // One misbehaving link must not fail the whole broadcast;
                // its close event will prune it.
                tracing::warn!("send to {} failed: {}", peer, error);
            }
        }
        Ok(())
    }

    /// Send an input payload to the host. Client only; requires the host
    /// link to be open.
    pub fn send(&mut self, kind: PayloadKind, data: &str) -> Result<()> {
        self.require_role(Role::Client)?;
        if kind != PayloadKind::Input {
            return Err(SessionError::WrongPayloadKind {
                kind,
                role: Role::Client,
            });
        }

        let host = self.current_host.clone().ok_or(SessionError::NotConnected)?;
        if !self.registry.get(&host).map(Connection::is_open).unwrap_or(false) {
            return Err(SessionError::NotConnected);
        }

        let bytes = Envelope::new(kind, data).encode()?;
        self.signaling.send_to(&host, &bytes)?;
        Ok(())
    }

    /// Report peer ids the application decoded out of a state payload.
    ///
    /// Payloads are opaque to this core, so a client's indirect membership
    /// knowledge enters here. Entries are tracked as best-effort and may
    /// be stale before a migration.
    pub fn observe_peers(&mut self, peers: impl IntoIterator<Item = PeerId>) -> Result<()> {
        self.require_role(Role::Client)?;
        for peer in peers {
            if self.self_id.as_ref() == Some(&peer) {
                continue;
            }
            self.membership.add_observed(peer);
        }
        Ok(())
    }

    pub fn state(&self) -> RoleState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.state.role()
    }

    pub fn self_id(&self) -> Option<&PeerId> {
        self.self_id.as_ref()
    }

    pub fn current_host(&self) -> Option<&PeerId> {
        self.current_host.as_ref()
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room_code.as_ref()
    }

    /// The membership roster, in lexicographic order.
    pub fn peers(&self) -> Vec<PeerId> {
        self.membership.ids().cloned().collect()
    }

    /// Peers with an open link.
    pub fn open_peers(&self) -> Vec<PeerId> {
        self.registry.open_peers()
    }

    /// The last state payload received before a migration, for re-seeding
    /// the simulation after a promotion.
    pub fn cached_state(&self) -> Option<&str> {
        self.cached_state.as_deref()
    }

    // ---- event handling ------------------------------------------------

    fn apply(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::Opened(id) => self.on_opened(id),
            SignalingEvent::IncomingConnection(peer) => self.on_incoming(peer),
            SignalingEvent::ConnectionOpened(peer) => self.on_connection_opened(peer),
            SignalingEvent::Data { from, payload } => self.on_data(from, &payload),
            SignalingEvent::ConnectionClosed(peer) => self.on_connection_closed(peer),
            SignalingEvent::Error { peer, error } => self.on_error(peer, error),
        }
    }

    fn on_opened(&mut self, id: PeerId) {
        match self.state {
            RoleState::Host => {
                tracing::info!("room registered as {}", id);
                self.self_id = Some(id.clone());
                self.events.push(SessionEvent::RoomCreated(id));
            }
            RoleState::Client => {
                tracing::debug!("assigned peer id {}", id);
                self.self_id = Some(id);

                let host = match self.current_host.clone() {
                    Some(host) => host,
                    None => return,
                };
                self.registry.register(Connection::connecting(host.clone()));
                if let Err(error) = self.signaling.connect(&host) {
                    tracing::warn!("dialing host {} failed: {}", host, error);
                    self.fail_join(error.user_message().to_string());
                }
            }
            RoleState::Unbound | RoleState::Terminated => {
                tracing::debug!("ignoring open event in {} state", self.state);
            }
        }
    }

    fn on_incoming(&mut self, peer: PeerId) {
        if self.state != RoleState::Host {
            tracing::warn!("unexpected incoming connection from {} as {}", peer, self.state);
            return;
        }
        tracing::debug!("client {} connecting", peer);
        self.registry.register(Connection::connecting(peer.clone()));
        self.membership.add_direct(peer);
    }

    fn on_connection_opened(&mut self, peer: PeerId) {
        if !self.registry.mark_open(&peer) {
            // Open without a prior register; tolerate and track it.
            let mut connection = Connection::connecting(peer.clone());
            connection.mark_open();
            self.registry.register(connection);
        }

        match self.state {
            RoleState::Host => {
                tracing::info!("client {} connected", peer);
                self.membership.add_direct(peer.clone());
                self.events.push(SessionEvent::PeerConnected {
                    role: Role::Host,
                    peer_id: Some(peer),
                    room_code: None,
                });
            }
            RoleState::Client if self.current_host.as_ref() == Some(&peer) => {
                tracing::info!("connected to host {}", peer);
                self.cancel_join_guard();
                self.membership.add_direct(peer);
                self.migration_attempts = 0;
                self.migration_cap = None;
                self.events.push(SessionEvent::PeerConnected {
                    role: Role::Client,
                    peer_id: None,
                    room_code: self.room_code.clone(),
                });
            }
            _ => {
                tracing::warn!("unexpected open link to {} as {}", peer, self.state);
            }
        }
    }

    fn on_data(&mut self, from: PeerId, payload: &[u8]) {
        let envelope = match Envelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!("undecodable payload from {}: {}", from, error);
                return;
            }
        };

        match (self.state, envelope.kind) {
            (RoleState::Client, PayloadKind::State)
                if self.current_host.as_ref() == Some(&from) =>
            {
                self.cached_state = Some(envelope.data.clone());
                self.events.push(SessionEvent::StateReceived {
                    from,
                    data: envelope.data,
                });
            }
            (RoleState::Host, PayloadKind::Input) => {
                self.events.push(SessionEvent::InputReceived {
                    from,
                    data: envelope.data,
                });
            }
            _ => {
                tracing::warn!(
                    "dropping {} payload from {} while {}",
                    envelope.kind,
                    from,
                    self.state
                );
            }
        }
    }

    fn on_connection_closed(&mut self, peer: PeerId) {
        if self.registry.unregister(&peer).is_none() {
            tracing::debug!("close for unknown link {}", peer);
            return;
        }
        self.membership.remove(&peer);

        match self.state {
            RoleState::Host => {
                tracing::info!("client {} disconnected", peer);
                self.events.push(SessionEvent::PeerDisconnected(peer));
            }
            RoleState::Client if self.current_host.as_ref() == Some(&peer) => {
                self.events.push(SessionEvent::PeerDisconnected(peer.clone()));
                if self.join_guard.as_ref().map(JoinTimeoutGuard::is_armed).unwrap_or(false) {
                    // The join never completed; the armed guard will fire
                    // the timeout. No migration without an established
                    // session.
                    tracing::warn!("host link closed before opening");
                } else {
                    tracing::warn!("host link lost, starting migration");
                    self.handle_host_loss(peer);
                }
            }
            RoleState::Client => {
                self.events.push(SessionEvent::PeerDisconnected(peer));
            }
            RoleState::Unbound | RoleState::Terminated => {}
        }
    }

    fn on_error(&mut self, peer: Option<PeerId>, error: SignalingError) {
        let message = error.user_message().to_string();
        match self.state {
            RoleState::Client
                if self.join_guard.as_ref().map(JoinTimeoutGuard::is_armed).unwrap_or(false) =>
            {
                tracing::warn!("join failed: {}", error);
                self.fail_join(message);
            }
            RoleState::Host if error.kind == SignalingErrorKind::IdTaken => {
                // Another room holds this code. Recoverable upward by
                // regenerating and retrying create.
                let code = self
                    .room_code
                    .as_ref()
                    .map(|code| code.to_string())
                    .unwrap_or_default();
                tracing::warn!("{}", SessionError::DuplicateRoomCode(code));
                self.events.push(SessionEvent::ConnectionError(message));
                self.teardown(RoleState::Unbound);
            }
            RoleState::Client
                if peer.is_some() && self.current_host == peer =>
            {
                tracing::warn!("host link error: {}", error);
                self.events.push(SessionEvent::ConnectionError(message));
                if let Some(host) = peer {
                    self.handle_host_loss(host);
                }
            }
            RoleState::Host | RoleState::Client => {
                // Per-connection failure; the session survives.
                tracing::warn!("signaling error ({:?}): {}", peer, error);
                self.events.push(SessionEvent::ConnectionError(message));
            }
            RoleState::Unbound | RoleState::Terminated => {
                tracing::debug!("ignoring signaling error in {} state", self.state);
            }
        }
    }

    // ---- migration -----------------------------------------------------

    /// React to losing the link to the current host: elect a successor
    /// from the shrinking membership view and rebuild the star around it.
    ///
    /// Every surviving client runs this independently and deterministically
    /// arrives at the same winner. The loop is bounded: each iteration
    /// removes the departed candidate, and a hard cap fixed at the first
    /// loss of an episode stops pathological chains even if membership is
    /// repopulated mid-episode.
    fn handle_host_loss(&mut self, departed_host: PeerId) {
        let mut departed = departed_host;
        loop {
            self.registry.unregister(&departed);
            self.membership.remove(&departed);

            if self.migration_cap.is_none() {
                // Every remaining candidate plus our own candidacy.
                self.migration_cap = Some(self.membership.len() + 1);
            }

            self.migration_attempts += 1;
            let cap = self.migration_cap.unwrap_or(1);
            if self.migration_attempts > cap {
                tracing::error!(
                    "{} after {} attempts",
                    SessionError::ElectionExhausted,
                    self.migration_attempts - 1
                );
                self.events.push(SessionEvent::ConnectionLost);
                self.teardown(RoleState::Terminated);
                return;
            }

            let self_id = match self.self_id.clone() {
                Some(id) => id,
                None => {
                    // No identity, no candidacy; nothing to rebuild.
                    self.events.push(SessionEvent::ConnectionLost);
                    self.teardown(RoleState::Terminated);
                    return;
                }
            };

            match elect(&departed, &self.membership, &self_id) {
                Some(winner) if winner == self_id => {
                    tracing::info!("elected self as new host");
                    self.state = RoleState::Host;
                    self.current_host = Some(self_id.clone());
                    if let Err(error) = self.signaling.listen() {
                        tracing::warn!("listen after promotion failed: {}", error);
                    }
                    self.migration_attempts = 0;
                    self.migration_cap = None;
                    let peers = self.peers();
                    self.events.push(SessionEvent::BecomeHost { self_id, peers });
                    return;
                }
                Some(winner) => {
                    tracing::info!("elected {} as new host, reconnecting", winner);
                    self.current_host = Some(winner.clone());
                    self.registry.register(Connection::connecting(winner.clone()));
                    self.events.push(SessionEvent::NewHost {
                        new_host_id: winner.clone(),
                    });
                    match self.signaling.connect(&winner) {
                        // Outcome arrives as open/close/error events.
                        Ok(()) => return,
                        Err(error) => {
                            tracing::warn!("reconnect to {} failed: {}", winner, error);
                            self.events.push(SessionEvent::ConnectionError(
                                error.user_message().to_string(),
                            ));
                            departed = winner;
                        }
                    }
                }
                None => {
                    tracing::warn!("{}", SessionError::ElectionExhausted);
                    self.events.push(SessionEvent::ConnectionLost);
                    self.teardown(RoleState::Terminated);
                    return;
                }
            }
        }
    }

    // ---- teardown ------------------------------------------------------

    fn fire_join_timeout(&mut self) {
        tracing::warn!("{}", SessionError::JoinTimeout);
        self.events
            .push(SessionEvent::ConnectionError(SessionError::JoinTimeout.to_string()));
        self.teardown(RoleState::Unbound);
    }

    fn fail_join(&mut self, message: String) {
        self.events.push(SessionEvent::ConnectionError(message));
        self.teardown(RoleState::Unbound);
    }

    fn cancel_join_guard(&mut self) {
        if let Some(mut guard) = self.join_guard.take() {
            guard.cancel();
        }
    }

    /// Full cleanup: cancel any pending timer, close every link, drop the
    /// rendezvous registration, clear membership and the cached state
    /// snapshot. Safe to invoke repeatedly.
    fn teardown(&mut self, next: RoleState) {
        self.cancel_join_guard();
        for peer in self.registry.close_all() {
            self.signaling.close(&peer);
        }
        self.signaling.close_session();
        self.membership.clear();
        self.cached_state = None;
        self.current_host = None;
        self.room_code = None;
        self.self_id = None;
        self.migration_attempts = 0;
        self.migration_cap = None;
        self.state = next;
        tracing::debug!("session torn down, now {}", next);
    }

    // ---- guards --------------------------------------------------------

    fn require_unbound(&self) -> Result<()> {
        if self.state == RoleState::Unbound {
            Ok(())
        } else {
            Err(SessionError::AlreadyBound(self.state))
        }
    }

    fn require_role(&self, required: Role) -> Result<()> {
        if self.state.role() == Some(required) {
            Ok(())
        } else {
            Err(SessionError::RoleViolation {
                required,
                actual: self.state,
            })
        }
    }
}
