//! Play session: unscrewing bolts into baskets and the overflow buffer.
//!
//! The [`Session`] is the only owner of game state. Meshes and bolts are
//! addressed by integer handles; names only appear in outcomes and lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::level::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Baskets accepting bolts at the same time.
    pub active_baskets: usize,
    pub buffer_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            active_baskets: 2,
            buffer_capacity: 5,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MeshHandle(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BoltHandle(pub usize);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("unknown bolt '{0}'")]
    UnknownBolt(String),
    #[error("unknown mesh '{0}'")]
    UnknownMesh(String),
    #[error("the level has no baskets")]
    NoBaskets,
}

pub type PlayResult<T> = Result<T, PlayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Basket(usize),
    /// Buffer slot.
    Buffer(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    BoltPlaced { bolt: String, placement: Placement },
    BasketFilled { basket: usize },
    BasketActivated { basket: usize },
    /// A buffered bolt moved into a basket.
    BufferFlushed { bolt: String, basket: usize },
    MeshDestroyed { mesh: String },
    GameOver,
    Won,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickStatus {
    AlreadyUnscrewed,
    /// The blocking mesh still stands; nothing changed.
    Blocked { by: String },
    Placed(Placement),
    /// No basket matched and the buffer is full.
    GameOver,
    /// The game ended earlier; clicks are ignored.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub status: ClickStatus,
    pub events: Vec<GameEvent>,
}

impl ClickOutcome {
    fn quiet(status: ClickStatus) -> Self {
        Self {
            status,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone)]
struct MeshState {
    name: String,
    remaining: usize,
}

impl MeshState {
    const fn alive(&self) -> bool {
        self.remaining > 0
    }
}

#[derive(Debug, Clone)]
struct BoltState {
    id: String,
    color: usize,
    mesh: MeshHandle,
    blocker: Option<MeshHandle>,
    unscrewed: bool,
}

#[derive(Debug, Clone)]
struct BasketState {
    color: usize,
    capacity: usize,
    bolts: Vec<BoltHandle>,
}

impl BasketState {
    fn is_full(&self) -> bool {
        self.bolts.len() >= self.capacity
    }

    fn accepts(&self, color: usize) -> bool {
        !self.is_full() && self.color == color
    }
}

/// Game coordinator for one level.
#[derive(Debug, Clone)]
pub struct Session {
    settings: SessionSettings,
    meshes: Vec<MeshState>,
    mesh_index: HashMap<String, MeshHandle>,
    bolts: Vec<BoltState>,
    bolt_index: HashMap<String, BoltHandle>,
    baskets: Vec<BasketState>,
    /// Active basket indices in activation order.
    active: Vec<usize>,
    next_basket: usize,
    retired: usize,
    buffer: Vec<BoltHandle>,
    state: SessionState,
}

impl Session {
    /// Registers every mesh and bolt of `level` and activates the first baskets.
    ///
    /// A blocking mesh that carries no bolt of the level counts as already
    /// cleared.
    pub fn new(level: &Level, settings: SessionSettings) -> PlayResult<Self> {
        if level.baskets.is_empty() {
            return Err(PlayError::NoBaskets);
        }

        let mut session = Self {
            settings,
            meshes: Vec::new(),
            mesh_index: HashMap::new(),
            bolts: Vec::with_capacity(level.bolts.len()),
            bolt_index: HashMap::new(),
            baskets: level
                .baskets
                .iter()
                .map(|b| BasketState {
                    color: b.color_index,
                    capacity: b.bolt_point_ids.len().max(1),
                    bolts: Vec::new(),
                })
                .collect(),
            active: Vec::new(),
            next_basket: 0,
            retired: 0,
            buffer: Vec::new(),
            state: SessionState::Playing,
        };

        for bolt in &level.bolts {
            let mesh = session.register_mesh(&bolt.mesh);
            session.meshes[mesh.0].remaining += 1;
            let blocker = bolt.blocked_by.as_deref().map(|m| session.register_mesh(m));
            let handle = BoltHandle(session.bolts.len());
            session.bolt_index.insert(bolt.id.clone(), handle);
            session.bolts.push(BoltState {
                id: bolt.id.clone(),
                color: bolt.color_index,
                mesh,
                blocker,
                unscrewed: false,
            });
        }

        for _ in 0..settings.active_baskets.max(1) {
            session.activate_next();
        }
        log::info!(
            "session with {} bolts on {} meshes, {} baskets",
            session.bolts.len(),
            session.meshes.len(),
            session.baskets.len()
        );
        Ok(session)
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn bolt(&self, id: &str) -> Option<BoltHandle> {
        self.bolt_index.get(id).copied()
    }

    #[must_use]
    pub fn mesh(&self, name: &str) -> Option<MeshHandle> {
        self.mesh_index.get(name).copied()
    }

    pub fn is_mesh_alive(&self, name: &str) -> PlayResult<bool> {
        let handle = self
            .mesh(name)
            .ok_or_else(|| PlayError::UnknownMesh(name.to_owned()))?;
        Ok(self.meshes[handle.0].alive())
    }

    /// Whether the bolt is still screwed in and nothing blocks it.
    pub fn can_unscrew(&self, id: &str) -> PlayResult<bool> {
        let handle = self.bolt(id).ok_or_else(|| PlayError::UnknownBolt(id.to_owned()))?;
        let bolt = &self.bolts[handle.0];
        Ok(!bolt.unscrewed && self.live_blocker(bolt).is_none())
    }

    /// Bolt ids in buffer slot order.
    pub fn buffer(&self) -> impl Iterator<Item = &str> {
        self.buffer.iter().map(|h| self.bolts[h.0].id.as_str())
    }

    /// Indices of the baskets currently accepting bolts.
    #[must_use]
    pub fn active_baskets(&self) -> &[usize] {
        &self.active
    }

    #[must_use]
    pub fn basket_contents(&self, basket: usize) -> Vec<&str> {
        self.baskets.get(basket).map_or_else(Vec::new, |b| {
            b.bolts.iter().map(|h| self.bolts[h.0].id.as_str()).collect()
        })
    }

    pub fn click(&mut self, id: &str) -> PlayResult<ClickOutcome> {
        let handle = self.bolt(id).ok_or_else(|| PlayError::UnknownBolt(id.to_owned()))?;
        Ok(self.click_handle(handle))
    }

    fn click_handle(&mut self, handle: BoltHandle) -> ClickOutcome {
        if self.state != SessionState::Playing {
            return ClickOutcome::quiet(ClickStatus::Finished);
        }
        let bolt = &self.bolts[handle.0];
        if bolt.unscrewed {
            return ClickOutcome::quiet(ClickStatus::AlreadyUnscrewed);
        }
        if let Some(blocker) = self.live_blocker(bolt) {
            let by = self.meshes[blocker.0].name.clone();
            log::debug!("bolt {}: mesh {by} still stands", bolt.id);
            return ClickOutcome::quiet(ClickStatus::Blocked { by });
        }

        self.bolts[handle.0].unscrewed = true;
        let mut events = Vec::new();
        let status = match self.place(handle, &mut events) {
            Some(placement) => ClickStatus::Placed(placement),
            None => {
                log::info!("game over: buffer is full");
                self.state = SessionState::Lost;
                events.push(GameEvent::GameOver);
                ClickStatus::GameOver
            }
        };
        self.detach(handle, &mut events);

        if self.state == SessionState::Playing && self.retired == self.baskets.len() {
            self.state = SessionState::Won;
            events.push(GameEvent::Won);
        }
        ClickOutcome { status, events }
    }

    fn place(&mut self, handle: BoltHandle, events: &mut Vec<GameEvent>) -> Option<Placement> {
        let color = self.bolts[handle.0].color;
        let bolt = self.bolts[handle.0].id.clone();

        if let Some(basket) = self.active.iter().copied().find(|&b| self.baskets[b].accepts(color)) {
            self.baskets[basket].bolts.push(handle);
            let placement = Placement::Basket(basket);
            events.push(GameEvent::BoltPlaced { bolt, placement });
            self.settle(events);
            return Some(placement);
        }

        if self.buffer.len() < self.settings.buffer_capacity {
            self.buffer.push(handle);
            let placement = Placement::Buffer(self.buffer.len() - 1);
            events.push(GameEvent::BoltPlaced { bolt, placement });
            return Some(placement);
        }
        None
    }

    /// Retires full baskets, activates replacements and flushes the buffer
    /// until nothing changes.
    fn settle(&mut self, events: &mut Vec<GameEvent>) {
        loop {
            let full: Vec<usize> = self
                .active
                .iter()
                .copied()
                .filter(|&b| self.baskets[b].is_full())
                .collect();
            if full.is_empty() {
                return;
            }
            for basket in full {
                self.active.retain(|&b| b != basket);
                self.retired += 1;
                events.push(GameEvent::BasketFilled { basket });
                if let Some(next) = self.activate_next() {
                    events.push(GameEvent::BasketActivated { basket: next });
                }
            }
            self.flush_buffer(events);
        }
    }

    /// Moves buffered bolts into matching active baskets, newest first, then
    /// compacts the remaining slots.
    fn flush_buffer(&mut self, events: &mut Vec<GameEvent>) {
        let mut i = self.buffer.len();
        while i > 0 {
            i -= 1;
            let handle = self.buffer[i];
            let color = self.bolts[handle.0].color;
            if let Some(basket) = self.active.iter().copied().find(|&b| self.baskets[b].accepts(color)) {
                self.baskets[basket].bolts.push(handle);
                self.buffer.remove(i);
                events.push(GameEvent::BufferFlushed {
                    bolt: self.bolts[handle.0].id.clone(),
                    basket,
                });
            }
        }
    }

    fn detach(&mut self, handle: BoltHandle, events: &mut Vec<GameEvent>) {
        let mesh = &mut self.meshes[self.bolts[handle.0].mesh.0];
        mesh.remaining = mesh.remaining.saturating_sub(1);
        if !mesh.alive() {
            log::debug!("mesh {} destroyed", mesh.name);
            events.push(GameEvent::MeshDestroyed {
                mesh: mesh.name.clone(),
            });
        }
    }

    fn activate_next(&mut self) -> Option<usize> {
        if self.next_basket >= self.baskets.len() {
            return None;
        }
        let basket = self.next_basket;
        self.active.push(basket);
        self.next_basket += 1;
        Some(basket)
    }

    fn live_blocker(&self, bolt: &BoltState) -> Option<MeshHandle> {
        bolt.blocker.filter(|m| self.meshes[m.0].alive())
    }

    fn register_mesh(&mut self, name: &str) -> MeshHandle {
        if let Some(handle) = self.mesh(name) {
            return handle;
        }
        let handle = MeshHandle(self.meshes.len());
        self.mesh_index.insert(name.to_owned(), handle);
        self.meshes.push(MeshState {
            name: name.to_owned(),
            remaining: 0,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{BasketPlan, LevelBolt};

    fn bolt(id: &str, basket: usize, color: usize, mesh: &str, blocked_by: Option<&str>) -> LevelBolt {
        LevelBolt {
            id: id.to_owned(),
            point_id: id.to_owned(),
            basket_index: basket,
            color_index: color,
            material: String::new(),
            mesh: mesh.to_owned(),
            blocked_by: blocked_by.map(str::to_owned),
            depth: 0,
        }
    }

    fn basket(index: usize, color: usize, ids: &[&str]) -> BasketPlan {
        BasketPlan {
            color_name: format!("Color_{color}"),
            color_index: color,
            basket_index: index,
            bolt_point_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Two colours, three baskets; `r*` on the lid, `g*` on the box under it.
    fn level() -> Level {
        Level {
            baskets: vec![
                basket(0, 0, &["r1", "r2", "r3"]),
                basket(1, 1, &["g1", "g2", "g3"]),
                basket(2, 0, &["r4", "r5", "r6"]),
            ],
            bolts: vec![
                bolt("r1", 0, 0, "lid", None),
                bolt("r2", 0, 0, "lid", None),
                bolt("r3", 0, 0, "lid", None),
                bolt("g1", 1, 1, "box", Some("lid")),
                bolt("g2", 1, 1, "box", Some("lid")),
                bolt("g3", 1, 1, "box", None),
                bolt("r4", 2, 0, "box", None),
                bolt("r5", 2, 0, "box", None),
                bolt("r6", 2, 0, "box", None),
            ],
        }
    }

    #[test]
    fn blocked_bolts_wait_for_their_mesh() {
        let mut session = Session::new(&level(), SessionSettings::default()).unwrap();
        let outcome = session.click("g1").unwrap();
        assert_eq!(outcome.status, ClickStatus::Blocked { by: "lid".into() });
        assert!(outcome.events.is_empty());
        assert!(!session.can_unscrew("g1").unwrap());

        for id in ["r1", "r2"] {
            session.click(id).unwrap();
        }
        let outcome = session.click("r3").unwrap();
        assert!(outcome.events.contains(&GameEvent::MeshDestroyed { mesh: "lid".into() }));
        assert!(outcome.events.contains(&GameEvent::BasketFilled { basket: 0 }));
        assert!(outcome.events.contains(&GameEvent::BasketActivated { basket: 2 }));
        assert!(!session.is_mesh_alive("lid").unwrap());
        assert!(session.can_unscrew("g1").unwrap());
        assert_eq!(session.click("r3").unwrap().status, ClickStatus::AlreadyUnscrewed);
    }

    #[test]
    fn buffered_bolts_flush_when_a_basket_opens() {
        let settings = SessionSettings {
            active_baskets: 1,
            buffer_capacity: 5,
        };
        let mut session = Session::new(&level(), settings).unwrap();

        // Only the red basket is active: greens go to the buffer.
        let outcome = session.click("g3").unwrap();
        assert_eq!(outcome.status, ClickStatus::Placed(Placement::Buffer(0)));
        for id in ["r1", "r2", "r3", "g1", "g2"] {
            session.click(id).unwrap();
        }
        // Filling red opened the green basket and pulled g3 in; g1, g2 went
        // straight there.
        assert_eq!(session.buffer().count(), 0);
        assert_eq!(session.basket_contents(1), vec!["g3", "g1", "g2"]);
        assert_eq!(session.active_baskets(), &[2]);
    }

    #[test]
    fn full_buffer_ends_the_game() {
        let settings = SessionSettings {
            active_baskets: 1,
            buffer_capacity: 1,
        };
        let mut session = Session::new(&level(), settings).unwrap();
        assert_eq!(
            session.click("g3").unwrap().status,
            ClickStatus::Placed(Placement::Buffer(0))
        );
        for id in ["r4", "r5", "r6"] {
            session.click(id).unwrap();
        }
        // Red basket 0 is full now, green basket 1 took g3 from the buffer.
        assert_eq!(session.active_baskets(), &[1]);
        let outcome = session.click("r1").unwrap();
        assert_eq!(outcome.status, ClickStatus::Placed(Placement::Buffer(0)));
        let outcome = session.click("r2").unwrap();
        assert_eq!(outcome.status, ClickStatus::GameOver);
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.click("r3").unwrap().status, ClickStatus::Finished);
    }

    #[test]
    fn clearing_every_basket_wins() {
        let mut session = Session::new(&level(), SessionSettings::default()).unwrap();
        let mut last = None;
        for id in ["r1", "r2", "r3", "g1", "g2", "g3", "r4", "r5", "r6"] {
            last = Some(session.click(id).unwrap());
        }
        let last = last.unwrap();
        assert!(last.events.contains(&GameEvent::Won));
        assert!(last.events.contains(&GameEvent::MeshDestroyed { mesh: "box".into() }));
        assert_eq!(session.state(), SessionState::Won);
    }

    #[test]
    fn unknown_ids_error() {
        let mut session = Session::new(&level(), SessionSettings::default()).unwrap();
        assert_eq!(session.click("nope"), Err(PlayError::UnknownBolt("nope".into())));
        assert_eq!(session.is_mesh_alive("nope"), Err(PlayError::UnknownMesh("nope".into())));
        let empty = Level {
            baskets: Vec::new(),
            bolts: Vec::new(),
        };
        assert!(matches!(Session::new(&empty, SessionSettings::default()), Err(PlayError::NoBaskets)));
    }
}
