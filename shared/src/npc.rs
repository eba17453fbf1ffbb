use crate::character::Character;
use crate::strategy::{Event, NpcContext, Strategy};
use crate::HEALTH_MAX;
use log::debug;
use std::collections::BTreeMap;
use std::time::Duration;

/// Which strategy is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveSlot {
    Registered(Event),
    /// Neither the requested event nor `Event::Default` is registered.
    Fallback,
}

/// A computer-controlled character driven by event-selected strategies.
#[derive(Debug, Clone)]
pub struct NonPlayer {
    pub body: Character,
    strategies: BTreeMap<Event, Strategy>,
    active: ActiveSlot,
    /// Process-wide default injected at construction.
    fallback: Strategy,
}

impl NonPlayer {
    /// Creates an NPC running `initial` as its `Event::Default` strategy.
    pub fn new(body: Character, initial: Strategy, fallback: Strategy) -> Self {
        let mut npc = Self {
            body,
            strategies: BTreeMap::new(),
            active: ActiveSlot::Registered(Event::Default),
            fallback,
        };
        npc.fallback.set_npc_reference(npc.body.id);
        npc.set_strategy(Event::Default, initial);
        npc.active_mut().initialize();
        npc
    }

    pub fn id(&self) -> crate::EntityId {
        self.body.id
    }

    pub fn set_strategy(&mut self, event: Event, mut strategy: Strategy) {
        strategy.set_npc_reference(self.body.id);
        self.strategies.insert(event, strategy);
    }

    pub fn strategy(&self, event: Event) -> Option<&Strategy> {
        self.strategies.get(&event)
    }

    /// Switches to the strategy for `event`, falling back to the registered
    /// default and then to the injected one. The chosen strategy is initialized.
    pub fn respond(&mut self, event: Event) {
        self.active = if self.strategies.contains_key(&event) {
            ActiveSlot::Registered(event)
        } else if self.strategies.contains_key(&Event::Default) {
            ActiveSlot::Registered(Event::Default)
        } else {
            ActiveSlot::Fallback
        };

        let npc = self.body.id;
        let strategy = self.active_mut();
        strategy.initialize();
        debug!("NPC {} responds to {:?} with {}", npc, event, strategy.name());
    }

    /// The event whose registered strategy is running, or `None` when the
    /// injected fallback is running.
    pub fn active_event(&self) -> Option<Event> {
        match self.active {
            ActiveSlot::Registered(event) => Some(event),
            ActiveSlot::Fallback => None,
        }
    }

    pub fn active_strategy(&self) -> &Strategy {
        match self.active {
            ActiveSlot::Registered(event) => self.strategies.get(&event).unwrap_or(&self.fallback),
            ActiveSlot::Fallback => &self.fallback,
        }
    }

    fn active_mut(&mut self) -> &mut Strategy {
        match self.active {
            ActiveSlot::Registered(event) => match self.strategies.get_mut(&event) {
                Some(strategy) => strategy,
                None => &mut self.fallback,
            },
            ActiveSlot::Fallback => &mut self.fallback,
        }
    }

    /// Negative deltas switch to combat before they land; a delta that leaves
    /// health below zero switches to death afterwards.
    pub fn modify_health(&mut self, amount: i32) -> bool {
        if amount < 0 {
            self.respond(Event::Combat);
        }
        let killed = self.body.modify_health(amount);
        if self.body.is_dead() {
            self.respond(Event::Death);
        }
        killed
    }

    pub fn is_dead(&self) -> bool {
        self.body.is_dead()
    }

    /// Runs the active strategy for one tick.
    pub fn update(&mut self, ctx: &mut NpcContext<'_>) {
        let strategy = match self.active {
            ActiveSlot::Registered(event) => match self.strategies.get_mut(&event) {
                Some(strategy) => strategy,
                None => &mut self.fallback,
            },
            ActiveSlot::Fallback => &mut self.fallback,
        };
        strategy.update(&mut self.body, ctx);
    }

    pub fn interact(&mut self, player: &Character) {
        let body = self.body.clone();
        self.active_mut().interact(player, &body);
    }

    pub fn take_respawn_request(&mut self) -> Option<Duration> {
        self.active_mut().take_respawn_request()
    }

    /// Restores a respawning NPC to full health and its default behavior.
    pub fn revive(&mut self) {
        self.body.health = HEALTH_MAX;
        self.respond(Event::Default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::PlayerType;

    fn npc(initial: Strategy) -> NonPlayer {
        let body = Character::new(10_001, PlayerType::Dave, 0, 48, 48);
        NonPlayer::new(body, initial, Strategy::wait())
    }

    #[test]
    fn test_damage_without_combat_strategy_keeps_default_instance() {
        let mut sentry = npc(Strategy::sentry(100.0));
        sentry.modify_health(-5);

        assert_eq!(sentry.body.health, HEALTH_MAX - 5);
        assert_eq!(sentry.active_event(), Some(Event::Default));
        assert_eq!(sentry.active_strategy().name(), "sentry");
    }

    #[test]
    fn test_combat_strategy_is_selected_on_damage() {
        let mut guard = npc(Strategy::wander());
        guard.set_strategy(Event::Combat, Strategy::sentry(80.0));
        guard.modify_health(-1);

        assert_eq!(guard.active_event(), Some(Event::Combat));
        assert_eq!(guard.active_strategy().name(), "sentry");
    }

    #[test]
    fn test_healing_does_not_trigger_combat() {
        let mut guard = npc(Strategy::wander());
        guard.set_strategy(Event::Combat, Strategy::sentry(80.0));
        guard.modify_health(-10);
        guard.respond(Event::Default);
        guard.modify_health(5);

        assert_eq!(guard.active_event(), Some(Event::Default));
    }

    #[test]
    fn test_death_arms_respawn() {
        let mut guard = npc(Strategy::wander());
        guard.set_strategy(Event::Death, Strategy::respawn(Duration::from_secs(1)));

        assert!(guard.modify_health(-150));
        assert_eq!(guard.active_event(), Some(Event::Death));
        assert_eq!(guard.take_respawn_request(), Some(Duration::from_secs(1)));
        assert_eq!(guard.take_respawn_request(), None);
    }

    #[test]
    fn test_empty_registry_selects_injected_default() {
        let mut guard = npc(Strategy::wander());
        guard.strategies.clear();
        guard.respond(Event::Combat);

        assert_eq!(guard.active_event(), None);
        assert_eq!(guard.active_strategy().name(), "wait");
    }

    #[test]
    fn test_strategies_receive_npc_handle() {
        let mut guard = npc(Strategy::ghost(30.0));
        guard.set_strategy(Event::Combat, Strategy::sentry(50.0));
        assert_eq!(guard.strategy(Event::Default).and_then(Strategy::npc_reference), Some(10_001));
        assert_eq!(guard.strategy(Event::Combat).and_then(Strategy::npc_reference), Some(10_001));
    }

    #[test]
    fn test_revive_restores_health_and_default() {
        let mut guard = npc(Strategy::wander());
        guard.set_strategy(Event::Death, Strategy::respawn(Duration::from_secs(1)));
        guard.modify_health(-200);
        guard.revive();

        assert_eq!(guard.body.health, HEALTH_MAX);
        assert_eq!(guard.active_event(), Some(Event::Default));
    }
}
