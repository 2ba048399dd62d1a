//! Combat logging
//!
//! Append-only, time-ordered record of every resource- or state-affecting occurrence.
//! Every mutation of health or mana in an encounter becomes observable here.

use bevy::log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use super::ActorId;

/// Domain event types. This is a closed set, not a severity scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatEventType {
    SpellCastStart,
    SpellCastSuccess,
    SpellCastInterrupted,
    SpellHeal,
    PeriodicSpellHeal,
    SpellDamage,
    SwingDamage,
    RangeDamage,
    SpellAuraApplied,
    SpellAuraRemoved,
    ResourceChange,
    UnitDied,
    EncounterStart,
    EncounterEnd,
}

impl CombatEventType {
    pub const ALL: [CombatEventType; 14] = [
        CombatEventType::SpellCastStart,
        CombatEventType::SpellCastSuccess,
        CombatEventType::SpellCastInterrupted,
        CombatEventType::SpellHeal,
        CombatEventType::PeriodicSpellHeal,
        CombatEventType::SpellDamage,
        CombatEventType::SwingDamage,
        CombatEventType::RangeDamage,
        CombatEventType::SpellAuraApplied,
        CombatEventType::SpellAuraRemoved,
        CombatEventType::ResourceChange,
        CombatEventType::UnitDied,
        CombatEventType::EncounterStart,
        CombatEventType::EncounterEnd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CombatEventType::SpellCastStart => "SPELL_CAST_START",
            CombatEventType::SpellCastSuccess => "SPELL_CAST_SUCCESS",
            CombatEventType::SpellCastInterrupted => "SPELL_CAST_INTERRUPTED",
            CombatEventType::SpellHeal => "SPELL_HEAL",
            CombatEventType::PeriodicSpellHeal => "PERIODIC_SPELL_HEAL",
            CombatEventType::SpellDamage => "SPELL_DAMAGE",
            CombatEventType::SwingDamage => "SWING_DAMAGE",
            CombatEventType::RangeDamage => "RANGE_DAMAGE",
            CombatEventType::SpellAuraApplied => "SPELL_AURA_APPLIED",
            CombatEventType::SpellAuraRemoved => "SPELL_AURA_REMOVED",
            CombatEventType::ResourceChange => "RESOURCE_CHANGE",
            CombatEventType::UnitDied => "UNIT_DIED",
            CombatEventType::EncounterStart => "ENCOUNTER_START",
            CombatEventType::EncounterEnd => "ENCOUNTER_END",
        }
    }

    /// Parse a SCREAMING_SNAKE_CASE name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_damage(&self) -> bool {
        matches!(
            self,
            CombatEventType::SpellDamage | CombatEventType::SwingDamage | CombatEventType::RangeDamage
        )
    }

    pub fn is_heal(&self) -> bool {
        matches!(self, CombatEventType::SpellHeal | CombatEventType::PeriodicSpellHeal)
    }
}

impl fmt::Display for CombatEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One immutable combat log record.
///
/// Built with [`CombatLogEvent::new`] and the chained setters, then handed to
/// [`CombatLog::append`]. A missing timestamp is filled with the log clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatLogEvent {
    #[serde(default, with = "duration_ms")]
    pub timestamp: Option<Duration>,
    pub event_type: CombatEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<String>,
    #[serde(default, rename = "isAOE", skip_serializing_if = "std::ops::Not::not")]
    pub is_aoe: bool,
}

impl CombatLogEvent {
    pub fn new(event_type: CombatEventType) -> Self {
        Self {
            timestamp: None,
            event_type,
            source_id: None,
            source_name: None,
            target_id: None,
            target_name: None,
            spell_id: None,
            spell_name: None,
            value: None,
            extra_info: None,
            is_aoe: false,
        }
    }

    pub fn at(mut self, timestamp: Duration) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn source(mut self, id: ActorId, name: impl Into<String>) -> Self {
        self.source_id = Some(id);
        self.source_name = Some(name.into());
        self
    }

    pub fn target(mut self, id: ActorId, name: impl Into<String>) -> Self {
        self.target_id = Some(id);
        self.target_name = Some(name.into());
        self
    }

    /// Spell id and display name are the same string for every effect we define.
    pub fn spell(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.spell_id = Some(name.clone());
        self.spell_name = Some(name);
        self
    }

    pub fn value(mut self, value: f32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn extra(mut self, info: impl Into<String>) -> Self {
        self.extra_info = Some(info.into());
        self
    }

    pub fn aoe(mut self) -> Self {
        self.is_aoe = true;
        self
    }

    /// Timestamp, or zero for an event that was never appended
    pub fn time(&self) -> Duration {
        self.timestamp.unwrap_or_default()
    }
}

impl fmt::Display for CombatLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_timestamp(self.time()), self.event_type)?;
        for part in [&self.source_name, &self.target_name, &self.spell_name]
            .into_iter()
            .flatten()
        {
            write!(f, " {}", part)?;
        }
        if let Some(value) = self.value {
            write!(f, " {}", value)?;
        }
        if let Some(extra) = &self.extra_info {
            write!(f, " {}", extra)?;
        }
        if self.is_aoe {
            f.write_str(" AOE")?;
        }
        Ok(())
    }
}

/// Format encounter time as `MM:SS.cc`
pub fn format_timestamp(time: Duration) -> String {
    let centis = time.as_millis() / 10;
    format!(
        "{:02}:{:02}.{:02}",
        centis / 6000,
        (centis / 100) % 60,
        centis % 100
    )
}

/// Handle returned by [`CombatLog::on_append`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CombatLogEvent) + Send + Sync>;

/// The combat log of one encounter.
#[derive(Default)]
pub struct CombatLog {
    /// All events in append order
    entries: Vec<CombatLogEvent>,
    /// Encounter time used to stamp events without a timestamp
    clock: Duration,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for CombatLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatLog")
            .field("entries", &self.entries.len())
            .field("clock", &self.clock)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CombatLog {
    /// Move the log clock forward. The clock never moves backwards.
    pub fn set_time(&mut self, time: Duration) {
        self.clock = self.clock.max(time);
    }

    pub fn time(&self) -> Duration {
        self.clock
    }

    /// Append an event, stamping it with the log clock if it has no timestamp.
    pub fn append(&mut self, mut event: CombatLogEvent) {
        if event.timestamp.is_none() {
            event.timestamp = Some(self.clock);
        }
        debug!("[COMBAT] {}", event);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        self.entries.push(event);
    }

    /// Register a callback invoked for every appended event.
    pub fn on_append(
        &mut self,
        listener: impl FnMut(&CombatLogEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Empty the log in place. Subscriptions and the clock are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Borrowed view of every event in order
    pub fn entries(&self) -> &[CombatLogEvent] {
        &self.entries
    }

    /// Copy of the full sequence
    pub fn events(&self) -> Vec<CombatLogEvent> {
        self.entries.clone()
    }

    /// Copy of the events of one type, in original order
    pub fn events_of(&self, event_type: CombatEventType) -> Vec<CombatLogEvent> {
        self.iter_of(event_type).cloned().collect()
    }

    pub fn iter_of(&self, event_type: CombatEventType) -> impl Iterator<Item = &CombatLogEvent> {
        self.entries
            .iter()
            .filter(move |event| event.event_type == event_type)
    }

    pub fn count_of(&self, event_type: CombatEventType) -> usize {
        self.iter_of(event_type).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&CombatLogEvent> {
        self.entries.last()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> &[CombatLogEvent] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    /// Damage dealt by `source`, summed per spell/attack name
    pub fn damage_by_spell(&self, source: ActorId) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for event in self
            .entries
            .iter()
            .filter(|e| e.event_type.is_damage() && e.source_id == Some(source))
        {
            let name = event.spell_name.clone().unwrap_or_default();
            *totals.entry(name).or_insert(0.0) += event.value.unwrap_or(0.0);
        }
        totals
    }

    /// Total damage recorded against `target`
    pub fn damage_taken(&self, target: ActorId) -> f32 {
        self.entries
            .iter()
            .filter(|e| e.event_type.is_damage() && e.target_id == Some(target))
            .filter_map(|e| e.value)
            .sum()
    }

    /// Total effective healing done by `source`
    pub fn healing_done(&self, source: ActorId) -> f32 {
        self.entries
            .iter()
            .filter(|e| e.event_type.is_heal() && e.source_id == Some(source))
            .filter_map(|e| e.value)
            .sum()
    }

    /// Write the full log as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.entries).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Serialize optional timestamps as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_u64(duration.as_millis() as u64),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
