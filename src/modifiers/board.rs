//! Modifier slots per effect channel
//!
//! `ModifierBoard` holds what external systems (events, automation) write
//! between ticks. `ModifierFrame` is rebuilt every tick from the board plus
//! live state (doctrine, upgrades, momentum, adaptive tuning) and then thrown
//! away; neither is persisted.

use ahash::AHashMap;

use crate::core::types::EffectChannel;
use crate::modifiers::pipeline::{Modifier, SourceTag};

#[derive(Debug, Clone, Default)]
pub struct ModifierBoard {
    slots: AHashMap<EffectChannel, Vec<Modifier>>,
}

impl ModifierBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel: EffectChannel, modifier: Modifier) {
        self.slots.entry(channel).or_default().push(modifier);
    }

    /// Push by wire name. Unknown channels are dropped with a warning.
    pub fn push_named(&mut self, channel: &str, modifier: Modifier) -> bool {
        match channel.parse::<EffectChannel>() {
            Ok(channel) => {
                self.push(channel, modifier);
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring modifier: {}", e);
                false
            }
        }
    }

    /// Replace everything `source` has on `channel`
    pub fn set_channel(&mut self, channel: EffectChannel, source: SourceTag, mods: Vec<Modifier>) {
        let slot = self.slots.entry(channel).or_default();
        slot.retain(|m| m.source != source);
        slot.extend(mods.into_iter().map(|m| Modifier { source, ..m }));
    }

    pub fn get_modifiers_for_effect(&self, channel: EffectChannel) -> &[Modifier] {
        self.slots.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove every modifier supplied by `source`, returning how many went
    pub fn remove_source(&mut self, source: SourceTag) -> usize {
        let mut removed = 0;
        for slot in self.slots.values_mut() {
            let before = slot.len();
            slot.retain(|m| m.source != source);
            removed += before - slot.len();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Per-tick snapshot of every modifier, by channel
#[derive(Debug, Clone, Default)]
pub struct ModifierFrame {
    channels: AHashMap<EffectChannel, Vec<Modifier>>,
}

impl ModifierFrame {
    /// Start a frame from whatever external systems have posted
    pub fn from_board(board: &ModifierBoard) -> Self {
        Self {
            channels: board.slots.clone(),
        }
    }

    pub fn push(&mut self, channel: EffectChannel, modifier: Modifier) {
        self.channels.entry(channel).or_default().push(modifier);
    }

    pub fn get(&self, channel: EffectChannel) -> &[Modifier] {
        self.channels.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }
}
