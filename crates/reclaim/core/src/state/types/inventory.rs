//! Item storage shared by actors and containers.

use arrayvec::ArrayVec;

use crate::config::ReclaimConfig;

/// A quantity of one item kind.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemStack {
    /// Item short name (e.g. `"wood"`, `"box.wooden.large"`).
    pub item: String,
    pub amount: u32,
    /// Remaining condition as a fraction; `None` for items without durability.
    pub condition: Option<f32>,
    pub skin: u64,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, amount: u32) -> Self {
        Self {
            item: item.into(),
            amount,
            condition: None,
            skin: 0,
        }
    }

    pub fn with_condition(mut self, condition: f32) -> Self {
        self.condition = Some(condition.clamp(0.0, 1.0));
        self
    }

    pub fn with_skin(mut self, skin: u64) -> Self {
        self.skin = skin;
        self
    }

    fn stacks_with(&self, other: &ItemStack) -> bool {
        self.item == other.item
            && self.skin == other.skin
            && self.condition.is_none()
            && other.condition.is_none()
    }
}

/// Raised when an inventory cannot satisfy a withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("requested {requested} of '{item}' but only {held} held")]
pub struct InsufficientItems {
    pub item: String,
    pub requested: u32,
    pub held: u32,
}

/// Bounded list of item stacks.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    slots: ArrayVec<ItemStack, { ReclaimConfig::MAX_INVENTORY_SLOTS }>,
}

impl Inventory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an inventory from stacks, ignoring anything past the slot limit.
    pub fn from_stacks(stacks: impl IntoIterator<Item = ItemStack>) -> Self {
        Self {
            slots: stacks
                .into_iter()
                .take(ReclaimConfig::MAX_INVENTORY_SLOTS)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.amount == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter()
    }

    /// Total amount held of `item` across all stacks.
    pub fn count(&self, item: &str) -> u32 {
        self.slots
            .iter()
            .filter(|slot| slot.item == item)
            .map(|slot| slot.amount)
            .sum()
    }

    /// Removes `amount` of `item`, either fully or not at all.
    pub fn take(&mut self, item: &str, amount: u32) -> Result<(), InsufficientItems> {
        let held = self.count(item);
        if held < amount {
            return Err(InsufficientItems {
                item: item.to_owned(),
                requested: amount,
                held,
            });
        }

        let mut remaining = amount;
        for slot in self.slots.iter_mut().filter(|slot| slot.item == item) {
            if remaining == 0 {
                break;
            }
            let taken = slot.amount.min(remaining);
            slot.amount -= taken;
            remaining -= taken;
        }
        self.slots.retain(|slot| slot.amount > 0);
        Ok(())
    }

    /// Adds `stack`, merging into compatible stacks up to `max_stack`.
    ///
    /// Returns whatever did not fit.
    pub fn give(&mut self, mut stack: ItemStack, max_stack: u32) -> Option<ItemStack> {
        let max_stack = max_stack.max(1);
        let kind = ItemStack {
            amount: 0,
            ..stack.clone()
        };

        for slot in self.slots.iter_mut().filter(|slot| slot.stacks_with(&kind)) {
            if stack.amount == 0 {
                break;
            }
            let room = max_stack.saturating_sub(slot.amount);
            let moved = room.min(stack.amount);
            slot.amount += moved;
            stack.amount -= moved;
        }

        while stack.amount > 0 && !self.slots.is_full() {
            let moved = stack.amount.min(max_stack);
            let mut part = stack.clone();
            part.amount = moved;
            self.slots.push(part);
            stack.amount -= moved;
        }

        (stack.amount > 0).then_some(stack)
    }

    /// Empties the inventory, returning every stack it held.
    pub fn drain(&mut self) -> Vec<ItemStack> {
        self.slots.drain(..).collect()
    }
}
