// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Tracks which peripherals are enabled and notifies subscribers on change.

use std::collections::BTreeSet;

use crate::error::RegistryError;

/// A capability tag the registry tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Rig,
    Sdr,
    Keyboard,
    Knob,
    Mouse,
}

/// The two capabilities protected by the "at least one radio enabled" rule.
/// Deliberately hardcoded to this pair, not a generic minimum-cardinality
/// constraint — the original only ever protects the rig/sdr pair.
const RADIOS: [Capability; 2] = [Capability::Rig, Capability::Sdr];

type Subscriber = Box<dyn FnMut(Capability) + Send>;

/// Enabled-capability set with add/remove/toggle and subscriber notification.
pub struct DeviceRegistry {
    enabled: BTreeSet<Capability>,
    on_add: Vec<Subscriber>,
    on_remove: Vec<Subscriber>,
}

impl DeviceRegistry {
    pub fn new(initial: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            enabled: initial.into_iter().collect(),
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    /// Register a callback fired, in order, after an `add`.
    pub fn on_add(&mut self, cb: impl FnMut(Capability) + Send + 'static) {
        self.on_add.push(Box::new(cb));
    }

    /// Register a callback fired, in order, after a `remove`.
    pub fn on_remove(&mut self, cb: impl FnMut(Capability) + Send + 'static) {
        self.on_remove.push(Box::new(cb));
    }

    /// Enable `cap`. No-op, and no subscriber notification, if already enabled.
    pub fn add(&mut self, cap: Capability) {
        if self.enabled.insert(cap) {
            for cb in &mut self.on_add {
                cb(cap);
            }
        }
    }

    /// Disable `cap`. No-op, and no subscriber notification, if already disabled.
    pub fn remove(&mut self, cap: Capability) {
        if self.enabled.remove(&cap) {
            for cb in &mut self.on_remove {
                cb(cap);
            }
        }
    }

    /// Toggle `cap`, refusing if it would leave both radios disabled.
    pub fn toggle(&mut self, cap: Capability) -> Result<(), RegistryError> {
        if RADIOS.contains(&cap) && self.enabled.contains(&cap) {
            let other = RADIOS.iter().copied().find(|&r| r != cap).unwrap();
            if !self.enabled.contains(&other) {
                return Err(RegistryError::BothRadiosDisabled);
            }
        }

        if self.enabled.contains(&cap) {
            self.remove(cap);
        } else {
            self.add(cap);
        }
        Ok(())
    }

    #[must_use]
    pub fn enabled(&self, cap: Capability) -> bool {
        self.enabled.contains(&cap)
    }

    /// Snapshot of all currently enabled capabilities.
    #[must_use]
    pub fn list(&self) -> BTreeSet<Capability> {
        self.enabled.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn add_fires_subscriber_only_on_real_change() {
        let calls = Arc::new(Mutex::new(0));
        let mut reg = DeviceRegistry::new([Capability::Rig, Capability::Sdr]);
        let c = calls.clone();
        reg.on_add(move |_| *c.lock().unwrap() += 1);
        reg.add(Capability::Knob);
        reg.add(Capability::Knob);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn toggle_refuses_to_disable_both_radios() {
        let mut reg = DeviceRegistry::new([Capability::Rig]);
        assert_eq!(
            reg.toggle(Capability::Rig),
            Err(RegistryError::BothRadiosDisabled)
        );
        assert!(reg.enabled(Capability::Rig));
    }

    #[test]
    fn toggle_allows_disabling_one_radio_when_other_is_up() {
        let mut reg = DeviceRegistry::new([Capability::Rig, Capability::Sdr]);
        assert!(reg.toggle(Capability::Rig).is_ok());
        assert!(!reg.enabled(Capability::Rig));
        assert!(reg.enabled(Capability::Sdr));
    }

    #[test]
    fn subscribers_fire_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut reg = DeviceRegistry::new([Capability::Rig, Capability::Sdr]);
        let o1 = order.clone();
        reg.on_add(move |_| o1.lock().unwrap().push(1));
        let o2 = order.clone();
        reg.on_add(move |_| o2.lock().unwrap().push(2));
        reg.add(Capability::Mouse);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }
}
