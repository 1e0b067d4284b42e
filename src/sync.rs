//! Shared value cells linking one visual attribute across viewports.
//!
//! A [`SyncCell`] is one owner's reference to a shared slot. Owners that
//! reference the same slot form a sync group: a write by any member is read
//! by every member on its next access. Membership is flat (a member points
//! at a slot, never at another member), so re-targeting a member can never
//! create a cycle.
//!
//! Detaching copies the current value into a fresh private slot, freezing
//! what the member saw; the rest of the group is unaffected. A slot is
//! dropped together with its last member.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One member's handle on a shared value.
///
/// Deliberately not `Clone`: joining a group is always an explicit
/// [`SyncCell::join`].
pub struct SyncCell<T: Copy> {
    slot: Rc<RefCell<T>>,
}

impl<T: Copy + fmt::Debug> fmt::Debug for SyncCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCell")
            .field("value", &self.get())
            .field("members", &self.members())
            .finish()
    }
}

impl<T: Copy> SyncCell<T> {
    /// A private cell (a group of one).
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(value)),
        }
    }

    /// Live value of the group.
    pub fn get(&self) -> T {
        *self.slot.borrow()
    }

    /// Write through to every member of the group.
    pub fn set(&self, value: T) {
        *self.slot.borrow_mut() = value;
    }

    /// Read-modify-write of the shared value.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.slot.borrow_mut());
    }

    /// Leave the current group and join `group`'s, adopting its value.
    pub fn join(&mut self, group: &SyncCell<T>) {
        if !self.is_linked(group) {
            self.slot = Rc::clone(&group.slot);
        }
    }

    /// Leave the group, keeping the value observed right now.
    pub fn detach(&mut self) {
        if self.members() > 1 {
            self.slot = Rc::new(RefCell::new(self.get()));
        }
    }

    /// Number of members currently sharing the slot, this one included.
    pub fn members(&self) -> usize {
        Rc::strong_count(&self.slot)
    }

    /// `true` if both cells read and write the same slot.
    pub fn is_linked(&self, other: &SyncCell<T>) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_cell() {
        let c = SyncCell::new(1.5);
        assert_eq!(c.get(), 1.5);
        c.set(2.0);
        assert_eq!(c.get(), 2.0);
        assert_eq!(c.members(), 1);
    }

    #[test]
    fn test_join_adopts_group_value_and_shares_writes() {
        let mut a = SyncCell::new(1.0);
        let b = SyncCell::new(2.0);
        a.join(&b);
        assert_eq!(a.get(), 2.0);
        a.set(3.0);
        assert_eq!(b.get(), 3.0);
        assert_eq!(b.members(), 2);
        assert!(a.is_linked(&b));
    }

    #[test]
    fn test_detach_freezes_value() {
        let mut a = SyncCell::new(0.0);
        let b = SyncCell::new(5.0);
        a.join(&b);
        a.detach();
        assert_eq!(a.get(), 5.0);
        b.set(9.0);
        assert_eq!(a.get(), 5.0);
        assert_eq!(b.members(), 1);
        assert!(!a.is_linked(&b));
    }

    #[test]
    fn test_rejoin_third_group_retargets_only_self() {
        let mut a = SyncCell::new(1);
        let mut b = SyncCell::new(2);
        let c = SyncCell::new(3);
        b.join(&a);
        a.join(&c);
        assert_eq!(a.get(), 3);
        assert_eq!(b.get(), 1);
        b.join(&a);
        assert_eq!(c.members(), 3);
        c.set(7);
        assert_eq!((a.get(), b.get()), (7, 7));
    }

    #[test]
    fn test_join_self_group_is_noop() {
        let mut a = SyncCell::new(1);
        let b = SyncCell::new(2);
        a.join(&b);
        a.join(&b);
        assert_eq!(b.members(), 2);
    }

    #[test]
    fn test_dropping_member_keeps_slot_for_others() {
        let mut a = SyncCell::new(1);
        let b = SyncCell::new(2);
        a.join(&b);
        drop(b);
        assert_eq!(a.members(), 1);
        assert_eq!(a.get(), 2);
        a.detach();
        assert_eq!(a.get(), 2);
    }
}
