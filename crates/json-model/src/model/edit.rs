//! Edit transactions and change notification.
//!
//! `begin_edit` stores a deep copy of the content. Nested documents are
//! edited in place through aliases, so only a detached baseline can tell
//! whether anything changed and restore it.

use std::cell::RefCell;
use std::rc::Rc;

use json_model_value::ValueStore;
use tracing::debug;

use super::{ChangeEvent, ChangeOrigin, EditOutcome, JsonModel, ObserverId};

impl JsonModel {
    /// Snapshots the current content. Calling it again while editing
    /// replaces the snapshot.
    pub fn begin_edit(&self) {
        let snapshot = self.inner.store.borrow().deep_copy();
        let restarted = self.inner.snapshot.borrow_mut().replace(snapshot).is_some();
        debug!(target: "json_model::edit", restarted, "edit began");
    }

    pub fn is_editing(&self) -> bool {
        self.inner.snapshot.borrow().is_some()
    }

    /// Ends the edit and discards the snapshot.
    ///
    /// When the content differs from the snapshot, `commit` keeps it and
    /// notifies every observer before returning; otherwise the snapshot is
    /// restored and nobody is notified. Nested documents resolved before a
    /// rollback keep pointing at the replaced nodes.
    ///
    /// Typed documents should prefer
    /// [`Document::end_edit`](crate::Document::end_edit), which also runs
    /// their [`save`](crate::Document::save) hook.
    pub fn end_edit(&self, commit: bool) -> EditOutcome {
        self.finish_edit(commit, || {})
    }

    /// `end_edit` with `on_commit` run after the changes are kept and before
    /// observers are notified.
    pub(crate) fn finish_edit(&self, commit: bool, on_commit: impl FnOnce()) -> EditOutcome {
        let Some(snapshot) = self.inner.snapshot.borrow_mut().take() else {
            return EditOutcome::NotEditing;
        };
        if *self.inner.store.borrow() == snapshot {
            debug!(target: "json_model::edit", "edit ended without changes");
            return EditOutcome::Unchanged;
        }
        if commit {
            debug!(
                target: "json_model::edit",
                observers = self.observer_count(),
                "edit committed"
            );
            on_commit();
            self.notify(ChangeOrigin::Commit, Some(snapshot));
            EditOutcome::Committed
        } else {
            debug!(target: "json_model::edit", "edit rolled back");
            self.replace_content(snapshot);
            EditOutcome::RolledBack
        }
    }

    /// Runs `f` inside an edit: committed on `Ok`, rolled back on `Err`.
    pub fn edit<R, E>(&self, f: impl FnOnce(&Self) -> Result<R, E>) -> Result<R, E> {
        self.begin_edit();
        let result = f(self);
        self.end_edit(result.is_ok());
        result
    }

    pub fn add_change_observer(&self, observer: impl FnMut(&ChangeEvent) + 'static) -> ObserverId {
        let id = self.inner.next_observer_id.get();
        self.inner.next_observer_id.set(id.saturating_add(1));
        let observer: Box<dyn FnMut(&ChangeEvent)> = Box::new(observer);
        self.inner
            .observers
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(observer)));
        ObserverId(id)
    }

    pub fn remove_change_observer(&self, id: ObserverId) -> bool {
        self.inner.observers.borrow_mut().remove(&id.0).is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Notifies every registered observer now.
    pub fn post_change_notification(&self) {
        self.notify(ChangeOrigin::Posted, None);
    }

    /// Calls observers in registration order. Observers may add or remove
    /// observers from their callback; one removed during dispatch is not
    /// called afterwards, one added is first called on the next dispatch.
    /// An observer whose callback triggers a nested dispatch is skipped by
    /// that nested dispatch.
    fn notify(&self, origin: ChangeOrigin, before: Option<ValueStore>) {
        let observers: Vec<_> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(id, observer)| (*id, observer.clone()))
            .collect();
        if observers.is_empty() {
            return;
        }
        let event = ChangeEvent {
            origin,
            before,
            after: self.inner.store.borrow().deep_copy(),
        };
        for (id, observer) in observers {
            if !self.inner.observers.borrow().contains_key(&id) {
                continue;
            }
            let Ok(mut callback) = observer.try_borrow_mut() else {
                continue;
            };
            (*callback)(&event);
        }
    }
}
