use json_model_value::ValueStore;

/// Why observers are being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// An edit was committed with changes.
    Commit,
    /// `post_change_notification` was called directly.
    Posted,
}

#[derive(Debug, PartialEq)]
pub struct ChangeEvent {
    pub origin: ChangeOrigin,
    /// Content when the edit began; `None` for posted notifications.
    pub before: Option<ValueStore>,
    /// Detached copy of the content at notification time.
    pub after: ValueStore,
}

/// Token returned by `add_change_observer`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Result of `end_edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// No edit was in progress.
    NotEditing,
    /// The content equals the snapshot; nothing was committed or restored.
    Unchanged,
    /// Changes were kept and observers notified.
    Committed,
    /// The content was restored from the snapshot.
    RolledBack,
}
