//! Modal transition state machine.
//!
//! Only one modal may be on screen at a time, and switching between two
//! modals has to wait for the outgoing one's close animation. Instead of
//! sequencing that with timers, the screen holds a [`ModalState`] and feeds
//! it three triggers: [`open`](ModalState::open), [`close`](ModalState::close)
//! and [`animation_finished`](ModalState::animation_finished).
//!
//! ```text
//! Closed ──open(k)──▶ Open(k)
//! Open(a) ──open(b)──▶ Transitioning { target: Some(b) }
//! Open(_) ──close──▶ Transitioning { target: None }
//! Transitioning { t } ──animation_finished──▶ Open(t) | Closed
//! ```

/// Where the modal layer is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<K> {
    Closed,
    /// The previous modal is animating out; `target` is shown next, or
    /// nothing if `None`.
    Transitioning { target: Option<K> },
    Open(K),
}

impl<K> Default for ModalState<K> {
    fn default() -> Self {
        Self::Closed
    }
}

impl<K: Clone + PartialEq> ModalState<K> {
    /// The modal currently on screen, if any. Nothing is considered visible
    /// while transitioning.
    pub fn visible(&self) -> Option<&K> {
        match self {
            Self::Open(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Request `kind` be shown.
    pub fn open(&mut self, kind: K) {
        *self = match std::mem::take(self) {
            Self::Closed => Self::Open(kind),
            Self::Open(current) if current == kind => Self::Open(current),
            Self::Open(_) | Self::Transitioning { .. } => Self::Transitioning { target: Some(kind) },
        };
    }

    /// Request the modal layer be emptied.
    pub fn close(&mut self) {
        *self = match std::mem::take(self) {
            Self::Closed => Self::Closed,
            Self::Open(_) | Self::Transitioning { .. } => Self::Transitioning { target: None },
        };
    }

    /// The outgoing modal finished animating.
    pub fn animation_finished(&mut self) {
        *self = match std::mem::take(self) {
            Self::Transitioning { target: Some(kind) } => Self::Open(kind),
            Self::Transitioning { target: None } => Self::Closed,
            other => other,
        };
    }
}

/// Modals of the profile-photo flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoModal {
    /// "Take photo / choose from library / remove" sheet.
    Options,
    Camera,
    Library,
}
