//! Foreground/background signal from the hosting surface.

use tokio::sync::watch;

/// Whether the hosting surface is currently visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    #[inline]
    #[must_use]
    pub fn is_hidden(self) -> bool {
        matches!(self, Visibility::Hidden)
    }
}

pub type VisibilityReceiver = watch::Receiver<Visibility>;

/// The hosting surface owns the sender half and pushes transitions; the
/// core only observes. Dropping the sender freezes the last value.
#[must_use]
pub fn visibility_channel(initial: Visibility) -> (watch::Sender<Visibility>, VisibilityReceiver) {
    watch::channel(initial)
}
