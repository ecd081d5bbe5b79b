//! Input normalization
//!
//! Every device reduces to the same three actions. Pointer and touch get no
//! special treatment over the keyboard.

use crate::session::Session;

/// What a host input means to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// Flap (and start from Idle)
    Impulse,
    /// Tear the session down
    Close,
    /// Reset after a run ended
    Retry,
}

/// Raw host input, named the way browsers report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource<'a> {
    PointerDown,
    TouchStart,
    /// `KeyboardEvent.code`
    Key(&'a str),
}

impl InputSource<'_> {
    pub fn action(self) -> Option<HostAction> {
        match self {
            InputSource::PointerDown | InputSource::TouchStart => Some(HostAction::Impulse),
            InputSource::Key(code) => match code {
                "Space" | "ArrowUp" => Some(HostAction::Impulse),
                "Escape" => Some(HostAction::Close),
                "Enter" | "KeyR" => Some(HostAction::Retry),
                _ => None,
            },
        }
    }
}

/// Apply an action to the session
pub fn dispatch(session: &mut Session, action: HostAction) {
    match action {
        HostAction::Impulse => session.request_impulse(),
        HostAction::Close => session.close(),
        HostAction::Retry => session.reset(),
    }
}
