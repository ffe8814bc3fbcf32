//! Command queue and event subscriptions.
//!
//! [`CommandBus`] is a world resource holding an unbounded crossbeam queue of
//! [`SceneCmd`]s and the list of subscribers. Commands are drained by
//! [`SceneEditor::run`](crate::editor::SceneEditor::run); every drained
//! command is published as [`EditorEvent::Dispatched`] before it is applied
//! and as [`EditorEvent::Completed`] once it succeeded.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

use super::scenecmd::{CmdKind, SceneCmd};

/// Phase of a command's life on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdPhase {
    Dispatched,
    Completed,
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Dispatched(SceneCmd),
    Completed(SceneCmd),
    Selected { ids: Vec<String> },
    Unselected { ids: Vec<String> },
}

impl EditorEvent {
    pub fn phase(&self) -> Option<CmdPhase> {
        match self {
            Self::Dispatched(_) => Some(CmdPhase::Dispatched),
            Self::Completed(_) => Some(CmdPhase::Completed),
            Self::Selected { .. } | Self::Unselected { .. } => None,
        }
    }

    pub fn command(&self) -> Option<&SceneCmd> {
        match self {
            Self::Dispatched(cmd) | Self::Completed(cmd) => Some(cmd),
            Self::Selected { .. } | Self::Unselected { .. } => None,
        }
    }
}

/// Which events a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    Any,
    /// Every command in the given phase.
    Phase(CmdPhase),
    /// One kind of command in the given phase.
    Command(CmdPhase, CmdKind),
    /// Selection changes only.
    Selection,
}

impl EventFilter {
    pub fn matches(&self, event: &EditorEvent) -> bool {
        match self {
            Self::Any => true,
            Self::Phase(phase) => event.phase() == Some(*phase),
            Self::Command(phase, kind) => {
                event.phase() == Some(*phase) && event.command().map(SceneCmd::kind) == Some(*kind)
            }
            Self::Selection => matches!(
                event,
                EditorEvent::Selected { .. } | EditorEvent::Unselected { .. }
            ),
        }
    }
}

struct Subscription {
    filter: EventFilter,
    tx: Sender<EditorEvent>,
}

#[derive(Resource)]
pub struct CommandBus {
    tx_cmd: Sender<SceneCmd>,
    rx_cmd: Receiver<SceneCmd>,
    subscriptions: Vec<Subscription>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<SceneCmd>();
        Self {
            tx_cmd,
            rx_cmd,
            subscriptions: Vec::new(),
        }
    }

    /// Queues a command for the next drain.
    pub fn dispatch(&self, cmd: SceneCmd) {
        debug!("bus: queued {:?}", cmd.kind());
        // The bus owns the receiver, so the channel cannot be disconnected.
        let _ = self.tx_cmd.send(cmd);
    }

    /// Next queued command, if any.
    pub fn next(&self) -> Option<SceneCmd> {
        self.rx_cmd.try_recv().ok()
    }

    pub fn pending(&self) -> usize {
        self.rx_cmd.len()
    }

    pub fn subscribe(&mut self, filter: EventFilter) -> Receiver<EditorEvent> {
        let (tx, rx) = unbounded::<EditorEvent>();
        self.subscriptions.push(Subscription { filter, tx });
        rx
    }

    /// Delivers `event` to every matching subscriber. Subscribers whose
    /// receiver was dropped are removed.
    pub fn publish(&mut self, event: &EditorEvent) {
        self.subscriptions.retain(|sub| {
            if !sub.filter.matches(event) {
                return true;
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }
}
