use tracing::{debug, warn};

use crate::domain::ExecState;
use crate::service::PeerExplorer;

impl PeerExplorer {
    /// `CREATED -> RUNNING`, optionally pinging the bootstrap addresses.
    ///
    /// Returns whether the transition happened.
    pub fn start_with(&self, ping_boot_nodes: bool) -> bool {
        self.with_state(|state, now| {
            if state.exec != ExecState::Created {
                warn!(state = %state.exec, "start ignored, explorer already started");
                return false;
            }

            state.exec = ExecState::Running;
            debug!(
                local = %self.local_node(),
                boot_nodes = state.boot_nodes.len(),
                "peer explorer running"
            );
            if ping_boot_nodes {
                self.start_conversation_with_new_nodes(state, now);
            }
            true
        })
    }

    /// `CREATED | RUNNING -> FINISHED`. In-flight requests are abandoned.
    pub(crate) fn finish(&self) -> bool {
        self.with_state(|state, _| {
            if state.exec == ExecState::Finished {
                warn!("dispose ignored, explorer already finished");
                return false;
            }

            debug!(
                from = %state.exec,
                pending_pings = state.requests.pending_ping_count(),
                "peer explorer finished"
            );
            state.exec = ExecState::Finished;
            true
        })
    }
}
