//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status_line: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::LoadSoilTypes => "load_soil_types",
        BackendCommand::Predict { .. } => "predict",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status_line = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status_line =
                "Backend worker disconnected (possible startup failure); restart the app"
                    .to_string();
        }
    }
}
