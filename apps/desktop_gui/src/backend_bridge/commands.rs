//! Backend commands queued from UI to backend worker.

use shared::domain::FormInput;

pub enum BackendCommand {
    LoadSoilTypes,
    Predict { input: FormInput },
}
