use crate::services::scan_state::SharedScanState;

#[derive(Clone)]
pub struct AppState {
    pub scan_state: SharedScanState,
}
