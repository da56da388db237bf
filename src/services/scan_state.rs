use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::scan::ScanSnapshot;

#[derive(Debug)]
pub struct ScanStateInner {
    pub snapshot: RwLock<ScanSnapshot>,
    pub broadcaster: broadcast::Sender<ScanSnapshot>,
}

pub type SharedScanState = Arc<ScanStateInner>;

pub fn new_shared_state() -> SharedScanState {
    let (broadcaster, _receiver) = broadcast::channel(16);
    Arc::new(ScanStateInner {
        snapshot: RwLock::new(ScanSnapshot::default()),
        broadcaster,
    })
}
