use std::sync::Arc;

use classifier::TicketClassifier;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) classifier: Arc<dyn TicketClassifier>,
}
