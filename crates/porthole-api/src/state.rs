use std::sync::Arc;

use porthole_ai::QueryGenerator;
use porthole_db::Documents;

#[derive(Clone)]
pub struct AppState {
    pub docs: Arc<Documents>,
    pub generator: Option<Arc<dyn QueryGenerator>>,
}
