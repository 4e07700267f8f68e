// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod dashboard {
    pub use crate::dashboard::*;
}

pub use crate::app::build_router;
