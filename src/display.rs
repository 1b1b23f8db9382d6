//! Display seam: the on-screen character is an external collaborator that
//! binds here.

use crate::triggers::Expression;

/// Renderer contract: fast and idempotent. The executor calls this on every
/// expression change and never from more than one task.
pub trait DisplayRenderer: Send + Sync {
    fn show(&self, expression: Expression);
}

/// Headless stand-in used when no renderer hardware is wired up.
pub struct LoggingDisplay;

impl DisplayRenderer for LoggingDisplay {
    fn show(&self, expression: Expression) {
        log::info!("🦆 Expression -> {}", expression);
    }
}
