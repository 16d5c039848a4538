//! Scroll position checkout around one rule run.

use crate::page::{Page, ScrollPosition};
use crate::result::LinterResult;
use tracing::{trace, warn};

/// Scroll offset captured before a rule runs.
///
/// Restoring is async, so it cannot happen in `Drop`; the engine calls
/// [`restore`](Self::restore) on every path out of the rule. Dropping an
/// unrestored checkout logs a warning.
#[must_use = "a scroll checkout must be restored"]
#[derive(Debug)]
pub struct ScrollCheckout {
    position: ScrollPosition,
    restored: bool,
}

impl ScrollCheckout {
    /// Read the page's current scroll offset
    pub async fn capture(page: &mut dyn Page) -> LinterResult<Self> {
        let position = page.scroll_position().await?;
        trace!(x = position.x, y = position.y, "scroll checked out");
        Ok(Self {
            position,
            restored: false,
        })
    }

    /// Captured offset
    #[must_use]
    pub const fn position(&self) -> ScrollPosition {
        self.position
    }

    /// Scroll the page back to the captured offset
    pub async fn restore(mut self, page: &mut dyn Page) -> LinterResult<()> {
        self.restored = true;
        trace!(x = self.position.x, y = self.position.y, "scroll restored");
        page.scroll_to(self.position).await
    }
}

impl Drop for ScrollCheckout {
    fn drop(&mut self) {
        if !self.restored {
            warn!(
                x = self.position.x,
                y = self.position.y,
                "scroll checkout dropped without restore"
            );
        }
    }
}
