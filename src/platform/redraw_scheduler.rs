//=========================================================================
// Redraw Scheduler
//=========================================================================
//
// `FrameScheduler` over winit redraws.
//
// Architecture:
//   request_frame() → armed token + redraw flag → window.request_redraw()
//   RedrawRequested → take_due() → Session::on_frame(token, now)
//
// winit has no per-request cancellation, so cancelling disarms the token
// instead: a redraw that arrives with nothing armed delivers no frame.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::pacer::{FrameScheduler, FrameToken};

//=== RedrawScheduler =====================================================

#[derive(Debug, Default)]
pub(crate) struct RedrawScheduler {
    next: u64,
    armed: Option<FrameToken>,
    redraw_requested: bool,
}

impl RedrawScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Takes the armed frame, if any, for delivery on this redraw.
    pub(crate) fn take_due(&mut self) -> Option<FrameToken> {
        self.armed.take()
    }

    /// Whether a redraw must be requested from the window. Resets the flag.
    pub(crate) fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken::new(self.next);
        self.armed = Some(token);
        self.redraw_requested = true;
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.armed == Some(token) {
            self.armed = None;
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
