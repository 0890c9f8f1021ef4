//! Handler chain result type.

/// Handler result for the chain. `Reply(text)` carries the final reply so `after()` hooks can see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; no response body.
    Stop,
    /// Skip this handler, try next.
    Ignore,
    /// Stop the chain and attach the text that was delivered to the user.
    Reply(String),
}
