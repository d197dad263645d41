//=========================================================================
// Event Channel
//=========================================================================
//
// Simulation → host notifications.
//
// Components:
// - `event`: payload model, tag table and the typed `GameEvent` view
// - `channel`: tag-keyed synchronous multi-listener dispatcher
// - `relay`: decodes raw host-import calls and re-emits them by name
//
//=========================================================================

//=== Module Declarations =================================================

mod channel;
mod event;
mod relay;

//=== Public API ==========================================================

pub use channel::{EventChannel, Listener, ListenerId};
pub use event::{tags, EventValue, GameEvent, NamedEvent};
pub use relay::{relay, HostCall};
