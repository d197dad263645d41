//=========================================================================
// Event Channel
//=========================================================================
//
// Tag-keyed multi-listener dispatcher for simulation events.
//
// Architecture:
//   relay / host → emit(tag, payload) → HashMap<tag, Vec<Listener>>
//                                              ↓
//                         every listener, in registration order
//
// Dispatch is synchronous: `emit` returns only after each listener ran,
// so events raised during a step are delivered before the step returns.
// Tags nobody listens to are dropped (trace-logged).
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::event::{EventValue, GameEvent};

//=== Public API ==========================================================

/// Listener invoked with an event's ordered payload.
pub type Listener = Box<dyn FnMut(&[EventValue])>;

/// Registration receipt, used to remove a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

//=========================================================================

/// Multi-listener dispatcher keyed by event tag.
pub struct EventChannel {
    listeners: HashMap<String, Vec<(ListenerId, Listener)>>,
    next_id: u64,
    dropped: u64,
}

impl EventChannel {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
            dropped: 0,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers `listener` for `tag`. Listeners of one tag run in the
    /// order they were registered.
    pub fn on<F>(&mut self, tag: &str, listener: F) -> ListenerId
    where
        F: FnMut(&[EventValue]) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        self.listeners
            .entry(tag.to_owned())
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Registers a listener that receives the typed [`GameEvent`] view.
    ///
    /// Payloads that do not fit the tag's shape are skipped with a warning.
    pub fn on_game_event<F>(&mut self, tag: &str, mut listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let owned_tag = tag.to_owned();
        self.on(tag, move |payload| match GameEvent::from_named(&owned_tag, payload) {
            Some(event) => listener(&event),
            None => warn!(target: "events", "Malformed `{}` payload: {:?}", owned_tag, payload),
        })
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        for list in self.listeners.values_mut() {
            if let Some(index) = list.iter().position(|(listener_id, _)| *listener_id == id) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    //--- Dispatch ---------------------------------------------------------

    /// Invokes every listener registered for `tag`, in order, and returns
    /// how many ran.
    pub fn emit(&mut self, tag: &str, payload: &[EventValue]) -> usize {
        match self.listeners.get_mut(tag) {
            Some(list) if !list.is_empty() => {
                for (_, listener) in list.iter_mut() {
                    listener(payload);
                }
                list.len()
            }
            _ => {
                self.dropped += 1;
                trace!(target: "events", "Unhandled event `{}` {:?}", tag, payload);
                0
            }
        }
    }

    /// Emits a typed event under its tag.
    pub fn emit_event(&mut self, event: &GameEvent) -> usize {
        let named = event.to_named();
        self.emit(&named.tag, &named.payload)
    }

    //--- Query API --------------------------------------------------------

    pub fn listener_count(&self, tag: &str) -> usize {
        self.listeners.get(tag).map(Vec::len).unwrap_or(0)
    }

    /// Number of emits that found no listener since creation.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(tag, list)| (tag.as_str(), list.len()))
            .collect();
        f.debug_struct("EventChannel")
            .field("listeners", &counts)
            .field("dropped", &self.dropped)
            .finish()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&str) -> Box<dyn FnMut(&[EventValue])>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &str| {
            let sink = Rc::clone(&sink);
            let name = name.to_owned();
            Box::new(move |payload: &[EventValue]| {
                sink.borrow_mut().push(format!("{}:{}", name, payload.len()));
            }) as Box<dyn FnMut(&[EventValue])>
        };
        (log, make)
    }

    #[test]
    fn new_channel_has_no_listeners() {
        let channel = EventChannel::new();
        assert_eq!(channel.listener_count("PLAY_AUDIO"), 0);
        assert_eq!(channel.dropped_count(), 0);
    }

    #[test]
    fn single_listener_receives_payload_in_order() {
        let mut channel = EventChannel::new();
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        channel.on("PLAY_AUDIO", move |payload| {
            sink.borrow_mut().push(payload.to_vec());
        });

        let invoked = channel.emit(
            "PLAY_AUDIO",
            &["PLAYER".into(), "JUMP".into(), 1.0f64.into(), 1.0f64.into()],
        );

        assert_eq!(invoked, 1);
        let received = received.borrow();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0],
            vec![
                EventValue::from("PLAYER"),
                EventValue::from("JUMP"),
                EventValue::Num(1.0),
                EventValue::Num(1.0),
            ]
        );
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let (log, mut make) = recorder();
        let mut channel = EventChannel::new();
        channel.on("STOP_AUDIO", make("first"));
        channel.on("STOP_AUDIO", make("second"));
        channel.on("STOP_AUDIO", make("third"));

        channel.emit("STOP_AUDIO", &["PLAYER".into(), "WALLRUN".into()]);

        assert_eq!(*log.borrow(), vec!["first:2", "second:2", "third:2"]);
    }

    #[test]
    fn unregistered_tag_is_dropped_silently() {
        let (log, mut make) = recorder();
        let mut channel = EventChannel::new();
        channel.on("PLAY_AUDIO", make("audio"));

        assert_eq!(channel.emit("LEVEL_COMPLETED", &[]), 0);
        assert!(log.borrow().is_empty());
        assert_eq!(channel.dropped_count(), 1);
    }

    #[test]
    fn tags_are_isolated() {
        let (log, mut make) = recorder();
        let mut channel = EventChannel::new();
        channel.on("LOOP_ANIMATION", make("anim"));
        channel.on("AD_ANNOUNCEMENT", make("ad"));

        channel.emit("AD_ANNOUNCEMENT", &["Gameplay started".into()]);

        assert_eq!(*log.borrow(), vec!["ad:1"]);
    }

    #[test]
    fn off_removes_only_that_listener() {
        let (log, mut make) = recorder();
        let mut channel = EventChannel::new();
        let first = channel.on("PLAYER_RESET", make("first"));
        channel.on("PLAYER_RESET", make("second"));

        assert!(channel.off(first));
        assert!(!channel.off(first));
        channel.emit("PLAYER_RESET", &[]);

        assert_eq!(*log.borrow(), vec!["second:0"]);
        assert_eq!(channel.listener_count("PLAYER_RESET"), 1);
    }

    #[test]
    fn emit_after_last_listener_removed_counts_as_dropped() {
        let (_log, mut make) = recorder();
        let mut channel = EventChannel::new();
        let id = channel.on("LEVEL_FAILED", make("only"));
        channel.off(id);

        assert_eq!(channel.emit("LEVEL_FAILED", &[]), 0);
        assert_eq!(channel.dropped_count(), 1);
    }

    #[test]
    fn typed_listener_receives_game_event() {
        let mut channel = EventChannel::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        channel.on_game_event("LOOP_AUDIO", move |event| {
            *sink.borrow_mut() = Some(event.clone());
        });

        channel.emit_event(&GameEvent::LoopAudio {
            target: "PLAYER".into(),
            clip: "LEVEL_MUSIC".into(),
            rate: 1.0,
            volume: 0.2,
        });

        assert_eq!(
            *seen.borrow(),
            Some(GameEvent::LoopAudio {
                target: "PLAYER".into(),
                clip: "LEVEL_MUSIC".into(),
                rate: 1.0,
                volume: 0.2,
            })
        );
    }

    #[test]
    fn typed_listener_skips_malformed_payload() {
        let mut channel = EventChannel::new();
        let calls = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&calls);
        channel.on_game_event("PLAY_AUDIO", move |_| *sink.borrow_mut() += 1);

        let invoked = channel.emit("PLAY_AUDIO", &["PLAYER".into()]);

        assert_eq!(invoked, 1);
        assert_eq!(*calls.borrow(), 0);
    }
}
