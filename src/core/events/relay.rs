//=========================================================================
// Host Call Relay
//=========================================================================
//
// Translates flat host-import invocations into named events.
//
// The simulation cannot hold host references; it can only call imported
// functions with integers and floats. Each import lands here as a
// `HostCall` carrying raw pointer/length pairs, is decoded through the
// transfer codec, and re-emitted on the channel.
//
// Architecture:
//   simulation ──play_audio_hook(ptr,len,ptr,len,rate,vol)──> HostCall
//        ↓ relay()
//   read_string() × n ──> GameEvent ──> EventChannel::emit_event()
//
//=========================================================================

//=== External Dependencies ===============================================

use log::Level;

//=== Internal Dependencies ===============================================

use super::{EventChannel, GameEvent};
use crate::core::transfer::{read_string, StrRef};
use crate::error::TransferError;

//=== HostCall ============================================================

/// One raw callback from the simulation, before decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCall {
    PlayAudio {
        target: StrRef,
        clip: StrRef,
        rate: f32,
        volume: f32,
    },
    LoopAudio {
        target: StrRef,
        clip: StrRef,
        rate: f32,
        volume: f32,
    },
    StopAudio {
        target: StrRef,
        clip: StrRef,
    },
    LoopAnimation {
        target: StrRef,
        clip: StrRef,
        time_scale: f32,
    },
    StopAnimation {
        target: StrRef,
        clip: StrRef,
    },
    Announce {
        message: StrRef,
    },
    /// Level progress signal; the string is the event tag itself.
    LevelEvent {
        kind: StrRef,
    },
    Log {
        level: Level,
        message: StrRef,
    },
}

impl HostCall {
    /// Import name the simulation links this callback under.
    pub fn import_name(&self) -> &'static str {
        match self {
            Self::PlayAudio { .. } => "play_audio_hook",
            Self::LoopAudio { .. } => "loop_audio_hook",
            Self::StopAudio { .. } => "stop_audio_hook",
            Self::LoopAnimation { .. } => "loop_animation_hook",
            Self::StopAnimation { .. } => "stop_animation_hook",
            Self::Announce { .. } => "assistive_device_announce_hook",
            Self::LevelEvent { .. } => "level_event_hook",
            Self::Log { level, .. } => match level {
                Level::Error => "on_error",
                Level::Warn => "on_warn",
                Level::Info => "on_info",
                Level::Debug => "on_debug",
                Level::Trace => "on_trace",
            },
        }
    }
}

//=== relay() =============================================================

/// Decodes `call` against `memory` and emits it. Returns the number of
/// listeners that ran.
///
/// Diagnostic calls are also written to the `log` facade under the
/// `simulation` target.
pub fn relay(events: &mut EventChannel, memory: &[u8], call: HostCall) -> Result<usize, TransferError> {
    let text = |s: StrRef| read_string(memory, s);

    let event = match call {
        HostCall::PlayAudio {
            target,
            clip,
            rate,
            volume,
        } => GameEvent::PlayAudio {
            target: text(target)?,
            clip: text(clip)?,
            rate,
            volume,
        },
        HostCall::LoopAudio {
            target,
            clip,
            rate,
            volume,
        } => GameEvent::LoopAudio {
            target: text(target)?,
            clip: text(clip)?,
            rate,
            volume,
        },
        HostCall::StopAudio { target, clip } => GameEvent::StopAudio {
            target: text(target)?,
            clip: text(clip)?,
        },
        HostCall::LoopAnimation {
            target,
            clip,
            time_scale,
        } => GameEvent::LoopAnimation {
            target: text(target)?,
            clip: text(clip)?,
            time_scale,
        },
        HostCall::StopAnimation { target, clip } => GameEvent::StopAnimation {
            target: text(target)?,
            clip: text(clip)?,
        },
        HostCall::Announce { message } => GameEvent::Announcement(text(message)?),
        HostCall::LevelEvent { kind } => {
            // Level tags are open-ended; forward whatever the level sent.
            let tag = text(kind)?;
            return Ok(events.emit(&tag, &[]));
        }
        HostCall::Log { level, message } => {
            let message = text(message)?;
            log::log!(target: "simulation", level, "{}", message);
            GameEvent::Log { level, message }
        }
    };

    Ok(events.emit_event(&event))
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventValue;
    use crate::core::transfer::write_string;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Lays strings out back to back, as the simulation would.
    fn memory_with(strings: &[&str]) -> (Vec<u8>, Vec<StrRef>) {
        let mut memory = vec![0u8; 256];
        let mut refs = Vec::new();
        let mut cursor = 16;
        for s in strings {
            refs.push(write_string(&mut memory, cursor, s.as_bytes()).unwrap());
            cursor += s.len() as u32;
        }
        (memory, refs)
    }

    fn capture(events: &mut EventChannel, tag: &str) -> Rc<RefCell<Vec<Vec<EventValue>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        events.on(tag, move |payload| sink.borrow_mut().push(payload.to_vec()));
        seen
    }

    #[test]
    fn play_audio_hook_emits_decoded_fields() {
        let (memory, refs) = memory_with(&["PLAYER", "JUMP"]);
        let mut events = EventChannel::new();
        let seen = capture(&mut events, "PLAY_AUDIO");

        let invoked = relay(
            &mut events,
            &memory,
            HostCall::PlayAudio {
                target: refs[0],
                clip: refs[1],
                rate: 1.25,
                volume: 0.5,
            },
        )
        .unwrap();

        assert_eq!(invoked, 1);
        assert_eq!(
            seen.borrow()[0],
            vec![
                EventValue::from("PLAYER"),
                EventValue::from("JUMP"),
                EventValue::Num(1.25),
                EventValue::Num(0.5),
            ]
        );
    }

    #[test]
    fn level_event_uses_string_as_tag() {
        let (memory, refs) = memory_with(&["CHECKPOINT_REACHED"]);
        let mut events = EventChannel::new();
        let seen = capture(&mut events, "CHECKPOINT_REACHED");

        relay(&mut events, &memory, HostCall::LevelEvent { kind: refs[0] }).unwrap();

        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_empty());
    }

    #[test]
    fn log_hook_emits_under_lowercase_level() {
        let (memory, refs) = memory_with(&["collider missing"]);
        let mut events = EventChannel::new();
        let seen = capture(&mut events, "warn");

        relay(
            &mut events,
            &memory,
            HostCall::Log {
                level: Level::Warn,
                message: refs[0],
            },
        )
        .unwrap();

        assert_eq!(seen.borrow()[0], vec![EventValue::from("collider missing")]);
    }

    #[test]
    fn bad_pointer_fails_without_emitting() {
        let memory = vec![0u8; 32];
        let mut events = EventChannel::new();
        let seen = capture(&mut events, "AD_ANNOUNCEMENT");

        let result = relay(
            &mut events,
            &memory,
            HostCall::Announce {
                message: StrRef::new(30, 8),
            },
        );

        assert!(result.is_err());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn import_names_match_abi() {
        let s = StrRef::new(0, 0);
        assert_eq!(HostCall::Announce { message: s }.import_name(), "assistive_device_announce_hook");
        assert_eq!(
            HostCall::Log {
                level: Level::Trace,
                message: s
            }
            .import_name(),
            "on_trace"
        );
    }
}
