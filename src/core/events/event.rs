//=========================================================================
// Named Events
//
// Defines the payload model for events raised by the simulation.
//
// A named event is a string tag plus an ordered list of string/number
// fields. `GameEvent` is the typed view over the tags the host knows
// about; unknown tags still travel through the channel untyped.
//
// Tag table:
// ```text
//   PLAY_AUDIO        (target, clip, rate, volume)
//   LOOP_AUDIO        (target, clip, rate, volume)
//   STOP_AUDIO        (target, clip)
//   LOOP_ANIMATION    (target, clip, time_scale)
//   STOP_ANIMATION    (target, clip)
//   AD_ANNOUNCEMENT   (message)
//   MASTER_VOLUME     (volume)                     host-raised
//   LEVEL_COMPLETED / LEVEL_RESTARTED / LEVEL_FAILED
//   CHECKPOINT_REACHED / PLAYER_RESET                 ()
//   error / warn / info / debug / trace               (message)
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use log::Level;

//=== Tags ================================================================

pub mod tags {
    pub const PLAY_AUDIO: &str = "PLAY_AUDIO";
    pub const LOOP_AUDIO: &str = "LOOP_AUDIO";
    pub const STOP_AUDIO: &str = "STOP_AUDIO";
    pub const LOOP_ANIMATION: &str = "LOOP_ANIMATION";
    pub const STOP_ANIMATION: &str = "STOP_ANIMATION";
    pub const AD_ANNOUNCEMENT: &str = "AD_ANNOUNCEMENT";
    pub const MASTER_VOLUME: &str = "MASTER_VOLUME";
    pub const LEVEL_COMPLETED: &str = "LEVEL_COMPLETED";
    pub const LEVEL_RESTARTED: &str = "LEVEL_RESTARTED";
    pub const LEVEL_FAILED: &str = "LEVEL_FAILED";
    pub const CHECKPOINT_REACHED: &str = "CHECKPOINT_REACHED";
    pub const PLAYER_RESET: &str = "PLAYER_RESET";
    pub const ERROR: &str = "error";
    pub const WARN: &str = "warn";
    pub const INFO: &str = "info";
    pub const DEBUG: &str = "debug";
    pub const TRACE: &str = "trace";
}

//=== EventValue ==========================================================

/// One positional payload field.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Str(String),
    Num(f64),
}

impl EventValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Num(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(_) => None,
        }
    }
}

impl From<&str> for EventValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for EventValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f32> for EventValue {
    fn from(value: f32) -> Self {
        Self::Num(f64::from(value))
    }
}

impl From<f64> for EventValue {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

//=== NamedEvent ==========================================================

/// Tagged event with its ordered payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEvent {
    pub tag: String,
    pub payload: Vec<EventValue>,
}

//=== GameEvent ===========================================================

/// Typed view over the known event tags.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayAudio {
        target: String,
        clip: String,
        rate: f32,
        volume: f32,
    },
    LoopAudio {
        target: String,
        clip: String,
        rate: f32,
        volume: f32,
    },
    StopAudio {
        target: String,
        clip: String,
    },
    LoopAnimation {
        target: String,
        clip: String,
        time_scale: f32,
    },
    StopAnimation {
        target: String,
        clip: String,
    },
    Announcement(String),
    /// Listener gain in `[0, 1]`, raised by the host when the setting changes.
    MasterVolume(f32),
    LevelCompleted,
    LevelRestarted,
    LevelFailed,
    CheckpointReached,
    PlayerReset,
    /// Diagnostic message raised by the simulation's logger.
    Log {
        level: Level,
        message: String,
    },
}

impl GameEvent {
    /// Returns the channel tag this event is emitted under.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PlayAudio { .. } => tags::PLAY_AUDIO,
            Self::LoopAudio { .. } => tags::LOOP_AUDIO,
            Self::StopAudio { .. } => tags::STOP_AUDIO,
            Self::LoopAnimation { .. } => tags::LOOP_ANIMATION,
            Self::StopAnimation { .. } => tags::STOP_ANIMATION,
            Self::Announcement(_) => tags::AD_ANNOUNCEMENT,
            Self::MasterVolume(_) => tags::MASTER_VOLUME,
            Self::LevelCompleted => tags::LEVEL_COMPLETED,
            Self::LevelRestarted => tags::LEVEL_RESTARTED,
            Self::LevelFailed => tags::LEVEL_FAILED,
            Self::CheckpointReached => tags::CHECKPOINT_REACHED,
            Self::PlayerReset => tags::PLAYER_RESET,
            Self::Log { level, .. } => log_tag(*level),
        }
    }

    /// Flattens into tag + ordered payload.
    pub fn to_named(&self) -> NamedEvent {
        let payload = match self {
            Self::PlayAudio {
                target,
                clip,
                rate,
                volume,
            }
            | Self::LoopAudio {
                target,
                clip,
                rate,
                volume,
            } => vec![
                target.as_str().into(),
                clip.as_str().into(),
                (*rate).into(),
                (*volume).into(),
            ],
            Self::StopAudio { target, clip } | Self::StopAnimation { target, clip } => {
                vec![target.as_str().into(), clip.as_str().into()]
            }
            Self::LoopAnimation {
                target,
                clip,
                time_scale,
            } => vec![
                target.as_str().into(),
                clip.as_str().into(),
                (*time_scale).into(),
            ],
            Self::Announcement(message) | Self::Log { message, .. } => {
                vec![message.as_str().into()]
            }
            Self::MasterVolume(volume) => vec![(*volume).into()],
            Self::LevelCompleted
            | Self::LevelRestarted
            | Self::LevelFailed
            | Self::CheckpointReached
            | Self::PlayerReset => Vec::new(),
        };

        NamedEvent {
            tag: self.tag().to_owned(),
            payload,
        }
    }

    /// Rebuilds the typed event. Returns `None` for unknown tags or a
    /// payload whose shape does not match the tag.
    pub fn from_named(tag: &str, payload: &[EventValue]) -> Option<Self> {
        let text = |i: usize| payload.get(i).and_then(EventValue::as_str).map(str::to_owned);
        let num = |i: usize| payload.get(i).and_then(EventValue::as_f64).map(|n| n as f32);

        let event = match tag {
            tags::PLAY_AUDIO => Self::PlayAudio {
                target: text(0)?,
                clip: text(1)?,
                rate: num(2)?,
                volume: num(3)?,
            },
            tags::LOOP_AUDIO => Self::LoopAudio {
                target: text(0)?,
                clip: text(1)?,
                rate: num(2)?,
                volume: num(3)?,
            },
            tags::STOP_AUDIO => Self::StopAudio {
                target: text(0)?,
                clip: text(1)?,
            },
            tags::LOOP_ANIMATION => Self::LoopAnimation {
                target: text(0)?,
                clip: text(1)?,
                time_scale: num(2)?,
            },
            tags::STOP_ANIMATION => Self::StopAnimation {
                target: text(0)?,
                clip: text(1)?,
            },
            tags::AD_ANNOUNCEMENT => Self::Announcement(text(0)?),
            tags::MASTER_VOLUME => Self::MasterVolume(num(0)?),
            tags::LEVEL_COMPLETED => Self::LevelCompleted,
            tags::LEVEL_RESTARTED => Self::LevelRestarted,
            tags::LEVEL_FAILED => Self::LevelFailed,
            tags::CHECKPOINT_REACHED => Self::CheckpointReached,
            tags::PLAYER_RESET => Self::PlayerReset,
            other => Self::Log {
                level: log_level(other)?,
                message: text(0)?,
            },
        };
        Some(event)
    }
}

//--- Diagnostic Levels ---------------------------------------------------

pub(crate) fn log_tag(level: Level) -> &'static str {
    match level {
        Level::Error => tags::ERROR,
        Level::Warn => tags::WARN,
        Level::Info => tags::INFO,
        Level::Debug => tags::DEBUG,
        Level::Trace => tags::TRACE,
    }
}

fn log_level(tag: &str) -> Option<Level> {
    match tag {
        tags::ERROR => Some(Level::Error),
        tags::WARN => Some(Level::Warn),
        tags::INFO => Some(Level::Info),
        tags::DEBUG => Some(Level::Debug),
        tags::TRACE => Some(Level::Trace),
        _ => None,
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
