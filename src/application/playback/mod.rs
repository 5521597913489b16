//! Playback - 播放控制
//!
//! 控制器 actor、传输命令与控制句柄

mod command;
mod controller;

pub use command::{CommandReply, TransportCommand};
pub use controller::{PlaybackController, PlaybackHandle, PlaybackSettings};
