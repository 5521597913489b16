//! 播放控制命令
//!
//! UI/HTTP 层与控制器 actor 之间的传输命令。每条命令携带一个
//! oneshot 回执通道，返回执行后的会话快照或错误。

use tokio::sync::oneshot;

use crate::application::error::ApplicationError;
use crate::domain::narration::{NarrationMode, PlaybackStatus};
use crate::domain::question::{Question, Topic};

/// 命令回执
pub type CommandReply = oneshot::Sender<Result<PlaybackStatus, ApplicationError>>;

/// 传输命令集
///
/// 题号参数为 1 起始（与题库页面一致），控制器内部转为 0 起始下标
#[derive(Debug)]
pub enum TransportCommand {
    /// 装载题目，进入 Ready
    Load {
        topic: Topic,
        questions: Vec<Question>,
        reply: CommandReply,
    },
    /// 从指定题号开始朗读
    Play {
        start_number: usize,
        reply: CommandReply,
    },
    Pause {
        reply: CommandReply,
    },
    Resume {
        reply: CommandReply,
    },
    Stop {
        reply: CommandReply,
    },
    Next {
        reply: CommandReply,
    },
    Previous {
        reply: CommandReply,
    },
    JumpTo {
        question_number: usize,
        reply: CommandReply,
    },
    SetMode {
        mode: NarrationMode,
        reply: CommandReply,
    },
    SetRate {
        rate: f32,
        reply: CommandReply,
    },
    SetAutoAdvance {
        enabled: bool,
        reply: CommandReply,
    },
}
