//! 朗读脚本构建器
//!
//! 将一道考题按朗读模式展开为有序的朗读片段序列。
//! (question, question_number, mode) 的纯函数，无隐藏状态。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::question::{option_letter, Question, QuestionError};

/// 朗读模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationMode {
    /// 朗读题目、全部选项、正确答案
    Full,
    /// 只朗读题目和正确答案
    CorrectOnly,
}

/// 朗读角色
///
/// 仅用于音色选择，不随单次发声之外持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Narrator,
    OptionsReader,
    AnswerReader,
}

/// 朗读片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationSegment {
    pub role: SpeakerRole,
    pub text: String,
}

/// 脚本构建错误
#[derive(Debug, Error)]
pub enum ScriptError {
    /// 题目数据损坏，无法确定正确选项字母
    #[error("Cannot build script: {0}")]
    MalformedQuestion(#[from] QuestionError),
}

/// 构建一道题的朗读片段序列
///
/// # 参数
/// - `question_number` - 1 起始的题号（朗读文本中使用）
///
/// # 片段顺序
/// - Full: Narrator 题目 → OptionsReader 全部选项 → AnswerReader 正确答案
/// - CorrectOnly: Narrator 题目 → AnswerReader 正确答案
pub fn build_segments(
    question: &Question,
    question_number: usize,
    mode: NarrationMode,
) -> Result<Vec<NarrationSegment>, ScriptError> {
    question.validate_for_narration()?;
    let correct_index = question.correct_index()?;

    let mut segments = Vec::with_capacity(3);

    segments.push(NarrationSegment {
        role: SpeakerRole::Narrator,
        text: format!("Question {}. {}", question_number, question.question_text),
    });

    if mode == NarrationMode::Full {
        let options = question
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| format!("{}. {}.", option_letter(i), opt))
            .collect::<Vec<_>>()
            .join(" ");
        segments.push(NarrationSegment {
            role: SpeakerRole::OptionsReader,
            text: format!("Options: {}", options),
        });
    }

    segments.push(NarrationSegment {
        role: SpeakerRole::AnswerReader,
        text: format!(
            "Correct answer: {}. {}",
            option_letter(correct_index),
            question.correct_option
        ),
    });

    Ok(segments)
}
