//! Question Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestionError {
    /// correct_option 不在 options 列表中（题目数据损坏）
    #[error("Malformed question {question_id}: correct option not found among options")]
    CorrectOptionMissing { question_id: String },

    /// 选项列表为空
    #[error("Malformed question {question_id}: empty options list")]
    NoOptions { question_id: String },
}
