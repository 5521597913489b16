//! Question Context - 题库上下文
//!
//! 上游 CRUD API 的数据契约在本系统内的只读表示

mod entities;
mod errors;

pub use entities::{option_letter, Question, Topic};
pub use errors::QuestionError;
