//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Question Context: 题库数据
//! - Narration Context: 朗读脚本、音色选择、播放会话

pub mod narration;
pub mod question;
