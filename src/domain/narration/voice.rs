//! 音色选择器
//!
//! 按朗读角色从引擎当前可用音色中选出一个。候选列表可能随引擎
//! 异步加载而变化，因此每次发声前重新选择，不做任何缓存。

use serde::{Deserialize, Serialize};

use super::script::SpeakerRole;

/// 性别提示（从音色名称推断，厂商相关，不保证准确）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderHint {
    Male,
    Female,
    Unknown,
}

impl GenderHint {
    /// 从音色名称的关键字推断性别
    ///
    /// "female" 包含 "male"，必须先检查
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("female") {
            Self::Female
        } else if lower.contains("male") {
            Self::Male
        } else {
            Self::Unknown
        }
    }
}

/// 引擎上报的音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// 引擎内部的音色句柄（名称）
    pub handle: String,
    /// 语言标签，如 "es-ES"
    pub language: String,
    /// 性别提示
    pub gender: GenderHint,
}

/// 音色选择偏好
#[derive(Debug, Clone, Default)]
pub struct VoicePreferences {
    /// 目标语言标签
    pub language: String,
    /// 旁白角色的偏好音色名称（按优先级）
    pub narrator_voices: Vec<String>,
    /// 选项/答案角色的偏好音色名称（按优先级）
    pub reader_voices: Vec<String>,
}

/// 角色关联的性别（旁白为男声，选项与答案为女声）
fn role_gender(role: SpeakerRole) -> GenderHint {
    match role {
        SpeakerRole::Narrator => GenderHint::Male,
        SpeakerRole::OptionsReader | SpeakerRole::AnswerReader => GenderHint::Female,
    }
}

/// 语言标签匹配：完全相等或主语言子标签相等（"es" 匹配 "es-MX"）
fn language_matches(voice_lang: &str, target: &str) -> bool {
    let primary = |tag: &str| {
        tag.split('-')
            .next()
            .unwrap_or(tag)
            .to_lowercase()
    };
    voice_lang.eq_ignore_ascii_case(target) || primary(voice_lang) == primary(target)
}

/// 为角色选择音色，分四级回退，首个命中即返回：
///
/// 1. 句柄命中角色对应的偏好名称列表（按偏好列表顺序）
/// 2. 语言匹配且名称性别关键字与角色一致
/// 3. 任意语言匹配的音色
/// 4. None（调用方回退到引擎默认音色）
///
/// 纯函数，无副作用，不缓存
pub fn select_voice<'a>(
    role: SpeakerRole,
    voices: &'a [VoiceProfile],
    prefs: &VoicePreferences,
) -> Option<&'a VoiceProfile> {
    let preferred = match role {
        SpeakerRole::Narrator => &prefs.narrator_voices,
        SpeakerRole::OptionsReader | SpeakerRole::AnswerReader => &prefs.reader_voices,
    };

    // Tier 1: 偏好名称列表
    for name in preferred {
        if let Some(voice) = voices.iter().find(|v| v.handle.contains(name.as_str())) {
            return Some(voice);
        }
    }

    // Tier 2: 语言 + 性别关键字
    let wanted = role_gender(role);
    if let Some(voice) = voices
        .iter()
        .find(|v| language_matches(&v.language, &prefs.language) && v.gender == wanted)
    {
        return Some(voice);
    }

    // Tier 3: 语言匹配
    voices
        .iter()
        .find(|v| language_matches(&v.language, &prefs.language))

    // Tier 4: None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(handle: &str, language: &str) -> VoiceProfile {
        VoiceProfile {
            handle: handle.to_string(),
            language: language.to_string(),
            gender: GenderHint::from_name(handle),
        }
    }

    fn prefs() -> VoicePreferences {
        VoicePreferences {
            language: "es-ES".to_string(),
            narrator_voices: vec!["Jorge".to_string()],
            reader_voices: vec!["Monica".to_string()],
        }
    }

    #[test]
    fn test_gender_hint_from_name() {
        assert_eq!(GenderHint::from_name("Spanish Female"), GenderHint::Female);
        assert_eq!(GenderHint::from_name("spanish male"), GenderHint::Male);
        assert_eq!(GenderHint::from_name("Jorge"), GenderHint::Unknown);
    }

    #[test]
    fn test_tier1_preferred_name_wins() {
        let voices = vec![
            voice("Spanish Male", "es-ES"),
            voice("Jorge (Spain)", "es-ES"),
        ];
        let selected = select_voice(SpeakerRole::Narrator, &voices, &prefs()).unwrap();
        assert_eq!(selected.handle, "Jorge (Spain)");
    }

    #[test]
    fn test_tier2_language_and_gender() {
        let voices = vec![
            voice("English Male", "en-US"),
            voice("Spanish Female", "es-MX"),
            voice("Spanish Male", "es-ES"),
        ];
        // OptionsReader 关联女声
        let selected = select_voice(SpeakerRole::OptionsReader, &voices, &prefs()).unwrap();
        assert_eq!(selected.handle, "Spanish Female");
        // Narrator 关联男声
        let selected = select_voice(SpeakerRole::Narrator, &voices, &prefs()).unwrap();
        assert_eq!(selected.handle, "Spanish Male");
    }

    #[test]
    fn test_tier3_any_language_match() {
        let voices = vec![voice("English Male", "en-US"), voice("Conchita", "es-MX")];
        let selected = select_voice(SpeakerRole::AnswerReader, &voices, &prefs()).unwrap();
        assert_eq!(selected.handle, "Conchita");
    }

    #[test]
    fn test_tier4_none_for_no_match() {
        let voices = vec![voice("English Male", "en-US")];
        assert!(select_voice(SpeakerRole::Narrator, &voices, &prefs()).is_none());
    }

    #[test]
    fn test_empty_voice_list_returns_none() {
        // 引擎音色未加载完成时返回 None，调用方回退到引擎默认音色
        assert!(select_voice(SpeakerRole::Narrator, &[], &prefs()).is_none());
    }

    #[test]
    fn test_deterministic_first_match() {
        let voices = vec![
            voice("Spanish Female A", "es-ES"),
            voice("Spanish Female B", "es-ES"),
        ];
        let selected = select_voice(SpeakerRole::AnswerReader, &voices, &prefs()).unwrap();
        assert_eq!(selected.handle, "Spanish Female A");
    }
}
