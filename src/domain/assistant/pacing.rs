//! 节奏判定
//!
//! 根据当前场景字数与本章场景数给出建议文本，规则按顺序匹配，比较均为严格大于

use serde::Serialize;

use super::settings::AiSettings;

/// 节奏级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingLevel {
    ChapterAlert,
    ChapterGuide,
    SceneAlert,
    SceneGuide,
    Developing,
}

/// 提示文本用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingAudience {
    /// 动作判定提示词
    Decision,
    /// 正文生成提示词
    Generation,
}

/// 节奏评估结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingAdvice {
    pub level: PacingLevel,
    pub scene_words: u32,
    pub scenes_per_chapter: u32,
    pub chapter_words: u32,
    pub current_words: u32,
    pub current_scenes: u32,
}

impl PacingAdvice {
    /// 评估节奏
    pub fn assess(
        current_words: u32,
        current_scenes: u32,
        scene_words: u32,
        scenes_per_chapter: u32,
    ) -> Self {
        let chapter_words = scene_words.saturating_mul(scenes_per_chapter);
        let words = current_words as f64;
        let scenes = current_scenes as f64;

        let level = if words > chapter_words as f64 * 1.5
            || scenes > scenes_per_chapter as f64 * 1.5
        {
            PacingLevel::ChapterAlert
        } else if current_words > chapter_words || current_scenes > scenes_per_chapter {
            PacingLevel::ChapterGuide
        } else if words > scene_words as f64 * 1.25 {
            PacingLevel::SceneAlert
        } else if words > scene_words as f64 * 0.75 {
            PacingLevel::SceneGuide
        } else {
            PacingLevel::Developing
        };

        Self {
            level,
            scene_words,
            scenes_per_chapter,
            chapter_words,
            current_words,
            current_scenes,
        }
    }

    /// 使用设置中的目标值评估
    pub fn from_settings(settings: &AiSettings, current_words: u32, current_scenes: u32) -> Self {
        Self::assess(
            current_words,
            current_scenes,
            settings.target_scene_words(),
            settings.target_scenes_per_chapter(),
        )
    }

    /// 建议文本（阈值向下取整）
    pub fn instruction(&self, audience: PacingAudience) -> String {
        let chapter_alert_words = floor_scaled(self.chapter_words, 1.5);
        let chapter_alert_scenes = floor_scaled(self.scenes_per_chapter, 1.5);
        let scene_alert_words = floor_scaled(self.scene_words, 1.25);
        let scene_guide_words = floor_scaled(self.scene_words, 0.75);

        match (self.level, audience) {
            (PacingLevel::ChapterAlert, PacingAudience::Decision) => format!(
                "PACING ALERT: This chapter is extremely long (>{chapter_alert_words} words or >{chapter_alert_scenes} scenes). Strongly recommend 'new_chapter'."
            ),
            (PacingLevel::ChapterAlert, PacingAudience::Generation) => format!(
                "PACING ALERT: This chapter is extremely long (>{chapter_alert_words} words or >{chapter_alert_scenes} scenes). You MUST conclude the current narrative arc and output 'new_chapter' to start a fresh chapter."
            ),
            (PacingLevel::ChapterGuide, PacingAudience::Decision) => format!(
                "PACING GUIDE: This chapter is getting long (>{} words or >{} scenes). Consider 'new_chapter'.",
                self.chapter_words, self.scenes_per_chapter
            ),
            (PacingLevel::ChapterGuide, PacingAudience::Generation) => format!(
                "PACING GUIDE: This chapter is getting long (>{} words or >{} scenes). Look for opportunities to conclude the current arc and transition to a 'new_chapter'.",
                self.chapter_words, self.scenes_per_chapter
            ),
            (PacingLevel::SceneAlert, PacingAudience::Decision) => format!(
                "PACING ALERT: The current scene is very long (>{scene_alert_words} words). Strongly recommend 'new_scene'."
            ),
            (PacingLevel::SceneAlert, PacingAudience::Generation) => format!(
                "PACING ALERT: The current scene is very long (>{scene_alert_words} words). Unless this is a climactic moment, you should aggressively move to wrap up the scene and output 'new_scene'."
            ),
            (PacingLevel::SceneGuide, PacingAudience::Decision) => format!(
                "PACING GUIDE: The current scene is getting long (>{scene_guide_words} words). Consider 'new_scene'."
            ),
            (PacingLevel::SceneGuide, PacingAudience::Generation) => format!(
                "PACING GUIDE: The current scene is getting long (>{scene_guide_words} words). Look for opportunities to conclude the scene and transition to a 'new_scene'."
            ),
            (PacingLevel::Developing, PacingAudience::Decision) => {
                "PACING GUIDE: The current scene is still developing. 'continue' unless there's a time jump or location change.".to_string()
            }
            (PacingLevel::Developing, PacingAudience::Generation) => {
                "PACING GUIDE: The current scene is still developing. Continue naturally, but if a time jump or location change is needed, use 'new_scene'.".to_string()
            }
        }
    }
}

fn floor_scaled(value: u32, factor: f64) -> u64 {
    (value as f64 * factor).floor() as u64
}
