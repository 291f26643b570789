use serde::{Deserialize, Serialize};
use serde_json::Number;

/// The three artifacts returned by the provider for one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPrompts {
    pub prompt_pt: String,
    pub prompt_en: String,
    pub prompt_json: PromptJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptJson {
    pub title: String,
    pub style: String,
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub description: String,
    pub camera_angle: String,
    pub lighting: String,
    // Kept as the provider wrote it so `5` is not re-rendered as `5.0`.
    pub duration_seconds: Number,
}

impl GeneratedPrompts {
    /// Pretty-printed `prompt_json`, as shown in the JSON panel and copied.
    pub fn formatted_json(&self) -> String {
        serde_json::to_string_pretty(&self.prompt_json).unwrap_or_default()
    }

    pub fn copy_text(&self, target: CopyTarget) -> String {
        match target {
            CopyTarget::Pt => self.prompt_pt.clone(),
            CopyTarget::En => self.prompt_en.clone(),
            CopyTarget::Json => self.formatted_json(),
        }
    }
}

/// One of the three copyable panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyTarget {
    Pt,
    En,
    Json,
}

impl CopyTarget {
    pub const ALL: [CopyTarget; 3] = [CopyTarget::Pt, CopyTarget::En, CopyTarget::Json];

    pub fn key(self) -> &'static str {
        match self {
            CopyTarget::Pt => "pt",
            CopyTarget::En => "en",
            CopyTarget::Json => "json",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            CopyTarget::Pt => "Copiar Prompt PT",
            CopyTarget::En => "Copiar Prompt EN",
            CopyTarget::Json => "Copiar JSON",
        }
    }

    pub fn panel_title(self) -> &'static str {
        match self {
            CopyTarget::Pt => "Prompt em Português (Análise)",
            CopyTarget::En => "Prompt em Inglês (Uso)",
            CopyTarget::Json => "Prompt em JSON (Automação)",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub theme: String,
}

#[cfg(test)]
pub(crate) fn sample_prompts() -> GeneratedPrompts {
    serde_json::from_value(serde_json::json!({
        "prompt_pt": "Um robô solitário caminha pelas dunas vermelhas de Marte ao entardecer.",
        "prompt_en": "A lonely robot walks across the red dunes of Mars at dusk.",
        "prompt_json": {
            "title": "Solidão em Marte",
            "style": "cinematográfico",
            "scenes": [{
                "description": "O robô observa o horizonte.",
                "camera_angle": "close-up",
                "lighting": "entardecer",
                "duration_seconds": 5
            }]
        }
    }))
    .expect("sample prompts are well formed")
}
