use serde_json::{Value, json};
use std::sync::LazyLock;

/// Structured-output schema sent with every `generateContent` request.
pub static RESPONSE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "prompt_pt": {
                "type": "STRING",
                "description": "Um prompt de vídeo extremamente detalhado em português do Brasil. Deve incluir estilo visual, atmosfera, descrições de cena, ângulos de câmera e movimentos, e detalhes de iluminação. Deve ser narrativo e evocativo."
            },
            "prompt_en": {
                "type": "STRING",
                "description": "A tradução exata e fiel do 'prompt_pt' para o inglês."
            },
            "prompt_json": {
                "type": "OBJECT",
                "description": "Uma estrutura JSON detalhada para automação da geração de vídeo (ex: VEO).",
                "properties": {
                    "title": {
                        "type": "STRING",
                        "description": "Um título curto e impactante para o vídeo."
                    },
                    "style": {
                        "type": "STRING",
                        "description": "O estilo visual geral do vídeo (ex: cinematográfico, 8-bit, aquarela, fotorrealista)."
                    },
                    "scenes": {
                        "type": "ARRAY",
                        "description": "Uma lista de cenas que compõem o vídeo.",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "description": {
                                    "type": "STRING",
                                    "description": "Descrição detalhada do que acontece na cena."
                                },
                                "camera_angle": {
                                    "type": "STRING",
                                    "description": "O ângulo da câmera (ex: close-up, plano geral, câmera baixa)."
                                },
                                "lighting": {
                                    "type": "STRING",
                                    "description": "A iluminação da cena (ex: luz do entardecer, neon, sombrio)."
                                },
                                "duration_seconds": {
                                    "type": "NUMBER",
                                    "description": "Duração aproximada da cena em segundos."
                                }
                            },
                            "required": ["description", "camera_angle", "lighting", "duration_seconds"]
                        }
                    }
                },
                "required": ["title", "style", "scenes"]
            }
        },
        "required": ["prompt_pt", "prompt_en", "prompt_json"]
    })
});

/// Instruction text for one theme.
pub fn user_prompt(theme: &str) -> String {
    format!(
        "Com base no seguinte tema, gere os prompts de vídeo conforme o schema JSON solicitado.\n\
         O tema é: \"{theme}\"\n\
         \n\
         Instruções:\n\
         1. Crie um prompt em português (prompt_pt) que seja rico, detalhado e inspirador.\n\
         2. Traduza-o fielmente para o inglês (prompt_en).\n\
         3. Estruture os detalhes do vídeo em um formato JSON (prompt_json) claro e útil para um sistema automatizado.\n"
    )
}
