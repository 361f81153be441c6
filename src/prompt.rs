use crate::models::{ConversationTurn, RetrievedPassage};

/// Persona instructions for soto. Process-wide constant: every request builds
/// its own formatted copy from explicit parameters, the template itself is
/// never mutated.
pub const PERSONA_TEMPLATE: &str = "\
Actúa como soto y responde siempre en primera persona. Tu nombre es soto, un artista virtual. \
Tu voz es crítica y sarcástica. \
Tu objetivo es responder a las preguntas del usuario. Para ello, tienes dos fuentes de información: \
el **Contexto sobre tus proyectos** y el **Historial de conversación**. \
**Tu fuente principal de verdad es siempre el Contexto.** Usa la información de tus proyectos para responder de forma precisa. \
Usa el **Historial de conversación** solo para recordar detalles sobre el usuario (como su nombre) y para que la conversación sea fluida. \
Si la respuesta a una pregunta no está en el Contexto ni en el Historial, entonces responde de forma sarcástica que no tienes datos sobre eso. No inventes. \
Hablas en español. Usa siempre 'soto' en minúsculas.
Historial de conversación:
{chat_history}
Contexto sobre tus proyectos:
{context_str}
Pregunta: {query_str}
Respuesta: ";

/// History rendered as `Usuario:` / `soto:` lines, oldest first.
pub fn render_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("Usuario: {}\nsoto: {}", t.pregunta, t.respuesta))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_context(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| format!("[{}] {}", p.source_label, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the final prompt for one request. Empty history or empty retrieval
/// still yields a complete prompt; the section headers stay in place so the
/// model sees that there was nothing, rather than a truncated template.
pub fn assemble(
    history: &[ConversationTurn],
    passages: &[RetrievedPassage],
    question: &str,
) -> String {
    PERSONA_TEMPLATE
        .replace("{chat_history}", &render_history(history))
        .replace("{context_str}", &render_context(passages))
        .replace("{query_str}", question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn turn(q: &str, a: &str) -> ConversationTurn {
        ConversationTurn {
            user_id: "u1".to_string(),
            pregunta: q.to_string(),
            respuesta: a.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_history_and_context_keep_persona_and_question() {
        let prompt = assemble(&[], &[], "¿Quién eres?");
        assert!(prompt.contains("Actúa como soto"));
        assert!(prompt.contains("Pregunta: ¿Quién eres?"));
        assert!(prompt.contains("Historial de conversación:"));
        assert!(prompt.contains("Contexto sobre tus proyectos:"));
        // No unexpanded placeholders left behind.
        assert!(!prompt.contains("{chat_history}"));
        assert!(!prompt.contains("{context_str}"));
        assert!(!prompt.contains("{query_str}"));
    }

    #[test]
    fn retrieved_passage_text_appears_in_prompt() {
        let passages = vec![RetrievedPassage {
            text: "Expuso en Madrid y Guadalajara".to_string(),
            source_label: "exposiciones.txt".to_string(),
        }];
        let prompt = assemble(&[], &passages, "¿Dónde has exhibido tu obra?");
        assert!(prompt.contains("Expuso en Madrid y Guadalajara"));
        assert!(prompt.contains("Pregunta: ¿Dónde has exhibido tu obra?"));
    }

    #[test]
    fn history_renders_oldest_to_newest() {
        let turns = vec![turn("primera", "uno"), turn("segunda", "dos")];
        let rendered = render_history(&turns);
        let first = rendered.find("primera").unwrap();
        let second = rendered.find("segunda").unwrap();
        assert!(first < second);
        assert!(rendered.contains("Usuario: primera\nsoto: uno"));
    }

    #[test]
    fn template_is_not_mutated_between_requests() {
        let before = PERSONA_TEMPLATE.to_string();
        let _ = assemble(&[turn("hola", "que tal")], &[], "¿sigues ahí?");
        assert_eq!(PERSONA_TEMPLATE, before);
    }
}
