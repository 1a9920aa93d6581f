//! Prompt builder: per-profile system message, numbered context blocks,
//! and the deterministic fallback answer.

use rag_store::ScoredCandidate;

/// How many top candidates are shown to the model.
pub const CONTEXT_CANDIDATES: usize = 3;
/// Per-candidate answer budget inside the context, in characters.
pub const CONTEXT_ANSWER_CHARS: usize = 400;
/// Display budget for `full_answer` and the fallback, in characters.
pub const DISPLAY_CHARS: usize = 500;

const BASIC_SYSTEM: &str = "\
Ты отвечаешь на вопросы о правилах Русского Викиучебника.
Тебе передан контекст: пронумерованные вопросы и ответы из базы знаний проекта.

Правила ответа:
1. Опирайся только на переданный контекст.
2. Не добавляй сведений, которых в контексте нет.
3. Если контекст отвечает на вопрос лишь частично, прямо скажи, что в материалах базы знаний полного ответа нет.
4. Начни с короткого вывода, затем перечисли подробности по пунктам.
5. Пиши официально, но просто.";

const CREATIVE_SYSTEM: &str = "\
Ты отвечаешь на вопросы о правилах Русского Викиучебника.
Тебе передан контекст: пронумерованные вопросы и ответы из базы знаний проекта.

Правила ответа:
1. Если контекст отвечает на вопрос, опирайся только на него и ничего не выдумывай.
2. Если контекст отвечает на вопрос лишь частично, прямо скажи, что в материалах базы знаний полного ответа нет.
3. Если в контексте нет ничего подходящего, но вопрос касается Викиучебника, дай общий совет. \
Обязательно предупреди, что совет основан на твоих общих знаниях, а не на правилах из базы, \
и годится только как направление для дальнейших шагов, а не как официальная рекомендация.
4. Начни с короткого вывода, затем перечисли подробности по пунктам.
5. Пиши официально, но просто.";

/// Instruction profile for the rewrite. Each maps to a sampling profile of
/// the LLM service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PromptProfile {
    /// Context-only answers.
    #[default]
    Basic,
    /// May add clearly-labelled general advice when the context is silent.
    Creative,
}

impl PromptProfile {
    pub fn from_creative(creative: bool) -> Self {
        if creative { Self::Creative } else { Self::Basic }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Basic => BASIC_SYSTEM,
            Self::Creative => CREATIVE_SYSTEM,
        }
    }
}

/// Cuts `s` to at most `max` characters, appending `...` only when
/// something was cut. Never splits a UTF-8 sequence.
///
/// # Example
/// ```
/// # use rag_answer::prompt::truncate_chars;
/// assert_eq!(truncate_chars("правило", 3), "пра...");
/// assert_eq!(truncate_chars("правило", 7), "правило");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

/// Renders up to [`CONTEXT_CANDIDATES`] candidates as numbered source blocks
/// separated by blank lines.
pub fn render_context(candidates: &[ScoredCandidate]) -> String {
    candidates
        .iter()
        .take(CONTEXT_CANDIDATES)
        .enumerate()
        .map(|(i, c)| {
            format!(
                "[Источник {}]:\nВопрос: {}\nПолный ответ: {}",
                i + 1,
                c.question,
                truncate_chars(&c.answer, CONTEXT_ANSWER_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the user message around the rendered context.
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "КОНТЕКСТ ИЗ БАЗЫ ЗНАНИЙ ВИКИУЧЕБНИКА:\n{context}\n\n\
         ВОПРОС ПОЛЬЗОВАТЕЛЯ: {}\n\n\
         Ответь по правилам из инструкции, на русском языке.",
        question.trim()
    )
}

/// Answer shown when the model could not be used. Depends only on the top
/// candidate.
pub fn fallback_answer(top: &ScoredCandidate) -> String {
    format!(
        "**На основе наиболее релевантного вопроса:**\n\n**Вопрос:** {}\n\n**Подробнее:** {}",
        top.question,
        truncate_chars(&top.answer, DISPLAY_CHARS)
    )
}
