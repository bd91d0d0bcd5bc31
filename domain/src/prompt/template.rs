//! Prompt templates for the intake interview

use crate::intake::category::IntakeDomain;
use crate::intake::exemplar::RelevantQuestion;
use crate::intake::field::IntakeField;
use crate::intake::state::InterviewState;
use crate::intake::turn::TurnContract;
use crate::session::entities::{Message, Role};

/// Opening questions; one is picked at random per session.
pub const OPENING_QUESTIONS: &[&str] = &[
    "To get started, how would you describe your sleep over the last few weeks?",
    "What does a typical day of eating look like for you?",
    "How physically active are you in a normal week?",
    "How have your energy levels been lately?",
    "Is there a health goal you would most like to work on right now?",
    "How would you rate your stress levels recently?",
];

/// Everything the turn prompt is built from.
pub struct TurnPromptContext<'a> {
    pub state: &'a InterviewState,
    pub history: &'a [Message],
    pub user_query: &'a str,
    pub exemplars: &'a [RelevantQuestion],
}

/// Templates for generating prompts at each stage
pub struct IntakePromptTemplate;

impl IntakePromptTemplate {
    /// System prompt for the active interview
    pub fn interview_system() -> String {
        format!(
            r#"You are a functional-medicine physician running a structured health intake interview.
Each turn you read the latest user answer, record what it tells you, and ask exactly one next question.

Rules:
- Record answers as value updates on existing field keys. If the user volunteers information for a field
  that does not exist yet, request the field and update it in the same turn.
- Prefer structured value types (single_choice, multi_choice, bucketed_choice, yes_no, scale_1_10) over free_text.
  Choice types must list their options as code -> label.
- Use "prefer_not_to_say" or "not_sure" alone when the user declines or does not know.
- Never reuse a key listed under the session state when requesting new fields.
- Domains must be one of: {domains}.
- Watch the session progress: mark a domain complete when it is sufficiently covered, and mark the interview
  complete once the turn budget is spent or every relevant domain is covered.
- The next field must be a field you request in this turn or one that is still to be collected.

Respond with a single JSON object matching the requested schema."#,
            domains = IntakeDomain::joined()
        )
    }

    /// System prompt once the interview is complete
    pub fn post_interview_system() -> &'static str {
        r#"You are a functional-medicine physician. The structured intake interview is complete.
The user may correct or add to answers they already gave. Record corrections as value updates on existing
field keys only, then ask one short follow-up question or confirm the change.

Respond with a single JSON object matching the requested schema."#
    }

    pub fn system_for(contract: TurnContract) -> String {
        match contract {
            TurnContract::Interview => Self::interview_system(),
            TurnContract::PostInterview => Self::post_interview_system().to_string(),
        }
    }

    /// User prompt for one turn
    pub fn turn_prompt(ctx: &TurnPromptContext<'_>) -> String {
        let mut prompt = format!(
            r#"# Intake Interview Session State

## Collected Fields (could still be updated)
{}

## To Be Collected Fields (avoid creating duplicates)
{}

## Session Progress (watch time, adjust pace)
{}
"#,
            Self::format_fields(ctx.state.collected_fields()),
            Self::format_fields(ctx.state.pending_fields()),
            ctx.state.stats().summary(),
        );

        if !ctx.exemplars.is_empty() {
            prompt.push_str(&format!(
                "\n# Relevant Example Questions (for phrasing and options)\n{}\n",
                Self::format_exemplars(ctx.exemplars)
            ));
        }

        prompt.push_str(&format!(
            "\n# Conversation History\n{}\n\n# Last User query:\n{}\n",
            Self::format_history(ctx.history),
            ctx.user_query.trim()
        ));

        prompt
    }

    /// Render history as `User: ...` / `You: ...` lines.
    pub fn format_history(history: &[Message]) -> String {
        if history.is_empty() {
            return "(no previous messages)".to_string();
        }
        history
            .iter()
            .map(|m| {
                let name = match m.role {
                    Role::User => "User",
                    Role::Assistant => "You",
                };
                format!("{}: {}", name, m.content.trim())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render fields as an indented key/value block.
    pub fn format_fields<'a>(fields: impl Iterator<Item = &'a IntakeField>) -> String {
        let mut lines = Vec::new();
        for field in fields {
            let spec = field.spec();
            lines.push(format!("- {}:", spec.key));
            lines.push(format!("    name: {}", spec.name));
            if !spec.description.is_empty() {
                lines.push(format!("    description: {}", spec.description));
            }
            lines.push(format!("    domain: {}", spec.domain));
            lines.push(format!("    value_type: {}", spec.value_type));
            if let Some(options) = &spec.options {
                let inline = options
                    .iter()
                    .map(|(code, label)| format!("{code}: {label}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("    options: {{{inline}}}"));
            }
            if let Some(hint) = &spec.format_hint {
                lines.push(format!("    format: {hint}"));
            }
            lines.push(format!("    rationale: {}", field.rationale()));
            lines.push(format!("    value: {}", field.value()));
        }
        if lines.is_empty() {
            return "(none)".to_string();
        }
        lines.join("\n")
    }

    pub fn format_exemplars(exemplars: &[RelevantQuestion]) -> String {
        exemplars
            .iter()
            .map(|q| {
                let mut line = format!("- [{}] {}: {}", q.domain_title, q.key, q.label);
                if !q.options.is_empty() {
                    let labels = q.options.values().cloned().collect::<Vec<_>>().join(" | ");
                    line.push_str(&format!(" ({labels})"));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Greeting for a new session.
    pub fn greeting(name: &str, opener: &str) -> String {
        let name = name.trim();
        if name.is_empty() {
            format!("Hello! I am your health intake assistant. {opener}")
        } else {
            format!("Hello {name}! I am your health intake assistant. {opener}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::field::{FieldRequest, FieldSpec, ValueType};
    use crate::intake::turn::{InterviewTurn, NextFieldSelection, ValueUpdate};

    fn state_with_fields() -> InterviewState {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &InterviewTurn::new(
                NextFieldSelection::new("is_smoker", IntakeDomain::SubstanceUse),
                "Do you smoke?",
            )
            .with_field(FieldRequest::new(
                FieldSpec::new("sleep_hours", "Sleep hours", IntakeDomain::Sleep, ValueType::BucketedChoice)
                    .with_option("4to6h", "4-6h"),
                "volunteered",
            ))
            .with_field(FieldRequest::new(
                FieldSpec::new("is_smoker", "Smoker", IntakeDomain::SubstanceUse, ValueType::YesNo),
                "baseline",
            ))
            .with_update(ValueUpdate::new("sleep_hours", "4to6h")),
        );
        state
    }

    #[test]
    fn test_interview_system_lists_domains() {
        let prompt = IntakePromptTemplate::interview_system();
        assert!(prompt.contains("current_health_status"));
        assert!(prompt.contains("prefer_not_to_say"));
    }

    #[test]
    fn test_turn_prompt_sections() {
        let state = state_with_fields();
        let history = vec![Message::assistant("How do you sleep?")];
        let ctx = TurnPromptContext {
            state: &state,
            history: &history,
            user_query: "  I sleep 5 hours  ",
            exemplars: &[],
        };
        let prompt = IntakePromptTemplate::turn_prompt(&ctx);

        let collected = prompt.find("## Collected Fields").unwrap();
        let pending = prompt.find("## To Be Collected Fields").unwrap();
        let sleep = prompt.find("- sleep_hours:").unwrap();
        let smoker = prompt.find("- is_smoker:").unwrap();
        assert!(collected < sleep && sleep < pending && pending < smoker);
        assert!(prompt.contains("You: How do you sleep?"));
        assert!(prompt.ends_with("# Last User query:\nI sleep 5 hours\n"));
        assert!(!prompt.contains("Relevant Example Questions"));
    }

    #[test]
    fn test_turn_prompt_includes_exemplars() {
        let state = InterviewState::new();
        let exemplars = vec![
            RelevantQuestion::new("1", "Sleep", "sleepHours", "Hours of sleep per night")
                .with_option("a", "<4h")
                .with_option("b", "4-6h"),
        ];
        let ctx = TurnPromptContext {
            state: &state,
            history: &[],
            user_query: "hi",
            exemplars: &exemplars,
        };
        let prompt = IntakePromptTemplate::turn_prompt(&ctx);
        assert!(prompt.contains("- [Sleep] sleepHours: Hours of sleep per night (<4h | 4-6h)"));
        assert!(prompt.contains("(no previous messages)"));
    }

    #[test]
    fn test_format_fields_empty() {
        let state = InterviewState::new();
        assert_eq!(IntakePromptTemplate::format_fields(state.fields().iter()), "(none)");
    }

    #[test]
    fn test_greeting_uses_name() {
        let greeting = IntakePromptTemplate::greeting("Ana", OPENING_QUESTIONS[0]);
        assert!(greeting.starts_with("Hello Ana!"));
        assert!(greeting.ends_with(OPENING_QUESTIONS[0]));
        assert!(IntakePromptTemplate::greeting("  ", "Hi?").starts_with("Hello! "));
    }
}
