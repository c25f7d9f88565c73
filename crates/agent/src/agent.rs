//! The persona-driven agent and its shared turn pipeline.
//!
//! Every agent runs the same steps; only the persona differs:
//! 1. render a prompt from the persona template and the transcript so far
//! 2. if the persona may use tools, run the trigger step and fold a
//!    successful tool result into the prompt
//! 3. generate the final content, retrying per the retry policy
//! 4. package content and tool invocations into a `Turn`

use std::sync::Arc;
use symposium_config::TriggerSource;
use symposium_core::backend::GenerateOptions;
use symposium_core::error::BackendError;
use symposium_core::persona::Persona;
use symposium_core::session::Session;
use symposium_core::tool::ToolInvocation;
use symposium_core::turn::{Transcript, Turn};
use symposium_providers::SharedBackend;
use symposium_tools::ToolRouter;
use tracing::{debug, info, warn};

use crate::retry::{RetryPolicy, generate_with_retry};

const EMPTY_HISTORY: &str = "(No prior conversation)";

/// Everything an agent sees when it takes a turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub session: &'a Session,
    /// Every turn appended so far
    pub transcript: &'a Transcript,
    pub round_index: u32,
    pub turn_index: u32,
}

/// One debate participant (or the summarizer).
pub struct Agent {
    persona: Persona,
    backend: Arc<SharedBackend>,
    tools: Option<Arc<ToolRouter>>,
    trigger_source: TriggerSource,
    retry: RetryPolicy,
}

impl Agent {
    pub fn new(persona: Persona, backend: Arc<SharedBackend>) -> Self {
        Self {
            persona,
            backend,
            tools: None,
            trigger_source: TriggerSource::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Attach the tool router. Ignored unless the persona may use tools.
    pub fn with_tools(mut self, router: Arc<ToolRouter>, source: TriggerSource) -> Self {
        if self.persona.can_use_tools() {
            self.tools = Some(router);
            self.trigger_source = source;
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn id(&self) -> &str {
        &self.persona.id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn has_tools(&self) -> bool {
        self.tools.is_some()
    }

    /// Produce this agent's turn. Never fails: exhausted retries yield a
    /// failed turn with empty content.
    pub async fn respond(&self, ctx: &TurnContext<'_>) -> Turn {
        debug!(
            speaker = %self.persona.id,
            round = ctx.round_index,
            turn = ctx.turn_index,
            "Agent responding"
        );

        let options = self.persona.options();
        let mut invocations = Vec::new();

        let result = match (&self.tools, self.trigger_source) {
            (None, _) => self.generate(&self.render_prompt(ctx, None), &options).await,

            (Some(router), TriggerSource::Prompt) => {
                let invocation = match router.trigger(&ctx.session.topic) {
                    Some(request) => Some(router.execute(&request).await),
                    None => None,
                };
                let prompt = self.render_prompt(ctx, invocation.as_ref());
                invocations.extend(invocation);
                self.generate(&prompt, &options).await
            }

            (Some(router), TriggerSource::Draft) => {
                match self.generate(&self.render_prompt(ctx, None), &options).await {
                    Ok(draft) => match router.trigger(&draft) {
                        Some(request) => {
                            let invocation = router.execute(&request).await;
                            let result = if invocation.success {
                                self.generate(&self.render_prompt(ctx, Some(&invocation)), &options)
                                    .await
                            } else {
                                Ok(draft)
                            };
                            invocations.push(invocation);
                            result
                        }
                        None => Ok(draft),
                    },
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(raw) => {
                let content = clean_response(&self.persona.name, &raw, self.persona.is_summarizer());
                info!(
                    speaker = %self.persona.id,
                    round = ctx.round_index,
                    chars = content.len(),
                    tools = invocations.len(),
                    "Turn complete"
                );
                Turn::ok(ctx.round_index, ctx.turn_index, &self.persona.id, content, invocations)
            }
            Err(e) => {
                warn!(
                    speaker = %self.persona.id,
                    round = ctx.round_index,
                    error = %e,
                    "Turn failed after retries"
                );
                let mut turn = Turn::failed(ctx.round_index, ctx.turn_index, &self.persona.id);
                turn.tool_invocations = invocations;
                turn
            }
        }
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, BackendError> {
        generate_with_retry(&self.backend, prompt, options, &self.retry, &self.persona.id).await
    }

    /// Render the full prompt for a turn. A successful tool invocation is
    /// folded under the question; a failed one is left out.
    pub fn render_prompt(&self, ctx: &TurnContext<'_>, tool: Option<&ToolInvocation>) -> String {
        let name = &self.persona.name;
        let preamble = fill_template(&self.persona.persona_template, &self.persona, ctx);
        let history = format_history(ctx.transcript);

        let mut question = ctx.session.topic.trim().to_string();
        if let Some(invocation) = tool.filter(|t| t.success) {
            let value = invocation.value.as_deref().unwrap_or_default();
            question.push_str(&format!(
                "\n\n[Tool {} Result]: {}\nUse this information to inform your response.",
                invocation.tool, value
            ));
        }

        let (first, second) = if self.persona.is_summarizer() {
            (("## Original Question:", question.as_str()), ("## Full Conversation:", history.as_str()))
        } else {
            (("## Conversation History:", history.as_str()), ("## Current Question:", question.as_str()))
        };

        let response_header = format!("## Your Response as {name}:");
        let response_cue = format!("{name}:");
        [
            preamble.trim(),
            "",
            first.0,
            first.1,
            "",
            second.0,
            second.1,
            "",
            &response_header,
            &response_cue,
        ]
        .join("\n")
    }
}

/// Substitute `{name}`, `{topic}`, `{round}` and `{rounds}` in a template.
pub fn fill_template(template: &str, persona: &Persona, ctx: &TurnContext<'_>) -> String {
    template
        .replace("{name}", &persona.name)
        .replace("{topic}", ctx.session.topic.trim())
        .replace("{rounds}", &ctx.session.round_count.to_string())
        .replace("{round}", &ctx.round_index.to_string())
}

/// Render a transcript as `[speaker] content` lines, skipping empty turns.
pub fn format_history(transcript: &Transcript) -> String {
    let lines: Vec<String> = transcript
        .iter()
        .filter(|t| !t.content.trim().is_empty())
        .map(|t| format!("[{}] {}", t.speaker, t.content.trim()))
        .collect();

    if lines.is_empty() {
        EMPTY_HISTORY.to_string()
    } else {
        lines.join("\n")
    }
}

/// Trim model output and strip a leading `Name:` or `[Name]` echo.
///
/// Summaries additionally lose their blank lines.
pub fn clean_response(name: &str, raw: &str, is_summarizer: bool) -> String {
    let mut text = raw.trim();
    for prefix in [format!("{name}:"), format!("[{name}]")] {
        if text
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
        {
            text = text[prefix.len()..].trim_start();
            break;
        }
    }

    if is_summarizer {
        text.lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        text.to_string()
    }
}
