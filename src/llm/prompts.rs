// System prompts and message templates for the advice generator

pub struct SystemPrompts;

impl SystemPrompts {
    /// Persona prompt for the comfort call. The reply must stay short — it
    /// is spoken aloud, not displayed.
    pub fn comforting_companion() -> &'static str {
        "You are an empathetic, cute, and slightly quirky desk duck. \
         A developer is visibly frustrated with their code. \
         Your job is to proactively say one short, comforting, \
         or funny distracting sentence (less than 15 words) \
         to help them reset. DO NOT offer coding help. \
         Just be a friend."
    }

    /// User-turn text paired with the persona prompt.
    pub fn comfort_request() -> &'static str {
        "Get me a comforting phrase for a frustrated developer."
    }
}
