use crate::demo::{
    SAMPLE_QUESTIONS, demo_response, format_quick_mortgage, parse_mortgage_command, quick_mortgage,
};

use super::backend::ChatBackend;

/// Which assistant answers the next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    /// Coordinator routing to research, financial and search specialists
    #[default]
    MultiAgent,
    /// Tool-calling agent with conversation memory
    Enhanced,
    /// Canned responses, no network
    Demo,
}

impl ChatMode {
    pub fn title(self) -> &'static str {
        match self {
            ChatMode::MultiAgent => "Multi-Agent System",
            ChatMode::Enhanced => "Enhanced Agent",
            ChatMode::Demo => "Demo Mode",
        }
    }

    /// Feature bullets shown in the side panel.
    pub fn features(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ChatMode::MultiAgent => &[
                ("Research Agent", "Market analysis"),
                ("Financial Agent", "Calculations & budgets"),
                ("Customer Agent", "Coordination & chat"),
                ("Smart Routing", "Auto-selects right agent"),
            ],
            ChatMode::Enhanced => &[
                ("Conversation Memory", "Remembers you"),
                ("Property Search", "RAG-powered"),
                ("Tool Usage", "Calculators & analysis"),
                ("Personalization", "Learns preferences"),
            ],
            ChatMode::Demo => &[
                ("Quick Responses", "Fast demonstrations"),
                ("Key Features", "Showcase capabilities"),
                ("Interview Ready", "Perfect for presentations"),
            ],
        }
    }

    /// Heading placed above a reply from this mode.
    fn reply_label(self) -> Option<&'static str> {
        match self {
            ChatMode::MultiAgent => Some("Multi-Agent Analysis:"),
            ChatMode::Enhanced => Some("Enhanced Agent Response:"),
            ChatMode::Demo => None,
        }
    }

    fn next(self) -> Self {
        match self {
            ChatMode::MultiAgent => ChatMode::Enhanced,
            ChatMode::Enhanced => ChatMode::Demo,
            ChatMode::Demo => ChatMode::MultiAgent,
        }
    }
}

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    Error,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub speaker: Speaker,
    /// Mode heading for assistant replies
    pub label: Option<&'static str>,
    pub content: String,
}

impl ChatEntry {
    fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            label: None,
            content: content.into(),
        }
    }

    fn assistant(label: Option<&'static str>, content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            label,
            content: content.into(),
        }
    }

    fn error(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Error,
            label: None,
            content: content.into(),
        }
    }
}

/// Panel focus state for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Message input (typing edits the draft, Enter sends)
    Input,
    /// Transcript panel (j/k scroll)
    Transcript,
    /// Sample-question list (j/k move, Enter sends)
    Samples,
}

/// Application state for the chat TUI.
#[derive(Debug, Clone)]
pub struct App {
    messages: Vec<ChatEntry>,
    input: String,
    focus: Focus,
    mode: ChatMode,
    /// Lines scrolled back from the newest entry; 0 keeps the transcript
    /// pinned to the bottom
    scrollback: u16,
    sample_index: usize,
    /// Message waiting for the backend; drawn as a thinking marker
    pending: Option<String>,
    reset_requested: bool,
}

impl App {
    /// Creates an empty conversation in multi-agent mode with the input focused.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            focus: Focus::Input,
            mode: ChatMode::default(),
            scrollback: 0,
            sample_index: 0,
            pending: None,
            reset_requested: false,
        }
    }

    pub fn messages(&self) -> &[ChatEntry] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn scrollback(&self) -> u16 {
        self.scrollback
    }

    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Returns true while a message is waiting for a reply.
    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true when `process_pending` has work to do.
    pub fn needs_backend(&self) -> bool {
        self.pending.is_some() || self.reset_requested
    }

    /// Switches to the next assistant mode (F2).
    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
    }

    /// Order: `Input` -> `Transcript` -> `Samples` -> `Input`
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Transcript,
            Focus::Transcript => Focus::Samples,
            Focus::Samples => Focus::Input,
        };
    }

    /// Order: `Input` -> `Samples` -> `Transcript` -> `Input`
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Samples,
            Focus::Transcript => Focus::Input,
            Focus::Samples => Focus::Transcript,
        };
    }

    /// Returns focus to the input (Esc key behavior).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::Input;
    }

    pub fn push_input_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.input.pop();
    }

    pub fn scroll_transcript_down(&mut self, amount: u16) {
        self.scrollback = self.scrollback.saturating_sub(amount);
    }

    pub fn scroll_transcript_up(&mut self, amount: u16) {
        self.scrollback = self.scrollback.saturating_add(amount);
    }

    /// Jumps back to the newest entry.
    pub fn pin_transcript(&mut self) {
        self.scrollback = 0;
    }

    /// Moves down the sample list, wrapping to the top.
    pub fn select_next_sample(&mut self) {
        self.sample_index = (self.sample_index + 1) % SAMPLE_QUESTIONS.len();
    }

    /// Moves up the sample list, wrapping to the bottom.
    pub fn select_previous_sample(&mut self) {
        self.sample_index = self
            .sample_index
            .checked_sub(1)
            .unwrap_or(SAMPLE_QUESTIONS.len() - 1);
    }

    /// Sends the draft.
    ///
    /// Blank drafts are ignored. `/mortgage` commands are answered locally;
    /// anything else is queued for the backend.
    pub fn submit_input(&mut self) {
        let draft = std::mem::take(&mut self.input);
        let message = draft.trim();
        if message.is_empty() {
            return;
        }

        if let Some(parsed) = parse_mortgage_command(message) {
            self.pin_transcript();
            self.messages.push(ChatEntry::user(message));
            let reply = parsed.and_then(|(price, down, rate)| {
                quick_mortgage(price, down, rate)
                    .map(|breakdown| format_quick_mortgage(&breakdown))
                    .map_err(|e| e.to_string())
            });
            match reply {
                Ok(text) => self
                    .messages
                    .push(ChatEntry::assistant(Some("Quick Mortgage Calculator:"), text)),
                Err(text) => self.messages.push(ChatEntry::error(text)),
            }
            return;
        }

        self.submit(message.to_string());
    }

    /// Sends the highlighted sample question.
    pub fn submit_sample(&mut self) {
        let question = SAMPLE_QUESTIONS[self.sample_index % SAMPLE_QUESTIONS.len()];
        self.submit(question.to_string());
    }

    fn submit(&mut self, message: String) {
        if self.pending.is_some() {
            return;
        }
        self.pin_transcript();
        self.messages.push(ChatEntry::user(message.clone()));
        self.pending = Some(message);
    }

    /// Clears the conversation and asks for the memory agent to be reset.
    pub fn clear_conversation(&mut self) {
        self.messages.clear();
        self.pending = None;
        self.pin_transcript();
        self.reset_requested = true;
    }

    /// Answers the queued message (if any) and applies a requested reset.
    ///
    /// Backend failures become error entries; they never end the session.
    pub fn process_pending(&mut self, backend: &mut dyn ChatBackend) {
        if std::mem::take(&mut self.reset_requested) {
            backend.reset_enhanced();
        }

        let Some(message) = self.pending.take() else {
            return;
        };

        let mode = self.mode;
        let result = match mode {
            ChatMode::MultiAgent => backend.coordinate(&message),
            ChatMode::Enhanced => backend.enhanced_chat(&message),
            ChatMode::Demo => Ok(demo_response(&message)),
        };

        self.pin_transcript();
        match result {
            Ok(reply) => self.messages.push(ChatEntry::assistant(mode.reply_label(), reply)),
            Err(e) => {
                tracing::warn!(error = %e, "chat backend failed");
                self.messages.push(ChatEntry::error(format!("Error: {e:#}")));
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
