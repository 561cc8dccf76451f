//! Tab-completion state machine.
//!
//! In script mode the console edits dotted addresses like
//! `pw.<domain>.<function>(...)`. The number of dots in the address at the end
//! of the line selects what is being completed:
//!
//! | phase | text          | candidates                        |
//! |-------|---------------|-----------------------------------|
//! | 0     | `setSp`       | all function names                |
//! | 1     | `pw.phy`      | domains and root functions        |
//! | 2     | `pw.physics.s`| functions of the selected domain  |
//!
//! Command mode always stays in phase 0 and completes the first token.
//! Repeated completion with an unchanged search text walks through every
//! match once, then wraps.

/// What the fragment being completed refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPhase {
    /// Phase 0: plain function names.
    #[default]
    Function,
    /// Phase 1: the `<domain>` part of a dotted address, or a function
    /// bound directly on the prefix table.
    Domain,
    /// Phase 2: the `<function>` part of a dotted address.
    DomainFunction,
}

impl CompletionPhase {
    /// Numeric phase (0, 1 or 2).
    pub fn index(self) -> u8 {
        match self {
            CompletionPhase::Function => 0,
            CompletionPhase::Domain => 1,
            CompletionPhase::DomainFunction => 2,
        }
    }
}

/// Completion state of the current command.
#[derive(Debug, Clone, Default)]
pub struct CompletionState {
    phase: CompletionPhase,
    /// Text the candidates must start with.
    search: String,
    /// Text kept in front of the completed fragment.
    prefix: String,
    /// Arguments kept after the completed name (command mode).
    suffix: String,
    /// Domain segment just before the last dot (phase 2 only).
    domain: String,
    last_match: usize,
    first_match_seen: bool,
}

impl CompletionState {
    pub fn phase(&self) -> CompletionPhase {
        self.phase
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Index of the last candidate returned, if any since the last reset.
    pub fn last_match(&self) -> Option<usize> {
        self.first_match_seen.then_some(self.last_match)
    }

    /// Re-derives phase and search text from edited command text.
    ///
    /// The match cursor only restarts if the search actually changed, so
    /// feeding back the same text does not break a completion cycle.
    pub fn update(&mut self, text: &str, dotted: bool) {
        let start = address_start(text);
        let (phase, prefix, search, domain, suffix) = match text[start..].rfind('.') {
            Some(offset) if dotted => {
                let last_dot = start + offset;
                let address = &text[start..last_dot];
                let phase = if address.contains('.') {
                    CompletionPhase::DomainFunction
                } else {
                    CompletionPhase::Domain
                };
                let domain = match phase {
                    CompletionPhase::DomainFunction => {
                        address.rsplit('.').next().unwrap_or_default().to_string()
                    }
                    _ => String::new(),
                };
                (
                    phase,
                    text[..=last_dot].to_string(),
                    text[last_dot + 1..].to_string(),
                    domain,
                    String::new(),
                )
            }
            _ => {
                let trimmed = text.trim_start();
                let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
                (
                    CompletionPhase::Function,
                    String::new(),
                    trimmed[..end].to_string(),
                    String::new(),
                    trimmed[end..].to_string(),
                )
            }
        };

        if phase != self.phase || search != self.search || prefix != self.prefix {
            self.last_match = 0;
            self.first_match_seen = false;
        }
        self.phase = phase;
        self.prefix = prefix;
        self.search = search;
        self.domain = domain;
        self.suffix = suffix;
    }

    /// Finds the next candidate starting with the search text.
    ///
    /// The scan starts after the previous match and wraps around the whole
    /// list, so every match is returned once before any repeats.
    pub fn next_match<'a>(&mut self, candidates: &'a [String]) -> Option<&'a str> {
        let n = candidates.len();
        if n == 0 {
            return None;
        }
        let start = if self.first_match_seen {
            (self.last_match + 1) % n
        } else {
            0
        };
        for offset in 0..n {
            let i = (start + offset) % n;
            if candidates[i].starts_with(&self.search) {
                self.last_match = i;
                self.first_match_seen = true;
                return Some(&candidates[i]);
            }
        }
        None
    }

    /// Command text with the fragment replaced by `name`.
    pub fn completed(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Byte offset where the trailing dotted address of `text` begins.
fn address_start(text: &str) -> usize {
    text.char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .map_or(0, |(i, c)| i + c.len_utf8())
}
