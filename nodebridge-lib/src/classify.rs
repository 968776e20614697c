//! Text-based classification of backend responses.
//!
//! Backends only describe many failures in free text. Each table here is an
//! ordered list of `(needles, outcome)` rules: the first rule with a needle
//! contained in the text wins, otherwise the table's fallback applies.
//! Matching is case-insensitive; needles must be lowercase.

use crate::models::OpenChannelOutcome;

/// One classification rule.
#[derive(Debug)]
pub struct Rule<T: 'static> {
    /// Any of these substrings triggers the rule.
    pub needles: &'static [&'static str],
    /// Outcome when the rule matches.
    pub outcome: T,
}

/// Ordered rule table with a fallback outcome.
#[derive(Debug)]
pub struct Classifier<T: 'static> {
    rules: &'static [Rule<T>],
    fallback: T,
}

impl<T: Copy + 'static> Classifier<T> {
    /// Build a table from its rules and fallback.
    pub const fn new(rules: &'static [Rule<T>], fallback: T) -> Self {
        Self { rules, fallback }
    }

    /// Outcome of the first matching rule, if any.
    pub fn matched(&self, text: &str) -> Option<T> {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.needles.iter().any(|needle| text.contains(needle)))
            .map(|rule| rule.outcome)
    }

    /// Outcome used when no rule matches.
    pub fn fallback(&self) -> T {
        self.fallback
    }

    /// Outcome of the first matching rule, or the fallback.
    pub fn classify(&self, text: &str) -> T {
        self.matched(text).unwrap_or(self.fallback)
    }
}

/// Errors raised by an open-channel call.
///
/// The `AlreadyExists` fallback is kept for compatibility with existing
/// callers; an unrecognized error is not evidence of an existing channel.
pub const OPEN_CHANNEL_ERRORS: Classifier<OpenChannelOutcome> = Classifier::new(
    &[
        Rule {
            needles: &["not connected", "no connection to peer"],
            outcome: OpenChannelOutcome::PeerNotConnected,
        },
        Rule {
            needles: &["insufficient funds"],
            outcome: OpenChannelOutcome::CannotAffordFunding,
        },
        Rule {
            needles: &["peer sent error: 'multiple channels unsupported'"],
            outcome: OpenChannelOutcome::AlreadyExists,
        },
    ],
    OpenChannelOutcome::AlreadyExists,
);

/// Success messages returned by an open-channel call.
pub const OPEN_CHANNEL_MESSAGES: Classifier<OpenChannelOutcome> = Classifier::new(
    &[Rule {
        needles: &[
            "couldn't publish funding tx",
            "could not publish funding transaction",
        ],
        outcome: OpenChannelOutcome::CannotAffordFunding,
    }],
    OpenChannelOutcome::Ok,
);

/// Channel states that precede funding confirmation.
pub const PENDING_CHANNEL_STATES: &[&str] = &[
    "WAIT_FOR_OPEN_CHANNEL",
    "WAIT_FOR_ACCEPT_CHANNEL",
    "WAIT_FOR_FUNDING_CREATED",
    "WAIT_FOR_FUNDING_SIGNED",
    "WAIT_FOR_FUNDING_LOCKED",
    "WAIT_FOR_FUNDING_CONFIRMED",
];

/// Returns true if the channel is still waiting on its funding transaction.
pub fn is_pending_channel_state(state: &str) -> bool {
    PENDING_CHANNEL_STATES
        .iter()
        .any(|pending| pending.eq_ignore_ascii_case(state))
}
