//! Dehydration assessment: a depth-2 decision tree over operator answers.
//!
//! ```text
//! appearance ─ 1 (normal) ──────────── eyes ─ 1 → No dehydration
//!            │                              └ 2 → Severe dehydration
//!            └ 2 (irritable/lethargic) ─ skin ─ 1 → Some dehydration
//!                                           └ 2 → Severe dehydration
//! ```
//!
//! Any answer outside `1`/`2` ends the walk as `Undetermined`. Under the
//! default policy nothing is asked again.

use crate::core::error::MedbotError;
use crate::plugins::prompts::{AnswerProvider, Question};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Normal,
    IrritableOrLethargic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eyes {
    NormalOrSlightlySunken,
    VerySunken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinPinch {
    Normal,
    Slow,
}

impl Appearance {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(Appearance::Normal),
            "2" => Some(Appearance::IrritableOrLethargic),
            _ => None,
        }
    }
}

impl Eyes {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(Eyes::NormalOrSlightlySunken),
            "2" => Some(Eyes::VerySunken),
            _ => None,
        }
    }

    pub fn level(self) -> DehydrationLevel {
        match self {
            Eyes::NormalOrSlightlySunken => DehydrationLevel::None,
            Eyes::VerySunken => DehydrationLevel::Severe,
        }
    }
}

impl SkinPinch {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(SkinPinch::Normal),
            "2" => Some(SkinPinch::Slow),
            _ => None,
        }
    }

    pub fn level(self) -> DehydrationLevel {
        match self {
            SkinPinch::Normal => DehydrationLevel::Some,
            SkinPinch::Slow => DehydrationLevel::Severe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DehydrationLevel {
    None,
    Some,
    Severe,
}

impl DehydrationLevel {
    pub fn label(self) -> &'static str {
        match self {
            DehydrationLevel::None => "No dehydration",
            DehydrationLevel::Some => "Some dehydration",
            DehydrationLevel::Severe => "Severe dehydration",
        }
    }
}

impl fmt::Display for DehydrationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one walk through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assessment {
    Determined(DehydrationLevel),
    Undetermined,
}

impl Assessment {
    /// Diagnosis label to persist; empty when undetermined.
    pub fn label(self) -> &'static str {
        match self {
            Assessment::Determined(level) => level.label(),
            Assessment::Undetermined => "",
        }
    }

    pub fn is_determined(self) -> bool {
        matches!(self, Assessment::Determined(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentState {
    Start,
    AwaitingEyes,
    AwaitingSkin,
    Done(Assessment),
}

impl AssessmentState {
    /// The question this state is waiting on, if any.
    pub fn pending_question(self) -> Option<Question> {
        match self {
            AssessmentState::Start => Some(Question::Appearance),
            AssessmentState::AwaitingEyes => Some(Question::Eyes),
            AssessmentState::AwaitingSkin => Some(Question::SkinPinch),
            AssessmentState::Done(_) => None,
        }
    }
}

/// Single transition. `Done` absorbs any further answer.
pub fn advance(state: AssessmentState, answer: &str) -> AssessmentState {
    use AssessmentState::*;
    match state {
        Start => match Appearance::parse(answer) {
            Some(Appearance::Normal) => AwaitingEyes,
            Some(Appearance::IrritableOrLethargic) => AwaitingSkin,
            None => Done(Assessment::Undetermined),
        },
        AwaitingEyes => Done(
            Eyes::parse(answer)
                .map(|e| Assessment::Determined(e.level()))
                .unwrap_or(Assessment::Undetermined),
        ),
        AwaitingSkin => Done(
            SkinPinch::parse(answer)
                .map(|s| Assessment::Determined(s.level()))
                .unwrap_or(Assessment::Undetermined),
        ),
        Done(result) => Done(result),
    }
}

/// What to do with an answer outside the expected options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidAnswerPolicy {
    /// Settle on `Undetermined` immediately.
    #[default]
    Degrade,
    /// Ask the same question again, up to `max_attempts` times in total.
    Reprompt { max_attempts: u32 },
}

/// Run the tree once, degrading silently on invalid input.
pub fn assess_appearance<P: AnswerProvider + ?Sized>(
    provider: &mut P,
) -> Result<Assessment, MedbotError> {
    assess_with_policy(provider, InvalidAnswerPolicy::Degrade)
}

pub fn assess_with_policy<P: AnswerProvider + ?Sized>(
    provider: &mut P,
    policy: InvalidAnswerPolicy,
) -> Result<Assessment, MedbotError> {
    let max_attempts = match policy {
        InvalidAnswerPolicy::Degrade => 1,
        InvalidAnswerPolicy::Reprompt { max_attempts } => max_attempts.max(1),
    };

    let mut state = AssessmentState::Start;
    while let Some(question) = state.pending_question() {
        let mut attempt = 1;
        state = loop {
            let answer = provider.answer(question)?;
            let next = advance(state, answer.trim_end_matches(['\r', '\n']));
            if next != AssessmentState::Done(Assessment::Undetermined) || attempt >= max_attempts {
                break next;
            }
            tracing::debug!(?question, attempt, "answer outside expected options, asking again");
            attempt += 1;
        };
    }

    match state {
        AssessmentState::Done(result) => Ok(result),
        _ => Ok(Assessment::Undetermined),
    }
}
