//! Console vocabulary: every question the intake asks, the fixed messages it
//! prints, and the `AnswerProvider` seam that feeds answers back in.
//!
//! Prompt strings are reproduced byte-for-byte; transcripts are compared
//! against them.

use crate::core::error::MedbotError;
use std::collections::VecDeque;

pub const WELCOME_PROMPT: &str = "Welcome doctor, what would you like to do?\n - To list all patients, press 1\n - To run a new diagnosis, press 2\n - To quit, press q\n";
pub const PATIENT_KIND_PROMPT: &str = "Is this a new or returning patient?\n - For a new patient, press 1\n - For a returning patient, press 2\n";
pub const PATIENT_ID_PROMPT: &str = "What is the patient's ID?\n";

pub const NAME_PROMPT: &str = "What is the patient's name?\n";
pub const AGE_PROMPT: &str = "What is the patient's age?\n";
pub const GENDER_PROMPT: &str = "What is the patient's gender?\n";
pub const HEIGHT_PROMPT: &str = "What is the patient's height?\n";
pub const WEIGHT_PROMPT: &str = "What is the patient's weight?\n";

pub const APPEARANCE_PROMPT: &str = "How is the patient's general appearance?\n - 1: Normal appearance\n - 2: Irritable or lethargic\n";
pub const EYES_PROMPT: &str = "How are the patient's eyes?\n - 1: Eyes normal or slightly sunken\n - 2: Eyes very sunken\n";
pub const SKIN_PROMPT: &str = "How is the patient's skin when you pinch it?\n - 1: Normal skin pinch\n - 2: Slow skin pinch\n";

pub const PATIENT_ERROR_MESSAGE: &str = "Could not save patient information due to invalid input.";
pub const SAVE_ERROR_MESSAGE: &str = "Could not save Patient or Diagnosis information.";
pub const DIAGNOSIS_ERROR_MESSAGE: &str = "Could not get new diagnosis information.";
pub const SAVED_MESSAGE: &str = "Saved!";
pub const LIST_SEPARATOR: &str = "----------";

/// Everything the intake can ask the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Question {
    Menu,
    PatientKind,
    PatientId,
    Name,
    Age,
    Gender,
    Height,
    Weight,
    Appearance,
    Eyes,
    SkinPinch,
}

impl Question {
    pub fn prompt(self) -> &'static str {
        match self {
            Question::Menu => WELCOME_PROMPT,
            Question::PatientKind => PATIENT_KIND_PROMPT,
            Question::PatientId => PATIENT_ID_PROMPT,
            Question::Name => NAME_PROMPT,
            Question::Age => AGE_PROMPT,
            Question::Gender => GENDER_PROMPT,
            Question::Height => HEIGHT_PROMPT,
            Question::Weight => WEIGHT_PROMPT,
            Question::Appearance => APPEARANCE_PROMPT,
            Question::Eyes => EYES_PROMPT,
            Question::SkinPinch => SKIN_PROMPT,
        }
    }

    /// Field name used in parse errors.
    pub fn field(self) -> &'static str {
        match self {
            Question::Menu => "menu selection",
            Question::PatientKind => "patient kind",
            Question::PatientId => "patient id",
            Question::Name => "name",
            Question::Age => "age",
            Question::Gender => "gender",
            Question::Height => "height",
            Question::Weight => "weight",
            Question::Appearance => "appearance",
            Question::Eyes => "eyes",
            Question::SkinPinch => "skin pinch",
        }
    }
}

/// Source of raw operator answers.
pub trait AnswerProvider {
    fn answer(&mut self, question: Question) -> Result<String, MedbotError>;
}

/// Ask `question` and parse the reply as a whole number.
pub fn ask_integer<P: AnswerProvider + ?Sized>(
    provider: &mut P,
    question: Question,
) -> Result<i64, MedbotError> {
    let raw = provider.answer(question)?;
    raw.trim().parse::<i64>().map_err(|_| MedbotError::InputParse {
        field: question.field(),
        value: raw,
    })
}

/// Pre-recorded answers, consumed in order. Running dry yields empty answers.
#[derive(Debug, Default, Clone)]
pub struct ScriptedAnswers {
    remaining: VecDeque<String>,
    asked: Vec<Question>,
}

impl ScriptedAnswers {
    pub fn new<I, T>(answers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            remaining: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    pub fn push(&mut self, answer: impl Into<String>) {
        self.remaining.push_back(answer.into());
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> &[Question] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl AnswerProvider for ScriptedAnswers {
    fn answer(&mut self, question: Question) -> Result<String, MedbotError> {
        self.asked.push(question);
        Ok(self.remaining.pop_front().unwrap_or_default())
    }
}
