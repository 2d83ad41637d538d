//! Interactive console driver.
//!
//! Reads operator answers line by line and writes prompts and results to the
//! given writer. Generic over the streams so transcripts can be driven from
//! byte buffers.

use crate::core::error::MedbotError;
use crate::plugins::assessment::InvalidAnswerPolicy;
use crate::plugins::intake::{IntakeOutcome, IntakeWorkflow, PatientHistory};
use crate::plugins::prompts::{
    self, AnswerProvider, DIAGNOSIS_ERROR_MESSAGE, LIST_SEPARATOR, PATIENT_ERROR_MESSAGE,
    Question, SAVE_ERROR_MESSAGE, SAVED_MESSAGE,
};
use crate::plugins::records::RecordStore;
use std::io::{self, BufRead, Write};

pub struct Console<R, W> {
    input: R,
    output: W,
}

/// Print the patient listing: separator, then each patient with its diagnoses.
pub fn write_listing<W: Write>(out: &mut W, histories: &[PatientHistory]) -> io::Result<()> {
    writeln!(out, "{}", LIST_SEPARATOR)?;
    writeln!(out)?;
    for history in histories {
        writeln!(out, "{}", history.patient)?;
        for diagnosis in &history.diagnoses {
            writeln!(out, "{}", diagnosis)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", LIST_SEPARATOR)?;
        writeln!(out)?;
    }
    Ok(())
}

fn is_end_of_input(err: &MedbotError) -> bool {
    matches!(err, MedbotError::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof)
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Main menu loop. Returns on `q` or end of input.
    pub fn run_menu<S: RecordStore + ?Sized>(
        &mut self,
        store: &S,
        policy: InvalidAnswerPolicy,
    ) -> Result<(), MedbotError> {
        let workflow = IntakeWorkflow::new(store).with_policy(policy);
        loop {
            let step = self.menu_step(&workflow);
            match step {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(e) if is_end_of_input(&e) => {
                    tracing::debug!("input closed, leaving menu");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One pass through the menu. `Ok(false)` means quit.
    fn menu_step<S: RecordStore + ?Sized>(
        &mut self,
        workflow: &IntakeWorkflow<'_, S>,
    ) -> Result<bool, MedbotError> {
        let selection = self.answer(Question::Menu)?;
        match selection.as_str() {
            "1" => {
                let histories = workflow.list_all();
                write_listing(&mut self.output, &histories)?;
            }
            "2" => self.new_diagnosis(workflow)?,
            "q" => return Ok(false),
            other => tracing::debug!(selection = other, "unrecognized menu selection"),
        }
        Ok(true)
    }

    fn new_diagnosis<S: RecordStore + ?Sized>(
        &mut self,
        workflow: &IntakeWorkflow<'_, S>,
    ) -> Result<(), MedbotError> {
        let patient_id = match self.answer(Question::PatientKind)?.as_str() {
            "1" => None,
            "2" => match prompts::ask_integer(self, Question::PatientId) {
                Ok(id) => Some(id),
                Err(MedbotError::InputParse { .. }) => {
                    writeln!(self.output, "{}", PATIENT_ERROR_MESSAGE)?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
            _ => {
                writeln!(self.output, "{}", DIAGNOSIS_ERROR_MESSAGE)?;
                return Ok(());
            }
        };

        match workflow.run_new_diagnosis(patient_id, self) {
            Ok(IntakeOutcome::PatientNotFound(id)) => {
                writeln!(self.output, "{} {}", PATIENT_ERROR_MESSAGE, id)?;
                writeln!(self.output, "{}", DIAGNOSIS_ERROR_MESSAGE)?;
            }
            Ok(IntakeOutcome::Saved { .. }) => writeln!(self.output, "{}", SAVED_MESSAGE)?,
            Ok(IntakeOutcome::SaveRejected { rejection, .. }) => {
                tracing::info!(?rejection, "intake not saved");
                writeln!(self.output, "{}", SAVE_ERROR_MESSAGE)?;
            }
            Err(e @ MedbotError::InputParse { .. }) => {
                tracing::info!(error = %e, "intake aborted");
                writeln!(self.output, "{}", PATIENT_ERROR_MESSAGE)?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> AnswerProvider for Console<R, W> {
    fn answer(&mut self, question: Question) -> Result<String, MedbotError> {
        self.output.write_all(question.prompt().as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MedbotError::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            )));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}
