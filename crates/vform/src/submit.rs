//! Submit coordination.
//!
//! A page offers two triggers, "save" and "save and close". Both run the
//! same submit path; the handler asks [`VForm::is_save_and_close`] which one
//! fired when it decides where to navigate afterwards.

use std::cell::Cell;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::context::FormContext;
use crate::form::{FormContainer, FormSnapshot};

/// Which trigger started the current submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitIntent {
    /// Persist and stay on the page.
    Save,
    /// Persist and leave the page.
    SaveAndClose,
}

/// Whether a submit is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
}

/// Receives the collected snapshot when a submit fires.
///
/// The handler gets the form back so it can push errors to the fields or
/// check the submit intent.
#[async_trait(?Send)]
pub trait SubmitHandler {
    /// Value returned to the trigger's caller.
    type Output;

    /// Handles one submit.
    async fn on_submit(&mut self, data: FormSnapshot, form: &VForm) -> Self::Output;
}

/// A form plus the "save" / "save and close" submit intent.
#[derive(Debug, Default)]
pub struct VForm {
    container: FormContainer,
    intent: Cell<Option<SubmitIntent>>,
    state: Cell<SubmitState>,
}

impl VForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing container.
    pub fn from_container(container: FormContainer) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    /// Returns the underlying container.
    pub fn form(&self) -> &FormContainer {
        &self.container
    }

    /// Returns the context fields mount against.
    pub fn context(&self) -> &FormContext {
        self.container.context()
    }

    /// Submits with the "save" intent.
    pub async fn save<H: SubmitHandler>(&self, handler: &mut H) -> H::Output {
        self.trigger(SubmitIntent::Save, handler).await
    }

    /// Submits with the "save and close" intent.
    pub async fn save_and_close<H: SubmitHandler>(&self, handler: &mut H) -> H::Output {
        self.trigger(SubmitIntent::SaveAndClose, handler).await
    }

    /// Records `intent` and runs the container's submit path.
    ///
    /// A trigger while a submit is already running is not rejected; callers
    /// disable their triggers while [`is_submitting`](Self::is_submitting).
    pub async fn trigger<H: SubmitHandler>(&self, intent: SubmitIntent, handler: &mut H) -> H::Output {
        if self.is_submitting() {
            warn!(?intent, "submit triggered while another submit is running");
        }
        self.intent.set(Some(intent));
        self.state.set(SubmitState::Submitting);
        debug!(?intent, "submit started");

        let output = self
            .container
            .submit(move |data| handler.on_submit(data, self))
            .await;

        self.state.set(SubmitState::Idle);
        // An intent the handler never read does not leak into the next cycle.
        self.intent.set(None);
        output
    }

    /// Returns true if the current submit came from "save and close".
    ///
    /// Reading consumes the intent: a second call in the same cycle returns
    /// false.
    pub fn is_save_and_close(&self) -> bool {
        self.intent.take() == Some(SubmitIntent::SaveAndClose)
    }

    /// Returns true while a submit is running.
    pub fn is_submitting(&self) -> bool {
        self.state.get() == SubmitState::Submitting
    }

    /// Returns the submit state.
    pub fn state(&self) -> SubmitState {
        self.state.get()
    }
}
