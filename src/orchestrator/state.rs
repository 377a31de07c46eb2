//! Step-tracked transaction state and its transitions.
//!
//! Transitions are pure: each takes the state by value and returns the next
//! one. A transition that is not allowed from the current state returns it
//! unchanged, so a terminal state (`Success` or `Error`) can never advance.

use serde::{Deserialize, Serialize};

use crate::errors::{BlockchainError, Locale};

/// Overall or per-step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Validate,
    Build,
    Sign,
    Submit,
    Confirm,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::Validate,
        StepId::Build,
        StepId::Sign,
        StepId::Submit,
        StepId::Confirm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Validate => "validate",
            StepId::Build => "build",
            StepId::Sign => "sign",
            StepId::Submit => "submit",
            StepId::Confirm => "confirm",
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::PtBr, StepId::Validate) => "Validando dados",
            (Locale::PtBr, StepId::Build) => "Construindo transação",
            (Locale::PtBr, StepId::Sign) => "Aguardando assinatura",
            (Locale::PtBr, StepId::Submit) => "Enviando transação",
            (Locale::PtBr, StepId::Confirm) => "Aguardando confirmação",
            (Locale::En, StepId::Validate) => "Validating data",
            (Locale::En, StepId::Build) => "Building transaction",
            (Locale::En, StepId::Sign) => "Awaiting signature",
            (Locale::En, StepId::Submit) => "Submitting transaction",
            (Locale::En, StepId::Confirm) => "Awaiting confirmation",
        }
    }

    /// Status line shown while this step runs.
    pub fn message(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::PtBr, StepId::Validate) => "Validando parâmetros da transação...",
            (Locale::PtBr, StepId::Build) => "Construindo transação...",
            (Locale::PtBr, StepId::Sign) => "Aguardando assinatura da carteira...",
            (Locale::PtBr, StepId::Submit) => "Enviando transação para a rede...",
            (Locale::PtBr, StepId::Confirm) => "Aguardando confirmação da transação...",
            (Locale::En, StepId::Validate) => "Validating transaction parameters...",
            (Locale::En, StepId::Build) => "Building transaction...",
            (Locale::En, StepId::Sign) => "Waiting for wallet signature...",
            (Locale::En, StepId::Submit) => "Submitting transaction to the network...",
            (Locale::En, StepId::Confirm) => "Waiting for transaction confirmation...",
        }
    }
}

fn success_message(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => "Transação confirmada com sucesso!",
        Locale::En => "Transaction confirmed successfully!",
    }
}

fn retry_message(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => "Tentando novamente...",
        Locale::En => "Retrying...",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub label: String,
    pub state: LoadingState,
}

/// Progress of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionState {
    pub loading_state: LoadingState,
    pub message: String,
    /// Percentage of completed steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BlockchainError>,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<StepId>,
    #[serde(skip)]
    locale: Locale,
}

impl Default for TransactionState {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl TransactionState {
    /// Fresh state: every step idle.
    pub fn new(locale: Locale) -> Self {
        Self {
            loading_state: LoadingState::Idle,
            message: String::new(),
            progress: None,
            transaction_hash: None,
            error: None,
            steps: StepId::ALL
                .iter()
                .map(|&id| Step {
                    id,
                    label: id.label(locale).to_string(),
                    state: LoadingState::Idle,
                })
                .collect(),
            current_step: None,
            locale,
        }
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_state(&self, id: StepId) -> LoadingState {
        self.step(id).map(|s| s.state).unwrap_or_default()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.loading_state, LoadingState::Success | LoadingState::Error)
    }

    fn loading_step(&self) -> Option<StepId> {
        self.steps
            .iter()
            .find(|s| s.state == LoadingState::Loading)
            .map(|s| s.id)
    }

    fn set_step(&mut self, id: StepId, state: LoadingState) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == id) {
            step.state = state;
        }
    }

    fn refresh_progress(&mut self) {
        let done = self
            .steps
            .iter()
            .filter(|s| s.state == LoadingState::Success)
            .count();
        self.progress = Some((done * 100 / self.steps.len().max(1)) as u8);
    }

    /// Start `id`. Ignored when terminal or while another step is running.
    pub fn begin(mut self, id: StepId) -> Self {
        if self.is_terminal() || self.loading_step().is_some_and(|s| s != id) {
            return self;
        }
        self.set_step(id, LoadingState::Loading);
        self.loading_state = LoadingState::Loading;
        self.current_step = Some(id);
        self.message = id.message(self.locale).to_string();
        self.refresh_progress();
        self
    }

    /// Mark the running step `id` as done.
    pub fn complete(mut self, id: StepId) -> Self {
        if self.is_terminal() || self.step_state(id) != LoadingState::Loading {
            return self;
        }
        self.set_step(id, LoadingState::Success);
        self.refresh_progress();
        self
    }

    /// Mark the running step `done` as done and start `next` in the same
    /// transition, so some step is always running while the run is loading.
    pub fn advance(self, done: StepId, next: StepId) -> Self {
        if self.is_terminal() || self.step_state(done) != LoadingState::Loading {
            return self;
        }
        self.complete(done).begin(next)
    }

    /// Terminal failure. Marks the running step (or the last started one) as failed.
    pub fn fail(mut self, error: BlockchainError) -> Self {
        if self.is_terminal() {
            return self;
        }
        if let Some(id) = self.loading_step().or(self.current_step) {
            self.set_step(id, LoadingState::Error);
            self.current_step = Some(id);
        }
        self.loading_state = LoadingState::Error;
        self.message = error.user_friendly_message().to_string();
        self.error = Some(error);
        self
    }

    /// Terminal success. Only allowed once every step has succeeded.
    pub fn succeed(mut self, transaction_hash: String) -> Self {
        if self.is_terminal() || self.steps.iter().any(|s| s.state != LoadingState::Success) {
            return self;
        }
        self.loading_state = LoadingState::Success;
        self.message = success_message(self.locale).to_string();
        self.transaction_hash = Some(transaction_hash);
        self.progress = Some(100);
        self
    }

    /// Restart at `from` for another attempt: every later step goes back to
    /// idle and `from` itself is running again.
    pub fn retry_from(mut self, from: StepId) -> Self {
        if self.is_terminal() {
            return self;
        }
        let mut reset = false;
        for step in &mut self.steps {
            reset |= step.id == from;
            if reset {
                step.state = LoadingState::Idle;
            }
        }
        self.set_step(from, LoadingState::Loading);
        self.loading_state = LoadingState::Loading;
        self.current_step = Some(from);
        self.message = retry_message(self.locale).to_string();
        self.refresh_progress();
        self
    }
}
