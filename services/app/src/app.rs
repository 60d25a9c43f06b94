//! services/app/src/app.rs
//!
//! The facade the presentation layer drives. It owns the engine, applies the form
//! policy from `validation`, scopes every call to the active session, and runs the
//! daily rollover whenever a session is established.

use crate::adapters::{Argon2Hasher, JsonFileStore};
use crate::config::Config;
use crate::error::AppError;
use crate::validation::{validate_login, validate_signup, validate_task_form, SignupForm, TaskForm};
use questlog_core::{
    level_progress, Completion, Dashboard, Engine, History, Identity, LedgerError, LevelProgress,
    Rollover, SystemClock, Task, TaskView,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct App {
    engine: Engine,
    config: Arc<Config>,
}

impl App {
    /// Opens the snapshots in the configured storage directory.
    pub fn open(config: Arc<Config>) -> Result<Self, AppError> {
        let store = Arc::new(JsonFileStore::open(&config.storage_dir)?);
        let engine = Engine::open(
            store.clone(),
            store,
            Arc::new(Argon2Hasher::new()),
            Arc::new(SystemClock),
            config.quest_settings(),
        )?;
        info!("Storage opened at {}.", config.storage_dir.display());
        Ok(Self::from_engine(config, engine))
    }

    /// Wraps an already assembled engine (custom clock, storage or rng).
    pub fn from_engine(config: Arc<Config>, engine: Engine) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.engine.active_identity()
    }

    fn require_session(&self) -> Result<Uuid, AppError> {
        self.current_user()
            .map(|identity| identity.id)
            .ok_or(AppError::Ledger(LedgerError::NotAuthenticated))
    }

    /// Fails with `NotFound` unless the task exists and belongs to the active user.
    fn require_owned(&self, id: Uuid) -> Result<Uuid, AppError> {
        let owner = self.require_session()?;
        match self.engine.tasks().get(id) {
            Some(task) if task.owner_id == owner => Ok(owner),
            _ => Err(LedgerError::NotFound(id).into()),
        }
    }

    //=====================================================================================
    // Session
    //=====================================================================================

    pub fn sign_up(&mut self, form: &SignupForm) -> Result<Identity, AppError> {
        validate_signup(form, self.config.min_password_length).map_err(|e| {
            warn!("Signup rejected: {}", e);
            e
        })?;
        let identity = self.engine.register(&form.username, &form.password)?;
        self.establish(&identity);
        Ok(identity)
    }

    pub fn log_in(&mut self, username: &str, password: &str) -> Result<Identity, AppError> {
        validate_login(username, password)?;
        let identity = self.engine.authenticate(username, password).map_err(|e| {
            warn!("Login failed for '{}'.", username);
            e
        })?;
        self.establish(&identity);
        Ok(identity)
    }

    pub fn log_out(&mut self) {
        self.engine.end_session();
    }

    /// Rollover after login or signup. The session stands even if it cannot be saved.
    fn establish(&mut self, identity: &Identity) {
        if let Err(e) = self.engine.rollover_daily_quests(identity.id) {
            error!("Daily quest rollover failed for {}: {}", identity.id, e);
        }
    }

    /// Re-runs the rollover for the active user; a no-op when nobody is logged in.
    pub fn refresh_daily_quests(&mut self) -> Result<Option<Rollover>, AppError> {
        let Some(id) = self.current_user().map(|identity| identity.id) else {
            return Ok(None);
        };
        Ok(Some(self.engine.rollover_daily_quests(id)?))
    }

    //=====================================================================================
    // Tasks
    //=====================================================================================

    fn checked(&self, form: TaskForm) -> Result<TaskForm, AppError> {
        validate_task_form(form, self.engine.clock().now()).map_err(|e| {
            warn!("Task form rejected: {}", e);
            e.into()
        })
    }

    pub fn add_task(&mut self, form: TaskForm) -> Result<Task, AppError> {
        let owner = self.require_session()?;
        let form = self.checked(form)?;
        Ok(self.engine.add_task(owner, form.into_draft())?)
    }

    pub fn edit_task(&mut self, id: Uuid, form: TaskForm) -> Result<Task, AppError> {
        self.require_owned(id)?;
        let form = self.checked(form)?;
        Ok(self.engine.update_task(id, form.into_update())?)
    }

    /// Idempotent: deleting a task that no longer exists succeeds with `false`.
    pub fn delete_task(&mut self, id: Uuid) -> Result<bool, AppError> {
        let owner = self.require_session()?;
        if let Some(task) = self.engine.tasks().get(id) {
            if task.owner_id != owner {
                return Err(LedgerError::NotFound(id).into());
            }
        }
        Ok(self.engine.delete_task(id)?)
    }

    pub fn complete_task(&mut self, id: Uuid) -> Result<Option<Completion>, AppError> {
        self.require_owned(id)?;
        let completion = self.engine.complete_task(id).map_err(|e| {
            error!("Completing task {} failed: {}", id, e);
            e
        })?;
        Ok(completion)
    }

    //=====================================================================================
    // Views
    //=====================================================================================

    /// The active user's tasks in `view`; empty when nobody is logged in.
    pub fn tasks(&self, view: TaskView) -> Vec<Task> {
        match self.current_user() {
            Some(identity) => self.engine.view(identity.id, view),
            None => Vec::new(),
        }
    }

    pub fn dashboard(&self) -> Option<Dashboard> {
        self.engine.dashboard(self.current_user()?.id)
    }

    pub fn history(&self) -> Option<History> {
        self.engine.history(self.current_user()?.id)
    }

    pub fn progress(&self) -> Option<LevelProgress> {
        self.current_user().map(level_progress)
    }
}
