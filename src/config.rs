//! Application-level configuration loading: claim timing, lock keys and the seed question bank.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::{NewQuestionEntity, QuestionId};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_CONFIG_PATH";
const DEFAULT_LOCK_TTL_SECS: u64 = 5;
const DEFAULT_LOCK_KEY_PREFIX: &str = "lock:question:";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_DELAY_MS: u64 = 250;

/// What happens to a claim whose holder answered wrongly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrongAnswerPolicy {
    /// Keep the claim until it expires; nobody else may try the question meanwhile.
    #[default]
    HoldUntilExpiry,
    /// Delete the claimant's own claim right away so the next player can try.
    Release,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    lock_ttl: Duration,
    lock_key_prefix: String,
    wrong_answer_policy: WrongAnswerPolicy,
    question_fetch_timeout: Duration,
    question_store_connect_attempts: u32,
    question_store_retry_delay: Duration,
    seed_questions: Vec<NewQuestionEntity>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        seed_questions = app_config.seed_questions.len(),
                        policy = ?app_config.wrong_answer_policy,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; missing keys take their default value.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// How long a granted claim protects a question.
    pub fn lock_ttl(&self) -> Duration {
        self.lock_ttl
    }

    /// Lock-store key guarding answers to `question_id`.
    pub fn claim_key(&self, question_id: QuestionId) -> String {
        format!("{}{}", self.lock_key_prefix, question_id)
    }

    pub fn wrong_answer_policy(&self) -> WrongAnswerPolicy {
        self.wrong_answer_policy
    }

    /// Upper bound on a single question-bank fetch.
    pub fn question_fetch_timeout(&self) -> Duration {
        self.question_fetch_timeout
    }

    /// Pings a persistent question bank gets per connect attempt.
    pub fn question_store_connect_attempts(&self) -> u32 {
        self.question_store_connect_attempts
    }

    /// First pause between question bank pings; later pauses double.
    pub fn question_store_retry_delay(&self) -> Duration {
        self.question_store_retry_delay
    }

    /// Questions used to fill the in-memory bank at startup.
    pub fn seed_questions(&self) -> &[NewQuestionEntity] {
        &self.seed_questions
    }

    /// Return a copy using `policy` for wrong answers.
    pub fn with_wrong_answer_policy(mut self, policy: WrongAnswerPolicy) -> Self {
        self.wrong_answer_policy = policy;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    lock_ttl_secs: u64,
    lock_key_prefix: String,
    wrong_answer_policy: WrongAnswerPolicy,
    question_fetch_timeout_ms: u64,
    question_store_connect_attempts: u32,
    question_store_retry_delay_ms: u64,
    seed_questions: Vec<RawQuestion>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            lock_ttl_secs: DEFAULT_LOCK_TTL_SECS,
            lock_key_prefix: DEFAULT_LOCK_KEY_PREFIX.to_owned(),
            wrong_answer_policy: WrongAnswerPolicy::default(),
            question_fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            question_store_connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            question_store_retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            seed_questions: Vec::new(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            lock_ttl: Duration::from_secs(value.lock_ttl_secs),
            lock_key_prefix: value.lock_key_prefix,
            wrong_answer_policy: value.wrong_answer_policy,
            question_fetch_timeout: Duration::from_millis(value.question_fetch_timeout_ms),
            question_store_connect_attempts: value.question_store_connect_attempts,
            question_store_retry_delay: Duration::from_millis(value.question_store_retry_delay_ms),
            seed_questions: value.seed_questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single seed question.
struct RawQuestion {
    question: String,
    answer: String,
}

impl From<RawQuestion> for NewQuestionEntity {
    fn from(value: RawQuestion) -> Self {
        Self {
            question: value.question,
            answer: value.answer,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
