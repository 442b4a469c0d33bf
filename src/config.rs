use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8699;
const DEFAULT_QUESTIONS_PATH: &str = "questions.json";
const DEFAULT_COUNTDOWN_SECS: u32 = 10;

/// Immutable runtime configuration, read from the environment once at
/// startup.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub port: u16,
    pub questions_path: PathBuf,
    /// Fixed per-question countdown reported to clients via `requestTime`.
    pub countdown_secs: u32,
}

impl QuizConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_env("QUIZ_PORT", DEFAULT_PORT),
            questions_path: env::var("QUIZ_QUESTIONS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_QUESTIONS_PATH)),
            countdown_secs: parse_env("QUIZ_COUNTDOWN_SECS", DEFAULT_COUNTDOWN_SECS),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_PATH),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("invalid value for {name}: {raw:?}, using default");
                default
            }
        },
        Err(_) => default,
    }
}
