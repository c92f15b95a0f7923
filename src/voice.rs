use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::VoiceConfig;
use crate::error::VoiceError;

/// Environment variable carrying the recognition language to the command.
pub const LANG_ENV: &str = "TASK_CHAT_VOICE_LANG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
}

/// A speech-to-text capability. One call captures one utterance.
pub trait SpeechRecognizer: Send + Sync {
    fn listen(&self, lang: &str) -> BoxFuture<'static, Result<String, VoiceError>>;
}

/// Runs an external program and takes its stdout as the transcript.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(CommandRecognizer {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn listen(&self, lang: &str) -> BoxFuture<'static, Result<String, VoiceError>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(LANG_ENV, lang)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let program = self.program.clone();

        async move {
            debug!(%program, "starting speech recognition");
            let output = cmd.output().await.map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    warn!(%program, error = %e, "speech recognizer unavailable");
                    VoiceError::Unsupported
                }
                _ => VoiceError::Failed(e.to_string()),
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let detail = if stderr.is_empty() {
                    format!("recognizer exited with {}", output.status)
                } else {
                    stderr
                };
                return Err(VoiceError::Failed(detail));
            }

            let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if transcript.is_empty() {
                return Err(VoiceError::Failed("no speech detected".to_string()));
            }
            Ok(transcript)
        }
        .boxed()
    }
}

/// Builds the configured recognizer, if any.
pub fn recognizer_from_config(config: &VoiceConfig) -> Option<Arc<dyn SpeechRecognizer>> {
    let argv = config.command.as_deref()?;
    match CommandRecognizer::from_argv(argv) {
        Some(recognizer) => Some(Arc::new(recognizer)),
        None => {
            warn!("voice.command is empty; voice input disabled");
            None
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn recognizer(parts: &[&str]) -> CommandRecognizer {
        CommandRecognizer::from_argv(&argv(parts)).unwrap()
    }

    #[test]
    fn test_empty_argv_has_no_recognizer() {
        assert!(CommandRecognizer::from_argv(&[]).is_none());
        assert!(CommandRecognizer::from_argv(&argv(&[" "])).is_none());
        let config = VoiceConfig {
            command: None,
            lang: "en-US".to_string(),
        };
        assert!(recognizer_from_config(&config).is_none());
    }

    #[tokio::test]
    async fn test_transcript_is_trimmed_stdout() {
        let result = recognizer(&["echo", "  call mom  "]).listen("en-US").await;
        assert_eq!(result, Ok("call mom".to_string()));
    }

    #[tokio::test]
    async fn test_language_is_passed_through() {
        let result = recognizer(&["sh", "-c", "printf %s \"$TASK_CHAT_VOICE_LANG\""])
            .listen("fr-FR")
            .await;
        assert_eq!(result, Ok("fr-FR".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program_is_unsupported() {
        let result = recognizer(&["task-chat-no-such-recognizer"]).listen("en-US").await;
        assert_eq!(result, Err(VoiceError::Unsupported));
    }

    #[tokio::test]
    async fn test_failing_program_reports_stderr() {
        let result = recognizer(&["sh", "-c", "echo mic busy >&2; exit 3"])
            .listen("en-US")
            .await;
        assert_eq!(result, Err(VoiceError::Failed("mic busy".to_string())));
    }

    #[tokio::test]
    async fn test_silence_is_a_failure() {
        let result = recognizer(&["true"]).listen("en-US").await;
        assert!(matches!(result, Err(VoiceError::Failed(_))));
    }
}
