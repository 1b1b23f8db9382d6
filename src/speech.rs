//! Speech synthesis: the output seam and the Piper subprocess pipeline.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Playback failed with exit code {code}")]
    Playback { code: i32 },
}

/// The audio-output collaborator: blocks until the text has been played.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

#[derive(Debug, Clone)]
pub struct PiperConfig {
    pub executable: PathBuf,
    pub voice_model: PathBuf,
}

/// Piper TTS piped into `aplay`, with the text written to Piper's stdin.
#[derive(Debug)]
pub struct PiperSpeech {
    config: PiperConfig,
}

impl PiperSpeech {
    /// Fails at startup when the binary or voice model is missing, so a
    /// broken audio setup is caught before the device enters steady state.
    pub fn new(config: PiperConfig) -> Result<Self, SpeechError> {
        if !config.executable.exists() {
            return Err(SpeechError::Config(format!(
                "Piper executable not found at: {}",
                config.executable.display()
            )));
        }
        if !config.voice_model.exists() {
            return Err(SpeechError::Config(format!(
                "Voice model not found at: {}",
                config.voice_model.display()
            )));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl SpeechSynthesizer for PiperSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        log::info!("Speaking: '{}'", text);

        let mut piper = Command::new(&self.config.executable)
            .arg("--model")
            .arg(&self.config.voice_model)
            .arg("--output_file")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let synth_out: Stdio = piper
            .stdout
            .take()
            .ok_or_else(|| SpeechError::Config("Piper stdout unavailable".to_string()))?
            .try_into()?;

        let mut player = Command::new("aplay")
            .stdin(synth_out)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = piper.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            // Dropping stdin closes the pipe so Piper can finish.
        }

        let piper_status = piper.wait().await?;
        if !piper_status.success() {
            return Err(SpeechError::Playback {
                code: piper_status.code().unwrap_or(-1),
            });
        }

        let player_status = player.wait().await?;
        if !player_status.success() {
            return Err(SpeechError::Playback {
                code: player_status.code().unwrap_or(-1),
            });
        }

        log::info!("Speech completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_executable_fails_at_startup() {
        let model = tempfile::NamedTempFile::new().unwrap();
        let config = PiperConfig {
            executable: PathBuf::from("/nonexistent/piper"),
            voice_model: model.path().to_path_buf(),
        };

        let err = PiperSpeech::new(config).unwrap_err();
        assert!(matches!(err, SpeechError::Config(msg) if msg.contains("Piper executable")));
    }

    #[test]
    fn test_missing_voice_model_fails_at_startup() {
        let mut exe = tempfile::NamedTempFile::new().unwrap();
        writeln!(exe, "#!/bin/sh").unwrap();

        let config = PiperConfig {
            executable: exe.path().to_path_buf(),
            voice_model: PathBuf::from("/nonexistent/voice.onnx"),
        };

        let err = PiperSpeech::new(config).unwrap_err();
        assert!(matches!(err, SpeechError::Config(msg) if msg.contains("Voice model")));
    }

    #[test]
    fn test_valid_paths_accepted() {
        let exe = tempfile::NamedTempFile::new().unwrap();
        let model = tempfile::NamedTempFile::new().unwrap();

        let config = PiperConfig {
            executable: exe.path().to_path_buf(),
            voice_model: model.path().to_path_buf(),
        };
        assert!(PiperSpeech::new(config).is_ok());
    }
}
