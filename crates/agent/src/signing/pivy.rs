use std::io::Write;
use std::process::{Command, Stdio};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::backend::{KeySlot, PivBackend};
use crate::error::AuthError;

/// Production backend: drives the `pivy-tool` utility.
///
/// `sign <slot>` reads the payload on stdin and prints a base64 signature;
/// `pubkey <slot>` prints an authorized-keys line whose second field is the
/// base64 SSH wire blob. Every failure (missing binary, non-zero exit,
/// unparseable output) maps to [`AuthError::SigningUnavailable`]: there is
/// no fallback signing path.
pub struct PivyTool {
    program: String,
}

impl PivyTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str], stdin_data: Option<&[u8]>) -> Result<String, AuthError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| AuthError::SigningUnavailable(format!("spawning {}: {e}", self.program)))?;

        if let Some(data) = stdin_data {
            child
                .stdin
                .take()
                .expect("stdin was piped")
                .write_all(data)
                .map_err(|e| {
                    AuthError::SigningUnavailable(format!("writing to {}: {e}", self.program))
                })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            AuthError::SigningUnavailable(format!("waiting for {}: {e}", self.program))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::SigningUnavailable(format!(
                "{} {} failed ({}): {}",
                self.program,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout).map_err(|e| {
            AuthError::SigningUnavailable(format!("{} output is not UTF-8: {e}", self.program))
        })
    }
}

impl Default for PivyTool {
    fn default() -> Self {
        Self::new("pivy-tool")
    }
}

impl PivBackend for PivyTool {
    fn sign(&self, slot: KeySlot, data: &[u8]) -> Result<Vec<u8>, AuthError> {
        let stdout = self.run(&["sign", &slot.to_string()], Some(data))?;
        // The tool appends a newline to its base64 output.
        BASE64
            .decode(stdout.trim_end())
            .map_err(|e| AuthError::SigningUnavailable(format!("signature not valid base64: {e}")))
    }

    fn public_key(&self, slot: KeySlot) -> Result<Vec<u8>, AuthError> {
        let stdout = self.run(&["pubkey", &slot.to_string()], None)?;
        let blob_b64 = stdout.split_whitespace().nth(1).ok_or_else(|| {
            AuthError::SigningUnavailable("pubkey output is missing the key blob".into())
        })?;
        BASE64
            .decode(blob_b64)
            .map_err(|e| AuthError::SigningUnavailable(format!("key blob not valid base64: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_signing_unavailable() {
        let backend = PivyTool::new("pivy-tool-that-does-not-exist");
        let err = backend
            .sign(KeySlot::KEY_MANAGEMENT, b"date: now")
            .unwrap_err();
        assert!(matches!(err, AuthError::SigningUnavailable(_)));
        assert!(err.to_string().contains("spawning"));
    }

    #[test]
    fn default_backend_targets_pivy_tool() {
        assert_eq!(PivyTool::default().program, "pivy-tool");
    }
}
