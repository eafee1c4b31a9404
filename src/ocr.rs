use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::error::{DaybookError, Result};

/// Turns an image of handwritten or printed payment notes into text.
pub trait Recognizer {
    fn recognize(&self, image: &Path) -> Result<String>;
}

/// Runs the `tesseract` command line tool and reads the text from stdout.
pub struct TesseractCli {
    pub program: String,
    pub language: String,
}

impl TesseractCli {
    pub fn new(program: &str, language: &str) -> Self {
        Self {
            program: program.to_string(),
            language: language.to_string(),
        }
    }
}

impl Recognizer for TesseractCli {
    fn recognize(&self, image: &Path) -> Result<String> {
        if !image.is_file() {
            return Err(DaybookError::Ocr(format!("image not found: {}", image.display())));
        }
        let image_str = image
            .to_str()
            .ok_or_else(|| DaybookError::Ocr(format!("invalid image path: {}", image.display())))?;

        info!(program = %self.program, image = %image.display(), "running OCR");
        let output = Command::new(&self.program)
            .args([image_str, "stdout", "-l", self.language.as_str()])
            .output()
            .map_err(|e| {
                warn!(program = %self.program, error = %e, "OCR program could not start");
                DaybookError::Ocr(format!("failed to run {}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(code = output.status.code().unwrap_or(-1), "OCR program failed");
            return Err(DaybookError::Ocr(format!(
                "{} failed (exit {}): {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            return Err(DaybookError::Ocr("no text recognized in image".to_string()));
        }
        Ok(text)
    }
}
