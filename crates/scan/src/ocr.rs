use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Boundary to the text-recognition engine: raw image bytes in, recognized
/// lines out in reading order. No bounding boxes or confidence scores cross
/// this boundary.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError>;
}

/// Errors surfaced by the OCR boundary.
#[derive(Debug)]
pub enum OcrError {
    Io(io::Error),
    Engine(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "ocr io error: {}", err),
            Self::Engine(message) => write!(f, "ocr engine error: {}", message),
        }
    }
}

impl std::error::Error for OcrError {}

impl From<io::Error> for OcrError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Engine backed by the `tesseract` binary, fed over stdin. The handle is
/// built once per process and reused; each call costs one subprocess.
pub struct TesseractEngine {
    binary: PathBuf,
    lang: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            lang: lang.into(),
        }
    }

    /// Reads `GUILD_MANAGER_TESSERACT` and `GUILD_MANAGER_OCR_LANG`,
    /// defaulting to `tesseract` on the PATH with the Korean+English packs.
    pub fn from_env() -> Self {
        let binary = std::env::var_os("GUILD_MANAGER_TESSERACT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tesseract"));
        let lang = std::env::var("GUILD_MANAGER_OCR_LANG")
            .unwrap_or_else(|_| "kor+eng".to_string());
        Self::new(binary, lang)
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(stderr.trim().to_string()));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
