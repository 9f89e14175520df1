use clap::Parser;
use std::path::{Path, PathBuf};

/// Default model artifact name, the converted `chestXray_model`.
pub const DEFAULT_MODEL_PATH: &str = "chestXray_model.onnx";

/// Reads the photo from stdin when given as the input.
pub const STDIN_INPUT: &str = "-";

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Image file, directory of images, or `-` to read one image from stdin
    pub input: PathBuf,

    #[arg(short, long, default_value = DEFAULT_MODEL_PATH, value_parser = check_model_path)]
    pub model_path: PathBuf,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Stdin,
    File(PathBuf),
    Directory(PathBuf),
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn input_kind(&self) -> InputKind {
        if self.input == Path::new(STDIN_INPUT) {
            InputKind::Stdin
        } else if self.input.is_dir() {
            InputKind::Directory(self.input.clone())
        } else {
            InputKind::File(self.input.clone())
        }
    }
}

fn check_model_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.extension().and_then(|e| e.to_str()) != Some("onnx") {
        return Err(format!("{s} is not an ONNX model (expected a `.onnx` file)"));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["pneumonia-rs", "scan.png"]).unwrap();
        assert_eq!(config.input, PathBuf::from("scan.png"));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.device_id, 0);
    }

    #[test]
    fn test_rejects_non_onnx_model() {
        let result =
            Config::try_parse_from(["pneumonia-rs", "scan.png", "-m", "chestXray_model.tflite"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_kind() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path().to_string_lossy().to_string();

        let stdin = Config::try_parse_from(["pneumonia-rs", "-"]).unwrap();
        assert_eq!(stdin.input_kind(), InputKind::Stdin);

        let directory = Config::try_parse_from(["pneumonia-rs", dir.as_str()]).unwrap();
        assert_eq!(
            directory.input_kind(),
            InputKind::Directory(temp_dir.path().to_path_buf())
        );

        let file = Config::try_parse_from(["pneumonia-rs", "xray.jpg", "-d", "2"]).unwrap();
        assert_eq!(file.input_kind(), InputKind::File(PathBuf::from("xray.jpg")));
        assert_eq!(file.device_id, 2);
        Ok(())
    }
}
