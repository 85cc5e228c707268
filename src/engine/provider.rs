//! Layout Engine Providers
//!
//! Defines the engine trait and the command-line backed implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::types::{EngineError, ImageJob, PageResult, PdfJob};
use crate::config::EngineConfig;

/// External layout/OCR engine
///
/// Implementations are shared by every in-flight request and must tolerate
/// concurrent calls.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    /// Short name used in logs and the health endpoint
    fn name(&self) -> &str;

    /// Parse a single image
    async fn parse_image(&self, job: &ImageJob) -> Result<Vec<PageResult>, EngineError>;

    /// Parse every page of a PDF
    async fn parse_pdf(&self, job: &PdfJob) -> Result<Vec<PageResult>, EngineError>;
}

/// Drives the engine's command-line entry point as a child process.
///
/// The engine writes one JSON line per page to `<save_dir>/<input stem>.jsonl`,
/// which is read back once the process exits.
pub struct CommandEngine {
    config: EngineConfig,
}

impl CommandEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    async fn run(
        &self,
        input_path: &Path,
        filename: &str,
        prompt_mode: &str,
        save_dir: &Path,
        fitz_preprocess: bool,
    ) -> Result<Vec<PageResult>, EngineError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(input_path)
            .arg("--output")
            .arg(save_dir)
            .arg("--prompt")
            .arg(prompt_mode)
            .arg("--ip")
            .arg(&self.config.ip)
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--dpi")
            .arg(self.config.dpi.to_string())
            .arg("--min_pixels")
            .arg(self.config.min_pixels.to_string())
            .arg("--max_pixels")
            .arg(self.config.max_pixels.to_string());
        if fitz_preprocess {
            cmd.arg("--fitz_preprocess");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %self.config.program,
            input = %input_path.display(),
            filename,
            prompt_mode,
            "Invoking layout engine"
        );

        let output = cmd.output().await.map_err(|e| {
            EngineError::Unavailable(format!("failed to run {}: {}", self.config.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(EngineError::Failed(if stderr.is_empty() {
                format!("engine exited with {}", output.status)
            } else {
                stderr_tail(stderr, 20)
            }));
        }

        read_manifest(&manifest_path(input_path, save_dir)).await
    }
}

#[async_trait]
impl LayoutEngine for CommandEngine {
    fn name(&self) -> &str {
        "dots-ocr-cli"
    }

    async fn parse_image(&self, job: &ImageJob) -> Result<Vec<PageResult>, EngineError> {
        self.run(
            &job.input_path,
            &job.filename,
            &job.prompt_mode,
            &job.save_dir,
            job.fitz_preprocess,
        )
        .await
    }

    async fn parse_pdf(&self, job: &PdfJob) -> Result<Vec<PageResult>, EngineError> {
        self.run(&job.input_path, &job.filename, &job.prompt_mode, &job.save_dir, false)
            .await
    }
}

/// Manifest the engine writes for `input_path`
pub(crate) fn manifest_path(input_path: &Path, save_dir: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    save_dir.join(format!("{}.jsonl", stem))
}

/// Read a JSON-lines result manifest, preserving line order.
pub(crate) async fn read_manifest(path: &Path) -> Result<Vec<PageResult>, EngineError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::MissingOutput(path.to_path_buf()));
        }
        Err(e) => {
            return Err(EngineError::InvalidOutput(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                EngineError::InvalidOutput(format!("manifest line {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_manifest_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.jsonl");
        tokio::fs::write(
            &path,
            "{\"page_no\": 2, \"layout_info_path\": \"/a\"}\n\n{\"page_no\": 0}\n{\"page_no\": 1}\n",
        )
        .await
        .unwrap();

        let results = read_manifest(&path).await.unwrap();
        let pages: Vec<_> = results.iter().map(|r| r.page_no).collect();
        assert_eq!(pages, vec![Some(2), Some(0), Some(1)]);
    }

    #[tokio::test]
    async fn test_read_manifest_missing() {
        let dir = TempDir::new().unwrap();
        let result = read_manifest(&dir.path().join("absent.jsonl")).await;
        assert!(matches!(result, Err(EngineError::MissingOutput(_))));
    }

    #[tokio::test]
    async fn test_read_manifest_invalid_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        tokio::fs::write(&path, "{\"page_no\": 0}\nnot json\n").await.unwrap();

        let err = read_manifest(&path).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidOutput(ref msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_manifest_path_uses_input_stem() {
        let path = manifest_path(Path::new("/tmp/in/upload_abc.pdf"), Path::new("/tmp/out"));
        assert_eq!(path, PathBuf::from("/tmp/out/upload_abc.jsonl"));
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(stderr_tail("a\nb\nc", 2), "b\nc");
        assert_eq!(stderr_tail("only", 5), "only");
    }

    #[cfg(unix)]
    fn shell_engine(script: &str) -> CommandEngine {
        CommandEngine::new(EngineConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "engine".to_string()],
            ..EngineConfig::default()
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_reads_manifest() {
        // $1 = input, $3 = save dir, $5 = prompt mode
        let engine = shell_engine(
            r#"stem=$(basename "$1"); stem=${stem%.*}
printf '{"page_no":0,"layout_info_path":"%s/p0.json","prompt":"%s"}\n' "$3" "$5" > "$3/$stem.jsonl"
printf '{"page_no":1}\n' >> "$3/$stem.jsonl""#,
        );
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let input_path = input.path().join("upload_1234.pdf");
        std::fs::write(&input_path, b"%PDF").unwrap();

        let results = engine
            .parse_pdf(&PdfJob {
                input_path,
                filename: "api_pdf".to_string(),
                prompt_mode: "prompt_ocr".to_string(),
                save_dir: output.path().to_path_buf(),
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].layout_info_path, Some(output.path().join("p0.json")));
        assert_eq!(results[0].extra["prompt"], "prompt_ocr");
        assert_eq!(results[1].page_no, Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_passes_preprocess_flag() {
        let engine = shell_engine(
            r#"stem=$(basename "$1"); stem=${stem%.*}
for arg in "$@"; do
  if [ "$arg" = "--fitz_preprocess" ]; then printf '{"page_no":0,"fitz":true}\n' > "$3/$stem.jsonl"; exit 0; fi
done
printf '{"page_no":0,"fitz":false}\n' > "$3/$stem.jsonl""#,
        );
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let input_path = input.path().join("upload_1.png");
        std::fs::write(&input_path, b"png").unwrap();

        let results = engine
            .parse_image(&ImageJob {
                input_path,
                filename: "api_image".to_string(),
                prompt_mode: "prompt_layout_all_en".to_string(),
                save_dir: output.path().to_path_buf(),
                fitz_preprocess: true,
            })
            .await
            .unwrap();

        assert_eq!(results[0].extra["fitz"], true);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_failure_carries_stderr() {
        let engine = shell_engine("echo 'CUDA out of memory' >&2; exit 3");
        let dir = TempDir::new().unwrap();

        let err = engine
            .parse_pdf(&PdfJob {
                input_path: dir.path().join("x.pdf"),
                filename: "api_pdf".to_string(),
                prompt_mode: "prompt_layout_all_en".to_string(),
                save_dir: dir.path().to_path_buf(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Failed(ref msg) if msg == "CUDA out of memory"));
    }

    #[tokio::test]
    async fn test_command_engine_missing_program() {
        let engine = CommandEngine::new(EngineConfig {
            program: "definitely-not-a-real-dots-binary".to_string(),
            args: vec![],
            ..EngineConfig::default()
        });
        let dir = TempDir::new().unwrap();

        let err = engine
            .parse_pdf(&PdfJob {
                input_path: dir.path().join("x.pdf"),
                filename: "api_pdf".to_string(),
                prompt_mode: "prompt_layout_all_en".to_string(),
                save_dir: dir.path().to_path_buf(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Unavailable(_)));
    }
}
