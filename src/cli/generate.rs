use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::handlers::responses::{format_all_options, skip_reason_text};
use crate::llm::media::ImagePayload;
use crate::llm::types::ImageGenerator;
use crate::studio::options::{BackgroundOption, EmoteEmotion, EmoteStyle, PortraitStyle};
use crate::studio::session::{Studio, StudioMode, SubmitOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChoice {
    Emote(EmoteStyle),
    Portrait(PortraitStyle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    pub image_path: PathBuf,
    pub mode: StudioMode,
    pub style: Option<StyleChoice>,
    pub emotion: Option<EmoteEmotion>,
    pub background: Option<BackgroundOption>,
    pub prompt: Option<String>,
    pub out_dir: PathBuf,
    pub print_data_uri: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutput {
    File(PathBuf),
    DataUri(String),
}

pub fn generate_usage() -> &'static str {
    "Usage: twitchmote_bot generate --image <path> [--mode emote|portrait|background] [--style <id>] [--emotion <id>] [--background <id>] [--prompt <text>] [--out <dir> | --data-uri]\n       twitchmote_bot options"
}

pub fn is_options_command(args: &[String]) -> bool {
    args.get(1).map(|value| value.as_str()) == Some("options")
}

pub fn print_options() {
    println!("{}", format_all_options());
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a String> {
    args.get(index)
        .ok_or_else(|| anyhow!("Missing value for {flag}\n{}", generate_usage()))
}

fn resolve_style(mode: StudioMode, value: &str) -> Result<StyleChoice> {
    match mode {
        StudioMode::Emote => EmoteStyle::from_id(value)
            .map(StyleChoice::Emote)
            .ok_or_else(|| anyhow!("Unknown emote style: {value}")),
        StudioMode::Portrait => PortraitStyle::from_id(value)
            .map(StyleChoice::Portrait)
            .ok_or_else(|| anyhow!("Unknown portrait style: {value}")),
        StudioMode::Background => Err(anyhow!(
            "--style does not apply to background mode; use --background"
        )),
    }
}

/// Returns `Ok(None)` when the first argument is not `generate`.
pub fn parse_generate_args(args: &[String], default_out_dir: &Path) -> Result<Option<GenerateArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("generate") {
        return Ok(None);
    }

    let mut image_path: Option<PathBuf> = None;
    let mut mode = StudioMode::default();
    let mut style: Option<String> = None;
    let mut emotion = None;
    let mut background = None;
    let mut prompt = None;
    let mut out_dir = default_out_dir.to_path_buf();
    let mut print_data_uri = false;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--image" => {
                index += 1;
                image_path = Some(PathBuf::from(flag_value(args, index, "--image")?));
            }
            "--mode" => {
                index += 1;
                let value = flag_value(args, index, "--mode")?;
                mode = StudioMode::from_id(value)
                    .ok_or_else(|| anyhow!("Invalid --mode value: {value}"))?;
            }
            "--style" => {
                index += 1;
                style = Some(flag_value(args, index, "--style")?.clone());
            }
            "--emotion" => {
                index += 1;
                let value = flag_value(args, index, "--emotion")?;
                emotion = Some(
                    EmoteEmotion::from_id(value)
                        .ok_or_else(|| anyhow!("Unknown emotion: {value}"))?,
                );
            }
            "--background" => {
                index += 1;
                let value = flag_value(args, index, "--background")?;
                background = Some(
                    BackgroundOption::from_id(value)
                        .ok_or_else(|| anyhow!("Unknown background: {value}"))?,
                );
            }
            "--prompt" => {
                index += 1;
                prompt = Some(flag_value(args, index, "--prompt")?.clone());
            }
            "--out" => {
                index += 1;
                out_dir = PathBuf::from(flag_value(args, index, "--out")?);
            }
            "--data-uri" => {
                print_data_uri = true;
            }
            "--help" | "-h" => {
                return Err(anyhow!(generate_usage()));
            }
            other => {
                return Err(anyhow!(
                    "Unknown generate argument: {other}\n{}",
                    generate_usage()
                ));
            }
        }
        index += 1;
    }

    let image_path = image_path.ok_or_else(|| anyhow!("--image is required"))?;
    // --style is resolved last so it may appear before --mode.
    let style = style
        .map(|value| resolve_style(mode, &value))
        .transpose()?;

    Ok(Some(GenerateArgs {
        image_path,
        mode,
        style,
        emotion,
        background,
        prompt,
        out_dir,
        print_data_uri,
    }))
}

/// Accepts raw image bytes, or a text file holding a data URI.
fn load_image_payload(raw: &[u8]) -> Result<ImagePayload> {
    if raw.starts_with(b"data:") {
        let text = std::str::from_utf8(raw).context("data URI file is not valid UTF-8")?;
        return Ok(ImagePayload::parse(text.trim())?);
    }
    Ok(ImagePayload::from_bytes(raw)?)
}

fn configure_studio(studio: &Studio, args: &GenerateArgs) {
    studio.set_mode(args.mode);
    match args.style {
        Some(StyleChoice::Emote(style)) => studio.set_emote_style(style),
        Some(StyleChoice::Portrait(style)) => studio.set_portrait_style(style),
        None => {}
    }
    if let Some(emotion) = args.emotion {
        studio.set_emotion(emotion);
    }
    if let Some(background) = args.background {
        studio.set_background(background);
    }
    if let Some(prompt) = &args.prompt {
        studio.set_annotation(prompt.as_str());
    }
}

/// Runs one request and writes the decoded image into `out_dir`, or returns
/// it as a data URI when `--data-uri` was given.
pub async fn run_generate(
    args: GenerateArgs,
    generator: Arc<dyn ImageGenerator>,
) -> Result<GenerateOutput> {
    let raw = tokio::fs::read(&args.image_path)
        .await
        .with_context(|| format!("failed to read {}", args.image_path.display()))?;
    let image = load_image_payload(&raw)?;

    let studio = Studio::new(generator);
    configure_studio(&studio, &args);
    studio.set_input_image(image);

    info!(
        mode = args.mode.id(),
        model = studio.generator_model(),
        image = %args.image_path.display(),
        "Running one-shot generation"
    );

    let result = match studio.submit().await {
        SubmitOutcome::Completed(result) => result,
        SubmitOutcome::Failed(message) => return Err(anyhow!(message)),
        SubmitOutcome::Skipped(reason) => return Err(anyhow!(skip_reason_text(reason))),
    };

    if args.print_data_uri {
        return Ok(GenerateOutput::DataUri(result.image.data_uri()));
    }

    let bytes = result.image.decode_bytes()?;
    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let path = args.out_dir.join(result.file_name());
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(GenerateOutput::File(path))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::llm::types::{GeneratedImage, GenerationError};

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    struct RecordingGenerator {
        seen: Mutex<Option<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageGenerator for RecordingGenerator {
        fn model(&self) -> &str {
            "recording"
        }

        async fn generate(
            &self,
            instruction: &str,
            image: &ImagePayload,
        ) -> Result<GeneratedImage, GenerationError> {
            *self.seen.lock() = Some((instruction.to_string(), image.mime_type.clone()));
            if self.fail {
                return Err(GenerationError::EmptyResponse);
            }
            Ok(GeneratedImage::new("image/png", "iVBORw0KGgo="))
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("twitchmote-{name}-{}", std::process::id()))
    }

    #[test]
    fn other_subcommands_are_ignored() {
        let parsed = parse_generate_args(&args(&["bin"]), Path::new("output")).unwrap();
        assert!(parsed.is_none());
        assert!(is_options_command(&args(&["bin", "options"])));
    }

    #[test]
    fn style_is_resolved_against_the_final_mode() {
        let parsed = parse_generate_args(
            &args(&[
                "bin", "generate", "--style", "oil-painting", "--mode", "portrait", "--image",
                "me.png", "--prompt", "keep glasses",
            ]),
            Path::new("output"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(parsed.mode, StudioMode::Portrait);
        assert_eq!(
            parsed.style,
            Some(StyleChoice::Portrait(PortraitStyle::OilPainting))
        );
        assert_eq!(parsed.prompt.as_deref(), Some("keep glasses"));
        assert_eq!(parsed.out_dir, PathBuf::from("output"));
    }

    #[test]
    fn invalid_arguments_are_reported() {
        let out = Path::new("output");
        assert!(parse_generate_args(&args(&["bin", "generate"]), out).is_err());
        assert!(parse_generate_args(&args(&["bin", "generate", "--image"]), out).is_err());
        assert!(parse_generate_args(
            &args(&["bin", "generate", "--image", "a.png", "--mode", "video"]),
            out
        )
        .is_err());
        assert!(parse_generate_args(
            &args(&["bin", "generate", "--image", "a.png", "--mode", "background", "--style", "anime"]),
            out
        )
        .is_err());
        assert!(parse_generate_args(&args(&["bin", "generate", "--verbose"]), out).is_err());
    }

    #[test]
    fn data_uri_files_are_parsed_as_text() {
        let payload = load_image_payload(b"data:image/webp;base64,UklGRg==\n").unwrap();
        assert_eq!(payload.mime_type, "image/webp");
        assert_eq!(payload.data, "UklGRg==");

        let payload = load_image_payload(&PNG_HEADER).unwrap();
        assert_eq!(payload.mime_type, "image/png");
    }

    #[tokio::test]
    async fn run_generate_writes_the_result_file() {
        let dir = scratch_dir("cli-ok");
        std::fs::create_dir_all(&dir).unwrap();
        let image_path = dir.join("input.png");
        std::fs::write(&image_path, PNG_HEADER).unwrap();

        let generator = Arc::new(RecordingGenerator {
            seen: Mutex::new(None),
            fail: false,
        });
        let args = GenerateArgs {
            image_path,
            mode: StudioMode::Background,
            style: None,
            emotion: None,
            background: Some(BackgroundOption::Green),
            prompt: None,
            out_dir: dir.join("out"),
            print_data_uri: false,
        };

        let GenerateOutput::File(path) = run_generate(args, generator.clone()).await.unwrap() else {
            panic!("expected a written file");
        };

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("twitchmote-ai-remove-bg-"));
        assert!(file_name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), PNG_HEADER.to_vec());

        let (instruction, mime) = generator.seen.lock().clone().unwrap();
        assert!(instruction.contains("#00FF00"));
        assert_eq!(mime, "image/png");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn run_generate_can_return_a_data_uri() {
        let dir = scratch_dir("cli-uri");
        std::fs::create_dir_all(&dir).unwrap();
        let image_path = dir.join("input.txt");
        std::fs::write(&image_path, "data:image/png;base64,iVBORw0KGgo=").unwrap();

        let generator = Arc::new(RecordingGenerator {
            seen: Mutex::new(None),
            fail: false,
        });
        let parsed = parse_generate_args(
            &args(&[
                "bin",
                "generate",
                "--image",
                image_path.to_str().unwrap(),
                "--data-uri",
            ]),
            &dir.join("out"),
        )
        .unwrap()
        .unwrap();

        let output = run_generate(parsed, generator).await.unwrap();

        assert_eq!(
            output,
            GenerateOutput::DataUri("data:image/png;base64,iVBORw0KGgo=".to_string())
        );
        assert!(!dir.join("out").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn run_generate_surfaces_the_collapsed_error() {
        let dir = scratch_dir("cli-fail");
        std::fs::create_dir_all(&dir).unwrap();
        let image_path = dir.join("input.png");
        std::fs::write(&image_path, PNG_HEADER).unwrap();

        let generator = Arc::new(RecordingGenerator {
            seen: Mutex::new(None),
            fail: true,
        });
        let args = GenerateArgs {
            image_path,
            mode: StudioMode::Emote,
            style: None,
            emotion: None,
            background: None,
            prompt: None,
            out_dir: dir.join("out"),
            print_data_uri: false,
        };

        let err = run_generate(args, generator).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "There was an error generating your image. Please try again."
        );
        assert!(!dir.join("out").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
