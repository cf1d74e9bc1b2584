use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub stt: SttConfig,
    pub paths: PathsConfig,
}

impl AvatarConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: AvatarConfig = toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(n) = v.parse() {
                self.server.port = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("OLLAMA_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ELEVEN_LABS_API_KEY") {
            self.tts.api_key = v;
        }
        if let Ok(v) = std::env::var("ELEVEN_LABS_VOICE_ID") {
            self.tts.voice_id = v;
        }
        if let Ok(v) = std::env::var("WHISPER_MODEL") {
            self.stt.model = v;
        }
        if let Ok(v) = std::env::var("FFMPEG_PATH") {
            self.paths.ffmpeg = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RHUBARB_PATH") {
            self.paths.rhubarb = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("AVATAR_TEMP_DIR") {
            self.paths.temp_root = PathBuf::from(v);
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "ollama", "openai", or "mock".
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f32,
    /// System instruction for the avatar persona.
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.1".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// The avatar persona: a friendly Hungarian-speaking companion that
/// keeps replies short enough to synthesize and animate naturally.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
Te egy kedves, segítőkész virtuális barátnő vagy. A neved Lili.
Magyarul beszélsz, és mindig barátságos, szeretetteli hangnemben válaszolsz.
A válaszaid rövidek és természetesek legyenek, mintha egy valódi beszélgetésben lennél.
Kerüld a túl hosszú válaszokat - maximum 2-3 mondat legyen.
Használj érzelmeket és legyél empatikus.";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub request_timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            voice_id: "kgG7dCoKCfLehAPWkJOE".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Whisper model name passed to the CLI.
    pub model: String,
    /// Target spoken language.
    pub language: String,
    /// Upper bound for one recognition run, in seconds.
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "large-v3".to_string(),
            language: "hu".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub ffmpeg: PathBuf,
    pub rhubarb: PathBuf,
    pub whisper: PathBuf,
    /// Root under which per-request workflow directories are created.
    pub temp_root: PathBuf,
    /// Static quiz catalog JSON.
    pub questions: PathBuf,
    /// Directory of pre-generated `<id>.mp3` / `<id>.json` assets.
    pub question_assets: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            rhubarb: PathBuf::from("rhubarb"),
            whisper: PathBuf::from("whisper"),
            temp_root: std::env::temp_dir().join("avatar"),
            questions: PathBuf::from("assets/questions.json"),
            question_assets: PathBuf::from("assets/questions_audio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AvatarConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.stt.timeout_secs, 120);
        assert_eq!(cfg.stt.language, "hu");
        assert!(cfg.llm.system_prompt.contains("Lili"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AvatarConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [stt]
            model = "base"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.stt.model, "base");
        assert_eq!(cfg.stt.timeout_secs, 120);
    }

    #[test]
    fn test_paths_toml() {
        let cfg: AvatarConfig = toml::from_str(
            r#"
            [paths]
            ffmpeg = "/usr/bin/ffmpeg"
            rhubarb = "/opt/rhubarb/rhubarb"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.paths.ffmpeg, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(cfg.paths.rhubarb, PathBuf::from("/opt/rhubarb/rhubarb"));
    }
}
