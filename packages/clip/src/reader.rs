use crate::binder::Binder;
use crate::config::ReaderConfig;
use crate::decompress::Decompressor;
use crate::error::{ClipError, ClipErrors};
use crate::model::Clip;
use crate::validator::{ValidationRule, Validator};
use animclip_parser::Parser;
use tracing::{debug, info, instrument};

/// Suffixes stripped from a source path to get the default clip name,
/// longest first
const NAME_SUFFIXES: [&str; 4] = [".acl.js", ".acl.zip", ".js", ".zip"];

/// Default clip name for a source path: the file name without directory or
/// clip-file suffix
pub fn clip_name_from_path(path: &str) -> String {
    let file_name = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    NAME_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name)
        .to_string()
}

/// Entry point for loading clips: parse, bind, then validate.
///
/// A reader holds no state between calls; one instance can read any number
/// of clips.
#[derive(Debug, Default)]
pub struct ClipReader {
    config: ReaderConfig,
    source_name: Option<String>,
    validator: Validator,
}

impl ClipReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Name of the file being read, used for the default clip name and in
    /// log output
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Add a validation rule. It runs after the built-in rules and can only
    /// reject more clips, never fewer.
    pub fn with_rule(mut self, rule: Box<dyn ValidationRule>) -> Self {
        self.validator.add_rule(rule);
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    fn default_name(&self) -> String {
        match (&self.source_name, &self.config.fallback_name) {
            (Some(source), _) => clip_name_from_path(source),
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => String::new(),
        }
    }

    /// Read a clip from its text form
    #[instrument(skip(self, source), fields(source_name = self.source_name.as_deref().unwrap_or("<memory>"), len = source.len()))]
    pub fn read(&self, source: &str) -> Result<Clip, ClipErrors> {
        let result = self.run(source);
        match &result {
            Ok(clip) => info!(
                clip = clip.name(),
                bones = clip.bones().len(),
                tracks = clip.tracks().len(),
                "read clip"
            ),
            Err(errors) => debug!(errors = errors.len(), "clip rejected"),
        }
        result
    }

    fn run(&self, source: &str) -> Result<Clip, ClipErrors> {
        let document = Parser::new(source)
            .with_max_depth(self.config.max_nesting_depth)
            .parse_document()?;
        debug!(assignments = document.len(), "parsed syntax tree");

        let raw = Binder::new(source, &self.config)
            .with_default_name(self.default_name())
            .bind(&document)?;

        self.validator.validate(raw)
    }

    /// Read a clip from raw bytes, which must be UTF-8
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Clip, ClipErrors> {
        let source = std::str::from_utf8(bytes).map_err(|e| ClipError::Encoding {
            message: e.to_string(),
        })?;
        self.read(source)
    }

    /// Read a clip from a compressed container
    pub fn read_compressed<D>(&self, decompressor: &D, bytes: &[u8]) -> Result<Clip, ClipErrors>
    where
        D: Decompressor + ?Sized,
    {
        let payload = decompressor.decompress(bytes).map_err(ClipError::from)?;
        debug!(compressed = bytes.len(), payload = payload.len(), "decompressed clip");
        self.read_bytes(&payload)
    }
}

/// Read a clip with default settings
pub fn read_clip(source: &str) -> Result<Clip, ClipErrors> {
    ClipReader::new().read(source)
}
