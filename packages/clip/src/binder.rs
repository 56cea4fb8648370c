//! Typing of the generic syntax tree
//!
//! The binder checks the document's section layout, then converts each
//! section into model values with defaults applied. Problems with one bone or
//! track do not stop the others from being bound; every problem found is
//! returned together. Cross-entity consistency is left to the validator.

use crate::config::ReaderConfig;
use crate::error::{ClipError, ClipErrors};
use crate::model::{
    AdditiveFormat, Bone, ClipHeader, ReferenceFrame, SequenceKind, Track,
    DEFAULT_ADDITIVE_BASE_NUM_SAMPLES, DEFAULT_ADDITIVE_BASE_SAMPLE_RATE, DEFAULT_ERROR_THRESHOLD,
    DEFAULT_VERTEX_DISTANCE,
};
use animclip_parser::{
    is_representable, Assignment, LineIndex, Object, Position, Span, Spanned, SyntaxValue,
};
use glam::{DQuat, DVec3};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Newest format version the reader has been checked against. Other
/// versions are read all the same.
const MAX_KNOWN_VERSION: u32 = 5;

const CLIP: &str = "clip";
const BONES: &str = "bones";
const TRACKS: &str = "tracks";
const VERSION: &str = "version";

/// Section keys in the order they must appear
const SECTIONS: [&str; 3] = [CLIP, BONES, TRACKS];

const IS_BINARY_EXACT: &str = "is_binary_exact";

const HEADER_FIELDS: &[&str] = &[
    "name",
    "num_samples",
    "sample_rate",
    "error_threshold",
    "reference_frame",
    IS_BINARY_EXACT,
    "additive_format",
    "additive_base_name",
    "additive_base_num_samples",
    "additive_base_sample_rate",
];
const BONE_FIELDS: &[&str] = &[
    "name",
    "parent",
    "vertex_distance",
    "bind_rotation",
    "bind_translation",
    "bind_scale",
];
const TRACK_FIELDS: &[&str] = &["name", "rotations", "translations", "scales"];

/// Typed but not yet cross-checked clip contents
#[derive(Debug, Clone, PartialEq)]
pub struct RawClip {
    /// The `version` key when it holds a whole number
    pub version: Option<u32>,
    pub header: ClipHeader,
    pub bones: Vec<Bone>,
    pub tracks: Vec<Track>,
}

/// Top-level sections found in the document
#[derive(Default)]
struct Sections<'doc> {
    clip: Option<&'doc Assignment>,
    bones: Option<&'doc Assignment>,
    tracks: Option<&'doc Assignment>,
    version: Option<&'doc Spanned<SyntaxValue>>,
}

impl<'doc> Sections<'doc> {
    fn slot(&mut self, key: &str) -> &mut Option<&'doc Assignment> {
        match key {
            CLIP => &mut self.clip,
            BONES => &mut self.bones,
            _ => &mut self.tracks,
        }
    }

    fn get(&self, key: &str) -> Option<&'doc Assignment> {
        match key {
            CLIP => self.clip,
            BONES => self.bones,
            _ => self.tracks,
        }
    }
}

/// Where a binding error was found
#[derive(Clone, Copy)]
struct Scope<'a> {
    context: &'a str,
    entity: Option<&'a str>,
}

const FILE: Scope<'static> = Scope {
    context: "file",
    entity: None,
};

/// An object block with its keys checked for repeats
struct Block<'doc> {
    context: String,
    /// Bone or track name, when the block has one
    entity: Option<String>,
    object: &'doc Object,
    position: Position,
}

impl<'doc> Block<'doc> {
    fn get(&self, field: &str) -> Option<&'doc Spanned<SyntaxValue>> {
        self.object.get(field).map(|assignment| &assignment.value)
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            context: &self.context,
            entity: self.entity.as_deref(),
        }
    }

    fn warn_unknown(&self, known: &[&str]) {
        for key in self.object.keys().filter(|key| !known.contains(key)) {
            warn!(context = %self.context, key, "ignoring unknown field");
        }
    }
}

/// Converts a parsed document into a [`RawClip`]
pub struct Binder<'src> {
    index: LineIndex<'src>,
    strict_sections: bool,
    default_name: String,
    /// Vector components may be hex-encoded bit patterns
    binary_exact: bool,
    errors: Vec<ClipError>,
}

impl<'src> Binder<'src> {
    pub fn new(source: &'src str, config: &ReaderConfig) -> Self {
        Self {
            index: LineIndex::new(source),
            strict_sections: config.strict_sections,
            default_name: config.fallback_name.clone().unwrap_or_default(),
            binary_exact: false,
            errors: Vec::new(),
        }
    }

    /// Clip name used when the header has no `name`
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    pub fn bind(mut self, document: &Object) -> Result<RawClip, ClipErrors> {
        let sections = self.read_sections(document)?;

        let (clip, bones, tracks) = match (sections.clip, sections.bones, sections.tracks) {
            (Some(clip), Some(bones), Some(tracks)) => (clip, bones, tracks),
            _ => {
                for key in [BONES, TRACKS] {
                    if sections.get(key).is_none() {
                        self.errors.push(ClipError::MissingField {
                            context: FILE.context.to_string(),
                            entity: None,
                            field: key.to_string(),
                            position: None,
                        });
                    }
                }
                return Err(self.errors.into());
            }
        };

        let version = sections.version.and_then(|value| self.read_version(value));

        // Decided up front so a bad header does not also fail every vector
        self.binary_exact = clip
            .value
            .node
            .as_object()
            .and_then(|header| header.get(IS_BINARY_EXACT))
            .and_then(|flag| flag.value.node.as_bool())
            .unwrap_or(false);

        let header = self.bind_header(clip);
        let bones = self.bind_list(bones, "bone", Self::bind_bone);
        let tracks = self.bind_list(tracks, "track", Self::bind_track);

        if !self.errors.is_empty() {
            debug!(errors = self.errors.len(), "binding failed");
            return Err(self.errors.into());
        }

        let header = header.ok_or_else(ClipErrors::new)?;
        debug!(bones = bones.len(), tracks = tracks.len(), "bound clip sections");

        Ok(RawClip {
            version,
            header,
            bones,
            tracks,
        })
    }

    /// First pass over the top level: order, repeats, unknown keys
    fn read_sections<'doc>(&mut self, document: &'doc Object) -> Result<Sections<'doc>, ClipErrors> {
        let mut sections = Sections::default();

        for assignment in document {
            let key = assignment.key.node.as_str();
            let position = self.position(assignment.key.span);

            if key == VERSION {
                if sections.version.is_some() {
                    warn!(%position, "ignoring repeated version");
                } else {
                    sections.version = Some(&assignment.value);
                }
                continue;
            }

            let Some(rank) = SECTIONS.iter().position(|section| *section == key) else {
                if self.strict_sections {
                    self.errors.push(ClipError::UnknownSection {
                        section: key.to_string(),
                        position,
                    });
                } else {
                    warn!(key, %position, "ignoring unknown top-level key");
                }
                continue;
            };

            if sections.get(key).is_some() {
                return Err(ClipError::DuplicateSection {
                    section: key.to_string(),
                    position,
                }
                .into());
            }

            // A later section already seen means this one is out of place
            let early = SECTIONS[rank + 1..]
                .iter()
                .filter_map(|later| sections.get(later))
                .min_by_key(|assignment| assignment.key.span.start);
            if let Some(early) = early {
                return Err(ClipError::Order {
                    early: early.key.node.clone(),
                    expected_first: key.to_string(),
                    position: self.position(early.key.span),
                }
                .into());
            }

            *sections.slot(key) = Some(assignment);
        }

        if sections.clip.is_none() {
            return Err(ClipError::MissingField {
                context: FILE.context.to_string(),
                entity: None,
                field: CLIP.to_string(),
                position: None,
            }
            .into());
        }

        Ok(sections)
    }

    /// The version is informational: odd values are logged, never rejected
    fn read_version(&self, value: &Spanned<SyntaxValue>) -> Option<u32> {
        let position = self.position(value.span);
        let Some(version) = value.node.as_number() else {
            warn!(%position, found = value.node.kind_name(), "ignoring version that is not a number");
            return None;
        };

        if version.fract() != 0.0 || version < 0.0 || version > f64::from(u32::MAX) {
            warn!(%position, version, "ignoring version that is not a whole number");
            return None;
        }

        let version = version as u32;
        if version == 0 || version > MAX_KNOWN_VERSION {
            warn!(%position, version, max = MAX_KNOWN_VERSION, "reading clip of unknown version");
        }
        Some(version)
    }

    fn bind_header(&mut self, section: &Assignment) -> Option<ClipHeader> {
        let block = self.block(CLIP.to_string(), None, FILE, CLIP, &section.value)?;
        block.warn_unknown(HEADER_FIELDS);
        let before = self.errors.len();

        let name = match block.get("name") {
            Some(value) => self.string(block.scope(), "name", value),
            None => self.default_name(&block),
        };
        let num_samples = match self.required(&block, "num_samples") {
            Some(value) => self.count(block.scope(), "num_samples", value, true),
            None => None,
        };
        let sample_rate = self.required_number(&block, "sample_rate");
        let error_threshold = self
            .optional_number(&block, "error_threshold")
            .unwrap_or(DEFAULT_ERROR_THRESHOLD);
        let reference_frame = self
            .enumeration(&block, "reference_frame", &ReferenceFrame::NAMES, ReferenceFrame::from_name)
            .unwrap_or_default();
        let is_binary_exact = self.optional_bool(&block, IS_BINARY_EXACT).unwrap_or(false);
        let additive_format = self
            .enumeration(&block, "additive_format", &AdditiveFormat::NAMES, AdditiveFormat::from_name)
            .unwrap_or_default();
        let additive_base_name = self
            .optional_string(&block, "additive_base_name")
            .unwrap_or_default();
        let additive_base_num_samples = match block.get("additive_base_num_samples") {
            Some(value) => self.count(block.scope(), "additive_base_num_samples", value, false),
            None => Some(DEFAULT_ADDITIVE_BASE_NUM_SAMPLES),
        };
        let additive_base_sample_rate = self
            .optional_number(&block, "additive_base_sample_rate")
            .unwrap_or(DEFAULT_ADDITIVE_BASE_SAMPLE_RATE);

        if self.errors.len() > before {
            return None;
        }

        Some(ClipHeader {
            name: name?,
            num_samples: num_samples?,
            sample_rate: sample_rate?,
            error_threshold,
            reference_frame,
            is_binary_exact,
            additive_format,
            additive_base_name,
            additive_base_num_samples: additive_base_num_samples?,
            additive_base_sample_rate,
        })
    }

    /// The name a header without `name` gets. It has to survive being
    /// written back out, and the format has no way to escape a quote.
    fn default_name(&mut self, block: &Block<'_>) -> Option<String> {
        if !is_representable(&self.default_name) {
            self.errors.push(ClipError::UnrepresentableName {
                name: self.default_name.clone(),
                position: block.position,
            });
            return None;
        }
        Some(self.default_name.clone())
    }

    fn bind_list<T>(
        &mut self,
        section: &Assignment,
        item: &str,
        bind_item: fn(&mut Self, Block<'_>) -> Option<T>,
    ) -> Vec<T> {
        let list = section.key.node.as_str();
        let Some(items) = section.value.node.as_array() else {
            self.type_error(FILE, list, "an array", &section.value);
            return Vec::new();
        };

        let owner = Scope {
            context: list,
            entity: None,
        };
        let mut bound = Vec::with_capacity(items.len());
        for (i, value) in items.iter().enumerate() {
            let name = value
                .node
                .as_object()
                .and_then(|object| object.get("name"))
                .and_then(|assignment| assignment.value.node.as_str());
            let label = match name {
                Some(name) => format!("{} '{}'", item, name),
                None => format!("{}[{}]", list, i),
            };
            let entity = name.map(str::to_string);

            if let Some(block) = self.block(label, entity, owner, &format!("{}[{}]", list, i), value) {
                if let Some(value) = bind_item(self, block) {
                    bound.push(value);
                }
            }
        }
        bound
    }

    fn bind_bone(&mut self, block: Block<'_>) -> Option<Bone> {
        block.warn_unknown(BONE_FIELDS);
        let before = self.errors.len();

        let name = self.required_string(&block, "name");
        let parent = self.required_string(&block, "parent");
        let vertex_distance = self
            .optional_number(&block, "vertex_distance")
            .unwrap_or(DEFAULT_VERTEX_DISTANCE);
        let bind_rotation = self
            .optional_numbers::<4>(&block, "bind_rotation")
            .map(quat)
            .unwrap_or(DQuat::IDENTITY);
        let bind_translation = self
            .optional_numbers::<3>(&block, "bind_translation")
            .map(DVec3::from_array)
            .unwrap_or(DVec3::ZERO);
        let bind_scale = self
            .optional_numbers::<3>(&block, "bind_scale")
            .map(DVec3::from_array)
            .unwrap_or(DVec3::ONE);

        if self.errors.len() > before {
            return None;
        }

        Some(Bone {
            name: name?,
            parent: parent?,
            vertex_distance,
            bind_rotation,
            bind_translation,
            bind_scale,
        })
    }

    fn bind_track(&mut self, block: Block<'_>) -> Option<Track> {
        block.warn_unknown(TRACK_FIELDS);
        let before = self.errors.len();

        let bone_name = self.required_string(&block, "name");
        let rotations = self.sequence::<4>(&block, SequenceKind::Rotations);
        let translations = self.sequence::<3>(&block, SequenceKind::Translations);
        let scales = self.sequence::<3>(&block, SequenceKind::Scales);

        if self.errors.len() > before {
            return None;
        }

        Some(Track {
            bone_name: bone_name?,
            rotations: rotations.into_iter().map(quat).collect(),
            translations: translations.into_iter().map(DVec3::from_array).collect(),
            scales: scales.into_iter().map(DVec3::from_array).collect(),
        })
    }

    /// Check that `value` is an object and that none of its keys repeat.
    /// `owner` is where the value sits, for the error when it is not one.
    fn block<'doc>(
        &mut self,
        context: String,
        entity: Option<String>,
        owner: Scope<'_>,
        field: &str,
        value: &'doc Spanned<SyntaxValue>,
    ) -> Option<Block<'doc>> {
        let Some(object) = value.node.as_object() else {
            self.type_error(owner, field, "an object", value);
            return None;
        };

        let mut seen = HashSet::new();
        for assignment in object {
            let key = assignment.key.node.as_str();
            if !seen.insert(key) {
                self.errors.push(ClipError::DuplicateField {
                    context: context.clone(),
                    entity: entity.clone(),
                    field: key.to_string(),
                    position: self.position(assignment.key.span),
                });
            }
        }

        Some(Block {
            context,
            entity,
            object,
            position: self.position(value.span),
        })
    }

    fn required<'doc>(&mut self, block: &Block<'doc>, field: &str) -> Option<&'doc Spanned<SyntaxValue>> {
        let value = block.get(field);
        if value.is_none() {
            self.errors.push(ClipError::MissingField {
                context: block.context.clone(),
                entity: block.entity.clone(),
                field: field.to_string(),
                position: Some(block.position),
            });
        }
        value
    }

    fn required_string(&mut self, block: &Block<'_>, field: &str) -> Option<String> {
        let value = self.required(block, field)?;
        self.string(block.scope(), field, value)
    }

    fn optional_string(&mut self, block: &Block<'_>, field: &str) -> Option<String> {
        let value = block.get(field)?;
        self.string(block.scope(), field, value)
    }

    fn string(&mut self, scope: Scope<'_>, field: &str, value: &Spanned<SyntaxValue>) -> Option<String> {
        match &value.node {
            SyntaxValue::String(s) => Some(s.clone()),
            _ => {
                self.type_error(scope, field, "a string", value);
                None
            }
        }
    }

    fn optional_bool(&mut self, block: &Block<'_>, field: &str) -> Option<bool> {
        let value = block.get(field)?;
        match value.node {
            SyntaxValue::Bool(b) => Some(b),
            _ => {
                self.type_error(block.scope(), field, "true or false", value);
                None
            }
        }
    }

    fn required_number(&mut self, block: &Block<'_>, field: &str) -> Option<f64> {
        let value = self.required(block, field)?;
        self.number(block.scope(), field, value)
    }

    fn optional_number(&mut self, block: &Block<'_>, field: &str) -> Option<f64> {
        let value = block.get(field)?;
        self.number(block.scope(), field, value)
    }

    fn number(&mut self, scope: Scope<'_>, field: &str, value: &Spanned<SyntaxValue>) -> Option<f64> {
        match value.node {
            SyntaxValue::Number(n) => Some(n),
            _ => {
                self.type_error(scope, field, "a number", value);
                None
            }
        }
    }

    /// A whole number that fits in a `u32`
    fn count(
        &mut self,
        scope: Scope<'_>,
        field: &str,
        value: &Spanned<SyntaxValue>,
        allow_zero: bool,
    ) -> Option<u32> {
        let n = self.number(scope, field, value)?;
        let min = if allow_zero { 0.0 } else { 1.0 };

        if n.fract() != 0.0 || n < min || n > f64::from(u32::MAX) {
            let expected = if allow_zero {
                "a non-negative integer"
            } else {
                "a positive integer"
            };
            self.errors.push(ClipError::Type {
                context: scope.context.to_string(),
                entity: scope.entity.map(str::to_string),
                field: field.to_string(),
                expected: expected.to_string(),
                found: format!("number {}", n),
                position: self.position(value.span),
            });
            return None;
        }
        Some(n as u32)
    }

    /// A string field restricted to a fixed set of spellings
    fn enumeration<T>(
        &mut self,
        block: &Block<'_>,
        field: &str,
        names: &[&str],
        from_name: fn(&str) -> Option<T>,
    ) -> Option<T> {
        let value = block.get(field)?;
        let name = self.string(block.scope(), field, value)?;

        let parsed = from_name(&name);
        if parsed.is_none() {
            self.errors.push(ClipError::InvalidEnum {
                context: block.context.clone(),
                entity: block.entity.clone(),
                field: field.to_string(),
                value: name,
                expected: names
                    .iter()
                    .map(|n| format!("\"{}\"", n))
                    .collect::<Vec<_>>()
                    .join(", "),
                position: self.position(value.span),
            });
        }
        parsed
    }

    fn optional_numbers<const N: usize>(&mut self, block: &Block<'_>, field: &str) -> Option<[f64; N]> {
        let value = block.get(field)?;
        self.numbers::<N>(block.scope(), field, value)
    }

    /// A fixed-size array of numbers such as a vector or quaternion
    fn numbers<const N: usize>(
        &mut self,
        scope: Scope<'_>,
        field: &str,
        value: &Spanned<SyntaxValue>,
    ) -> Option<[f64; N]> {
        let Some(items) = value.node.as_array() else {
            self.type_error(scope, field, &format!("an array of {} numbers", N), value);
            return None;
        };

        if items.len() != N {
            self.errors.push(ClipError::MalformedVector {
                context: scope.context.to_string(),
                entity: scope.entity.map(str::to_string),
                field: field.to_string(),
                expected: N,
                found: items.len(),
                position: self.position(value.span),
            });
            return None;
        }

        let mut out = [0.0; N];
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match self.component(scope, &format!("{}[{}]", field, i), item) {
                Some(n) => out[i] = n,
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    /// One vector component. Binary-exact clips may store it as the
    /// hexadecimal bit pattern of an `f64`.
    fn component(&mut self, scope: Scope<'_>, field: &str, value: &Spanned<SyntaxValue>) -> Option<f64> {
        match &value.node {
            SyntaxValue::String(bits) if self.binary_exact => match decode_bits(bits) {
                Some(n) => Some(n),
                None => {
                    self.type_error(scope, field, "a hex-encoded number", value);
                    None
                }
            },
            _ => self.number(scope, field, value),
        }
    }

    /// A track sequence. Absent and empty are the same thing.
    fn sequence<const N: usize>(&mut self, block: &Block<'_>, kind: SequenceKind) -> Vec<[f64; N]> {
        let field = kind.as_str();
        let Some(value) = block.get(field) else {
            return Vec::new();
        };
        let Some(items) = value.node.as_array() else {
            self.type_error(block.scope(), field, "an array", value);
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.numbers::<N>(block.scope(), &format!("{}[{}]", field, i), item))
            .collect()
    }

    fn type_error(&mut self, scope: Scope<'_>, field: &str, expected: &str, value: &Spanned<SyntaxValue>) {
        self.errors.push(ClipError::Type {
            context: scope.context.to_string(),
            entity: scope.entity.map(str::to_string),
            field: field.to_string(),
            expected: expected.to_string(),
            found: value.node.kind_name().to_string(),
            position: self.position(value.span),
        });
    }

    fn position(&self, span: Span) -> Position {
        self.index.position(span.start)
    }
}

fn quat([x, y, z, w]: [f64; 4]) -> DQuat {
    DQuat::from_xyzw(x, y, z, w)
}

/// Up to 16 hex digits holding the bits of an `f64`
fn decode_bits(text: &str) -> Option<f64> {
    if text.is_empty() || text.len() > 16 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(text, 16).ok().map(f64::from_bits)
}

/// Bind a parsed document with default settings
pub fn bind(source: &str, document: &Object) -> Result<RawClip, ClipErrors> {
    Binder::new(source, &ReaderConfig::default()).bind(document)
}
