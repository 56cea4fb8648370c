//! Validated clip data
//!
//! A [`Clip`] only comes out of the reader once every cross-entity rule
//! holds: bone names are unique, the skeleton is a single tree, every track
//! names a real bone at most once, and every non-empty track sequence has
//! exactly `num_samples` entries. Bones and tracks refer to each other by
//! name; the indices below are derived from those names once at
//! construction.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Vertex distance used when a bone does not specify one
pub const DEFAULT_VERTEX_DISTANCE: f64 = 1.0;

/// Error threshold used when the clip header does not specify one
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.0;

/// Additive base sample count when the header does not give one
pub const DEFAULT_ADDITIVE_BASE_NUM_SAMPLES: u32 = 1;

/// Additive base sample rate when the header does not give one
pub const DEFAULT_ADDITIVE_BASE_SAMPLE_RATE: f64 = 30.0;

/// Space the track samples are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceFrame {
    Object,
    #[default]
    Local,
}

impl ReferenceFrame {
    pub const NAMES: [&'static str; 2] = ["object", "local"];

    /// Parse the file spelling. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "object" => Some(ReferenceFrame::Object),
            "local" => Some(ReferenceFrame::Local),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceFrame::Object => "object",
            ReferenceFrame::Local => "local",
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the clip's samples combine with its additive base clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AdditiveFormat {
    /// Not an additive clip
    #[default]
    None,
    Relative,
    Additive0,
    Additive1,
}

impl AdditiveFormat {
    pub const NAMES: [&'static str; 4] = ["None", "Relative", "Additive0", "Additive1"];

    /// Parse the file spelling, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        [
            AdditiveFormat::None,
            AdditiveFormat::Relative,
            AdditiveFormat::Additive0,
            AdditiveFormat::Additive1,
        ]
        .into_iter()
        .find(|format| format.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdditiveFormat::None => "None",
            AdditiveFormat::Relative => "Relative",
            AdditiveFormat::Additive0 => "Additive0",
            AdditiveFormat::Additive1 => "Additive1",
        }
    }

    pub fn is_additive(&self) -> bool {
        *self != AdditiveFormat::None
    }
}

impl fmt::Display for AdditiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three per-bone sample sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
    Rotations,
    Translations,
    Scales,
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 3] = [
        SequenceKind::Rotations,
        SequenceKind::Translations,
        SequenceKind::Scales,
    ];

    /// Key used for the sequence in a track block
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceKind::Rotations => "rotations",
            SequenceKind::Translations => "translations",
            SequenceKind::Scales => "scales",
        }
    }

    /// Numbers per sample: quaternions have four, vectors three
    pub fn arity(&self) -> usize {
        match self {
            SequenceKind::Rotations => 4,
            SequenceKind::Translations | SequenceKind::Scales => 3,
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clip-wide settings from the `clip` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipHeader {
    pub name: String,
    pub num_samples: u32,
    pub sample_rate: f64,
    pub error_threshold: f64,
    pub reference_frame: ReferenceFrame,
    /// Bind poses and samples are stored as hex-encoded `f64` bit patterns
    pub is_binary_exact: bool,
    pub additive_format: AdditiveFormat,
    pub additive_base_name: String,
    pub additive_base_num_samples: u32,
    pub additive_base_sample_rate: f64,
}

impl ClipHeader {
    /// A header with every optional field at its default
    pub fn new(name: impl Into<String>, num_samples: u32, sample_rate: f64) -> Self {
        Self {
            name: name.into(),
            num_samples,
            sample_rate,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            reference_frame: ReferenceFrame::default(),
            is_binary_exact: false,
            additive_format: AdditiveFormat::default(),
            additive_base_name: String::new(),
            additive_base_num_samples: DEFAULT_ADDITIVE_BASE_NUM_SAMPLES,
            additive_base_sample_rate: DEFAULT_ADDITIVE_BASE_SAMPLE_RATE,
        }
    }
}

/// A skeleton bone and its bind pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Empty for the root bone
    pub parent: String,
    pub vertex_distance: f64,
    pub bind_rotation: DQuat,
    pub bind_translation: DVec3,
    pub bind_scale: DVec3,
}

impl Bone {
    /// A bone with the default bind pose
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            vertex_distance: DEFAULT_VERTEX_DISTANCE,
            bind_rotation: DQuat::IDENTITY,
            bind_translation: DVec3::ZERO,
            bind_scale: DVec3::ONE,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Animation samples for one bone. An empty sequence means the bone is not
/// animated on that channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    pub bone_name: String,
    pub rotations: Vec<DQuat>,
    pub translations: Vec<DVec3>,
    pub scales: Vec<DVec3>,
}

impl Track {
    pub fn new(bone_name: impl Into<String>) -> Self {
        Self {
            bone_name: bone_name.into(),
            ..Self::default()
        }
    }

    pub fn sequence_len(&self, kind: SequenceKind) -> usize {
        match kind {
            SequenceKind::Rotations => self.rotations.len(),
            SequenceKind::Translations => self.translations.len(),
            SequenceKind::Scales => self.scales.len(),
        }
    }

    /// True when the track animates nothing
    pub fn is_inert(&self) -> bool {
        SequenceKind::ALL.iter().all(|kind| self.sequence_len(*kind) == 0)
    }
}

/// A validated animation clip. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    header: ClipHeader,
    bones: Vec<Bone>,
    tracks: Vec<Track>,
    #[serde(skip)]
    bone_indices: HashMap<String, usize>,
    #[serde(skip)]
    parent_indices: Vec<Option<usize>>,
}

impl Clip {
    /// Assemble a clip whose invariants have already been checked
    pub(crate) fn from_validated(header: ClipHeader, bones: Vec<Bone>, tracks: Vec<Track>) -> Self {
        let bone_indices: HashMap<String, usize> = bones
            .iter()
            .enumerate()
            .map(|(index, bone)| (bone.name.clone(), index))
            .collect();
        let parent_indices = bones
            .iter()
            .map(|bone| bone_indices.get(&bone.parent).copied())
            .collect();

        Self {
            header,
            bones,
            tracks,
            bone_indices,
            parent_indices,
        }
    }

    pub fn header(&self) -> &ClipHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn num_samples(&self) -> u32 {
        self.header.num_samples
    }

    pub fn sample_rate(&self) -> f64 {
        self.header.sample_rate
    }

    pub fn error_threshold(&self) -> f64 {
        self.header.error_threshold
    }

    pub fn reference_frame(&self) -> ReferenceFrame {
        self.header.reference_frame
    }

    /// Length in seconds from the first to the last sample
    pub fn duration(&self) -> f64 {
        if self.header.num_samples < 2 {
            return 0.0;
        }
        f64::from(self.header.num_samples - 1) / self.header.sample_rate
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_indices.get(name).copied()
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bone_index(name).map(|index| &self.bones[index])
    }

    /// Index of a bone's parent, `None` for the root or an out-of-range index
    pub fn parent_index(&self, bone_index: usize) -> Option<usize> {
        self.parent_indices.get(bone_index).copied().flatten()
    }

    /// `None` only for a skeleton without bones
    pub fn root_index(&self) -> Option<usize> {
        self.bones.iter().position(Bone::is_root)
    }

    pub fn root(&self) -> Option<&Bone> {
        self.root_index().map(|index| &self.bones[index])
    }

    /// Track animating the named bone, if any
    pub fn track(&self, bone_name: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.bone_name == bone_name)
    }

    pub fn into_parts(self) -> (ClipHeader, Vec<Bone>, Vec<Track>) {
        (self.header, self.bones, self.tracks)
    }
}
