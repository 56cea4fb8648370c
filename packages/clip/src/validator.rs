//! Cross-entity checks on a bound clip
//!
//! Every rule runs on every input and all failures are reported together, in
//! rule order. Rules only read the candidate, so the outcome depends on
//! nothing but the input.

use crate::binder::RawClip;
use crate::error::{ClipError, ClipErrors};
use crate::model::{Clip, SequenceKind};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// What a rule sees: the candidate plus a name lookup built once
pub struct ValidationContext<'a> {
    pub clip: &'a RawClip,
    /// First declaration of each bone name
    pub bone_indices: HashMap<&'a str, usize>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(clip: &'a RawClip) -> Self {
        let mut bone_indices = HashMap::with_capacity(clip.bones.len());
        for (index, bone) in clip.bones.iter().enumerate() {
            bone_indices.entry(bone.name.as_str()).or_insert(index);
        }
        Self { clip, bone_indices }
    }

    /// Index of the named bone's parent. `None` for roots and unknown parents.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        let bone = &self.clip.bones[index];
        if bone.is_root() {
            return None;
        }
        self.bone_indices.get(bone.parent.as_str()).copied()
    }
}

/// A single consistency check
pub trait ValidationRule {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>);
}

/// Bone names must be unique
pub struct UniqueBoneNames;

impl ValidationRule for UniqueBoneNames {
    fn name(&self) -> &'static str {
        "unique-bone-names"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for bone in &context.clip.bones {
            let name = bone.name.as_str();
            if !seen.insert(name) && reported.insert(name) {
                errors.push(ClipError::DuplicateBone {
                    name: name.to_string(),
                });
            }
        }
    }
}

/// Exactly one bone has an empty parent
pub struct SingleRoot;

impl ValidationRule for SingleRoot {
    fn name(&self) -> &'static str {
        "single-root"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        let roots: Vec<String> = context
            .clip
            .bones
            .iter()
            .filter(|bone| bone.is_root())
            .map(|bone| bone.name.clone())
            .collect();

        match roots.len() {
            0 => errors.push(ClipError::NoRoot),
            1 => {}
            _ => errors.push(ClipError::MultipleRoots { roots }),
        }
    }
}

/// Every parent names a declared bone
pub struct ParentsResolve;

impl ValidationRule for ParentsResolve {
    fn name(&self) -> &'static str {
        "parents-resolve"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        for bone in &context.clip.bones {
            if !bone.is_root() && !context.bone_indices.contains_key(bone.parent.as_str()) {
                errors.push(ClipError::DanglingParent {
                    bone: bone.name.clone(),
                    parent: bone.parent.clone(),
                });
            }
        }
    }
}

/// No bone is its own ancestor
///
/// Each ancestor walk is bounded by the bone count. A cycle is reported once,
/// starting from its first-declared member; bones that merely lead into a
/// cycle are not reported separately.
pub struct AcyclicHierarchy;

impl ValidationRule for AcyclicHierarchy {
    fn name(&self) -> &'static str {
        "acyclic-hierarchy"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        let bones = &context.clip.bones;
        let mut reported: HashSet<usize> = HashSet::new();

        for start in 0..bones.len() {
            let mut visited = HashSet::new();
            let mut current = start;
            let mut steps = 0;

            let entry = loop {
                if !visited.insert(current) {
                    break Some(current);
                }
                if steps >= bones.len() {
                    break None;
                }
                steps += 1;
                match context.parent_of(current) {
                    Some(parent) => current = parent,
                    None => break None,
                }
            };

            let Some(entry) = entry else {
                continue;
            };

            let mut members = vec![entry];
            let mut next = context.parent_of(entry);
            while let Some(index) = next {
                if index == entry {
                    break;
                }
                members.push(index);
                next = context.parent_of(index);
            }

            let Some(&first) = members.iter().min() else {
                continue;
            };
            if !reported.insert(first) {
                continue;
            }

            // Walk from the first-declared member so the listing is stable
            let mut cycle = vec![bones[first].name.clone()];
            let mut next = context.parent_of(first);
            while let Some(index) = next {
                if index == first {
                    break;
                }
                cycle.push(bones[index].name.clone());
                next = context.parent_of(index);
            }
            cycle.push(bones[first].name.clone());

            errors.push(ClipError::CyclicHierarchy {
                bone: bones[first].name.clone(),
                cycle,
            });
        }
    }
}

/// Tracks name declared bones, at most once each
pub struct TrackReferences;

impl ValidationRule for TrackReferences {
    fn name(&self) -> &'static str {
        "track-references"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        for track in &context.clip.tracks {
            if !context.bone_indices.contains_key(track.bone_name.as_str()) {
                errors.push(ClipError::UnknownTrackBone {
                    bone: track.bone_name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for track in &context.clip.tracks {
            let name = track.bone_name.as_str();
            if !seen.insert(name) && reported.insert(name) {
                errors.push(ClipError::DuplicateTrack {
                    bone: name.to_string(),
                });
            }
        }
    }
}

/// Non-empty sequences have exactly `num_samples` entries
pub struct SampleCounts;

impl ValidationRule for SampleCounts {
    fn name(&self) -> &'static str {
        "sample-counts"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        let expected = context.clip.header.num_samples;
        for track in &context.clip.tracks {
            for kind in SequenceKind::ALL {
                let actual = track.sequence_len(kind);
                if actual != 0 && actual != expected as usize {
                    errors.push(ClipError::SampleCountMismatch {
                        bone: track.bone_name.clone(),
                        kind,
                        expected,
                        actual,
                    });
                }
            }
        }
    }
}

/// Numeric fields within their allowed ranges
pub struct Ranges;

impl ValidationRule for Ranges {
    fn name(&self) -> &'static str {
        "ranges"
    }

    fn check(&self, context: &ValidationContext<'_>, errors: &mut Vec<ClipError>) {
        let header = &context.clip.header;
        if header.sample_rate <= 0.0 {
            errors.push(range(None, "sample_rate", header.sample_rate, "greater than 0"));
        }
        if header.error_threshold < 0.0 {
            errors.push(range(None, "error_threshold", header.error_threshold, "at least 0"));
        }
        if header.additive_base_sample_rate <= 0.0 {
            errors.push(range(
                None,
                "additive_base_sample_rate",
                header.additive_base_sample_rate,
                "greater than 0",
            ));
        }
        for bone in &context.clip.bones {
            if bone.vertex_distance <= 0.0 {
                errors.push(range(
                    Some(bone.name.as_str()),
                    "vertex_distance",
                    bone.vertex_distance,
                    "greater than 0",
                ));
            }
        }
    }
}

fn range(bone: Option<&str>, field: &str, value: f64, requirement: &str) -> ClipError {
    ClipError::Range {
        bone: bone.map(str::to_string),
        field: field.to_string(),
        value,
        requirement: requirement.to_string(),
    }
}

/// Ordered set of rules applied to every bound clip. The built-in rules
/// always run first, so a validated [`Clip`] keeps its invariants whatever
/// else is added.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// All built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(UniqueBoneNames),
                Box::new(SingleRoot),
                Box::new(ParentsResolve),
                Box::new(AcyclicHierarchy),
                Box::new(TrackReferences),
                Box::new(SampleCounts),
                Box::new(Ranges),
            ],
        }
    }

    pub fn rules(&self) -> &[Box<dyn ValidationRule>] {
        &self.rules
    }

    /// Append a rule; it runs after the existing ones
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn check(&self, raw: &RawClip) -> Vec<ClipError> {
        let context = ValidationContext::new(raw);
        let mut errors = Vec::new();
        for rule in &self.rules {
            let before = errors.len();
            rule.check(&context, &mut errors);
            if errors.len() > before {
                debug!(rule = rule.name(), errors = errors.len() - before, "rule failed");
            }
        }
        errors
    }

    pub fn validate(&self, raw: RawClip) -> Result<Clip, ClipErrors> {
        let errors = self.check(&raw);
        if !errors.is_empty() {
            return Err(errors.into());
        }
        Ok(Clip::from_validated(raw.header, raw.bones, raw.tracks))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Validate with the built-in rules
pub fn validate(raw: RawClip) -> Result<Clip, ClipErrors> {
    Validator::new().validate(raw)
}
