//! Canonical text output for clips
//!
//! The writer goes through the same generic syntax tree the parser produces,
//! so reading its output back yields an equal [`Clip`]. Every string in a
//! clip either came from the parser or passed the reader's name check, so
//! none of them holds a `"`.

use crate::model::{Bone, Clip, ClipHeader, Track};
use animclip_parser::{Object, Serializer, Span, Spanned, SyntaxValue};
use glam::{DQuat, DVec3};

/// Format version written by [`write_clip`]
pub const WRITE_VERSION: u32 = 1;

/// Build the syntax tree for a clip
pub fn to_syntax(clip: &Clip) -> Object {
    let exact = clip.header().is_binary_exact;
    Object::new()
        .with("version", SyntaxValue::Number(f64::from(WRITE_VERSION)))
        .with("clip", SyntaxValue::Object(header_object(clip.header())))
        .with("bones", list(clip.bones().iter().map(|bone| bone_object(bone, exact))))
        .with("tracks", list(clip.tracks().iter().map(|track| track_object(track, exact))))
}

/// Write a clip in the text format
pub fn write_clip(clip: &Clip) -> String {
    Serializer::new().serialize(&to_syntax(clip))
}

fn header_object(header: &ClipHeader) -> Object {
    Object::new()
        .with("name", string(&header.name))
        .with("num_samples", SyntaxValue::Number(f64::from(header.num_samples)))
        .with("sample_rate", SyntaxValue::Number(header.sample_rate))
        .with("error_threshold", SyntaxValue::Number(header.error_threshold))
        .with("reference_frame", string(header.reference_frame.as_str()))
        .with("is_binary_exact", SyntaxValue::Bool(header.is_binary_exact))
        .with("additive_format", string(header.additive_format.as_str()))
        .with("additive_base_name", string(&header.additive_base_name))
        .with(
            "additive_base_num_samples",
            SyntaxValue::Number(f64::from(header.additive_base_num_samples)),
        )
        .with(
            "additive_base_sample_rate",
            SyntaxValue::Number(header.additive_base_sample_rate),
        )
}

fn bone_object(bone: &Bone, exact: bool) -> SyntaxValue {
    SyntaxValue::Object(
        Object::new()
            .with("name", string(&bone.name))
            .with("parent", string(&bone.parent))
            .with("vertex_distance", SyntaxValue::Number(bone.vertex_distance))
            .with("bind_rotation", quat(bone.bind_rotation, exact))
            .with("bind_translation", vec3(bone.bind_translation, exact))
            .with("bind_scale", vec3(bone.bind_scale, exact)),
    )
}

fn track_object(track: &Track, exact: bool) -> SyntaxValue {
    let mut object = Object::new().with("name", string(&track.bone_name));

    // Empty sequences are the same as absent ones
    if !track.rotations.is_empty() {
        object.push("rotations", list(track.rotations.iter().map(|q| quat(*q, exact))));
    }
    if !track.translations.is_empty() {
        object.push("translations", list(track.translations.iter().map(|v| vec3(*v, exact))));
    }
    if !track.scales.is_empty() {
        object.push("scales", list(track.scales.iter().map(|v| vec3(*v, exact))));
    }

    SyntaxValue::Object(object)
}

fn string(s: &str) -> SyntaxValue {
    SyntaxValue::String(s.to_string())
}

fn quat(q: DQuat, exact: bool) -> SyntaxValue {
    numbers(&q.to_array(), exact)
}

fn vec3(v: DVec3, exact: bool) -> SyntaxValue {
    numbers(&v.to_array(), exact)
}

/// Decimal numbers, or hex bit patterns for binary-exact clips
fn numbers(values: &[f64], exact: bool) -> SyntaxValue {
    list(values.iter().map(|n| {
        if exact {
            SyntaxValue::String(format!("{:016x}", n.to_bits()))
        } else {
            SyntaxValue::Number(*n)
        }
    }))
}

fn list(items: impl Iterator<Item = SyntaxValue>) -> SyntaxValue {
    SyntaxValue::Array(
        items
            .map(|item| Spanned::new(item, Span::default()))
            .collect(),
    )
}
