//! Parser tests over complete clip files
use crate::*;

const SAMPLE_CLIP: &str = r#"
// Example clip
clip = {
	name = "A clip"
	num_samples = 73
	sample_rate = 30
	error_threshold = 0.01
	reference_frame = "object"
}

bones = [
	{
		name = "root"
		parent = ""
		vertex_distance = 1.0
		bind_rotation = [ 0 0 0 1 ]
		bind_translation = [ 0 0 0 ]
		bind_scale = [ 1 1 1 ]
	}
	{
		name = "bone1"
		parent = "root"
		vertex_distance = 1.0
		bind_rotation = [ 0 0 0 1 ]
		bind_translation = [ 0 0 0 ]
		bind_scale = [ 1 1 1 ]
	}
]

tracks = [
	{
		name = "root"
		rotations = [
			[ 0 0 0 1 ]
			[ 1 0 0 0 ]
		]
		translations = [
			[ 0 0 0 ]
			[ 1 1 1 ]
		]
		scales = [
			[ 1 1 1 ]
			[ 2 2 2 ]
		]
	}
]
"#;

#[test]
fn test_parse_sample_clip_sections_in_order() {
    let doc = parse(SAMPLE_CLIP).expect("Should parse successfully");
    assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["clip", "bones", "tracks"]);
}

#[test]
fn test_parse_sample_clip_header() {
    let doc = parse(SAMPLE_CLIP).unwrap();
    let clip = doc.get("clip").unwrap().value.node.as_object().unwrap();

    assert_eq!(clip.get("name").unwrap().value.node.as_str(), Some("A clip"));
    assert_eq!(clip.get("num_samples").unwrap().value.node.as_number(), Some(73.0));
    assert_eq!(clip.get("sample_rate").unwrap().value.node.as_number(), Some(30.0));
    assert_eq!(clip.get("error_threshold").unwrap().value.node.as_number(), Some(0.01));
    assert_eq!(clip.get("reference_frame").unwrap().value.node.as_str(), Some("object"));
}

#[test]
fn test_parse_sample_clip_bones() {
    let doc = parse(SAMPLE_CLIP).unwrap();
    let bones = doc.get("bones").unwrap().value.node.as_array().unwrap();
    assert_eq!(bones.len(), 2);

    let bone1 = bones[1].node.as_object().unwrap();
    assert_eq!(bone1.get("parent").unwrap().value.node.as_str(), Some("root"));
    let rotation = bone1.get("bind_rotation").unwrap().value.node.as_array().unwrap();
    let values: Vec<f64> = rotation.iter().filter_map(|v| v.node.as_number()).collect();
    assert_eq!(values, vec![0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_parse_sample_clip_tracks() {
    let doc = parse(SAMPLE_CLIP).unwrap();
    let tracks = doc.get("tracks").unwrap().value.node.as_array().unwrap();
    let track = tracks[0].node.as_object().unwrap();

    for key in ["rotations", "translations", "scales"] {
        let samples = track.get(key).unwrap().value.node.as_array().unwrap();
        assert_eq!(samples.len(), 2, "{} should have two samples", key);
    }
}

#[test]
fn test_error_position_points_into_file() {
    let source = "clip = {\n\tname = \"x\"\n\tnum_samples 3\n}";
    let error = parse(source).unwrap_err();
    let position = error.position();
    assert_eq!(position.line, 3);
    assert_eq!(position.column, 14);
}

#[test]
fn test_comma_separated_array_is_rejected() {
    let error = parse("bind_rotation = [ 0, 0, 0, 1 ]").unwrap_err();
    assert!(matches!(error, ParseError::Lex { found: ',', .. }));
}

#[test]
fn test_key_order_is_preserved_inside_objects() {
    let doc = parse("clip = { z = 1 a = 2 m = 3 }").unwrap();
    let clip = doc.get("clip").unwrap().value.node.as_object().unwrap();
    assert_eq!(clip.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
}

#[test]
fn test_unclosed_array_in_bones() {
    let source = r#"bones = [ { name = "root" parent = "" }"#;
    let error = parse(source).unwrap_err();
    match error {
        ParseError::Syntax { expected, found, .. } => {
            assert_eq!(expected, "a value or ']'");
            assert_eq!(found, "end of input");
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}
