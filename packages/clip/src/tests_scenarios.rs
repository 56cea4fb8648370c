//! End-to-end reading of whole clip files
use crate::*;

const SCENARIO_A: &str = r#"
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

fn clip_with(bones: &str, tracks: &str) -> String {
    format!(
        "clip = {{ name = \"t\" num_samples = 2 sample_rate = 30 }}\nbones = [ {} ]\ntracks = [ {} ]\n",
        bones, tracks
    )
}

#[test]
fn test_scenario_a_sample_count_mismatch_per_sequence() {
    assert!(animclip_parser::parse(SCENARIO_A).is_ok());

    let errors = read_clip(SCENARIO_A).unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::SampleCountMismatch; 3]);

    let kinds: Vec<SequenceKind> = errors
        .iter()
        .map(|error| match error {
            ClipError::SampleCountMismatch {
                bone,
                kind,
                expected,
                actual,
            } => {
                assert_eq!(bone, "root");
                assert_eq!(*expected, 73);
                assert_eq!(*actual, 2);
                *kind
            }
            other => panic!("Expected sample count mismatch, got {:?}", other),
        })
        .collect();
    assert_eq!(kinds, SequenceKind::ALL.to_vec());
    assert!(errors.iter().all(|e| e.entity() != Some("bone1")));
}

#[test]
fn test_scenario_a_fixed_reads() {
    let source = SCENARIO_A.replace("num_samples = 73", "num_samples = 2");
    let clip = read_clip(&source).unwrap();

    assert_eq!(clip.name(), "A clip");
    assert_eq!(clip.sample_rate(), 30.0);
    assert_eq!(clip.error_threshold(), 0.01);
    assert_eq!(clip.reference_frame(), ReferenceFrame::Object);
    assert_eq!(clip.root().map(|bone| bone.name.as_str()), Some("root"));
    assert_eq!(clip.parent_index(1), Some(0));
    assert!(clip.track("bone1").is_none());

    let track = clip.track("root").unwrap();
    assert_eq!(track.scales[1], glam::DVec3::splat(2.0));
    assert!((clip.duration() - 1.0 / 30.0).abs() < 1e-12);
}

#[test]
fn test_scenario_b_two_roots() {
    let source = clip_with(
        r#"{ name = "a" parent = "" } { name = "b" parent = "" }"#,
        "",
    );
    let errors = read_clip(&source).unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::MultipleRoots]);
}

#[test]
fn test_scenario_c_dangling_parent() {
    let source = clip_with(
        r#"{ name = "root" parent = "" } { name = "arm" parent = "ghost" }"#,
        "",
    );
    let errors = read_clip(&source).unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::DanglingParent]);
    assert!(errors.to_string().contains("ghost"));
}

#[test]
fn test_scenario_d_tracks_before_bones() {
    // The bones are broken too, but ordering is reported alone
    let source = r#"
        clip = { num_samples = 2 sample_rate = 30 }
        tracks = [ { name = "nobody" rotations = [ [ 0 0 0 ] ] } ]
        bones = [ { name = "a" parent = "x" } { name = "a" parent = "" } ]
    "#;
    let errors = read_clip(source).unwrap_err();
    assert_eq!(errors.len(), 1);
    match errors.first() {
        Some(ClipError::Order {
            early,
            expected_first,
            position,
        }) => {
            assert_eq!(early, "tracks");
            assert_eq!(expected_first, "bones");
            assert_eq!(position.line, 3);
        }
        other => panic!("Expected order error, got {:?}", other),
    }
}

#[test]
fn test_scenario_e_empty_file() {
    for source in ["", "   \n", "// nothing but a comment\n"] {
        let errors = read_clip(source).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors.first(),
            Some(ClipError::MissingField { field, position: None, .. }) if field == "clip"
        ));
    }
}

#[test]
fn test_order_error_regardless_of_content() {
    let sources = [
        "bones = [] clip = { num_samples = 0 sample_rate = 30 } tracks = []",
        "bones = 3 clip = \"nonsense\" tracks = []",
        "tracks = [] clip = {} bones = []",
    ];
    for source in sources {
        assert_eq!(read_clip(source).unwrap_err().kinds(), vec![ErrorKind::Order], "{}", source);
    }
}

#[test]
fn test_lex_error_is_fatal_and_alone() {
    let source = SCENARIO_A.replace("[ 0 0 0 1 ]", "[ 0, 0, 0, 1 ]");
    let errors = read_clip(&source).unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::Lex]);
    let position = errors.first().and_then(ClipError::position).unwrap();
    assert_eq!(position.line, 16);
}

#[test]
fn test_syntax_error_is_fatal_and_alone() {
    let errors = read_clip("clip = { num_samples 2 }").unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::Syntax]);
}

#[test]
fn test_binder_errors_skip_validation() {
    // Two roots would also fail validation; only the binding problem shows
    let source = clip_with(
        r#"{ name = "a" parent = "" vertex_distance = "far" } { name = "b" parent = "" }"#,
        "",
    );
    let errors = read_clip(&source).unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::Type]);
    assert_eq!(errors.first().and_then(ClipError::entity), Some("a"));
    assert!(errors.to_string().contains("of bone 'a'"));
}

#[test]
fn test_many_validation_errors_in_one_pass() {
    let source = r#"
        clip = { num_samples = 1 sample_rate = -30 error_threshold = -1 }
        bones = [
            { name = "a" parent = "" vertex_distance = 0 }
            { name = "a" parent = "a" }
            { name = "c" parent = "d" }
        ]
        tracks = [
            { name = "a" scales = [ [ 1 1 1 ] [ 1 1 1 ] ] }
            { name = "a" }
            { name = "zz" }
        ]
    "#;
    let errors = read_clip(source).unwrap_err();
    assert_eq!(
        errors.kinds(),
        vec![
            ErrorKind::DuplicateBone,
            ErrorKind::DanglingParent,
            ErrorKind::UnknownTrackBone,
            ErrorKind::DuplicateTrack,
            ErrorKind::SampleCountMismatch,
            ErrorKind::Range,
            ErrorKind::Range,
            ErrorKind::Range,
        ]
    );
}

#[test]
fn test_inert_track_and_empty_sequences() {
    let source = clip_with(
        r#"{ name = "root" parent = "" }"#,
        r#"{ name = "root" rotations = [] translations = [] }"#,
    );
    let clip = read_clip(&source).unwrap();
    assert!(clip.tracks()[0].is_inert());
}

#[test]
fn test_zero_samples() {
    let source = r#"
        clip = { num_samples = 0 sample_rate = 30 }
        bones = [ { name = "root" parent = "" } ]
        tracks = [ { name = "root" rotations = [] } ]
    "#;
    let clip = read_clip(source).unwrap();
    assert_eq!(clip.num_samples(), 0);
    assert_eq!(clip.duration(), 0.0);
}

#[test]
fn test_valid_clip_invariants() {
    let source = clip_with(
        r#"
        { name = "hand" parent = "arm" }
        { name = "arm" parent = "spine" }
        { name = "root" parent = "" }
        { name = "spine" parent = "root" }
        "#,
        r#"
        { name = "arm" rotations = [ [ 0 0 0 1 ] [ 0 0 0 1 ] ] }
        { name = "root" translations = [ [ 0 0 0 ] [ 0 1 0 ] ] }
        "#,
    );
    let clip = read_clip(&source).unwrap();

    let roots: Vec<_> = clip.bones().iter().filter(|b| b.is_root()).collect();
    assert_eq!(roots.len(), 1);

    let root = clip.root_index().unwrap();
    for start in 0..clip.bones().len() {
        let mut current = start;
        let mut steps = 0;
        while let Some(parent) = clip.parent_index(current) {
            current = parent;
            steps += 1;
            assert!(steps <= clip.bones().len());
        }
        assert_eq!(current, root);
    }

    for track in clip.tracks() {
        for kind in SequenceKind::ALL {
            let len = track.sequence_len(kind);
            assert!(len == 0 || len == clip.num_samples() as usize);
        }
    }
}

#[test]
fn test_comments_everywhere() {
    let source = r#"
        /* header */ clip = { num_samples = 1 // samples
            sample_rate = 30 /* per second */ }
        bones = [ /* one */ { name = "root" parent = "" } ]
        tracks = [] // none
    "#;
    assert!(read_clip(source).is_ok());
}

#[cfg(feature = "pretty-errors")]
#[test]
fn test_format_errors_for_scenario_a() {
    let errors = read_clip(SCENARIO_A).unwrap_err();
    let rendered = format_errors(SCENARIO_A, "a.acl.js", &errors);
    assert!(rendered.contains("sample_count_mismatch"));
    assert!(rendered.contains("rotations"));
}
