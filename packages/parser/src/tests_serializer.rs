//! Tests to verify the serializer round-trips parsed trees
use crate::*;

fn strip_spans(value: &SyntaxValue) -> SyntaxValue {
    match value {
        SyntaxValue::Array(items) => SyntaxValue::Array(
            items
                .iter()
                .map(|item| Spanned::new(strip_spans(&item.node), Span::default()))
                .collect(),
        ),
        SyntaxValue::Object(object) => SyntaxValue::Object(strip_object(object)),
        other => other.clone(),
    }
}

fn strip_object(object: &Object) -> Object {
    let mut stripped = Object::new();
    for assignment in object {
        stripped.push(assignment.key.node.clone(), strip_spans(&assignment.value.node));
    }
    stripped
}

#[test]
fn test_roundtrip_sources() {
    let sources = vec![
        r#"clip = { name = "walk" num_samples = 2 sample_rate = 30 }"#,
        "q = [ 0 0 0 1 ]",
        "nested = [ [ 1 2 3 ] [ 4 5 6 ] ]",
        "exact = true flags = [ false true ]",
        r#"bones = [ { name = "root" parent = "" } { name = "b" parent = "root" } ]"#,
        "empty = [] also = {}",
        "numbers = [ -0.000001 1e10 3.25 -7 ]",
        "a = 1 a = 2",
    ];

    for source in sources {
        let doc = parse(source).unwrap_or_else(|e| panic!("Failed to parse {}: {}", source, e));
        let serialized = serialize(&doc);
        let reparsed = parse(&serialized)
            .unwrap_or_else(|e| panic!("Failed to reparse {}: {}", serialized, e));

        assert_eq!(strip_object(&doc), strip_object(&reparsed), "source: {}", source);
    }
}

#[test]
fn test_roundtrip_is_stable() {
    let source = r#"tracks = [ { name = "root" rotations = [ [ 0 0 0 1 ] ] } ]"#;
    let once = serialize(&parse(source).unwrap());
    let twice = serialize(&parse(&once).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn test_serialized_array_of_objects_layout() {
    let doc = parse(r#"bones = [ { name = "root" } ]"#).unwrap();
    let output = Serializer::with_indent("  ").serialize(&doc);
    assert_eq!(output, "bones = [\n  {\n    name = \"root\"\n  }\n]\n");
}
