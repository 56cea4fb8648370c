use crate::ast::{Object, Spanned, SyntaxValue};

/// Serializer converts a syntax tree back to source text
///
/// Output is canonical rather than lossless: comments and source
/// whitespace are gone, arrays of scalars are written on one line and
/// everything else is broken over indented lines. Parsing the output yields
/// the same tree (spans aside).
///
/// Strings are written verbatim between quotes. The format has no escapes,
/// so a string containing `"` cannot be written; see [`is_representable`].
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "\t".to_string(),
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a top-level object to source text
    pub fn serialize(&mut self, doc: &Object) -> String {
        let mut output = String::new();

        for (i, assignment) in doc.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            self.serialize_assignment(&assignment.key.node, &assignment.value.node, &mut output);
        }

        output
    }

    fn serialize_assignment(&mut self, key: &str, value: &SyntaxValue, output: &mut String) {
        self.write_indent(output);
        output.push_str(key);
        output.push_str(" = ");
        self.serialize_value(value, output);
        output.push('\n');
    }

    fn serialize_value(&mut self, value: &SyntaxValue, output: &mut String) {
        match value {
            SyntaxValue::String(s) => {
                output.push('"');
                output.push_str(s);
                output.push('"');
            }
            SyntaxValue::Number(n) => output.push_str(&format_number(*n)),
            SyntaxValue::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
            SyntaxValue::Array(items) => self.serialize_array(items, output),
            SyntaxValue::Object(object) => self.serialize_object(object, output),
        }
    }

    fn serialize_array(&mut self, items: &[Spanned<SyntaxValue>], output: &mut String) {
        if items.is_empty() {
            output.push_str("[]");
            return;
        }

        let is_flat = items
            .iter()
            .all(|item| matches!(
                item.node,
                SyntaxValue::String(_) | SyntaxValue::Number(_) | SyntaxValue::Bool(_)
            ));

        if is_flat {
            output.push_str("[ ");
            for item in items {
                self.serialize_value(&item.node, output);
                output.push(' ');
            }
            output.push(']');
            return;
        }

        output.push_str("[\n");
        self.indent_level += 1;
        for item in items {
            self.write_indent(output);
            self.serialize_value(&item.node, output);
            output.push('\n');
        }
        self.indent_level -= 1;
        self.write_indent(output);
        output.push(']');
    }

    fn serialize_object(&mut self, object: &Object, output: &mut String) {
        if object.is_empty() {
            output.push_str("{}");
            return;
        }

        output.push_str("{\n");
        self.indent_level += 1;
        for assignment in object {
            self.serialize_assignment(&assignment.key.node, &assignment.value.node, output);
        }
        self.indent_level -= 1;
        self.write_indent(output);
        output.push('}');
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

/// Shortest decimal text that parses back to exactly `value`
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Whether `value` can be written as a string literal
pub fn is_representable(value: &str) -> bool {
    !value.contains('"')
}

/// Serialize a top-level object with the default indentation
pub fn serialize(doc: &Object) -> String {
    Serializer::new().serialize(doc)
}
