//! Parser benchmarks

use animclip_parser::{parse, tokenize};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn generate_clip(num_bones: usize, num_samples: usize) -> String {
    let mut source = String::new();

    source.push_str(&format!(
        "clip = {{\n\tname = \"bench\"\n\tnum_samples = {}\n\tsample_rate = 30\n}}\n\n",
        num_samples
    ));

    source.push_str("bones = [\n");
    for i in 0..num_bones {
        let parent = if i == 0 { String::new() } else { format!("bone{}", i - 1) };
        source.push_str(&format!(
            "\t{{\n\t\tname = \"bone{}\"\n\t\tparent = \"{}\"\n\t\tvertex_distance = 1\n\t\tbind_rotation = [ 0 0 0 1 ]\n\t}}\n",
            i, parent
        ));
    }
    source.push_str("]\n\n");

    source.push_str("tracks = [\n");
    for i in 0..num_bones {
        source.push_str(&format!("\t{{\n\t\tname = \"bone{}\"\n\t\trotations = [\n", i));
        for s in 0..num_samples {
            source.push_str(&format!("\t\t\t[ 0 0 {} 1 ]\n", s as f64 * 0.001));
        }
        source.push_str("\t\t]\n\t\ttranslations = [\n");
        for s in 0..num_samples {
            source.push_str(&format!("\t\t\t[ {} 0 0 ]\n", s));
        }
        source.push_str("\t\t]\n\t}\n");
    }
    source.push_str("]\n");

    source
}

fn parse_small_clip(c: &mut Criterion) {
    let source = generate_clip(2, 10);

    c.bench_function("parse_small_clip", |b| {
        b.iter(|| parse(black_box(&source)))
    });
}

fn parse_large_clip(c: &mut Criterion) {
    let source = generate_clip(60, 120);

    c.bench_function("parse_large_clip", |b| {
        b.iter(|| parse(black_box(&source)))
    });
}

fn tokenize_only(c: &mut Criterion) {
    let source = generate_clip(60, 120);

    c.bench_function("tokenize_only", |b| {
        b.iter(|| tokenize(black_box(&source)))
    });
}

criterion_group!(benches, parse_small_clip, parse_large_clip, tokenize_only);
criterion_main!(benches);
