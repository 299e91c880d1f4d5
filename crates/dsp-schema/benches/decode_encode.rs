use dsp_schema::parser::parse_schema;
use dsp_schema::registry::TypeRegistry;

use criterion::{Criterion, criterion_group, criterion_main};

fn build_registry(field_count: usize) -> TypeRegistry {
    let mut schema_text = String::from("Row {\n");
    for i in 0..field_count {
        schema_text.push_str(&format!("    int32 f{i}\n"));
    }
    schema_text.push_str("}\n");
    TypeRegistry::build(parse_schema(&schema_text).unwrap()).unwrap()
}

fn gen_bytes(field_count: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(field_count * 4);
    for i in 0..field_count as u32 {
        data.extend_from_slice(&i.to_le_bytes());
    }
    data
}

fn bench_decode(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 200] {
        let registry = build_registry(field_count);
        let bytes = gen_bytes(field_count);

        c.bench_function(&format!("decode_{field_count}_fields"), |b| {
            b.iter(|| registry.decode("Row", &bytes, &[]).unwrap())
        });
    }
}

fn bench_encode(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 200] {
        let registry = build_registry(field_count);
        let bytes = gen_bytes(field_count);
        let value = registry.decode("Row", &bytes, &[]).unwrap();

        c.bench_function(&format!("encode_{field_count}_fields"), |b| {
            b.iter(|| registry.encode("Row", &value).unwrap())
        });
    }
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
