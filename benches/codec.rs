use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fumen_editor::codec::{decode, encode};
use fumen_editor::core::types::{Move, Piece, Rotation};
use fumen_editor::core::{Field, Page};
use fumen_editor::engine::{FieldMode, PageStore};

/// A long document of locked pieces stacking on one key page
fn long_document(len: usize) -> Vec<Page> {
    let mut pages = vec![Page::key(0, Field::new(), "bench")];
    for index in 1..len {
        let piece = Piece::MINOS[index % Piece::MINOS.len()];
        let x = 1 + (index * 3) % 7;
        let mut page = Page::reference(index, 0, 0);
        page.piece = Some(Move::new(piece, Rotation::Spawn, x as i32, 1));
        pages.push(page);
    }
    pages
}

fn bench_encode(c: &mut Criterion) {
    let pages = long_document(500);
    c.bench_function("encode_500_pages", |b| {
        b.iter(|| encode(black_box(&pages)))
    });
}

fn bench_decode(c: &mut Criterion) {
    let data = encode(&long_document(500)).unwrap();
    c.bench_function("decode_500_pages", |b| b.iter(|| decode(black_box(&data))));
}

fn bench_resolve(c: &mut Criterion) {
    let pages = long_document(500);
    c.bench_function("resolve_last_page_cold", |b| {
        b.iter(|| {
            let mut store = PageStore::new(pages.clone()).unwrap();
            store.get_field(black_box(499), FieldMode::All)
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_resolve);
criterion_main!(benches);
