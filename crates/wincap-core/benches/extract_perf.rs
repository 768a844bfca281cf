//! Pixel extraction performance benchmarks
//!
//! Measures BGRX to RGB conversion and client-area cropping on 4K
//! (3840x2160) buffers, the hot path between a rendered surface and the
//! returned image.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use wincap_core::{
    capture::{RasterImage, RawBitmap, RowOrder, extract::convert},
    model::Region,
    util::encode::encode_png,
};

const WIDTH: u32 = 3840;
const HEIGHT: u32 = 2160;

fn create_4k_bitmap(row_order: RowOrder) -> RawBitmap {
    let bytes = (0..WIDTH as usize * HEIGHT as usize * 4)
        .map(|i| (i % 251) as u8)
        .collect();
    RawBitmap::packed(WIDTH, HEIGHT, row_order, bytes)
}

fn bench_convert_bottom_up(c: &mut Criterion) {
    let raw = create_4k_bitmap(RowOrder::BottomUp);

    c.bench_function("convert_bgrx_bottom_up_4k", |b| {
        b.iter(|| {
            convert(black_box(&raw)).unwrap();
        });
    });
}

fn bench_convert_top_down(c: &mut Criterion) {
    let raw = create_4k_bitmap(RowOrder::TopDown);

    c.bench_function("convert_bgrx_top_down_4k", |b| {
        b.iter(|| {
            convert(black_box(&raw)).unwrap();
        });
    });
}

fn bench_client_crop(c: &mut Criterion) {
    let img = RasterImage::from_test_pattern(WIDTH, HEIGHT);
    // Typical frame: 8 px borders and a 31 px title bar
    let region = Region::new(8, 31, WIDTH - 16, HEIGHT - 39);

    c.bench_function("crop_client_area_4k", |b| {
        b.iter(|| {
            black_box(&img).crop(black_box(region)).unwrap();
        });
    });
}

fn bench_png_encoding(c: &mut Criterion) {
    let img = RasterImage::from_test_pattern(WIDTH, HEIGHT);

    c.bench_function("encode_png_4k", |b| {
        b.iter(|| {
            encode_png(black_box(&img)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_convert_bottom_up,
    bench_convert_top_down,
    bench_client_crop,
    bench_png_encoding
);
criterion_main!(benches);
