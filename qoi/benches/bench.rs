use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use qoi::{
    decode::SliceDecodeOutput, Channels, Colorspace, Header, QoiDecodeContext, QoiEncodeContext,
};

fn test_images() -> Vec<(&'static str, Header, Vec<u8>)> {
    let (width, height) = (512, 512);

    let photo_like = RgbImage::from_fn(width, height, |x, y| {
        let n = (x * 7 + y * 13) % 5;
        Rgb([((x / 2) as u8).wrapping_add(n as u8), (y / 2) as u8, ((x + y) / 4) as u8])
    });
    let ui_like = RgbaImage::from_fn(width, height, |x, y| {
        if (x / 32 + y / 32) % 2 == 0 {
            Rgba([240, 240, 240, 255])
        } else {
            Rgba([(x % 64) as u8, 90, 200, ((y % 128) * 2) as u8])
        }
    });

    vec![
        (
            "photo_like rgb",
            Header::new(width, height, Channels::Rgb, Colorspace::Srgb).unwrap(),
            photo_like.into_raw(),
        ),
        (
            "ui_like rgba",
            Header::new(width, height, Channels::Rgba, Colorspace::Srgb).unwrap(),
            ui_like.into_raw(),
        ),
    ]
}

fn decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for (name, header, pixels) in test_images() {
        let mut encoded = Vec::new();
        QoiEncodeContext::encode_to_vec(&header, &pixels, &mut encoded).unwrap();

        group.throughput(criterion::Throughput::Elements(header.pixel_count() as u64));
        group.bench_with_input(BenchmarkId::new("slice", name), &encoded, |b, input| {
            let mut output = vec![0; pixels.len()];
            b.iter(|| {
                QoiDecodeContext::decode(
                    input,
                    SliceDecodeOutput::new(&mut output, header.channels),
                )
            })
        });
        group.bench_with_input(BenchmarkId::new("vec", name), &encoded, |b, input| {
            let mut output = Vec::with_capacity(pixels.len());
            b.iter(|| {
                output.clear();
                QoiDecodeContext::decode_to_vec(input, None, &mut output)
            })
        });
    }
}

fn encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for (name, header, pixels) in test_images() {
        group.throughput(criterion::Throughput::Elements(header.pixel_count() as u64));

        group.bench_with_input(
            BenchmarkId::new("encode_to_vec", name),
            &pixels,
            |b, input| {
                let mut encoded = Vec::with_capacity(pixels.len());
                b.iter(|| {
                    encoded.clear();
                    QoiEncodeContext::encode_to_vec(&header, input, &mut encoded)
                })
            },
        );

        group.bench_with_input(BenchmarkId::new("encode_std", name), &pixels, |b, input| {
            let mut encoded = Vec::with_capacity(pixels.len());
            b.iter(|| {
                encoded.clear();
                QoiEncodeContext::encode(&header, input, &mut encoded)
            })
        });
    }
}

criterion_group!(benches, decode, encode);
criterion_main!(benches);
