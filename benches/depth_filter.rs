use criterion::{criterion_group, criterion_main, Criterion, black_box};

use stablescan::cloud::synthetic;
use stablescan::core::camera::Camera;
use stablescan::core::types::Vec3;
use stablescan::depth::{Denoise, DepthConsistencyFilter, create_depth_image};
use stablescan::picking::IdBuffer;
use stablescan::depth::DepthBuffer;
use stablescan::render::{PointRenderer, RenderRequest, SoftwareRenderer};
use stablescan::store::TexturedPointSet;

/// Id and depth buffers of a tilted plane seen in perspective
fn capture(size: u32) -> (IdBuffer, DepthBuffer) {
    let cloud = synthetic::tilted_plane(size, size, 0.6);
    let camera = Camera::new(Vec3::ZERO, 2.5, 60.0, 1.0);
    let request = RenderRequest::capture(camera.mvp(), size, size);
    let mut renderer = SoftwareRenderer::new();
    let ids = renderer.render_id_buffer(&cloud, &request).unwrap();
    let depth = renderer.render_depth_buffer(&cloud, &request).unwrap();
    (ids, depth)
}

fn bench_denoise_512(c: &mut Criterion) {
    let (_, depth) = capture(512);
    let denoise = Denoise::default();

    c.bench_function("denoise_512", |b| {
        b.iter(|| denoise.apply(black_box(&depth)));
    });
}

fn bench_depth_image_512(c: &mut Criterion) {
    let (_, depth) = capture(512);
    let denoise = Denoise::default();

    c.bench_function("depth_image_512", |b| {
        b.iter(|| create_depth_image(black_box(&depth), Some(&denoise)).unwrap());
    });
}

fn bench_partition_256(c: &mut Criterion) {
    let (ids, depth) = capture(256);
    let filter = DepthConsistencyFilter::default();

    c.bench_function("partition_256", |b| {
        b.iter(|| filter.partition(black_box(&ids), black_box(&depth)).unwrap());
    });
}

fn bench_partition_512(c: &mut Criterion) {
    let (ids, depth) = capture(512);
    let filter = DepthConsistencyFilter::default();

    c.bench_function("partition_512", |b| {
        b.iter(|| filter.partition(black_box(&ids), black_box(&depth)).unwrap());
    });
}

fn bench_retexture_512(c: &mut Criterion) {
    let (ids, _) = capture(512);
    let cloud = synthetic::tilted_plane(512, 512, 0.6);
    let image = image::RgbImage::from_pixel(512, 512, image::Rgb([90, 140, 60]));

    c.bench_function("retexture_512", |b| {
        b.iter(|| {
            let mut store = TexturedPointSet::new(cloud.clone()).unwrap();
            store.retexture(black_box(&image), black_box(&ids)).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_denoise_512,
    bench_depth_image_512,
    bench_partition_256,
    bench_partition_512,
    bench_retexture_512,
);
criterion_main!(benches);
