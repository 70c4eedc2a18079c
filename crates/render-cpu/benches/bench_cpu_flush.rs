use std::hint::black_box;
use std::time::Instant;

use pathfiddle_document::{Document, Scene, sample_document};
use pathfiddle_render::{Backend, BackendOptions, FrameDescriptor, HeadlessSurface};
use pathfiddle_render_cpu::CpuBackend;

fn bench_frames(width: u32, height: u32, wireframe: bool, iterations: usize) {
    let surface = HeadlessSurface::new(width, height);
    let mut backend = CpuBackend::new(BackendOptions::default());
    backend
        .on_size_changed(&surface, width, height, 0)
        .expect("resize");

    let doc = Document::from_data(sample_document(), backend.factory()).expect("sample imports");
    let mut artboard = doc.artboard_default().expect("artboard");
    let mut scene = artboard.animation_at(0).expect("animation");

    let mut frame = FrameDescriptor::new(width, height);
    frame.wireframe = wireframe;

    let start = Instant::now();
    for _ in 0..iterations {
        scene.advance_and_apply(&mut artboard, 1.0 / 60.0);
        backend.begin(frame).expect("begin");
        let mut renderer = backend.make_renderer(width, height);
        artboard.draw(renderer.as_mut());
        backend.end(&surface, None).expect("end");
        black_box(backend.stats());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  {width}x{height} wireframe={wireframe} ({iterations} frames): {per_iter:?}/frame, total {elapsed:?}"
    );
}

fn bench_readback(width: u32, height: u32, iterations: usize) {
    let surface = HeadlessSurface::new(width, height);
    let mut backend = CpuBackend::new(BackendOptions::default());
    backend
        .on_size_changed(&surface, width, height, 0)
        .expect("resize");
    let mut pixels = Vec::new();

    let start = Instant::now();
    for _ in 0..iterations {
        backend.begin(FrameDescriptor::new(width, height)).expect("begin");
        backend.end(&surface, Some(&mut pixels)).expect("end");
        black_box(pixels.len());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  readback {width}x{height} ({iterations} frames): {per_iter:?}/frame, total {elapsed:?}");
}

fn main() {
    println!("=== CPU Backend Benchmarks ===\n");

    println!("Sample document frames:");
    bench_frames(400, 300, false, 200);
    bench_frames(1280, 720, false, 50);
    bench_frames(1280, 720, true, 50);

    println!("\nClear + readback:");
    bench_readback(640, 480, 200);
    bench_readback(1920, 1080, 20);

    println!("\n=== Done ===");
}
