use deconv_core::{
    degrade_with_config, mean_absolute_error, restore, unsharp_mask, DegradationConfig,
    RestorationMode, UnsharpConfig,
};
use flexi_logger::Logger;
use ndarray::Array2;
use std::time::Instant;

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse::<T>().ok())
        .unwrap_or(default)
}

/// Blocks, a ramp and a bright disc: sharp edges plus smooth shading.
fn build_scene(rows: usize, cols: usize) -> Array2<f32> {
    let (cy, cx) = (rows as f32 * 0.6, cols as f32 * 0.35);
    let radius = rows.min(cols) as f32 * 0.15;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (y, x) = (r as f32, c as f32);
        let mut v = 40.0 + 100.0 * x / cols as f32;
        if ((r / 16) + (c / 16)) % 2 == 0 && r < rows / 3 {
            v += 60.0;
        }
        if (y - cy).powi(2) + (x - cx).powi(2) < radius * radius {
            v = 230.0;
        }
        v
    })
}

fn main() {
    let _logger = Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));

    let args: Vec<String> = std::env::args().collect();
    let rows = parse_arg(&args, "--rows", 256usize);
    let cols = parse_arg(&args, "--cols", 256usize);
    let blur_std_dev = parse_arg(&args, "--sigma", 1.5f32);
    let snr = parse_arg(&args, "--snr", 20.0f32);
    let seed = parse_arg(&args, "--seed", 42u64);

    log::info!(
        "restore_synthetic rows={} cols={} sigma={} snr={} seed={}",
        rows,
        cols,
        blur_std_dev,
        snr,
        seed
    );

    let scene = build_scene(rows, cols);
    let config = DegradationConfig::new(blur_std_dev, snr).with_seed(seed);
    let degradation =
        degrade_with_config(scene.view(), &config).expect("degradation parameters rejected");

    let baseline = mean_absolute_error(degradation.degraded.view(), scene.view())
        .expect("shape mismatch");
    println!("{:<10} mae={:>8.3}", "degraded", baseline);

    for mode in [RestorationMode::Inverse, RestorationMode::Wiener] {
        let t0 = Instant::now();
        let restored = restore(
            degradation.degraded.view(),
            degradation.kernel.view(),
            mode,
            snr,
        )
        .expect("restoration failed");
        let mae = mean_absolute_error(restored.view(), scene.view()).expect("shape mismatch");
        println!(
            "{:<10} mae={:>8.3} elapsed_ms={:.2}",
            format!("{:?}", mode).to_lowercase(),
            mae,
            t0.elapsed().as_secs_f64() * 1000.0
        );
    }

    let sharpened = unsharp_mask(degradation.degraded.view(), &UnsharpConfig::default())
        .expect("unsharp mask failed");
    let mae = mean_absolute_error(sharpened.view(), scene.view()).expect("shape mismatch");
    println!("{:<10} mae={:>8.3}", "unsharp", mae);
}
