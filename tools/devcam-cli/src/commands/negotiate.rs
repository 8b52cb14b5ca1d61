//! Show preview size negotiation for a set of camera outputs.

use devcam_capture_engine::preview_size::suitable_preview_size;
use devcam_platform_core::Size;

pub fn run(sizes: &[Size], stream: Option<Size>, bound: Size) -> anyhow::Result<()> {
    match stream {
        Some(stream) => println!("Webcam stream: {stream} (aspect and bound follow the host)"),
        None => println!("No webcam stream; 16:9 within {bound}"),
    }
    println!(
        "Outputs: {}",
        sizes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    match suitable_preview_size(sizes, stream, bound) {
        Some(size) => println!("Preview size: {size}"),
        None => anyhow::bail!("no preview size available"),
    }
    Ok(())
}
