//! Check that every GStreamer element a render needs is installed.

use auricle_render_engine::{missing_elements, REQUIRED_ELEMENTS};

pub fn run() -> anyhow::Result<()> {
    println!("Auricle System Check");
    println!("{}", "=".repeat(50));

    let missing = missing_elements()?;
    for element in REQUIRED_ELEMENTS {
        if missing.contains(element) {
            println!("[MISSING] {element}");
        } else {
            println!("[OK] {element}");
        }
    }

    println!();
    if missing.is_empty() {
        println!("All required elements are available. Auricle is ready.");
        Ok(())
    } else {
        // fdkaacenc ships in gst-plugins-bad, x264enc in gst-plugins-ugly.
        println!(
            "Some required elements are missing. \
             Install the GStreamer plugin sets providing them."
        );
        anyhow::bail!("{} required element(s) missing", missing.len())
    }
}
