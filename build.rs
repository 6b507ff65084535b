use std::{env, fs, path::Path};

/// Places `config.json` next to the built `log-service` binary so that
/// `cargo run` finds it without any extra setup.
fn main() {
    println!("cargo:rerun-if-changed=config.json");

    let Ok(out_dir) = env::var("OUT_DIR") else {
        println!("cargo:warning=OUT_DIR not set, skipping config.json copy");
        return;
    };

    // OUT_DIR = target/<profile>/build/<crate>/out
    let Some(bin_dir) = Path::new(&out_dir).ancestors().nth(3) else {
        println!("cargo:warning=Cannot find binary directory from {out_dir}");
        return;
    };

    let src = Path::new("config.json");
    if !src.exists() {
        println!("cargo:warning=No config.json in the package root, nothing to copy");
        return;
    }

    let dst = bin_dir.join("config.json");
    if let Err(e) = fs::copy(src, &dst) {
        println!("cargo:warning=Could NOT copy config.json to {}: {}", dst.display(), e);
    }
}
