use std::env;
use std::path::PathBuf;

// Windows builds of the `ffmpeg` feature locate FFmpeg through FFMPEG_DIR;
// point at a vcpkg install when one is present but not configured.
fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");
    println!("cargo:rerun-if-env-changed=VCPKGRS_TRIPLET");

    let decoding_enabled = env::var_os("CARGO_FEATURE_FFMPEG").is_some();
    let on_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !decoding_enabled || !on_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!(
            "cargo:warning=keyreel: the ffmpeg feature needs FFmpeg; set FFMPEG_DIR or install it with vcpkg and set VCPKG_ROOT."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if install.exists() {
        println!(
            "cargo:warning=keyreel: found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it.",
            install.display()
        );
    } else {
        println!(
            "cargo:warning=keyreel: VCPKG_ROOT is set but {} does not exist.",
            install.display()
        );
    }
}
