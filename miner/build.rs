use std::{env, fs, path::Path};

fn main() {
    let manifest = fs::read_to_string("../Cargo.toml").expect("Unable to read workspace Cargo.toml");
    let version = manifest
        .lines()
        .skip_while(|line| line.trim() != "[workspace.package]")
        .find(|line| line.starts_with("version = "))
        .and_then(|line| line.split('=').nth(1))
        .map(|v| v.trim_matches(&[' ', '"']).to_string())
        .expect("Unable to find workspace version in Cargo.toml");
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let build_file = Path::new(&out_dir).join("build_info.rs");
    fs::write(
        &build_file,
        format!("pub const VERSION: &str = \"{version}\";\npub const PROFILE: &str = \"{profile}\";\n"),
    )
    .expect("Unable to write build info file");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../Cargo.toml");
}
