use std::path::PathBuf;

fn main() {
    // Re-run if the embedded module catalogue changes
    println!("cargo:rerun-if-changed=modules/");

    // The catalogue is embedded with include_dir! in config/loader.rs,
    // so the directory has to exist even when it is empty
    let modules_path = PathBuf::from("modules");
    if !modules_path.exists() {
        std::fs::create_dir_all(&modules_path)
            .expect("Failed to create modules directory");
    }
}
