use std::process::Command;
use vergen::EmitBuilder;

fn main() {
    // Check if we're in a git repository
    let is_git_available = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);

    // Generate build-time metadata based on git availability
    let git_emitted = is_git_available
        && EmitBuilder::builder()
            .build_timestamp()
            .git_sha(false) // Short SHA
            .emit()
            .is_ok();

    if !git_emitted {
        // No usable git metadata (tarball or vendored checkout); emit a
        // placeholder so the version endpoint still compiles.
        println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
        EmitBuilder::builder()
            .build_timestamp()
            .emit()
            .expect("Unable to generate build metadata");
    }
}
