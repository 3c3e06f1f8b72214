use std::{error::Error, path::Path};
use vergen_gitcl::{Emitter, GitclBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo::rustc-check-cfg=cfg(has_git_describe)");
    println!("cargo:rerun-if-changed=build.rs");

    // Source tarballs carry no git metadata, the version then falls back to the crate version
    if !Path::new(".git").exists() {
        return Ok(());
    }

    let mut git = GitclBuilder::default();
    git.describe(false, true, Some("ThisPatternShouldNotMatchAnythingEver"));

    let described = Emitter::default()
        .fail_on_error()
        .quiet()
        .add_instructions(&git.build()?)
        .and_then(|e| e.emit())
        .is_ok();

    if described {
        println!("cargo:rustc-cfg=has_git_describe");
    }

    for git_path in [".git/HEAD", ".git/refs/heads", ".git/refs/tags"] {
        println!("cargo:rerun-if-changed={}", git_path);
    }

    Ok(())
}
