use std::process::Command;
use std::str;

fn main() {
    // It's usually fine to just run this on every build.
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--broken"])
        .current_dir(env!("CARGO_MANIFEST_DIR")) // Run git in the project root
        .output();

    let git_tag = match output {
        Ok(output) if output.status.success() => str::from_utf8(&output.stdout)
            .unwrap_or("unknown")
            .trim()
            .to_string(),
        // Fallback for when git isn't available or fails
        Ok(output) => {
            eprintln!("WARNING: git describe failed: {:?}", output.stderr);
            "unknown".to_string()
        }
        Err(err) => {
            eprintln!("WARNING: could not run git: {err}");
            "unknown".to_string()
        }
    };

    println!("cargo:rustc-env=GIT_TAG={git_tag}");
}
