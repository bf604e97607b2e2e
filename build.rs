use std::process::Command;

fn main() {
    let commit_count = git_output(&["rev-list", "--count", "HEAD"])
        .and_then(|out| out.trim().parse::<u32>().ok())
        .unwrap_or(0);

    let is_dirty = git_output(&["status", "--porcelain"])
        .map(|out| !out.trim().is_empty())
        .unwrap_or(false);

    // <major>.<minor>.<commit count>[+dirty]
    let major = env_or("CARGO_PKG_VERSION_MAJOR", "0");
    let minor = env_or("CARGO_PKG_VERSION_MINOR", "1");
    let mut version = format!("{major}.{minor}.{commit_count}");
    if is_dirty {
        version.push_str("+dirty");
    }

    println!("cargo:rustc-env=TDA_VERSION={version}");
    println!("cargo:rustc-env=TDA_COMMIT_COUNT={commit_count}");
    println!("cargo:rustc-env=TDA_IS_DIRTY={is_dirty}");

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-changed=.git/index");
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}
