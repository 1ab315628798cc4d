// Storefront Edge - developer task runner
// cargo xtask <command>

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BINARY: &str = "storefront-edge";

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flag = |name: &str| args.iter().any(|a| a == name);

    match args.first().map(String::as_str) {
        Some("build") => build(&sh, flag("--release")),
        Some("test") => test(&sh),
        Some("format") => format(&sh, flag("--check")),
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Storefront Edge - developer tasks");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the gateway (release also stages build/dist)");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code, or only check formatting");
    println!("  clippy              Run clippy with warnings denied");
    println!("  run [ARGS...]       Build and run the gateway, passing ARGS through");
    println!("  clean               Remove build artifacts");
    println!("  ci                  format --check, clippy, release build, test");
    println!("  dist                Package build/dist as a tar.gz");
    println!();
    println!("Examples:");
    println!("  cargo xtask run -- --port 8080");
    println!("  cargo xtask format --check");
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    let _dir = sh.push_dir(backend_dir());

    if release {
        println!("🦀 Building {} (release)...", BINARY);
        cmd!(sh, "cargo build --release")
            .run()
            .context("Failed to build release binary")?;
        stage_distribution(sh)?;
        println!("✅ Staged in build/dist/");
    } else {
        println!("🦀 Building {}...", BINARY);
        cmd!(sh, "cargo build").run().context("Failed to build")?;
    }

    Ok(())
}

/// Lay out build/dist: bin/, conf/config.toml, logs/
fn stage_distribution(sh: &Shell) -> Result<()> {
    let root = project_root();
    let dist_dir = root.join("build/dist");

    for sub in ["bin", "conf", "logs"] {
        std::fs::create_dir_all(dist_dir.join(sub))
            .with_context(|| format!("Failed to create build/dist/{}", sub))?;
    }

    let binary_src = root.join("target/release").join(BINARY);
    let binary_dst = dist_dir.join("bin").join(BINARY);
    cmd!(sh, "cp {binary_src} {binary_dst}").run()?;

    write_default_config(&dist_dir)
}

/// Seed conf/config.toml unless one is already staged
fn write_default_config(dist_dir: &Path) -> Result<()> {
    let config_path = dist_dir.join("conf/config.toml");
    if config_path.exists() {
        return Ok(());
    }

    let config_content = r#"[server]
host = "0.0.0.0"
port = 3000

[auth]
# GoTrue base URL; leave empty to disable session refresh
url = ""
anon_key = ""
# Access token signing secret; also read from APP_AUTH_JWT_SECRET
jwt_secret = ""
timeout_ms = "3s"
secure_cookies = true

[locale]
locales = ["sq", "en", "it"]
default_locale = "sq"
prefix = "always"

[routing]
excluded_prefixes = ["/api", "/_next", "/_vercel", "/_static"]

[upstream]
# Page renderer; leave empty to serve placeholder pages
url = ""
timeout_ms = "30s"

[logging]
level = "info,storefront_edge=debug"
file = "logs/storefront-edge.log"
"#;

    std::fs::write(config_path, config_content).context("Failed to write default config")
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");
    cmd!(sh, "cargo test --workspace")
        .run()
        .context("Tests failed")?;
    println!("✅ All tests passed");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Code is not formatted, run `cargo xtask format`")?;
        println!("✅ Code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format code")?;
        println!("✅ Code formatted");
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --workspace --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;
    Ok(())
}

fn run(sh: &Shell, args: &[String]) -> Result<()> {
    let args = args.iter().skip_while(|a| *a == "--");
    let _dir = sh.push_dir(backend_dir());

    println!("▶️  Starting {}...", BINARY);
    cmd!(sh, "cargo run --bin {BINARY} -- {args...}")
        .run()
        .context("Gateway exited with an error")?;
    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 Cleaning...");
    cmd!(sh, "cargo clean").run()?;

    let build_dir = project_root().join("build");
    if build_dir.exists() {
        std::fs::remove_dir_all(&build_dir).context("Failed to remove build/")?;
    }

    println!("✅ Clean complete");
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("📝 [1/4] Checking format...");
    format(sh, true)?;

    println!("🔍 [2/4] Running clippy...");
    clippy(sh)?;

    println!("🔨 [3/4] Building release...");
    build(sh, true)?;

    println!("🧪 [4/4] Running tests...");
    test(sh)?;

    println!("🎉 CI pipeline passed");
    Ok(())
}

fn dist(sh: &Shell) -> Result<()> {
    build(sh, true)?;

    let dist_dir = project_root().join("build/dist");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("{}-{}.tar.gz", BINARY, timestamp);

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf logs")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Package: {}", dist_dir.join(&package_name).display());
    Ok(())
}

fn backend_dir() -> PathBuf {
    project_root().join("backend")
}

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
