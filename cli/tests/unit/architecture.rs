//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! domain is pure, application talks only to ports, infra never reaches up
//! into commands or output.

use std::path::{Path, PathBuf};

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    pending: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            pending: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().starts_with("#[cfg(test)]") {
            self.pending = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => {
                    self.brace_depth += 1;
                    if self.pending {
                        self.in_test_block = true;
                        self.pending = false;
                    }
                }
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                ';' if self.pending && !self.in_test_block => {
                    // `#[cfg(test)] mod tests;` covers a whole file, not a block.
                    self.pending = false;
                }
                _ => {}
            }
        }
        self.in_test_block || self.pending
    }
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with 1-based line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            let comment = trimmed.starts_with("//")
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*');
            (!in_test && !comment).then(|| (i + 1, line.to_string()))
        })
        .collect()
}

/// Files under `dir` that are test-only modules.
fn is_test_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name == "tests.rs" || name == "test_support.rs"
}

fn scan(dir: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        if is_test_file(&file) {
            continue;
        }
        let rel = relative(&file);
        for (lineno, line) in production_lines(&file) {
            for pattern in forbidden {
                if line.contains(pattern) {
                    violations.push(format!("{rel}:{lineno}: `{pattern}`: {}", line.trim()));
                }
            }
        }
    }
    violations
}

// ── Layer boundaries ─────────────────────────────────────────────────────────

#[test]
fn domain_is_pure() {
    let violations = scan(
        &src_dir().join("domain"),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must not perform I/O or import outer layers:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_depends_only_on_domain_and_ports() {
    let violations = scan(
        &src_dir().join("application"),
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );
    assert!(
        violations.is_empty(),
        "application/ must not import infra/, commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = scan(
        &src_dir().join("infra"),
        &["crate::commands", "crate::output", "crate::app::"],
    );
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn inner_layers_have_no_print_macros_outside_tests() {
    let mut violations = Vec::new();
    for layer in ["domain", "application", "infra"] {
        violations.extend(scan(&src_dir().join(layer), &["println!", "eprintln!"]));
    }
    assert!(
        violations.is_empty(),
        "domain/, application/ and infra/ report through tracing or ports, not print macros:\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_take_trait_bounds_not_adapters() {
    let concrete = ["AzCli<", "TokioCommandRunner", "SshSession", "SshConnector", "RegistryFile"];
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir().join("application")) {
        let rel = relative(&file);
        for (lineno, line) in production_lines(&file) {
            if !line.contains("fn ") {
                continue;
            }
            for ty in concrete {
                if line.contains(ty) {
                    violations.push(format!("{rel}:{lineno}: concrete `{ty}`: {}", line.trim()));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "application services must be generic over ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn process_spawning_stays_in_infra() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir()) {
        let rel = relative(&file).replace('\\', "/");
        if rel.contains("/infra/") {
            continue;
        }
        for (lineno, line) in production_lines(&file) {
            if line.contains("tokio::process::Command") || line.contains("std::process::Command") {
                violations.push(format!("{rel}:{lineno}: {}", line.trim()));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "only infra/ may spawn processes:\n{}",
        violations.join("\n")
    );
}

// ── Command conventions ──────────────────────────────────────────────────────

/// All confirmation prompts in `commands/` must go through `app.confirm()`.
#[test]
fn commands_use_standardized_confirmation() {
    let violations = scan(
        &src_dir().join("commands"),
        &["io::stdin().lock()", "Confirm::new()"],
    );
    assert!(
        violations.is_empty(),
        "Commands must use app.confirm() for user prompts:\n{}",
        violations.join("\n")
    );
}

/// Commands render through `app.renderer()` rather than printing JSON inline.
#[test]
fn commands_do_not_serialize_json_inline() {
    let violations = scan(
        &src_dir().join("commands"),
        &["serde_json::to_string", "println!(\"{{"],
    );
    assert!(
        violations.is_empty(),
        "Use the renderer for JSON output in commands/:\n{}",
        violations.join("\n")
    );
}

// ── Blocking I/O safety ──────────────────────────────────────────────────────

#[test]
fn infra_async_functions_do_not_use_blocking_fs() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir().join("infra")) {
        let rel = relative(&file);
        let mut in_async = false;
        let mut depth = 0i32;
        let mut async_depth = 0i32;
        for (lineno, line) in production_lines(&file) {
            let trimmed = line.trim();
            if trimmed.contains("async fn ") {
                in_async = true;
                async_depth = depth;
            }
            if in_async && line.contains("std::fs::") && !line.contains("spawn_blocking") {
                violations.push(format!("{rel}:{lineno}: {trimmed}"));
            }
            for ch in line.chars() {
                match ch {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if in_async && depth <= async_depth {
                            in_async = false;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "std::fs in async fn; move it into a sync helper run on spawn_blocking:\n{}",
        violations.join("\n")
    );
}
