//! Builds reading real files through `NativeRuntime`.

use std::fs;
use std::path::Path;

use rove::{BuildOptions, Diagnostic, Error, ModuleId};
use tempfile::TempDir;

fn write(root: &Path, path: &str, source: &str) {
    let path = root.join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, source).unwrap();
}

#[tokio::test]
async fn builds_from_disk_with_extension_probing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(
        root,
        "src/main.js",
        "import { greet } from './lib';\nimport { VERSION } from './version';\nexport const out = greet(VERSION);",
    );
    write(
        root,
        "src/lib/index.js",
        "export function greet(v) { return 'v' + v; }\nexport function shout() {}",
    );
    write(root, "src/version.mjs", "export const VERSION = 3;");

    let output = BuildOptions::new("src/main.js").cwd(root).build().await.unwrap();

    assert_eq!(output.graph.len(), 3);
    assert!(output.diagnostics.is_empty());

    let lib = ModuleId::new(root.join("src/lib/index.js")).unwrap();
    assert_eq!(
        output.included_code(&lib),
        ["export function greet(v) { return 'v' + v; }"]
    );
    let version = ModuleId::new(root.join("src/version.mjs")).unwrap();
    assert_eq!(output.included_code(&version), ["export const VERSION = 3;"]);
}

#[tokio::test]
async fn different_relative_paths_share_one_module() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(
        root,
        "main.js",
        "import { a } from './a/a.js';\nimport { shared } from './shared.js';\nexport const x = a + shared;",
    );
    write(root, "a/a.js", "import { shared } from '../shared.js';\nexport const a = shared;");
    write(root, "shared.js", "export const shared = 1;");

    let output = BuildOptions::new("./main.js").cwd(root).build().await.unwrap();
    assert_eq!(output.graph.len(), 3);
}

#[tokio::test]
async fn bare_imports_are_reported_as_unresolved() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.js", "import lodash from 'lodash';\nexport const y = lodash;");

    let output = BuildOptions::new("main.js")
        .cwd(temp.path())
        .build()
        .await
        .unwrap();

    assert!(matches!(
        output.diagnostics.as_slice(),
        [Diagnostic::UnresolvedDependency { specifier, .. }] if specifier == "lodash"
    ));
}

#[tokio::test]
async fn missing_entry_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let err = BuildOptions::new("nope.js")
        .cwd(temp.path())
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EntryNotFound(_)));
}
