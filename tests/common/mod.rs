#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// Write `content` to `name` inside a fresh temporary directory, returning
/// the dir handle and file path.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn write_report(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Two files, `src/alpha.c` with 3/4 lines covered and `src/beta.c` with
/// 1/2, in each supported format.
pub const EQUIVALENT_LCOV: &[u8] = b"TN:
SF:src/alpha.c
DA:1,1
DA:2,1
DA:3,0
DA:4,7
LF:4
LH:3
end_of_record
SF:src/beta.c
DA:1,0
DA:2,2
LF:2
LH:1
end_of_record
";

pub const EQUIVALENT_COVERAGEPY: &[u8] = br#"{
  "meta": {"version": "7.4.0"},
  "files": {
    "src/alpha.c": {"summary": {"covered_lines": 3, "num_statements": 4}},
    "src/beta.c": {"summary": {"covered_lines": 1, "num_statements": 2}}
  }
}"#;

pub const EQUIVALENT_COBERTURA: &[u8] = br#"<?xml version="1.0" ?>
<coverage line-rate="0.6667" branch-rate="0">
  <packages>
    <package name="src" line-rate="0.6667" branch-rate="0">
      <classes>
        <class name="alpha" filename="src/alpha.c" line-rate="0.75" branch-rate="0">
          <lines>
            <line number="1" hits="1"/>
            <line number="2" hits="1"/>
            <line number="3" hits="0"/>
            <line number="4" hits="7"/>
          </lines>
        </class>
        <class name="beta" filename="src/beta.c" line-rate="0.5" branch-rate="0">
          <lines>
            <line number="1" hits="0"/>
            <line number="2" hits="2"/>
          </lines>
        </class>
      </classes>
    </package>
  </packages>
</coverage>
"#;
