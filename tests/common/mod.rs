#![allow(dead_code)]

pub mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    use microgen::GenConfig;
    use tempfile::TempDir;

    pub const MAIN_RS: &str = "mod services;\n\nfn main() {\n    fabric::run(vec![\n        // HINT: Add services here\n    ]);\n}\n";

    /// A scratch crate with `Cargo.toml`, `src/` and a composition
    /// `main.rs`. Removed on drop.
    pub struct ProjectFixture {
        tmp: TempDir,
        root: PathBuf,
    }

    impl ProjectFixture {
        pub fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path().canonicalize().unwrap();
            fs::write(root.join("Cargo.toml"), "[package]\nname = \"app\"\n").unwrap();
            fs::create_dir_all(root.join("src")).unwrap();
            fs::write(root.join("src").join("main.rs"), MAIN_RS).unwrap();
            Self { tmp, root }
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        /// Create `src/<rel>/service.yaml` and return the service directory.
        pub fn service(&self, rel: &str, yaml: &str) -> PathBuf {
            let dir = self.root.join("src").join(rel);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("service.yaml"), yaml).unwrap();
            dir
        }

        pub fn write(&self, path: &Path, content: &str) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
    }

    pub fn read(path: &Path) -> String {
        fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
    }

    /// Contents of every file below `dir`, keyed by path, for before/after
    /// comparisons.
    pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect();
        files.sort();
        files
    }

    /// Generation settings for tests: never touch `main.rs`.
    pub fn config() -> GenConfig {
        GenConfig {
            register_with_main: false,
            ..GenConfig::default()
        }
    }

    pub const CALCULATOR: &str = r#"general:
  host: calculator.example
  description: The Calculator microservice performs simple mathematical operations.
configs:
  - signature: MaxNum() (max int)
    description: MaxNum is the largest number accepted.
    default: 1000
    validation: int [0,]
    callback: true
metrics:
  - signature: UsedOperators(count int, op string)
    description: UsedOperators counts the operators used.
    kind: counter
functions:
  - signature: Arithmetic(x int, op string, y int) (xEquals int, opEquals string, yEquals int, result int)
    description: Arithmetic performs an arithmetic operation between two integers.
    path: /arithmetic
  - signature: Distance(p1 Point, p2 Point) (d float64)
    description: Distance calculates the distance between two points.
tickers:
  - signature: Tick
    interval: 1m
"#;
}
