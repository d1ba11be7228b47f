use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TsConfigError {
    #[error("Disk I/O Error reading {}: {source}", path.display())]
    IOError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse {} as JSON or JSON5: {message}", path.display())]
    ParseError { path: PathBuf, message: String },
    #[error("Unexpected tsconfig shape in {}: {source}", path.display())]
    SerdeError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Could not find config '{extends}' extended by {}", from.display())]
    ExtendsNotFound { extends: String, from: PathBuf },
    #[error("Circular 'extends' chain through {}", path.display())]
    CircularExtends { path: PathBuf },
}
