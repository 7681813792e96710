use mjc::ast::AstError;
use mjc::semantic_analysis::SemanticError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("File {} does not exist", .0.display())]
    InputFileDoesNotExist(PathBuf),
    #[error("invalid syntax tree json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("malformed syntax tree: {0}")]
    MalformedAst(#[from] AstError),
    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
