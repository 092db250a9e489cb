use thiserror::Error;

#[derive(Debug, Error)]
pub enum InlineError {
    #[error("{file}: removal of \"{module}\" names module item {index}, which is not an import declaration")]
    RemovalNotAnImport {
        file: String,
        module: String,
        index: usize,
    },
}
