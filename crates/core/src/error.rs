//! Error type for the core crate.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read store file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write store file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("failed to serialize stored value: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize stored value: {0}")]
    Deserialization(serde_json::Error),
    #[error("store lock poisoned")]
    StoreLock,

    #[error("remote request failed: {0}")]
    Client(#[from] medview_client::ClientError),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
    #[error("invalid text: {0}")]
    Text(#[from] medview_types::TextError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
