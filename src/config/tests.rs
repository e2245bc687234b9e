use super::*;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.vector_db.backend, "lancedb");
    assert_eq!(config.vector_db.collection_name, "code_embeddings");
    assert_eq!(config.embedding.model_name, "all-minilm-l6-v2");
    assert_eq!(config.embedding.max_input_chars, 30_000);
    assert_eq!(config.indexing.json_group_size, 5);
    assert!(config.indexing.respect_gitignore);
    assert_eq!(config.search.default_top_k, 2);
    assert_eq!(config.search.max_top_k, 10);
    assert_eq!(config.update.max_new_code_chars, 10_000);
}

#[test]
fn test_validate_valid_config() {
    assert!(Config::default().validate().is_ok());

    let mut config = Config::default();
    config.vector_db.backend = "memory".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_invalid_backend() {
    let mut config = Config::default();
    config.vector_db.backend = "qdrant".to_string();
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        RagError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "vector_db.backend"
    ));
}

#[test]
fn test_validate_zero_group_size() {
    let mut config = Config::default();
    config.indexing.json_group_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_top_k_bounds() {
    let mut config = Config::default();
    config.search.default_top_k = 11;
    assert!(config.validate().is_err());

    config.search.default_top_k = 0;
    assert!(config.validate().is_err());

    config.search.default_top_k = 10;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_blank_collection() {
    let mut config = Config::default();
    config.vector_db.collection_name = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let mut config = Config::default();
    config.indexing.json_group_size = 8;
    config.indexing.root_path = PathBuf::from("/srv/site");
    config.search.default_top_k = 4;

    config.save(path).unwrap();
    let loaded = Config::from_file(path).unwrap();

    assert_eq!(loaded.indexing.json_group_size, 8);
    assert_eq!(loaded.indexing.root_path, PathBuf::from("/srv/site"));
    assert_eq!(loaded.search.default_top_k, 4);
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(
        temp_file.path(),
        "[vector_db]\nbackend = \"memory\"\n\n[indexing]\nroot_path = \"web\"\n",
    )
    .unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.vector_db.backend, "memory");
    assert_eq!(config.vector_db.collection_name, "code_embeddings");
    assert_eq!(config.indexing.root_path, PathBuf::from("web"));
    assert_eq!(config.indexing.json_group_size, 5);
    assert_eq!(config.update.max_new_code_chars, 10_000);
}

#[test]
fn test_invalid_toml() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "[vector_db\nbackend=").unwrap();
    assert!(matches!(
        Config::from_file(temp_file.path()).unwrap_err(),
        RagError::Config(ConfigError::ParseFailed(_))
    ));
}

#[test]
fn test_load_nonexistent_file() {
    let result = Config::from_file(Path::new("/nonexistent/config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        RagError::Config(ConfigError::FileNotFound(_))
    ));
}

#[test]
fn test_apply_env_overrides() {
    // Safety: these variables are only touched by this test
    unsafe {
        std::env::set_var("CODE_SYNC_ROOT", "/tmp/project");
        std::env::set_var("CODE_SYNC_COLLECTION", "site_chunks");
        std::env::set_var("CODE_SYNC_DB_BACKEND", "memory");
        std::env::set_var("CODE_SYNC_MODEL", "BAAI/bge-small-en-v1.5");
    }

    let mut config = Config::default();
    config.apply_env_overrides();

    assert_eq!(config.indexing.root_path, PathBuf::from("/tmp/project"));
    assert_eq!(config.vector_db.collection_name, "site_chunks");
    assert_eq!(config.vector_db.backend, "memory");
    assert_eq!(config.embedding.model_name, "BAAI/bge-small-en-v1.5");

    unsafe {
        std::env::remove_var("CODE_SYNC_ROOT");
        std::env::remove_var("CODE_SYNC_COLLECTION");
        std::env::remove_var("CODE_SYNC_DB_BACKEND");
        std::env::remove_var("CODE_SYNC_MODEL");
    }
}

#[test]
fn test_toml_serialization() {
    let toml_str = toml::to_string(&Config::default()).unwrap();
    assert!(toml_str.contains("json_group_size"));
    assert!(toml_str.contains("max_new_code_chars"));
    assert!(toml_str.contains("collection_name"));
}
