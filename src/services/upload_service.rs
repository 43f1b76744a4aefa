// src/services/upload_service.rs
//
// Imagens enviadas por multipart, gravadas em disco e servidas em /uploads.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use thiserror::Error;
use uuid::Uuid;

use crate::models::upload::UploadedFile;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
pub const MAX_FILES: usize = 10;
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_TYPES: [(&str, &str); 5] = [
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("tipo de arquivo não permitido: {0}")]
    InvalidType(String),

    #[error("arquivo maior que o limite")]
    TooLarge,

    #[error("arquivos demais na mesma requisição")]
    TooManyFiles,

    #[error("nenhum arquivo enviado")]
    NoFile,

    #[error("nome de arquivo inválido")]
    InvalidFilename,

    #[error("arquivo não encontrado")]
    NotFound,

    #[error("multipart inválido: {0}")]
    Multipart(String),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),
}

/// Arquivo lido do multipart, ainda não gravado.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Confere tipo e tamanho. Devolve a extensão canônica do tipo.
pub fn validate_image(content_type: &str, size: usize) -> Result<&'static str, UploadError> {
    let content_type = content_type.trim().to_ascii_lowercase();
    let extension = ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| UploadError::InvalidType(content_type.clone()))?;

    if size > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge);
    }
    Ok(extension)
}

/// Só nomes simples: nada de separadores ou `..`.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('\0')
}

/// `{stem}-{millis}-{aleatório}{ext}`, com o stem reduzido a ASCII seguro.
pub fn unique_filename(original_name: &str, fallback_ext: &str) -> String {
    let path = Path::new(original_name);
    let stem: String = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    let stem = if stem.is_empty() { "file" } else { stem };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .filter(|e| ALLOWED_TYPES.iter().any(|(_, allowed)| allowed == e) || e == ".jpeg")
        .unwrap_or_else(|| fallback_ext.to_string());

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let random = Uuid::new_v4().simple().to_string();

    format!("{}-{}-{}{}", stem, millis, &random[..8], ext)
}

#[derive(Clone)]
pub struct UploadService {
    dir: PathBuf,
}

impl UploadService {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn save(&self, file: IncomingFile) -> Result<UploadedFile, UploadError> {
        let extension = validate_image(&file.content_type, file.bytes.len())?;
        let filename = unique_filename(&file.original_name, extension);

        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&filename), &file.bytes).await?;

        tracing::info!(filename = %filename, size = file.bytes.len(), "📎 Arquivo salvo");

        Ok(UploadedFile {
            url: format!("{}/{}", PUBLIC_PREFIX, filename),
            filename,
            original_name: file.original_name,
            size: file.bytes.len(),
            mimetype: file.content_type,
        })
    }

    /// Valida tudo antes de gravar qualquer arquivo.
    pub async fn save_many(&self, files: Vec<IncomingFile>) -> Result<Vec<UploadedFile>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFile);
        }
        if files.len() > MAX_FILES {
            return Err(UploadError::TooManyFiles);
        }
        for file in &files {
            validate_image(&file.content_type, file.bytes.len())?;
        }

        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            saved.push(self.save(file).await?);
        }
        Ok(saved)
    }

    pub async fn delete(&self, filename: &str) -> Result<(), UploadError> {
        if !is_safe_filename(filename) {
            return Err(UploadError::InvalidFilename);
        }
        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(e) => Err(UploadError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, size: usize) -> IncomingFile {
        IncomingFile {
            original_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8; size],
        }
    }

    fn temp_service() -> UploadService {
        UploadService::new(std::env::temp_dir().join(format!("uploads-test-{}", Uuid::new_v4())))
    }

    #[test]
    fn accepts_only_common_image_types() {
        assert_eq!(validate_image("image/jpeg", 10).unwrap(), ".jpg");
        assert_eq!(validate_image("IMAGE/PNG", 10).unwrap(), ".png");
        assert!(matches!(validate_image("application/pdf", 10), Err(UploadError::InvalidType(_))));
        assert!(matches!(validate_image("image/png", MAX_FILE_SIZE + 1), Err(UploadError::TooLarge)));
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(is_safe_filename("photo-1-abc.jpg"));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("a/b.png"));
        assert!(!is_safe_filename("a\\b.png"));
        assert!(!is_safe_filename(""));
    }

    #[test]
    fn unique_names_keep_stem_and_extension() {
        let name = unique_filename("Site Photo.JPG", ".jpg");
        assert!(name.starts_with("Site-Photo-"));
        assert!(name.ends_with(".jpg"));

        // Extensão estranha cai na do tipo declarado
        let name = unique_filename("รูปภาพ.exe", ".png");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".png"));

        assert_ne!(unique_filename("a.png", ".png"), unique_filename("a.png", ".png"));
    }

    #[tokio::test]
    async fn save_then_delete_roundtrip_on_disk() {
        let service = temp_service();
        let saved = service.save(png("logo.png", 16)).await.unwrap();

        assert!(saved.url.starts_with("/uploads/logo-"));
        assert_eq!(saved.size, 16);
        assert!(service.dir().join(&saved.filename).exists());

        service.delete(&saved.filename).await.unwrap();
        assert!(matches!(service.delete(&saved.filename).await, Err(UploadError::NotFound)));

        let _ = tokio::fs::remove_dir_all(service.dir()).await;
    }

    #[tokio::test]
    async fn batch_is_validated_before_writing() {
        let service = temp_service();
        let batch = vec![
            png("ok.png", 8),
            IncomingFile {
                original_name: "doc.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: vec![1, 2, 3],
            },
        ];

        assert!(matches!(service.save_many(batch).await, Err(UploadError::InvalidType(_))));
        assert!(!service.dir().exists());

        assert!(matches!(service.save_many(vec![]).await, Err(UploadError::NoFile)));
        let too_many = (0..=MAX_FILES).map(|i| png(&format!("{i}.png"), 1)).collect();
        assert!(matches!(service.save_many(too_many).await, Err(UploadError::TooManyFiles)));
    }
}
