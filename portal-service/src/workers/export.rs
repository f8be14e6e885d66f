//! Person directory export job.
//!
//! Builds a spreadsheet of all persons plus a copy of each stored
//! photo, zips them into `{media_root}/person.zip`, and removes the
//! staging directory. The archive is overwritten on each run.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::config::MediaConfig;
use crate::error::AppError;
use crate::models::PersonExportRow;
use crate::services::database::Database;

pub const ARCHIVE_NAME: &str = "person.zip";
const WORKBOOK_NAME: &str = "person.xlsx";

pub async fn run(db: &Database, media: &MediaConfig) -> Result<(), AppError> {
    let rows = db.person_export_rows().await?;
    let media_root = PathBuf::from(&media.root);

    // File work is synchronous, keep it off the async executor
    tokio::task::spawn_blocking(move || write_archive(&rows, &media_root))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Export task panicked: {}", e)))?
}

/// Stage the workbook and photo copies, then zip them into the media
/// root.
pub fn write_archive(rows: &[PersonExportRow], media_root: &Path) -> Result<(), AppError> {
    let staging = media_root.join(format!("export_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&staging)?;

    let result = build_archive_contents(rows, media_root, &staging);

    // Staging is removed whether or not the build succeeded
    if let Err(e) = std::fs::remove_dir_all(&staging) {
        tracing::warn!(path = ?staging, "Failed to remove export staging directory: {}", e);
    }

    result
}

fn build_archive_contents(
    rows: &[PersonExportRow],
    media_root: &Path,
    staging: &Path,
) -> Result<(), AppError> {
    write_workbook(rows, &staging.join(WORKBOOK_NAME))?;

    for row in rows {
        let source = image_fs_path(media_root, &row.image_url);
        let target = staging.join(format!(
            "{}_{}_{}",
            row.id,
            row.last_name,
            file_name_of(&row.image_url)
        ));
        if let Err(e) = std::fs::copy(&source, &target) {
            // A missing photo does not sink the whole export
            tracing::warn!(person_id = row.id, path = ?source, "Skipping photo: {}", e);
        }
    }

    zip_directory(staging, &media_root.join(ARCHIVE_NAME))?;

    tracing::info!(persons = rows.len(), "Person export archive written");
    Ok(())
}

fn write_workbook(rows: &[PersonExportRow], path: &Path) -> Result<(), AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let headers = ["ID", "First name", "Last name", "Image", "Department", "Created at"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write(0, col as u16, *header).map_err(export_err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write(r, 0, row.id).map_err(export_err)?;
        worksheet.write(r, 1, &row.first_name).map_err(export_err)?;
        worksheet.write(r, 2, &row.last_name).map_err(export_err)?;
        worksheet.write(r, 3, &row.image_url).map_err(export_err)?;
        worksheet
            .write(r, 4, &row.department_name)
            .map_err(export_err)?;
        worksheet
            .write(r, 5, row.created_at.to_rfc3339())
            .map_err(export_err)?;
    }

    workbook.save(path).map_err(export_err)?;
    Ok(())
}

fn zip_directory(dir: &Path, archive_path: &Path) -> Result<(), AppError> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut buffer = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        zip.start_file(name, options).map_err(export_err)?;

        buffer.clear();
        File::open(entry.path())?.read_to_end(&mut buffer)?;
        zip.write_all(&buffer)?;
    }

    zip.finish().map_err(export_err)?;
    Ok(())
}

/// Map a stored image URL (`/storage/images/...`) back to its path
/// under the media root.
pub fn image_fs_path(media_root: &Path, image_url: &str) -> PathBuf {
    let relative = image_url
        .trim_start_matches('/')
        .strip_prefix("storage/")
        .unwrap_or(image_url.trim_start_matches('/'));
    media_root.join(relative)
}

fn file_name_of(image_url: &str) -> &str {
    image_url.rsplit('/').next().unwrap_or(image_url)
}

fn export_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::InternalError(anyhow::anyhow!("Export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(id: i64, first: &str, last: &str, image_url: &str) -> PersonExportRow {
        PersonExportRow {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            image_url: image_url.to_string(),
            department_name: "Engineering".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_image_fs_path_strips_storage_prefix() {
        let root = Path::new("storage");
        assert_eq!(
            image_fs_path(root, "/storage/images/a.png"),
            Path::new("storage/images/a.png")
        );
        assert_eq!(
            image_fs_path(root, "images/a.png"),
            Path::new("storage/images/a.png")
        );
    }

    #[test]
    fn test_write_archive_produces_zip_with_workbook() {
        let media = tempfile::tempdir().expect("tempdir");
        let images = media.path().join("images");
        std::fs::create_dir_all(&images).expect("images dir");
        std::fs::write(images.join("a.png"), b"not-really-a-png").expect("image");

        let rows = vec![
            row(1, "Ada", "Lovelace", "/storage/images/a.png"),
            row(2, "Alan", "Turing", "/storage/images/missing.png"),
        ];

        write_archive(&rows, media.path()).expect("archive");

        let archive_path = media.path().join(ARCHIVE_NAME);
        let archive = File::open(&archive_path).expect("open zip");
        let mut zip = zip::ZipArchive::new(archive).expect("read zip");

        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).expect("entry").name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == WORKBOOK_NAME));
        // Present photo is copied, missing one skipped
        assert!(names.iter().any(|n| n.contains("Lovelace")));
        assert!(!names.iter().any(|n| n.contains("Turing")));

        // No staging directory left behind
        let leftovers: Vec<_> = std::fs::read_dir(media.path())
            .expect("read media")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("export_"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_archive_with_no_rows() {
        let media = tempfile::tempdir().expect("tempdir");
        write_archive(&[], media.path()).expect("archive");
        assert!(media.path().join(ARCHIVE_NAME).exists());
    }
}
