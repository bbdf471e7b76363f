// ============================================================================
// 打包服务：归档命名、目标路径布局、ZIP 打包
// 纯 Rust 函数，方便单元测试
// ============================================================================

use std::ffi::OsString;
use std::fs::Metadata;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::utils::error::{AppError, AppResult};

/// 超过此大小的文件需要以 zip64 写入
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// 归档文件名：未以 `.zip` 结尾（忽略大小写）时补上后缀
pub fn archive_file_name(archive_name: &str) -> String {
    let has_suffix = archive_name
        .get(archive_name.len().saturating_sub(4)..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case(".zip"));
    if has_suffix {
        archive_name.to_string()
    } else {
        format!("{}.zip", archive_name)
    }
}

/// 项目子目录名，即遍历根目录最后一段路径
pub fn project_folder_name(root: &Path) -> AppResult<OsString> {
    root.file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| AppError::ProjectNameError(root.to_path_buf()))
}

/// `<备份根目录>/<项目名>/<归档文件名>`
pub fn target_archive_path(backup_root: &Path, project: &OsString, file_name: &str) -> PathBuf {
    backup_root.join(project).join(file_name)
}

/// 确保目标目录存在，并删除同名旧归档
///
/// 不做合并、追加或版本保留，始终整体覆盖。
pub fn prepare_destination(archive_path: &Path) -> AppResult<()> {
    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::ArchiveError(format!("无法创建目录 {}: {}", parent.display(), e))
        })?;
    }
    if archive_path.is_file() {
        log::info!("删除旧归档：{}", archive_path.display());
        std::fs::remove_file(archive_path).map_err(|e| {
            AppError::ArchiveError(format!("无法删除旧归档 {}: {}", archive_path.display(), e))
        })?;
    }
    Ok(())
}

/// 归档条目名：相对遍历根目录的路径，统一使用正斜杠
pub fn entry_name(root: &Path, file: &Path) -> AppResult<String> {
    let relative = file.strip_prefix(root).map_err(|e| {
        AppError::ArchiveError(format!("路径处理失败 {}: {}", file.display(), e))
    })?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Ok(parts.join("/"))
}

/// 打包结果统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// 写入的条目数
    pub entry_count: usize,
    /// 归档文件最终大小（字节）
    pub archive_bytes: u64,
}

/// 将文件列表写入新的 ZIP 归档
///
/// 使用 Deflate 最高压缩等级，保留源文件修改时间。
/// 任何一个文件读写失败都会直接返回错误，已写入的部分归档保留在磁盘上，不做清理。
/// 函数返回前归档句柄已释放。
pub fn create_zip_from_files(
    root: &Path,
    files: &[PathBuf],
    zip_path: &Path,
) -> AppResult<ArchiveSummary> {
    let file = std::fs::File::create(zip_path).map_err(|e| {
        AppError::ArchiveError(format!("无法创建 ZIP 文件 {}: {}", zip_path.display(), e))
    })?;
    let mut zip_writer = zip::ZipWriter::new(file);

    for path in files {
        let name = entry_name(root, path)?;

        let mut source = std::fs::File::open(path).map_err(|e| {
            AppError::ArchiveError(format!("读取文件失败 {}: {}", path.display(), e))
        })?;
        let metadata = source.metadata()?;

        zip_writer.start_file(name.as_str(), entry_options(&metadata))?;

        // 流式写入：分块读取文件，避免大文件一次性加载到内存
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = source.read(&mut buf).map_err(|e| {
                AppError::ArchiveError(format!("读取文件失败 {}: {}", path.display(), e))
            })?;
            if n == 0 {
                break;
            }
            zip_writer.write_all(&buf[..n]).map_err(|e| {
                AppError::ArchiveError(format!("写入条目失败 {}: {}", name, e))
            })?;
        }
        log::debug!("已写入条目：{}", name);
    }

    let file = zip_writer.finish()?;
    let archive_bytes = file.metadata()?.len();
    drop(file);

    Ok(ArchiveSummary {
        entry_count: files.len(),
        archive_bytes,
    })
}

/// 单个条目的写入选项：Deflate 最高压缩等级，超大文件启用 zip64
fn entry_options(metadata: &Metadata) -> zip::write::SimpleFileOptions {
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(9))
        .large_file(metadata.len() >= LARGE_FILE_THRESHOLD);
    match zip_timestamp(metadata) {
        Some(modified) => options.last_modified_time(modified),
        None => options,
    }
}

/// 源文件修改时间转换为本地时间的 ZIP 时间戳
///
/// 早于 1980 年或晚于 2107 年的时间无法表示，返回 None 使用默认时间戳。
fn zip_timestamp(metadata: &Metadata) -> Option<zip::DateTime> {
    let modified = metadata.modified().ok()?;
    let mut datetime = time::OffsetDateTime::from(modified);
    if let Ok(offset) = time::UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    zip::DateTime::try_from(datetime).ok()
}

/// 计算文件的 SHA-256 摘要（小写十六进制）
pub fn file_digest(path: &Path) -> AppResult<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn read_entries(zip_path: &Path) -> Vec<(String, String)> {
        let zip_file = fs::File::open(zip_path).unwrap();
        let mut archive = zip::ZipArchive::new(zip_file).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            entries.push((entry.name().to_string(), content));
        }
        entries
    }

    #[test]
    fn test_archive_file_name_appends_suffix() {
        assert_eq!(archive_file_name("backup"), "backup.zip");
    }

    #[test]
    fn test_archive_file_name_keeps_existing_suffix() {
        assert_eq!(archive_file_name("backup.zip"), "backup.zip");
        assert_eq!(archive_file_name("backup.ZIP"), "backup.ZIP");
        assert_eq!(archive_file_name("backup.Zip"), "backup.Zip");
    }

    #[test]
    fn test_archive_file_name_suffix_must_be_at_end() {
        assert_eq!(archive_file_name("backup.zip.old"), "backup.zip.old.zip");
        assert_eq!(archive_file_name("zip"), "zip.zip");
    }

    #[test]
    fn test_archive_file_name_multibyte() {
        assert_eq!(archive_file_name("备份"), "备份.zip");
        assert_eq!(archive_file_name("备份.zip"), "备份.zip");
    }

    #[test]
    fn test_project_folder_name() {
        let name = project_folder_name(Path::new("/home/user/my-project")).unwrap();
        assert_eq!(name, OsString::from("my-project"));
    }

    #[cfg(unix)]
    #[test]
    fn test_project_folder_name_filesystem_root() {
        let result = project_folder_name(Path::new("/"));
        assert!(matches!(result, Err(AppError::ProjectNameError(_))));
    }

    #[test]
    fn test_target_archive_path_layout() {
        let path = target_archive_path(
            Path::new("/backups"),
            &OsString::from("proj"),
            "snap.zip",
        );
        assert_eq!(path, Path::new("/backups").join("proj").join("snap.zip"));
    }

    #[test]
    fn test_prepare_destination_creates_intermediate_dirs() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("a").join("b").join("proj").join("x.zip");
        prepare_destination(&archive).unwrap();
        assert!(archive.parent().unwrap().is_dir());
        assert!(!archive.exists());
    }

    #[test]
    fn test_prepare_destination_removes_old_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("x.zip");
        fs::write(&archive, "old").unwrap();
        prepare_destination(&archive).unwrap();
        assert!(!archive.exists());
    }

    #[test]
    fn test_entry_name_is_root_relative() {
        let root = Path::new("/work/proj");
        let name = entry_name(root, &root.join("src").join("main.rs")).unwrap();
        assert_eq!(name, "src/main.rs");
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_name_keeps_literal_backslash() {
        let root = Path::new("/work/proj");
        let name = entry_name(root, &root.join("notes").join("a\\b.txt")).unwrap();
        assert_eq!(name, "notes/a\\b.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_create_zip_from_files_backslash_names_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("proj");
        fs::create_dir_all(src.join("a")).unwrap();
        fs::write(src.join("a\\b.txt"), "flat").unwrap();
        fs::write(src.join("a").join("b.txt"), "nested").unwrap();

        let files = vec![src.join("a\\b.txt"), src.join("a").join("b.txt")];
        let zip_path = dir.path().join("out.zip");
        create_zip_from_files(&src, &files, &zip_path).unwrap();

        let entries = read_entries(&zip_path);
        assert_eq!(
            entries,
            vec![
                ("a\\b.txt".to_string(), "flat".to_string()),
                ("a/b.txt".to_string(), "nested".to_string()),
            ]
        );
    }

    #[test]
    fn test_entry_name_outside_root_is_error() {
        let result = entry_name(Path::new("/work/proj"), Path::new("/elsewhere/file"));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_zip_from_files_basic() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("proj");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("hello.txt"), "你好世界").unwrap();
        fs::write(src.join("sub").join("nested.txt"), "嵌套文件").unwrap();

        let files = vec![src.join("hello.txt"), src.join("sub").join("nested.txt")];
        let zip_path = dir.path().join("out.zip");
        let summary = create_zip_from_files(&src, &files, &zip_path).unwrap();

        assert_eq!(summary.entry_count, 2);
        assert_eq!(summary.archive_bytes, fs::metadata(&zip_path).unwrap().len());

        let entries = read_entries(&zip_path);
        assert_eq!(
            entries,
            vec![
                ("hello.txt".to_string(), "你好世界".to_string()),
                ("sub/nested.txt".to_string(), "嵌套文件".to_string()),
            ]
        );
    }

    #[test]
    fn test_create_zip_from_files_uses_deflate() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("proj");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("big.txt"), "abc".repeat(10_000)).unwrap();

        let zip_path = dir.path().join("out.zip");
        create_zip_from_files(&src, &[src.join("big.txt")], &zip_path).unwrap();

        let mut archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
        assert!(entry.compressed_size() < entry.size());
    }

    #[test]
    fn test_create_zip_from_files_empty_list() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("empty.zip");
        let summary = create_zip_from_files(dir.path(), &[], &zip_path).unwrap();
        assert_eq!(summary.entry_count, 0);
        assert!(read_entries(&zip_path).is_empty());
    }

    #[test]
    fn test_create_zip_from_files_missing_source_leaves_partial_archive() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("proj");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("ok.txt"), "ok").unwrap();

        let files = vec![src.join("ok.txt"), src.join("vanished.txt")];
        let zip_path = dir.path().join("partial.zip");
        let result = create_zip_from_files(&src, &files, &zip_path);

        assert!(matches!(result, Err(AppError::ArchiveError(_))));
        assert!(zip_path.exists());
    }

    #[test]
    fn test_file_digest_known_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            file_digest(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// 带或不带后缀的同一名称得到相同的归档文件名，且不会出现双重后缀
        #[test]
        fn prop_archive_file_name_idempotent(name in "[a-zA-Z0-9_-]{1,20}") {
            let once = archive_file_name(&name);
            prop_assert!(once.to_ascii_lowercase().ends_with(".zip"));
            prop_assert!(!once.ends_with(".zip.zip"));
            prop_assert_eq!(archive_file_name(&once), once.clone());
            prop_assert_eq!(archive_file_name(&format!("{}.zip", name)), format!("{}.zip", name));
        }
    }
}
