use crate::crawler::CrawlerConfig;
use crate::dedup::{dedup, sanitize_name};
use crate::types::Gallery;
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 檔案操作管理器
pub struct FileManager {
    /// 存檔根目錄
    root_dir: PathBuf,
}

impl FileManager {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// 讀取設定檔
    pub fn load_config(path: &Path) -> Result<CrawlerConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取設定檔 {}", path.display()))?;

        let config: CrawlerConfig = serde_json::from_str(&content)
            .with_context(|| format!("無法解析設定檔 {}", path.display()))?;

        Ok(config)
    }

    /// 讀取畫廊清單（一行一個網址），去重後保留原順序
    pub fn load_gallery_list(path: &Path) -> Result<Vec<String>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                bail!("找不到清單檔案 {}", path.display())
            }
            Err(e) => {
                return Err(e).with_context(|| format!("無法讀取清單檔案 {}", path.display()));
            }
        };

        let urls = dedup(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );

        if urls.is_empty() {
            bail!("清單檔案 {} 是空的", path.display());
        }

        Ok(urls)
    }

    /// 建立畫廊目錄：<root>/<語言>/<標題>
    ///
    /// 目錄已存在時改用 `<標題> - <id>`，再失敗就放棄整個畫廊。
    pub fn create_gallery_dir(&self, gallery: &Gallery) -> Result<PathBuf> {
        let language_dir = self.root_dir.join(gallery.language_dir());
        fs::create_dir_all(&language_dir)
            .with_context(|| format!("無法建立目錄 {}", language_dir.display()))?;

        let title = sanitize_name(gallery.display_title());
        let primary = language_dir.join(&title);

        match fs::create_dir(&primary) {
            Ok(()) => return Ok(primary),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("無法建立目錄 {}", primary.display()));
            }
        }

        let fallback = language_dir.join(format!("{} - {}", title, gallery.id));
        fs::create_dir(&fallback)
            .with_context(|| format!("無法建立目錄 {}", fallback.display()))?;

        Ok(fallback)
    }

    /// 儲存圖片檔案（覆寫既有檔案）
    pub async fn save_image(path: &Path, data: &[u8]) -> Result<()> {
        tokio::fs::write(path, data)
            .await
            .with_context(|| format!("無法寫入圖片檔案 {}", path.display()))?;
        Ok(())
    }
}
