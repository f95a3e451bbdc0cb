//! 圖片 CDN 網址推導
//!
//! 子網域的分流規則是遠端未公開的約定，下面的常數必須逐字保留，
//! 任何改動都會讓下載失敗。

use crate::error::DownloadError;
use crate::types::Image;
use std::path::Path;

const CDN_HOST: &str = "hitomi.la";

/// 小於這個值只有兩個分流
const TWO_SHARD_THRESHOLD: u32 = 0x30;

/// 小於這個值一律視為 1
const CLAMP_THRESHOLD: u32 = 0x09;

/// 要下載的檔案格式，優先順序 avif > webp > 原檔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Avif,
    Webp,
    Original,
}

impl AssetKind {
    pub fn for_image(image: &Image) -> Self {
        if image.has_avif {
            AssetKind::Avif
        } else if image.has_webp {
            AssetKind::Webp
        } else {
            AssetKind::Original
        }
    }

    fn directory(self) -> &'static str {
        match self {
            AssetKind::Avif => "avif",
            AssetKind::Webp => "webp",
            AssetKind::Original => "images",
        }
    }

    fn shard_suffix(self) -> char {
        match self {
            AssetKind::Avif | AssetKind::Webp => 'a',
            AssetKind::Original => 'b',
        }
    }
}

/// 產生圖片下載網址（純函式，不做 I/O）
pub fn image_url(image: &Image) -> Result<String, DownloadError> {
    let kind = AssetKind::for_image(image);
    let hash = image.content_hash.as_str();

    if hash.len() < 3 || !hash.is_ascii() {
        return Err(DownloadError::InvalidHash(hash.to_string()));
    }
    let h1 = &hash[hash.len() - 1..];
    let h2 = &hash[hash.len() - 3..hash.len() - 1];

    let extension = match kind {
        AssetKind::Avif => ".avif".to_string(),
        AssetKind::Webp => ".webp".to_string(),
        AssetKind::Original => Path::new(&image.file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default(),
    };

    Ok(format!(
        "https://{}.{}/{}/{}/{}/{}{}",
        subdomain(h2, kind),
        CDN_HOST,
        kind.directory(),
        h1,
        h2,
        hash,
        extension
    ))
}

/// 分流子網域，例如 "ba"
fn subdomain(h2: &str, kind: AssetKind) -> String {
    // h2 不是 16 進位時遠端只認 "a"
    let Ok(mut g) = u32::from_str_radix(h2, 16) else {
        return "a".to_string();
    };

    let shard_count = if g < TWO_SHARD_THRESHOLD { 2 } else { 3 };
    if g < CLAMP_THRESHOLD {
        g = 1;
    }
    let letter = char::from(b'a' + (g % shard_count) as u8);

    format!("{}{}", letter, kind.shard_suffix())
}

/// 存檔名稱：下載 avif/webp 時副檔名跟著換
pub fn output_file_name(image: &Image) -> String {
    let path = Path::new(&image.file_name);
    match AssetKind::for_image(image) {
        AssetKind::Avif => path.with_extension("avif").to_string_lossy().into_owned(),
        AssetKind::Webp => path.with_extension("webp").to_string_lossy().into_owned(),
        AssetKind::Original => image.file_name.clone(),
    }
}
