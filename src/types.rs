use bytes::Bytes;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// 單一畫廊的 metadata（由 galleries/<id>.js 解析而來）
#[derive(Debug, Clone, Deserialize)]
pub struct Gallery {
    /// 畫廊編號，遠端可能給字串也可能給數字
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// 標題
    #[serde(default)]
    pub title: String,
    /// 日文標題（可能為 null）
    #[serde(rename = "japanese_title", default, deserialize_with = "null_as_empty")]
    pub alternate_title: String,
    /// 語言（可能為 null）
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
    /// 圖片列表，順序即頁碼順序
    #[serde(rename = "files", default)]
    pub images: Vec<Image>,
}

impl Gallery {
    /// 目錄使用的標題：優先日文標題
    pub fn display_title(&self) -> &str {
        if self.alternate_title.is_empty() {
            &self.title
        } else {
            &self.alternate_title
        }
    }

    /// 語言目錄名稱，沒有語言時用 "null"
    pub fn language_dir(&self) -> &str {
        if self.language.is_empty() {
            "null"
        } else {
            &self.language
        }
    }
}

/// 單張圖片
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Image {
    #[serde(rename = "name")]
    pub file_name: String,
    #[serde(rename = "hash")]
    pub content_hash: String,
    #[serde(rename = "haswebp", default, deserialize_with = "flag")]
    pub has_webp: bool,
    #[serde(rename = "hasavif", default, deserialize_with = "flag")]
    pub has_avif: bool,
}

/// 下載任務：每張圖片一個
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub image: Image,
    pub gallery: Gallery,
    pub destination: PathBuf,
}

/// 寫檔任務：下載成功後才會產生
#[derive(Debug)]
pub struct WriteJob {
    pub payload: Bytes,
    pub path: PathBuf,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id 必須是字串或數字，實際為 {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// haswebp / hasavif 在舊資料是 0/1，新資料可能是 bool 或 null
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_i64() == Some(1)),
        serde_json::Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "旗標必須是 0/1 或 bool，實際為 {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_deserialize_mixed_types() {
        let json = r#"{
            "id": 1234,
            "title": "Title",
            "japanese_title": null,
            "language": "japanese",
            "files": [
                {"name": "01.jpg", "hash": "abc", "haswebp": 1, "hasavif": 0},
                {"name": "02.png", "hash": "def", "haswebp": true}
            ]
        }"#;

        let gallery: Gallery = serde_json::from_str(json).unwrap();
        assert_eq!(gallery.id, "1234");
        assert_eq!(gallery.alternate_title, "");
        assert_eq!(gallery.display_title(), "Title");
        assert_eq!(gallery.images.len(), 2);
        assert!(gallery.images[0].has_webp);
        assert!(!gallery.images[0].has_avif);
        assert!(gallery.images[1].has_webp);
        assert!(!gallery.images[1].has_avif);
    }

    #[test]
    fn test_language_dir_fallback() {
        let gallery: Gallery =
            serde_json::from_str(r#"{"id": "9", "title": "t", "japanese_title": "日本", "language": null}"#)
                .unwrap();
        assert_eq!(gallery.language_dir(), "null");
        assert_eq!(gallery.display_title(), "日本");
        assert!(gallery.images.is_empty());
    }
}
