use crate::error::ResolveError;
use crate::types::Gallery;

/// metadata 檔案的網址格式
const METADATA_BASE: &str = "https://ltn.hitomi.la/galleries";

/// galleries/<id>.js 實際上是一段 JS 賦值
const ASSIGNMENT_PREFIX: &[u8] = b"var galleryinfo = ";

/// 從畫廊網址取出編號：最後一個 '-' 到副檔名之間的文字
///
/// `https://hitomi.la/doujinshi/some-title-123456.html` → `123456`
pub fn gallery_id_from_url(url: &str) -> Result<&str, ResolveError> {
    let last = url.rsplit('-').next().unwrap_or(url);
    let id = last.split('.').next().unwrap_or(last).trim();

    if id.is_empty() {
        return Err(ResolveError::InvalidUrl(url.to_string()));
    }
    Ok(id)
}

pub fn metadata_url(id: &str) -> String {
    format!("{}/{}.js", METADATA_BASE, id)
}

/// 移除 `var galleryinfo = ` 後以 JSON 解析
pub fn parse_gallery(body: &[u8]) -> Result<Gallery, ResolveError> {
    let json = strip_assignment(body);
    Ok(serde_json::from_slice(json)?)
}

fn strip_assignment(body: &[u8]) -> &[u8] {
    let body = body.trim_ascii_start();
    let body = body.strip_prefix(ASSIGNMENT_PREFIX).unwrap_or(body);
    let body = body.trim_ascii_end();
    body.strip_suffix(b";").unwrap_or(body)
}
