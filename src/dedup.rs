use std::collections::HashSet;
use std::hash::Hash;

/// 檔名不允許的字元
const ILLEGAL_CHARS: [char; 9] = [':', '/', '\\', '?', '*', '"', '<', '>', '|'];

/// 去除重複項目，保留第一次出現的順序
pub fn dedup<T>(items: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// 移除檔名非法字元，其他字元（包含空白、大小寫）完全不動
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        assert_eq!(dedup(["a", "b", "a"]), vec!["a", "b"]);
        assert_eq!(dedup(["c", "a", "c", "b", "a"]), vec!["c", "a", "b"]);
        assert!(dedup(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_dedup_idempotent() {
        let input = vec!["x", "y", "x", "z", "y", "x"];
        let once = dedup(input);
        let twice = dedup(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("a:b/c*d"), "abcd");
        assert_eq!(sanitize_name(r#"\?"<>|"#), "");
        // 非法字元以外的內容不做任何處理
        assert_eq!(sanitize_name("  Mixed Case 日本語 (1) "), "  Mixed Case 日本語 (1) ");
    }
}
