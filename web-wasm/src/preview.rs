//! プレビュー用オブジェクトURLの管理
//!
//! 差し替え・破棄時に古いURLを返すので、呼び出し側は
//! revoke_object_url をちょうど1回だけ呼べる。

/// プレビューURLの保持枠
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewSlot {
    url: Option<String>,
}

impl PreviewSlot {
    /// 新しいURLに差し替え、解放すべき古いURLを返す
    pub fn replace(&mut self, url: String) -> Option<String> {
        self.url.replace(url)
    }

    /// URLを取り出して空にする
    pub fn take(&mut self) -> Option<String> {
        self.url.take()
    }

    /// 保持中のURL
    pub fn current(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_returns_previous_url() {
        let mut slot = PreviewSlot::default();
        assert_eq!(slot.replace("blob:a".to_string()), None);
        assert_eq!(slot.replace("blob:b".to_string()), Some("blob:a".to_string()));
        assert_eq!(slot.current(), Some("blob:b"));
    }

    #[test]
    fn test_take_empties_slot() {
        let mut slot = PreviewSlot::default();
        slot.replace("blob:a".to_string());

        assert_eq!(slot.take(), Some("blob:a".to_string()));
        assert_eq!(slot.take(), None);
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn test_consecutive_picks_release_each_url_once() {
        // N回選び直しても解放対象は毎回ちょうど1つ
        let mut slot = PreviewSlot::default();
        let mut released = Vec::new();

        for i in 0..5 {
            if let Some(old) = slot.replace(format!("blob:{}", i)) {
                released.push(old);
            }
        }
        if let Some(last) = slot.take() {
            released.push(last);
        }

        assert_eq!(released, ["blob:0", "blob:1", "blob:2", "blob:3", "blob:4"]);
    }
}
