//! 助手回复的显示排版：句末断段、编号列表换行、小节标题前空行

use std::sync::OnceLock;

use regex::Regex;

struct Patterns {
    sentence_end: Regex,
    numbered: Regex,
    header: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        sentence_end: Regex::new(r"([.!?])\s+").expect("valid regex"),
        numbered: Regex::new(r"(\d+\.\s)").expect("valid regex"),
        header: Regex::new(r"([A-Z][a-z]+:)").expect("valid regex"),
    })
}

/// 长回复排版，仅影响显示，不改变消息本身
pub fn format_message(text: &str) -> String {
    let p = patterns();
    let s = p.sentence_end.replace_all(text, "$1\n\n");
    let s = p.numbered.replace_all(&s, "\n$1");
    let s = p.header.replace_all(&s, "\n\n$1");
    s.trim().to_string()
}
