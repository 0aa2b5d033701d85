//! 界面渲染
//!
//! 三栏布局：左侧为连接 / 智能体状态与统计，中间为对话历史与输入框，右侧为活动日志。
//! 只读 SessionSnapshot，不持有任何会话状态。

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::activity::{ActivityLogEntry, LogAction};
use crate::core::{AgentStatus, SessionSnapshot};
use crate::session::{Message, Strategy};
use crate::ui::format::format_message;

/// 单条消息在 UI 中显示的最大字符数，超出折叠
const MAX_DISPLAY_CHARS: usize = 1200;

/// 界面本地状态（不属于会话）
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub show_stats: bool,
    pub chat_scroll: usize,
}

fn truncate_for_display(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= MAX_DISPLAY_CHARS {
        return content.to_string();
    }
    let head: String = chars.iter().take(MAX_DISPLAY_CHARS).collect();
    format!("{}\n... [{} chars total]", head, chars.len())
}

/// 截取从 offset 起的 height 行；行数超过 u16 范围时仍能定位到末尾
fn visible_window<'a>(lines: Vec<Line<'a>>, offset: usize, height: usize) -> Vec<Line<'a>> {
    lines.into_iter().skip(offset).take(height).collect()
}

/// 将内容按宽度换行，支持 UTF-8（按字符数，避免在 UTF-8 中间截断）
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        for ch in para.chars() {
            if line.chars().count() >= width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn strategy_color(strategy: &Strategy) -> Color {
    match strategy {
        Strategy::General => Color::Blue,
        Strategy::Vector => Color::Magenta,
        Strategy::KnowledgeGraph => Color::Yellow,
        Strategy::Hybrid => Color::Green,
        Strategy::Other(_) => Color::DarkGray,
    }
}

fn status_color(status: AgentStatus) -> Color {
    match status {
        AgentStatus::Ready | AgentStatus::Connected => Color::Green,
        AgentStatus::Processing => Color::Yellow,
        AgentStatus::Disconnected | AgentStatus::Error => Color::Red,
    }
}

/// 绘制一帧；将对话区 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(
    f: &mut Frame,
    state: &SessionSnapshot,
    input_buffer: &str,
    view: &ViewState,
    out: &mut (usize, usize),
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(40),
            Constraint::Length(46),
        ])
        .split(f.area());

    draw_status_panel(f, state, view, columns[0]);
    *out = draw_chat_panel(f, state, input_buffer, view, columns[1]);
    draw_activity_panel(f, &state.activity, columns[2]);
}

fn draw_status_panel(f: &mut Frame, state: &SessionSnapshot, view: &ViewState, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);

    let (dot, dot_color, conn) = if state.connected {
        ("●", Color::Green, "Connected")
    } else {
        ("○", Color::Red, "Disconnected")
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", dot), Style::default().fg(dot_color)),
            Span::raw(conn),
        ]),
        Line::from(vec![
            Span::raw("Agent: "),
            Span::styled(
                state.agent_status.to_string(),
                Style::default().fg(status_color(state.agent_status)),
            ),
        ]),
        Line::from(format!("Messages: {}", state.messages.len())),
        Line::from(format!(
            "Session: {}",
            state.session_id.as_deref().unwrap_or("-")
        )),
        Line::from(vec![
            Span::raw("Strategy: "),
            match &state.current_strategy {
                Some(s) => Span::styled(s.to_string(), Style::default().fg(strategy_color(s))),
                None => Span::raw("-"),
            },
        ]),
    ];
    let status = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title(" System Status ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(status, rows[0]);

    let (title, body) = if view.show_stats {
        (
            " Statistics ",
            serde_json::to_string_pretty(&state.stats).unwrap_or_default(),
        )
    } else {
        (
            " Keys ",
            "Enter   send\nShift+Enter  new line\nCtrl+L  clear chat\nCtrl+R  refresh status\nCtrl+S  statistics\nCtrl+Q  quit".to_string(),
        )
    };
    let lower = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(lower, rows[1]);
}

fn message_lines(m: &Message, width: usize) -> Vec<Line<'static>> {
    let (prefix, color) = if m.is_user() {
        ("You ", Color::Cyan)
    } else if m.is_error {
        ("Bot ", Color::Red)
    } else {
        ("Bot ", Color::Green)
    };
    let text = if m.is_user() || m.is_error {
        m.text.clone()
    } else {
        format_message(&m.text)
    };
    let display = truncate_for_display(&text);

    let mut lines = Vec::new();
    for (i, line) in wrap_text(&display, width).into_iter().enumerate() {
        let pref = if i == 0 { prefix } else { "    " };
        let body_style = if m.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(pref, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(line, body_style),
        ]));
    }

    let mut meta = vec![
        Span::raw("    "),
        Span::styled(
            m.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(strategy) = &m.strategy {
        meta.push(Span::raw(" "));
        meta.push(Span::styled(
            format!("[{}]", strategy.as_str().to_uppercase()),
            Style::default().fg(strategy_color(strategy)),
        ));
    }
    if let Some(pct) = m.confidence_percent() {
        meta.push(Span::styled(
            format!(" {}%", pct),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(meta));
    lines
}

fn draw_chat_panel(
    f: &mut Frame,
    state: &SessionSnapshot,
    input_buffer: &str,
    view: &ViewState,
    area: Rect,
) -> (usize, usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(area);
    let conv_area = chunks[0];
    // 边框 + 滚动条 + 前缀
    let content_width = conv_area.width.saturating_sub(3 + 4) as usize;

    let block = Block::default()
        .title(" RAG Chat ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let mut text_lines: Vec<Line> = Vec::new();
    if state.messages.is_empty() {
        text_lines.push(Line::from(Span::styled(
            "Welcome! Ask a question to start chatting.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (idx, m) in state.messages.iter().enumerate() {
        if idx > 0 {
            text_lines.push(Line::from(""));
        }
        text_lines.extend(message_lines(m, content_width.max(20)));
    }
    if state.submitting {
        text_lines.push(Line::from(""));
        text_lines.push(Line::from(Span::styled(
            "Bot ...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let content_height = conv_area.height.saturating_sub(2) as usize;
    let total_lines = text_lines.len();
    let max_scroll = total_lines.saturating_sub(content_height);
    let scroll_offset = view.chat_scroll.min(max_scroll);

    let inner = block.inner(conv_area);
    f.render_widget(block, conv_area);
    let paragraph = Paragraph::new(Text::from(visible_window(
        text_lines,
        scroll_offset,
        content_height,
    )));
    f.render_widget(paragraph, inner);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll_offset)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
    }

    let input_prompt = if state.submitting {
        " Waiting for response... "
    } else {
        " Ask a question "
    };
    let border_color = if state.agent_status == AgentStatus::Error {
        Color::Red
    } else {
        Color::Blue
    };
    let input_block = Block::default()
        .title(input_prompt)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let input = Paragraph::new(input_buffer)
        .block(input_block)
        .wrap(Wrap { trim: false })
        .style(if state.submitting {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        });
    f.render_widget(input, chunks[1]);

    (total_lines, content_height)
}

fn entry_style(action: LogAction) -> Style {
    match action {
        LogAction::EnterTask => Style::default(),
        LogAction::Thought => Style::default().add_modifier(Modifier::ITALIC),
        LogAction::ApiRequest => Style::default().fg(Color::Green),
        LogAction::ApiResponse => Style::default().fg(Color::Blue),
        LogAction::Error => Style::default().fg(Color::Red),
    }
}

fn draw_activity_panel(f: &mut Frame, activity: &[ActivityLogEntry], area: Rect) {
    let block = Block::default()
        .title(" Conversation Details ")
        .borders(Borders::ALL);
    let width = area.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();
    if activity.is_empty() {
        lines.push(Line::from(Span::styled(
            "No conversation activity yet.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for entry in activity {
        lines.push(Line::from(vec![
            Span::styled(
                entry.agent.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", entry.time), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(Span::styled(
            format!("{}:", entry.action.label()),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in wrap_text(&entry.content, width.max(10)) {
            lines.push(Line::from(Span::styled(line, entry_style(entry.action))));
        }
        lines.push(Line::from(""));
    }

    // 始终显示最新的条目
    let height = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(height);
    let paragraph = Paragraph::new(Text::from(visible_window(lines, scroll, height))).block(block);
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_wrap_text_by_chars() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("你好世界", 2), vec!["你好", "世界"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn test_truncate_long_content() {
        let long = "x".repeat(MAX_DISPLAY_CHARS + 10);
        let shown = truncate_for_display(&long);
        assert!(shown.ends_with(&format!("[{} chars total]", MAX_DISPLAY_CHARS + 10)));
    }

    #[test]
    fn test_visible_window_past_u16_range() {
        let total = u16::MAX as usize + 100;
        let lines: Vec<Line> = (0..total).map(|i| Line::from(i.to_string())).collect();
        let shown = visible_window(lines, total - 3, 3);
        let texts: Vec<String> = shown
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.to_string()).collect())
            .collect();
        assert_eq!(
            texts,
            vec![
                (total - 3).to_string(),
                (total - 2).to_string(),
                (total - 1).to_string()
            ]
        );
    }

    #[test]
    fn test_message_meta_line() {
        let m = Message::assistant("Done.", Utc::now(), Strategy::Hybrid, 0.846, "m");
        let lines = message_lines(&m, 40);
        let meta: String = lines
            .last()
            .unwrap()
            .spans
            .iter()
            .map(|s| s.content.to_string())
            .collect();
        assert!(meta.contains("[HYBRID]"));
        assert!(meta.contains("85%"));
    }
}
