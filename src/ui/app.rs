//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件，将用户输入与快捷键转为 Command 发送给编排器，
//! 每帧用 draw 渲染 SessionSnapshot 与输入缓冲。

use std::io::{self, Stdout};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, SessionSnapshot};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::{draw, ViewState};

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<SessionSnapshot>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    // 区分 Shift+Enter 与 Enter 需要终端支持按键增强协议
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, state_rx, cmd_tx).await;
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    restore_terminal(&mut terminal)?;
    result
}

/// 编辑输入缓冲：Shift+Enter 换行，Enter 返回待提交的查询（空白输入不提交）
fn edit_input(buffer: &mut String, key: KeyEvent) -> Option<String> {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
            buffer.push('\n');
            None
        }
        KeyCode::Enter => {
            let input = buffer.trim().to_string();
            if input.is_empty() {
                return None;
            }
            buffer.clear();
            Some(input)
        }
        KeyCode::Backspace => {
            buffer.pop();
            None
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            None
        }
        _ => None,
    }
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: watch::Receiver<SessionSnapshot>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    let event_handler = EventHandler::new(cmd_tx);
    // 启动时先检查一次连接
    event_handler.send(Command::RefreshStatus);

    let mut input_buffer = String::new();
    let mut view = ViewState::default();
    let mut last_history_len = 0usize;

    loop {
        let state = state_rx.borrow().clone();

        if state.messages.len() != last_history_len {
            last_history_len = state.messages.len();
            view.chat_scroll = usize::MAX;
        }

        if let Some(ev) = event_handler.poll()? {
            match ev {
                AppEvent::Command(Command::Quit) => {
                    event_handler.send(Command::Quit);
                    break;
                }
                AppEvent::Command(_) => {}
                AppEvent::ToggleStats => {
                    view.show_stats = !view.show_stats;
                    if view.show_stats {
                        event_handler.send(Command::LoadStats);
                    }
                }
                AppEvent::Key(key) => match key.code {
                    KeyCode::Enter | KeyCode::Backspace | KeyCode::Char(_) => {
                        if !state.submitting {
                            if let Some(input) = edit_input(&mut input_buffer, key) {
                                event_handler.send_submit(input);
                            }
                        }
                    }
                    KeyCode::Up => view.chat_scroll = view.chat_scroll.saturating_sub(1),
                    KeyCode::Down => view.chat_scroll = view.chat_scroll.saturating_add(1),
                    KeyCode::PageUp => view.chat_scroll = view.chat_scroll.saturating_sub(10),
                    KeyCode::PageDown => view.chat_scroll = view.chat_scroll.saturating_add(10),
                    KeyCode::Home => view.chat_scroll = 0,
                    KeyCode::End => view.chat_scroll = usize::MAX,
                    _ => {}
                },
            }
        }

        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| {
            draw(f, &state, &input_buffer, &view, &mut scroll_info);
        })?;
        let (total_lines, viewport_height) = scroll_info;
        view.chat_scroll = view.chat_scroll.min(total_lines.saturating_sub(viewport_height));

        tokio::task::yield_now().await;
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut buffer = String::new();
        for c in "line one".chars() {
            edit_input(&mut buffer, key(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert_eq!(edit_input(&mut buffer, key(KeyCode::Enter, KeyModifiers::SHIFT)), None);
        edit_input(&mut buffer, key(KeyCode::Char('2'), KeyModifiers::NONE));
        assert_eq!(buffer, "line one\n2");

        let sent = edit_input(&mut buffer, key(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(sent.as_deref(), Some("line one\n2"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_blank_enter_keeps_buffer() {
        let mut buffer = String::from("  ");
        assert_eq!(edit_input(&mut buffer, key(KeyCode::Enter, KeyModifiers::NONE)), None);
        assert_eq!(buffer, "  ");
    }
}
